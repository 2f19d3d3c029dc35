mod settings;

pub use settings::{
    ApiConfig, DirectoryConfig, LogConfig, OtelConfig, RedisConfig, ServerConfig, Settings,
    SiteSettings, TransportConfig,
};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::i18n::{DateFormatError, DateFormatter, Locale, DEFAULT_DATE_FORMAT};
use crate::policy::{GlobalFlagWiring, PolicySettings};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub site: SiteSettings,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub otel: OtelConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Maximum accepted request body in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    pub key: Option<String>,
}

/// Host site facts this service needs but cannot read from the event
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSettings {
    /// Public root URL of the host platform
    #[serde(default = "default_wwwroot")]
    pub wwwroot: String,
    /// Front page course, which never carries an instance
    #[serde(default = "default_site_course_id")]
    pub site_course_id: i64,
    /// Name the notifier is registered under in the host
    #[serde(default = "default_plugin_name")]
    pub plugin_name: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_support_name")]
    pub support_name: String,
    #[serde(default = "default_support_email")]
    pub support_email: String,
    #[serde(default)]
    pub global_flag_wiring: GlobalFlagWiring,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// `memory` or `postgres`
    #[serde(default = "default_directory_backend")]
    pub backend: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// `log`, `smtp` or `memory`
    #[serde(default = "default_transport_backend")]
    pub backend: String,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    #[serde(default)]
    pub smtp_starttls: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default)]
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Emit JSON log lines instead of human readable ones
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_body_limit() -> usize {
    64 * 1024 // 64 KiB
}

fn default_wwwroot() -> String {
    "http://localhost".to_string()
}

fn default_site_course_id() -> i64 {
    1
}

fn default_plugin_name() -> String {
    "notificationeabc".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_support_name() -> String {
    "Support".to_string()
}

fn default_support_email() -> String {
    "noreply@localhost".to_string()
}

fn default_directory_backend() -> String {
    "memory".to_string()
}

fn default_table_prefix() -> String {
    "mdl_".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_transport_backend() -> String {
    "log".to_string()
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "enrol-notification-service".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("site.locale", default_locale())?
            .set_default("directory.backend", default_directory_backend())?
            .set_default("transport.backend", default_transport_backend())?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // SERVER__PORT, SITE__WWWROOT, DIRECTORY__URL, TRANSPORT__SMTP_HOST, etc.
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("redis.channels")
                    .with_list_parse_key("server.cors_origins"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn locale(&self) -> Locale {
        Locale::parse(&self.site.locale)
    }

    pub fn date_formatter(&self) -> Result<DateFormatter, DateFormatError> {
        DateFormatter::new(
            self.locale(),
            &self.site.date_format,
            self.site.utc_offset_minutes,
        )
    }

    pub fn policy_settings(&self) -> PolicySettings {
        PolicySettings {
            plugin_name: self.site.plugin_name.clone(),
            wiring: self.site.global_flag_wiring,
            locale: self.locale(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            body_limit: default_body_limit(),
        }
    }
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            wwwroot: default_wwwroot(),
            site_course_id: default_site_course_id(),
            plugin_name: default_plugin_name(),
            locale: default_locale(),
            date_format: default_date_format(),
            utc_offset_minutes: 0,
            support_name: default_support_name(),
            support_email: default_support_email(),
            global_flag_wiring: GlobalFlagWiring::default(),
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            backend: default_directory_backend(),
            url: String::new(),
            table_prefix: default_table_prefix(),
            pool_size: default_pool_size(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            backend: default_transport_backend(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            smtp_starttls: false,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_redis_url(),
            channels: vec![],
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

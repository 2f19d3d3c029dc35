// Domain layer (business logic)
pub mod domain;

// Re-export domain modules at the crate root
pub use domain::enrolment;
pub use domain::instance;
pub use domain::policy;
pub use domain::template;

// Supporting layer
pub mod config;
pub mod error;
pub mod host;
pub mod i18n;
pub mod metrics;
pub mod notification;
pub mod telemetry;

// Application layer
pub mod api;
pub mod handler;
pub mod server;
pub mod triggers;

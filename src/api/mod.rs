//! API layer - HTTP endpoint handlers organized by domain.

mod health;
mod instance;
mod metrics;
mod routes;
mod template;

pub use health::{health, stats};
pub use instance::{add_instance, get_instance, instance_form, update_instance};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
pub use template::{list_tokens, render_preview};

//! Access to the host platform's records.
//!
//! # Directory Backends
//!
//! - `MemoryDirectory`: In-memory storage using DashMap (default, tests)
//! - `PostgresDirectory`: Reads the host's own PostgreSQL tables
//!
//! Use `create_directory()` to build the backend selected in configuration.

mod directory;
mod memory;
mod postgres;

use std::sync::Arc;

use crate::config::Settings;

pub use directory::{DirectoryError, DirectoryResult, HostDirectory};
pub use memory::MemoryDirectory;
pub use postgres::PostgresDirectory;

/// Create the host directory selected by `directory.backend`:
/// - `"postgres"`: connects to `directory.url`
/// - `"memory"` (default): an empty in-memory directory
pub async fn create_directory(settings: &Settings) -> DirectoryResult<Arc<dyn HostDirectory>> {
    match settings.directory.backend.as_str() {
        "postgres" => {
            tracing::info!(backend = "postgres", "Creating host directory");
            let directory = PostgresDirectory::connect(
                &settings.directory,
                &settings.site.plugin_name,
                &settings.site.wwwroot,
            )
            .await?;
            Ok(Arc::new(directory))
        }
        "memory" => {
            tracing::info!(backend = "memory", "Creating host directory");
            Ok(Arc::new(MemoryDirectory::default()))
        }
        other => {
            tracing::warn!(
                backend = %other,
                "Unknown directory backend, falling back to memory"
            );
            Ok(Arc::new(MemoryDirectory::default()))
        }
    }
}

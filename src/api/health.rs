//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::notification::DispatcherStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub directory: DirectoryHealthResponse,
    pub transport: String,
    pub redis_trigger: bool,
}

#[derive(Debug, Serialize)]
pub struct DirectoryHealthResponse {
    pub backend: String,
    pub reachable: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub uptime_seconds: u64,
    pub notifications: DispatcherStatsSnapshot,
}

/// Reports `degraded` when the host directory cannot be read
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let reachable = match state.directory.site_config().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Host directory health probe failed");
            false
        }
    };

    Json(HealthResponse {
        status: if reachable { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        directory: DirectoryHealthResponse {
            backend: state.directory.backend_name().to_string(),
            reachable,
        },
        transport: state.dispatcher.transport_name().to_string(),
        redis_trigger: state.settings.redis.enabled,
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        uptime_seconds: state.started_at.elapsed().as_secs(),
        notifications: state.dispatcher.stats(),
    })
}

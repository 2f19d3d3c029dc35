use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};
use crate::triggers::receive_event;

use super::health::{health, stats};
use super::instance::{add_instance, get_instance, instance_form, update_instance};
use super::metrics::prometheus_metrics;
use super::template::{list_tokens, render_preview};

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                // Host events
                .route("/events", post(receive_event))
                // Templates
                .route("/tokens", get(list_tokens))
                .route("/render", post(render_preview))
                // Course instances
                .route("/instances/form", get(instance_form))
                .route(
                    "/courses/{course_id}/instance",
                    get(get_instance).post(add_instance).put(update_instance),
                )
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
}

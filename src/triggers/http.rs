use axum::{extract::State, Json};

use crate::enrolment::{HostEventPayload, NotificationEvent};
use crate::error::Result;
use crate::handler::HandleOutcome;
use crate::server::AppState;

/// Host webhook for enrolment lifecycle events
#[tracing::instrument(
    name = "http.enrolment_event",
    skip(state, payload),
    fields(course_id = payload.courseid, user_id = payload.relateduserid)
)]
pub async fn receive_event(
    State(state): State<AppState>,
    Json(payload): Json<HostEventPayload>,
) -> Result<Json<HandleOutcome>> {
    let event = NotificationEvent::try_from(payload)?;
    let outcome = state.handler.handle(&event).await?;
    Ok(Json(outcome))
}

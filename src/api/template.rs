//! Template token listing and render preview.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::server::AppState;
use crate::template::{known_tokens, TokenInfo};

#[derive(Debug, Serialize)]
pub struct TokenListResponse {
    pub tokens: Vec<TokenInfo>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub template: String,
    pub course_id: i64,
    pub user_id: i64,
    /// Enrolment whose dates fill the `{ENROL*}` placeholders
    #[serde(default)]
    pub enrolment_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub rendered: String,
    /// An empty rendering would not be sent
    pub empty: bool,
}

/// GET /api/v1/tokens - Every placeholder a template may use on this site
#[tracing::instrument(name = "http.list_tokens", skip(state))]
pub async fn list_tokens(State(state): State<AppState>) -> Result<Json<TokenListResponse>> {
    let shortnames = state.directory.profile_field_shortnames().await?;
    let tokens = known_tokens(shortnames.iter().map(String::as_str));
    let total = tokens.len();

    Ok(Json(TokenListResponse { tokens, total }))
}

/// POST /api/v1/render - Render a template against real records without sending
#[tracing::instrument(
    name = "http.render_preview",
    skip(state, request),
    fields(course_id = request.course_id, user_id = request.user_id)
)]
pub async fn render_preview(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderResponse>> {
    let course = state
        .directory
        .course(request.course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {}", request.course_id)))?;
    let user = state
        .directory
        .user(request.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", request.user_id)))?;
    let enrolment = match request.enrolment_id {
        Some(id) => Some(
            state
                .directory
                .enrolment(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("enrolment {}", id)))?,
        ),
        None => None,
    };

    let rendered = state
        .dispatcher
        .renderer()
        .render(&request.template, &user, &course, enrolment.as_ref());

    Ok(Json(RenderResponse {
        empty: rendered.is_empty(),
        rendered,
    }))
}

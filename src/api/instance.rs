//! Course instance configuration endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::instance::{
    can_add_instance, form_schema, instance_defaults, FormField, InstanceForm, InstanceRecord,
};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct FormSchemaResponse {
    pub locale: String,
    pub fields: Vec<FormField>,
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// GET /api/v1/instances/form - Field definitions for the configuration form
#[tracing::instrument(name = "http.instance_form", skip(state))]
pub async fn instance_form(State(state): State<AppState>) -> Result<Json<FormSchemaResponse>> {
    let site = state.directory.site_config().await?;
    let locale = state.settings.locale();

    Ok(Json(FormSchemaResponse {
        locale: locale.code().to_string(),
        fields: form_schema(locale, &instance_defaults(&site)),
    }))
}

/// GET /api/v1/courses/{course_id}/instance
#[tracing::instrument(name = "http.get_instance", skip(state))]
pub async fn get_instance(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<Json<InstanceRecord>> {
    state
        .directory
        .instance_for_course(course_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no instance for course {}", course_id)))
}

/// POST /api/v1/courses/{course_id}/instance - Add the course's instance
#[tracing::instrument(name = "http.add_instance", skip(state, form))]
pub async fn add_instance(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Json(form): Json<InstanceForm>,
) -> Result<(StatusCode, Json<InstanceRecord>)> {
    form.validate(state.settings.locale())?;

    if state.directory.course(course_id).await?.is_none() {
        return Err(AppError::NotFound(format!("course {}", course_id)));
    }

    let existing = state.directory.instance_for_course(course_id).await?;
    // Callers holding the API key act with the manage capability
    if !can_add_instance(
        course_id,
        state.settings.site.site_course_id,
        usize::from(existing.is_some()),
        true,
    ) {
        return Err(AppError::Conflict(format!(
            "course {} cannot take another notifier instance",
            course_id
        )));
    }

    let mut record = InstanceRecord::from_form(course_id, &form, now());
    // A concurrent add may have won since the check above
    record.id = state
        .directory
        .insert_instance(&record)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("course {} already has a notifier instance", course_id))
        })?;

    tracing::info!(instance_id = record.id, "Instance added");
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/v1/courses/{course_id}/instance - Update the course's instance
#[tracing::instrument(name = "http.update_instance", skip(state, form))]
pub async fn update_instance(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Json(form): Json<InstanceForm>,
) -> Result<Json<InstanceRecord>> {
    form.validate(state.settings.locale())?;

    let mut record = state
        .directory
        .instance_for_course(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no instance for course {}", course_id)))?;

    record.apply_form(&form, now());

    if !state.directory.update_instance(&record).await? {
        return Err(AppError::NotFound(format!("instance {}", record.id)));
    }

    tracing::info!(instance_id = record.id, "Instance updated");
    Ok(Json(record))
}

use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use uuid::Uuid;

use pulse_db::models::FormRow;
use pulse_types::api::{CreateFormRequest, UpdateFormRequest};
use pulse_types::models::{FeedbackForm, FormField};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

pub async fn list_forms(State(state): State<AppState>) -> Result<Json<Vec<FeedbackForm>>, ApiError> {
    let rows = state.db.list_forms()?;
    let forms = rows
        .into_iter()
        .map(form_response)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(forms))
}

pub async fn create_form(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateFormRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = FormRow {
        id: Uuid::new_v4().to_string(),
        title: req.title,
        description: req.description,
        created_by: user.id,
        created_at: now_timestamp(),
        is_active: req.is_active,
        fields: serialize_fields(&req.fields)?,
    };

    state.db.insert_form(&row)?;

    Ok((StatusCode::CREATED, Json(form_response(row)?)))
}

pub async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FeedbackForm>, ApiError> {
    let row = state
        .db
        .get_form(&id)?
        .ok_or_else(|| ApiError::NotFound("Form not found".to_string()))?;

    Ok(Json(form_response(row)?))
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateFormRequest>,
) -> Result<Json<FeedbackForm>, ApiError> {
    let row = state
        .db
        .get_form(&id)?
        .ok_or_else(|| ApiError::NotFound("Form not found".to_string()))?;

    // Merge the partial update over the stored row
    let title = req.title.unwrap_or(row.title);
    let description = req.description.unwrap_or(row.description);
    let is_active = req.is_active.unwrap_or(row.is_active);
    let fields = match req.fields {
        Some(fields) => serialize_fields(&fields)?,
        None => row.fields,
    };

    state
        .db
        .update_form(&id, &title, &description, is_active, &fields)?;

    let updated = state
        .db
        .get_form(&id)?
        .ok_or_else(|| ApiError::NotFound("Form not found".to_string()))?;

    Ok(Json(form_response(updated)?))
}

pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .get_form(&id)?
        .ok_or_else(|| ApiError::NotFound("Form not found".to_string()))?;

    state.db.delete_form_cascade(&id)?;

    Ok(Json(json!({ "message": "Form deleted successfully" })))
}

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_fields(fields: &[FormField]) -> Result<String, ApiError> {
    Ok(serde_json::to_string(fields).context("failed to serialize form fields")?)
}

/// Converts a stored row into the API shape, deserializing the `fields`
/// sub-document. Corrupt stored JSON surfaces as an internal error.
pub fn form_response(row: FormRow) -> Result<FeedbackForm, ApiError> {
    let fields: Vec<FormField> =
        serde_json::from_str(&row.fields).context("corrupt form fields column")?;
    let created_at = row
        .created_at
        .parse::<DateTime<Utc>>()
        .context("corrupt form created_at column")?;

    Ok(FeedbackForm {
        id: row.id,
        title: row.title,
        description: row.description,
        created_by: row.created_by,
        created_at,
        is_active: row.is_active,
        fields,
    })
}

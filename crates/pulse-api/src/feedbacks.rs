use anyhow::Context;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use pulse_db::FeedbackFilter;
use pulse_db::models::FeedbackRow;
use pulse_types::api::{FeedbackQuery, SubmitFeedbackRequest};
use pulse_types::models::Feedback;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::forms::now_timestamp;

pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<SubmitFeedbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = state
        .db
        .get_form(&req.form_id)?
        .ok_or_else(|| ApiError::NotFound("Form not found".to_string()))?;

    if !form.is_active {
        return Err(ApiError::FormInactive(
            "This form is no longer accepting responses".to_string(),
        ));
    }

    if !(1..=5).contains(&req.rating) {
        return Err(ApiError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    let row = FeedbackRow {
        id: Uuid::new_v4().to_string(),
        form_id: req.form_id,
        name: req.name,
        email: req.email,
        message: req.message,
        rating: req.rating,
        created_at: now_timestamp(),
        responses: serde_json::to_string(&req.responses)
            .context("failed to serialize responses")?,
    };

    state.db.insert_feedback(&row)?;

    Ok((StatusCode::CREATED, Json(feedback_response(row)?)))
}

pub async fn list_feedbacks(
    State(state): State<AppState>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<Vec<Feedback>>, ApiError> {
    // "all" is the sentinel for "no form filter"; empty strings mean absent
    let filter = FeedbackFilter {
        form_id: query.form_id.filter(|v| v != "all" && !v.is_empty()),
        rating: query.rating,
        search: query.search.filter(|s| !s.is_empty()),
    };

    let rows = state.db.list_feedbacks(&filter)?;
    let feedbacks = rows
        .into_iter()
        .map(feedback_response)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(feedbacks))
}

fn feedback_response(row: FeedbackRow) -> Result<Feedback, ApiError> {
    let responses =
        serde_json::from_str(&row.responses).context("corrupt feedback responses column")?;
    let created_at = row
        .created_at
        .parse::<DateTime<Utc>>()
        .context("corrupt feedback created_at column")?;

    Ok(Feedback {
        id: row.id,
        form_id: row.form_id,
        name: row.name,
        email: row.email,
        message: row.message,
        rating: row.rating,
        created_at,
        responses,
    })
}

use serde::{Deserialize, Serialize};

use crate::models::{FormField, Role, User};

// -- JWT Claims --

/// Session token claims shared between token issuance (login) and the auth
/// middleware. Tokens expire one day after issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

/// Both fields are optional so a missing one maps to a 400 with a clear
/// message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

// -- Forms --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateFormRequest {
    pub title: String,
    pub description: String,
    pub fields: Vec<FormField>,
    pub is_active: bool,
}

/// Partial update: omitted fields keep their stored values.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateFormRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Option<Vec<FormField>>,
    pub is_active: Option<bool>,
}

// -- Feedback --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmitFeedbackRequest {
    pub form_id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub rating: i64,
    pub responses: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub form_id: Option<String>,
    pub rating: Option<i64>,
    pub search: Option<String>,
}

// -- Analytics --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub form_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_feedbacks: i64,
    pub average_rating: f64,
    pub positive_count: i64,
    pub negative_count: i64,
    pub neutral_count: i64,
}

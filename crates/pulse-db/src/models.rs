/// Database row types — these map directly to SQLite rows.
/// Distinct from pulse-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub password_hash: String,
}

pub struct FormRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_by: String,
    pub created_at: String,
    pub is_active: bool,
    pub fields: String,
}

pub struct FeedbackRow {
    pub id: String,
    pub form_id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub rating: i64,
    pub created_at: String,
    pub responses: String,
}

/// Aggregate over feedback ratings, one row per query. `average` is the raw
/// SQL average; rounding happens at the API boundary.
pub struct RatingSummaryRow {
    pub total: i64,
    pub average: f64,
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
}

use axum::{
    Json,
    extract::{Query, State},
};

use pulse_types::api::{AnalyticsQuery, AnalyticsSummary};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let form_id = query.form_id.filter(|v| v != "all" && !v.is_empty());

    let summary = state.db.rating_summary(form_id.as_deref())?;

    Ok(Json(AnalyticsSummary {
        total_feedbacks: summary.total,
        average_rating: (summary.average * 10.0).round() / 10.0,
        positive_count: summary.positive,
        negative_count: summary.negative,
        neutral_count: summary.neutral,
    }))
}

#[cfg(test)]
mod tests {
    #[test]
    fn average_rounds_to_one_decimal() {
        // ratings [4, 5, 4] -> raw 4.333...
        let raw: f64 = 13.0 / 3.0;
        assert_eq!((raw * 10.0).round() / 10.0, 4.3);

        // ratings [1, 2] -> 1.5 stays exact
        let raw: f64 = 3.0 / 2.0;
        assert_eq!((raw * 10.0).round() / 10.0, 1.5);
    }
}

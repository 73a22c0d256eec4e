pub mod analytics;
pub mod auth;
pub mod error;
pub mod feedbacks;
pub mod forms;
pub mod middleware;

pub use auth::{AppState, AppStateInner};

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, patch, post};

/// Assembles the full route table. Public routes carry no gate; admin routes
/// are wrapped in `require_auth` then `require_admin`, in that order.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/forms/{id}", get(forms::get_form))
        .route("/feedbacks", post(feedbacks::submit_feedback))
        .with_state(state.clone());

    let authed = Router::new()
        .route("/auth/me", get(auth::me))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state.clone());

    // Layers run outermost-last, so require_auth is added after require_admin
    let admin = Router::new()
        .route("/forms", get(forms::list_forms).post(forms::create_form))
        .route(
            "/forms/{id}",
            patch(forms::update_form).delete(forms::delete_form),
        )
        .route("/feedbacks", get(feedbacks::list_feedbacks))
        .route("/analytics", get(analytics::get_analytics))
        .layer(from_fn(middleware::require_admin))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state);

    Router::new().merge(public).merge(authed).merge(admin)
}

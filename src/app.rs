use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/habits", get(handlers::list_habits).post(handlers::create_habit))
        .route("/api/habits/due", get(handlers::habits_due))
        .route(
            "/api/habits/:id",
            get(handlers::get_habit)
                .patch(handlers::update_habit)
                .delete(handlers::delete_habit),
        )
        .route("/api/habits/:id/toggle", post(handlers::toggle_completion))
        .route("/api/stats/dashboard", get(handlers::dashboard))
        .route("/api/stats/analytics", get(handlers::analytics))
        .route("/api/stats/heatmap", get(handlers::heatmap))
        .route("/api/calendar", get(handlers::calendar))
        .route("/api/insights", post(handlers::create_insight))
        .route("/api/insights/latest", get(handlers::latest_insight))
        .with_state(state)
}

pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::parsing::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/resume/parse", post(handlers::handle_parse))
        .route(
            "/api/resume/parse-multiple",
            post(handlers::handle_parse_multiple),
        )
        .route("/api/resume/results", get(handlers::handle_list_results))
        .route("/api/resume/results/:id", get(handlers::handle_get_result))
        .with_state(state)
}

pub mod handlers;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // MCP tools — the core's two exposed operations
        .route(
            "/mcp/plan_weekly_content",
            post(handlers::handle_plan_weekly_content),
        )
        .route(
            "/mcp/generate_content",
            post(handlers::handle_generate_content),
        )
        // Public feed API
        .route("/api/feed", get(handlers::handle_feed))
        .route("/api/content/:id", get(handlers::handle_get_content))
        .with_state(state)
}

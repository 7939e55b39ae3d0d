use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Reports service status and database connectivity.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let database = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Json(json!({
        "status": "ok",
        "service": "agrofeed-api",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}

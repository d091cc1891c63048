use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::db;
use crate::state::AppState;

/// GET /health
/// Reports service version, database reachability and live review sessions.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let database = if db::ping(&state.db).await { "ok" } else { "unreachable" };
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "recruit-api",
        "database": database,
        "active_video_reviews": state.reviews.len().await,
    }))
}

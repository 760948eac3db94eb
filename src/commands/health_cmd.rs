use axum::{extract::State, response::Response, Json};
use serde_json::json;

use crate::AppState;
use super::response::no_cache;

/// GET /health; `database` turns true once the background init finished
pub async fn health(State(state): State<AppState>) -> Response {
    let ready = state.db.is_ready().await;
    let status = if ready { "ok" } else { "starting" };
    no_cache(Json(json!({ "status": status, "database": ready })))
}

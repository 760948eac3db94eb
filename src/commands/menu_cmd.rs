//! Menu Handlers
//!
//! Public menu read plus the admin saves that reconcile storage with the
//! submitted tree.

use axum::{body::Bytes, extract::State, response::Response, Json};
use serde_json::{json, Value};

use crate::auth::RequireAdmin;
use crate::domain::{parse_category_payload, parse_menu_payload};
use crate::repository::MenuSyncOperations;
use crate::AppState;
use super::response::{no_cache, success, ApiResult};

/// GET /api/menu
pub async fn get_menu(State(state): State<AppState>) -> ApiResult<Response> {
    let menu = state.menu_repo.load_menu().await?;
    Ok(no_cache(Json(menu)))
}

/// POST /api/menu: the body is the whole menu
pub async fn save_menu(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let categories = parse_menu_payload(&body)?;
    state.menu_repo.save_menu(&categories).await?;
    Ok(success(json!({})))
}

/// POST /api/menu/category: one category subtree, siblings untouched
pub async fn save_category(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let category = parse_category_payload(&body)?;
    let id = state.menu_repo.save_category(&category).await?;
    Ok(success(json!({ "id": id })))
}

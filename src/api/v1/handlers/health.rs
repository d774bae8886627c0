/*
 * Responsibility
 * - GET /health (疎通用)
 * - storage backend 名も返す (memory / postgres の取り違え確認用)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "storage": state.repo.backend_name()})),
    )
}

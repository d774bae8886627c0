/*
 * Responsibility
 * - URL 構造を定義 (wire contract そのまま: /discussions 以下)
 * - 認証の要否は handler の extractor (AuthCtxExtractor) で表現する
 */
use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    discussions::{
        add_reply, create_discussion, delete_discussion, delete_reply, list_discussions,
        update_discussion, vote_discussion,
    },
    health::health,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/discussions",
            get(list_discussions).post(create_discussion),
        )
        .route(
            "/discussions/{id}",
            put(update_discussion).delete(delete_discussion),
        )
        .route("/discussions/vote/{id}", put(vote_discussion))
        .route("/discussions/reply/{id}", put(add_reply))
        .route("/discussions/reply/{id}/{reply}", delete(delete_reply))
}

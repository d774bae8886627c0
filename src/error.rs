/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - RepoError / content validation / id codec のエラーを統一的に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ContentError, ReplyRefError};
use crate::repos::error::RepoError;
use crate::services::id_codec::IdCodecError;

pub const CODE_REPLY_OUT_OF_RANGE: &str = "REPLY_OUT_OF_RANGE";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource} not found."),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "unauthorized".into(),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", "forbidden".into()),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::ReplyOutOfRange { index, len } => AppError::bad_request(
                CODE_REPLY_OUT_OF_RANGE,
                format!("reply index {index} is out of range for {len} replies"),
            ),
            RepoError::ReplyNotFound => AppError::not_found("reply"),
            RepoError::NotOwner => AppError::Forbidden,
            RepoError::Db(e) => {
                tracing::error!(error = ?e, "repository failure");
                AppError::Internal
            }
        }
    }
}

impl From<ContentError> for AppError {
    fn from(e: ContentError) -> Self {
        AppError::bad_request("INVALID_CONTENT", e.to_string())
    }
}

impl From<ReplyRefError> for AppError {
    fn from(e: ReplyRefError) -> Self {
        AppError::bad_request("INVALID_REPLY_REF", e.to_string())
    }
}

impl From<IdCodecError> for AppError {
    fn from(e: IdCodecError) -> Self {
        match e {
            // a public id we never issued names a post that does not exist
            IdCodecError::Unrecognized => AppError::not_found("discussion"),

            // These indicate server-side config / programming errors
            _ => {
                tracing::error!(error = %e, "id codec failure");
                AppError::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn out_of_range_is_a_bad_request_with_its_own_code() {
        let (status, body) = body_of(RepoError::ReplyOutOfRange { index: 3, len: 1 }.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.code, CODE_REPLY_OUT_OF_RANGE);
    }

    #[tokio::test]
    async fn not_owner_is_forbidden() {
        let (status, body) = body_of(RepoError::NotOwner.into()).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.error.code, "FORBIDDEN");
    }

    #[tokio::test]
    async fn unknown_public_id_is_not_found() {
        let (status, body) = body_of(IdCodecError::Unrecognized.into()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.message, "discussion not found.");
    }

    #[tokio::test]
    async fn content_errors_are_bad_requests() {
        let (status, body) = body_of(ContentError::TooLong { max: 500 }.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.code, "INVALID_CONTENT");
        assert_eq!(body.error.message, "content must be at most 500 characters");
    }
}

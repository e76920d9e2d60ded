//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous key: {0}")]
    Ambiguous(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// 404 for an item that does not exist under the given key.
    pub fn item_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Item '{id}' not found"))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Ambiguous { .. } => ApiError::Ambiguous(err.to_string()),
            StoreError::Serialization(_) | StoreError::Backend(_) => {
                ApiError::Storage(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                msg,
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                msg,
            ),
            ApiError::Ambiguous(msg) => (
                StatusCode::BAD_REQUEST,
                "ambiguous_key_error",
                msg,
            ),
            ApiError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "api_error",
                msg,
            ),
        };

        let body = Json(ErrorResponse {
            type_: "error".to_string(),
            error: ErrorDetail {
                type_: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    #[serde(rename = "type")]
    type_: String,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    type_: String,
    message: String,
}

//! API request handlers

pub mod health;
pub mod tracking;
pub mod workflows;

use axum::{http::StatusCode, Json};
use mailloom_common::Error;
use serde::Serialize;

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Map a domain error to its HTTP representation
pub fn error_response(err: &Error) -> (StatusCode, Json<ErrorResponse>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorResponse {
            error: err.code().to_string(),
            message: err.to_string(),
        }),
    )
}

//! Error-to-response mapping.
//!
//! # Status Codes
//! - 400: a request parameter is structurally invalid (names the parameter)
//! - 404: no such route or no tab for the requested month
//! - 504: a deadline was exceeded, at the pipeline or upstream-call level
//! - 500: anything else, without internal detail
//!
//! Diagnostic detail is logged here and never sent to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monthly::IndexError;
use crate::resilience::{is_cancellation_error, is_timeout_error};

pub const TIMED_OUT_MESSAGE: &str = "Request timed out";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Every failure a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Detail is for logs only.
    #[error("{0}")]
    Deadline(String),

    /// The request's signal fired (server shutting down).
    #[error("{0}")]
    Cancelled(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Deadline(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Cancelled(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Invalid(e) => ApiError::Validation(e.to_string()),
            IndexError::MonthNotFound(month) => ApiError::NotFound(format!("No tab for month {}", month)),
            other if is_timeout_error(&other) => ApiError::Deadline(other.to_string()),
            other if is_cancellation_error(&other) => ApiError::Cancelled(other.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Validation(message) => {
                tracing::debug!(error = %message, "Rejected request parameters");
                message
            }
            ApiError::NotFound(message) => message,
            ApiError::Deadline(detail) => {
                tracing::warn!(detail = %detail, "Request timed out");
                TIMED_OUT_MESSAGE.to_string()
            }
            ApiError::Cancelled(detail) => {
                tracing::info!(detail = %detail, "Request cancelled");
                INTERNAL_MESSAGE.to_string()
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Request failed");
                INTERNAL_MESSAGE.to_string()
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

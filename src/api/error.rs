use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::FormError;

/// API error types that can be returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid model: {0}")]
    InvalidModel(#[from] FormError),

    #[error("Solver error: {0}")]
    SolverError(String),
}

/// Error response that gets serialized to JSON
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) | ApiError::InvalidModel(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::SolverError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string
    fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::ValidationError(_) => "ValidationError",
            ApiError::InvalidModel(_) => "InvalidModel",
            ApiError::SolverError(_) => "SolverError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();

        let message = match &self {
            ApiError::SolverError(_) => {
                tracing::error!(error = %self, "API error occurred");
                "An internal error occurred".to_string()
            }
            _ => {
                tracing::debug!(error = %self, "Client error");
                self.to_string()
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<FormError>() {
            Ok(form_error) => ApiError::InvalidModel(form_error),
            Err(other) => ApiError::SolverError(format!("{:#}", other)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}

/// User-facing text for the HTML flow: input problems versus everything else
pub fn flash_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<FormError>() {
        Some(form_error) => format!(
            "Invalid input data. Check that all numbers are valid. Detail: {}",
            form_error
        ),
        None => format!("An unexpected error occurred: {:#}", error),
    }
}

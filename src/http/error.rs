//! HTTP error handling and response types.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::{FieldErrors, RecordsError};

/// API error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Messages for each rejected input field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: FieldErrors) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Request body or query could not be parsed
    BadRequest(String),
    /// Input parsed but was rejected field by field
    Validation(FieldErrors),
    /// Storage failure
    Database(String),
    /// Internal server error
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("VALIDATION_ERROR", fields.to_string()).with_fields(fields),
            ),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("DATABASE_ERROR", msg),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("INTERNAL_ERROR", msg),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<RecordsError> for AppError {
    fn from(err: RecordsError) -> Self {
        match err {
            RecordsError::Validation(fields) => AppError::Validation(fields),
            RecordsError::NotFound { .. } => AppError::NotFound(err.to_string()),
            RecordsError::Database(_) | RecordsError::Pool(_) | RecordsError::Migration(_) => {
                AppError::Database(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_errors_map_to_status() {
        let cases = [
            (
                RecordsError::Validation(FieldErrors::single("roll_no", "taken")),
                StatusCode::BAD_REQUEST,
            ),
            (RecordsError::not_found("marks", 3), StatusCode::NOT_FOUND),
            (
                RecordsError::Migration("bad schema".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RecordsError::Database(diesel::result::Error::NotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_validation_body_lists_fields() {
        let error = ApiError::new("VALIDATION_ERROR", "name: required")
            .with_fields(FieldErrors::single("name", "This field is required."));
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["fields"]["name"][0], "This field is required.");
        assert!(
            serde_json::to_value(ApiError::new("NOT_FOUND", "gone"))
                .unwrap()
                .get("fields")
                .is_none()
        );
    }
}

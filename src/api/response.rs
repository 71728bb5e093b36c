//! Response types for the payroll engine API.
//!
//! This module defines the error body returned by every endpoint and the
//! mapping from [`EngineError`] to HTTP status codes.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates a 400 response for a bad path or query parameter.
    pub fn bad_parameter(name: &str, value: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::with_details(
                "VALIDATION_ERROR",
                format!("Invalid {}: {}", name, value),
                format!("'{}' must be a UUID", name),
            ),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        let error = match rejection {
            JsonRejection::JsonDataError(err) => {
                let body_text = err.body_text();
                if body_text.contains("missing field") {
                    ApiError::new("VALIDATION_ERROR", body_text)
                } else {
                    ApiError::malformed_json(body_text)
                }
            }
            JsonRejection::JsonSyntaxError(err) => {
                ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
            }
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
            }
            _ => ApiError::malformed_json("Failed to parse request body"),
        };
        ApiErrorResponse {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, error) = match error {
            EngineError::Validation { field, .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::with_details("VALIDATION_ERROR", message, format!("field: {}", field)),
            ),
            EngineError::Conflict { .. } => (
                StatusCode::CONFLICT,
                ApiError::with_details(
                    "DAY_CONFLICT",
                    message,
                    "Each examiner may record at most one evaluation day per date",
                ),
            ),
            EngineError::CalculationInProgress => (
                StatusCode::CONFLICT,
                ApiError::new("CALCULATION_IN_PROGRESS", message),
            ),
            EngineError::NotFound { entity, .. } => (
                StatusCode::NOT_FOUND,
                ApiError::with_details("NOT_FOUND", message, format!("entity: {}", entity)),
            ),
            EngineError::NoValidInput { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("NO_VALID_INPUT", message),
            ),
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
            EngineError::Persistence { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("PERSISTENCE_ERROR", "Storage operation failed", message),
            ),
            EngineError::RemoteComputation { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CALCULATION_ERROR", "Calculation failed", message),
            ),
        };
        ApiErrorResponse { status, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (EngineError::validation("date", "bad"), StatusCode::BAD_REQUEST),
            (
                EngineError::Conflict {
                    examiner_id: "x".to_string(),
                    date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                },
                StatusCode::CONFLICT,
            ),
            (EngineError::CalculationInProgress, StatusCode::CONFLICT),
            (
                EngineError::NotFound {
                    entity: "Calculation",
                    id: "x".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                EngineError::NoValidInput {
                    message: "none".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                EngineError::Persistence {
                    message: "down".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let response: ApiErrorResponse = error.into();
            assert_eq!(response.status, expected);
        }
    }

    #[test]
    fn test_validation_error_names_field() {
        let response: ApiErrorResponse =
            EngineError::validation("staff[0].staff_name", "must be a non-empty name").into();
        assert_eq!(response.error.code, "VALIDATION_ERROR");
        assert_eq!(
            response.error.details.as_deref(),
            Some("field: staff[0].staff_name")
        );
    }
}

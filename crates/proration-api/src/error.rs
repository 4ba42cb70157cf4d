//! Error handling for the proration API
//!
//! Client mistakes, proration failures and internal faults are kept apart so a
//! caller can tell "fix your request" from "the numbers cannot be prorated".

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use proration_engine::AllocationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::InputError;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request failed validation (400 Bad Request)
    #[error(transparent)]
    Validation(#[from] InputError),

    /// The engine could not prorate a valid request (500 Internal Server Error)
    #[error("Failed to calculate proration")]
    Proration(#[from] AllocationError),

    /// Unknown route (404 Not Found)
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Anything else (500 Internal Server Error)
    #[error("Internal server error")]
    Internal {
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ApiError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Proration(_) | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Proration(_) => "PRORATION_ERROR",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Convert to ApiErrorResponse format for JSON serialization
    pub fn to_response(&self, request_id: Option<String>) -> ApiErrorResponse {
        let details = match self {
            ApiError::Validation(input) => input
                .field()
                .map(|field| serde_json::json!({ "field": field })),
            ApiError::Proration(err) => Some(serde_json::json!({
                "reason": err.code(),
                "message": err.to_string(),
            })),
            // Internal faults are logged, never echoed to the caller.
            ApiError::NotFound { .. } | ApiError::Internal { .. } => None,
        };

        ApiErrorResponse {
            code: self.error_code().to_string(),
            error: self.to_string(),
            details,
            request_id,
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create an internal error without a source
    pub fn internal() -> Self {
        Self::Internal { source: None }
    }
}

/// JSON-serializable error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorResponse {
    /// Error code
    pub code: String,

    /// Human-readable error message
    pub error: String,

    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Request ID for tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response(None))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(input) = err.downcast_ref::<InputError>() {
            return ApiError::Validation(input.clone());
        }
        if let Some(allocation) = err.downcast_ref::<AllocationError>() {
            return ApiError::Proration(allocation.clone());
        }
        ApiError::Internal { source: Some(err.into()) }
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request_with_field() {
        let err = ApiError::from(InputError::NoClaims);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = err.to_response(Some("req-1".to_string()));
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert_eq!(body.error, "At least one claim is required");
        assert_eq!(body.details, Some(serde_json::json!({ "field": "claims" })));
        assert_eq!(body.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn proration_failure_is_a_server_error_with_reason() {
        let err = ApiError::from(AllocationError::NoProrationBasis { total_weight: 0.0 });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = err.to_response(None);
        assert_eq!(body.code, "PRORATION_ERROR");
        assert_eq!(body.error, "Failed to calculate proration");
        let details = body.details.unwrap();
        assert_eq!(details["reason"], "NO_PRORATION_BASIS");
        assert!(details["message"].as_str().unwrap().starts_with("no proration basis"));
    }

    #[test]
    fn internal_errors_hide_their_source() {
        let err = ApiError::from(anyhow::anyhow!("slot index 7 out of range"));
        assert_eq!(err.error_code(), "INTERNAL_ERROR");

        let body = err.to_response(None);
        assert_eq!(body.error, "Internal server error");
        assert!(body.details.is_none());
    }

    #[test]
    fn anyhow_keeps_known_error_kinds() {
        let err = ApiError::from(anyhow::Error::new(InputError::NoClaims));
        assert!(matches!(err, ApiError::Validation(InputError::NoClaims)));
    }
}

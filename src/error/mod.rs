//! Unified error handling for Domainly Core

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error")]
    Validation(validator::ValidationErrors),

    #[error("TLD not supported: {0}")]
    UnsupportedTld(String),

    #[error("Pricing not available: {0}")]
    PricingUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body: `success` is always false, `error` is a stable
/// machine-readable code, `errors` carries structured detail (the
/// field -> messages map for validation failures).
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<serde_json::Value>,
}

impl AppError {
    /// Map a validation-errors set to a `field -> [messages]` JSON object.
    fn validation_details(errors: &validator::ValidationErrors) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let messages: Vec<serde_json::Value> = field_errors
                    .iter()
                    .map(|e| {
                        let msg = e
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string());
                        serde_json::Value::String(msg)
                    })
                    .collect();
                (field.to_string(), serde_json::Value::Array(messages))
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message, errors) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None)
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone(), None)
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone(), None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            AppError::Validation(errs) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation",
                "Validation error".to_string(),
                Some(Self::validation_details(errs)),
            ),
            AppError::UnsupportedTld(suffix) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unsupported_tld",
                format!("The TLD {} is not supported", suffix),
                None,
            ),
            AppError::PricingUnavailable(what) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "pricing_unavailable",
                format!("No price is published for {}", what),
                None,
            ),
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "A file storage error occurred".to_string(),
                    None,
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: error_type.to_string(),
            message,
            errors,
        });

        (status, body).into_response()
    }
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn test_error_display() {
        let err = AppError::NotFound("Order not found".to_string());
        assert_eq!(err.to_string(), "Not found: Order not found");
    }

    #[test]
    fn test_error_conversion() {
        let err: AppError = anyhow::anyhow!("Something went wrong").into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_unsupported_tld_maps_to_422() {
        let response = AppError::UnsupportedTld("TLD not supported".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_pricing_unavailable_maps_to_422() {
        let response =
            AppError::PricingUnavailable("No tier for 5 years".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_validation_details_keeps_field_names() {
        let mut errors = ValidationErrors::new();
        let mut e = ValidationError::new("required");
        e.message = Some("The auth letter file is required.".into());
        errors.add("auth_letter", e);

        let details = AppError::validation_details(&errors);
        let messages = details.get("auth_letter").unwrap().as_array().unwrap();
        assert_eq!(
            messages[0].as_str().unwrap(),
            "The auth letter file is required."
        );
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let response =
            AppError::Conflict("Order already has an invoice".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}

//! JWT authentication extractor
//!
//! Handlers receive the calling [`Actor`] explicitly; there is no
//! ambient identity. The extractor validates the Bearer token and
//! rejects the request with a 401 envelope otherwise.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};

use crate::domain::Actor;
use crate::state::AppState;

/// Authentication errors
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No Authorization header present
    MissingToken,
    /// Invalid Authorization header format
    InvalidHeader(String),
    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing authorization token",
            AuthError::InvalidHeader(_) => "Invalid authorization header",
            AuthError::InvalidToken(_) => "Invalid token",
        };

        let body = serde_json::json!({
            "success": false,
            "error": "UNAUTHORIZED",
            "message": message,
        });

        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

/// Extract and validate Bearer token from Authorization header
fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader("Invalid header encoding".to_string()))?;

    if !auth_header.starts_with("Bearer ") {
        return Err(AuthError::InvalidHeader(
            "Authorization header must use Bearer scheme".to_string(),
        ));
    }

    Ok(&auth_header[7..])
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        state
            .jwt_manager
            .verify_access_token(token)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

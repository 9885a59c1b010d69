//! REST API shared utilities (response envelope, pagination)

pub mod health;
pub mod invoice;
pub mod order;
pub mod tld;

use crate::domain::Actor;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Maximum allowed per_page value for pagination
pub(crate) const MAX_PER_PAGE: i64 = 100;

/// Require admin access. Returns Forbidden otherwise.
pub(crate) fn require_admin(actor: &Actor) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

/// Response envelope used by every endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page", deserialize_with = "deserialize_page")]
    pub page: i64,
    #[serde(
        default = "default_per_page",
        deserialize_with = "deserialize_per_page",
        alias = "limit"
    )]
    pub per_page: i64,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationQuery {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_per_page() -> i64 {
    20
}

/// Reject page values less than 1
pub(crate) fn deserialize_page<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    if value < 1 {
        return Err(serde::de::Error::custom(
            "page must be a positive integer (>= 1)",
        ));
    }
    Ok(value)
}

/// Reject per_page values less than 1, clamp to MAX_PER_PAGE
pub(crate) fn deserialize_per_page<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    if value < 1 {
        return Err(serde::de::Error::custom(
            "per_page must be a positive integer (>= 1)",
        ));
    }
    Ok(value.min(MAX_PER_PAGE))
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = (total as f64 / per_page as f64).ceil() as i64;
        Self {
            data,
            pagination: PaginationMeta {
                page,
                per_page,
                total,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let query: PaginationQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 20);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_pagination_offset() {
        let query = PaginationQuery {
            page: 3,
            per_page: 25,
        };
        assert_eq!(query.offset(), 50);
    }

    #[test]
    fn test_per_page_clamped() {
        let query: PaginationQuery = serde_json::from_str(r#"{"per_page": 5000}"#).unwrap();
        assert_eq!(query.per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_page_zero_rejected() {
        let result: std::result::Result<PaginationQuery, _> =
            serde_json::from_str(r#"{"page": 0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_limit_alias() {
        let query: PaginationQuery = serde_json::from_str(r#"{"limit": 5}"#).unwrap();
        assert_eq!(query.per_page, 5);
    }

    #[test]
    fn test_paginated_response_total_pages() {
        let response = PaginatedResponse::new(vec![1, 2, 3], 1, 20, 41);
        assert_eq!(response.pagination.total_pages, 3);
    }

    #[test]
    fn test_api_response_serialization() {
        let response = ApiResponse::ok_with_message("Created", serde_json::json!({"id": 1}));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Created");
        assert_eq!(json["data"]["id"], 1);

        let bare = ApiResponse::message("Deleted");
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("data").is_none());
    }
}

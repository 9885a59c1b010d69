//! TLD and price tier domain models

use super::common::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Sale lifecycle of a TLD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TldStatus {
    #[default]
    Active,
    ComingSoon,
    Disabled,
}

impl std::str::FromStr for TldStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(TldStatus::Active),
            "coming_soon" => Ok(TldStatus::ComingSoon),
            "disabled" => Ok(TldStatus::Disabled),
            _ => Err(format!("Unknown TLD status: {}", s)),
        }
    }
}

impl std::fmt::Display for TldStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TldStatus::Active => write!(f, "active"),
            TldStatus::ComingSoon => write!(f, "coming_soon"),
            TldStatus::Disabled => write!(f, "disabled"),
        }
    }
}

impl sqlx::Type<sqlx::MySql> for TldStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for TldStatus {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for TldStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// Sellable domain suffix (".com", ".com.bd", ...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tld {
    pub id: i64,
    pub name: String,
    pub status: TldStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-year pricing for a TLD. At most one tier per (tld, years).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceTier {
    pub id: i64,
    pub tld_id: i64,
    pub years: i32,
    pub register_price: Money,
    pub renewal_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A TLD together with its tiers, as returned by listing endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TldWithPrices {
    #[serde(flatten)]
    pub tld: Tld,
    pub prices: Vec<PriceTier>,
}

/// The answer of the pricing catalog for (suffix, years)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    pub tld_id: i64,
    pub years: i32,
    pub register_price: Money,
}

/// Input for one price tier (money in minor units)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PriceTierInput {
    #[validate(range(min = 1, max = 10, message = "years must be between 1 and 10"))]
    pub years: i32,
    #[validate(range(min = 0, message = "register_price must not be negative"))]
    pub register_price: i64,
    #[validate(range(min = 0, message = "renewal_price must not be negative"))]
    pub renewal_price: i64,
}

/// Input for creating a TLD with its initial tiers
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTldInput {
    #[validate(custom(function = "validate_tld_name"))]
    pub name: String,
    pub status: Option<TldStatus>,
    #[validate(length(min = 1, message = "at least one price tier is required"))]
    #[validate(nested)]
    pub prices: Vec<PriceTierInput>,
}

/// Input for updating a TLD; a present tier list replaces all tiers
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTldInput {
    #[validate(custom(function = "validate_tld_name"))]
    pub name: Option<String>,
    pub status: Option<TldStatus>,
    #[validate(nested)]
    pub prices: Option<Vec<PriceTierInput>>,
}

/// Normalize a suffix for catalog matching: trimmed and lowercased
pub fn normalize_suffix(suffix: &str) -> String {
    suffix.trim().to_lowercase()
}

/// Extract the TLD suffix from a full domain name: everything after the
/// first dot, normalized and prefixed with a dot. Multi-label suffixes
/// (".co.uk") thus match only if a TLD row with that exact name exists.
pub fn extract_suffix(domain_name: &str) -> Option<String> {
    let (_, rest) = domain_name.split_once('.')?;
    if rest.trim().is_empty() {
        return None;
    }
    Some(format!(".{}", normalize_suffix(rest)))
}

fn validate_tld_name(name: &str) -> Result<(), validator::ValidationError> {
    if TLD_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        let mut e = validator::ValidationError::new("invalid_tld_name");
        e.message = Some("TLD name must look like \".com\" or \".com.bd\"".into());
        Err(e)
    }
}

// Leading dot, lowercase labels, optional further dotted labels
lazy_static::lazy_static! {
    pub static ref TLD_NAME_REGEX: regex::Regex =
        regex::Regex::new(r"^(\.[a-z0-9]+)+$").unwrap();
}

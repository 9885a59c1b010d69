//! Invoice models and the invoice numbering scheme

use super::common::Money;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Paid,
    Cancelled,
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unpaid" => Ok(InvoiceStatus::Unpaid),
            "paid" => Ok(InvoiceStatus::Paid),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            _ => Err(format!("Unknown invoice status: {}", s)),
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Unpaid => write!(f, "unpaid"),
            InvoiceStatus::Paid => write!(f, "paid"),
            InvoiceStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl sqlx::Type<sqlx::MySql> for InvoiceStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for InvoiceStatus {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for InvoiceStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// An invoice issued against exactly one order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub invoice_no: String,
    pub order_id: i64,
    pub customer_id: i64,
    /// Copied from the order at issuance; never recomputed afterwards
    pub amount: Money,
    pub status: InvoiceStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new invoice row
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_no: String,
    pub order_id: i64,
    pub customer_id: i64,
    pub amount: Money,
}

/// Deterministic invoice number: issue date plus the zero-padded order id.
/// Unique because an order carries at most one invoice.
pub fn invoice_number(date: NaiveDate, order_id: i64) -> String {
    format!("INV-{}-{:05}", date.format("%Y%m%d"), order_id)
}

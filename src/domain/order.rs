//! Domain order models and the pure validation stage of order creation

use super::actor::Role;
use super::common::Money;
use super::invoice::Invoice;
use super::tld;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError, ValidationErrors};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Active,
    Rejected,
    Failed,
    Expired,
    Cancelled,
    Refunded,
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "active" => Ok(OrderStatus::Active),
            "rejected" => Ok(OrderStatus::Rejected),
            "failed" => Ok(OrderStatus::Failed),
            "expired" => Ok(OrderStatus::Expired),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Active => "active",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Failed => "failed",
            OrderStatus::Expired => "expired",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        };
        write!(f, "{}", s)
    }
}

impl sqlx::Type<sqlx::MySql> for OrderStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for OrderStatus {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for OrderStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// Whether the order is on behalf of a person or a company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    Individual,
    Company,
}

impl std::str::FromStr for CustomerType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "individual" => Ok(CustomerType::Individual),
            "company" => Ok(CustomerType::Company),
            _ => Err(format!("Unknown customer type: {}", s)),
        }
    }
}

impl std::fmt::Display for CustomerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CustomerType::Individual => write!(f, "individual"),
            CustomerType::Company => write!(f, "company"),
        }
    }
}

impl sqlx::Type<sqlx::MySql> for CustomerType {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for CustomerType {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for CustomerType {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// Kind of supporting document attached to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Nid,
    TradeLicense,
    AuthorizationLetter,
    Other,
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nid" => Ok(DocumentType::Nid),
            "trade_license" => Ok(DocumentType::TradeLicense),
            "authorization_letter" => Ok(DocumentType::AuthorizationLetter),
            "other" => Ok(DocumentType::Other),
            _ => Err(format!("Unknown document type: {}", s)),
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocumentType::Nid => "nid",
            DocumentType::TradeLicense => "trade_license",
            DocumentType::AuthorizationLetter => "authorization_letter",
            DocumentType::Other => "other",
        };
        write!(f, "{}", s)
    }
}

impl sqlx::Type<sqlx::MySql> for DocumentType {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for DocumentType {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for DocumentType {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// A customer's domain-registration order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub domain_name: String,
    pub years: i32,
    /// Registration price copied from the matched tier at creation,
    /// never from client input. Immutable once set.
    pub amount: Money,
    pub customer_type: CustomerType,
    pub status: OrderStatus,
    /// UUID namespace under which this order's documents are stored
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted document metadata for an order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentAttachment {
    pub id: i64,
    pub order_id: i64,
    pub doc_type: DocumentType,
    /// Opaque location handle returned by the file-storage collaborator
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new order row
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: i64,
    pub domain_name: String,
    pub years: i32,
    pub amount: Money,
    pub customer_type: CustomerType,
    pub storage_key: String,
}

/// Fields for inserting a new attachment row
#[derive(Debug, Clone)]
pub struct NewDocumentAttachment {
    pub doc_type: DocumentType,
    pub file_path: String,
}

/// An uploaded file, decoded from the multipart request
#[derive(Clone)]
pub struct DocumentUpload {
    pub doc_type: DocumentType,
    pub file_name: String,
    pub content: Vec<u8>,
}

impl std::fmt::Debug for DocumentUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentUpload")
            .field("doc_type", &self.doc_type)
            .field("file_name", &self.file_name)
            .field("len", &self.content.len())
            .finish()
    }
}

/// Everything a created order returns to the caller
#[derive(Debug, Clone, Serialize)]
pub struct OrderPlacement {
    #[serde(flatten)]
    pub order: Order,
    pub documents: Vec<DocumentAttachment>,
    pub invoice: Invoice,
}

/// An order with its attachments, for listing/fetch endpoints
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithDocuments {
    #[serde(flatten)]
    pub order: Order,
    pub documents: Vec<DocumentAttachment>,
}

/// Raw order-creation request as received from the API layer
#[derive(Debug, Clone, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "domain_name is required"))]
    pub domain_name: String,
    #[validate(range(min = 1, max = 10, message = "years must be between 1 and 10"))]
    pub years: i32,
    #[validate(custom(function = "validate_customer_type"))]
    pub customer_type: String,
    /// Target customer; required for admin actors, ignored for customers
    pub customer_id: Option<i64>,
    pub documents: Vec<DocumentUpload>,
}

/// Outcome of the pure validation stage: a normalized request
#[derive(Debug, Clone)]
pub struct ValidOrderRequest {
    pub domain_name: String,
    /// Normalized suffix for the pricing catalog, e.g. ".com"
    pub suffix: String,
    pub years: i32,
    pub customer_type: CustomerType,
    pub documents: Vec<DocumentUpload>,
}

fn validate_customer_type(value: &str) -> Result<(), ValidationError> {
    if value.parse::<CustomerType>().is_ok() {
        Ok(())
    } else {
        let mut e = ValidationError::new("invalid_customer_type");
        e.message = Some("customer_type must be \"individual\" or \"company\"".into());
        Err(e)
    }
}

fn required(field_label: &str) -> ValidationError {
    let mut e = ValidationError::new("required");
    e.message = Some(format!("The {} is required.", field_label).into());
    e
}

impl CreateOrderRequest {
    fn has_document(&self, doc_type: DocumentType) -> bool {
        self.documents.iter().any(|d| d.doc_type == doc_type)
    }

    /// Pure validation stage. Aggregates every individually checkable rule
    /// violation (scalar constraints, required documents, admin target,
    /// domain format) into one error set, then yields a normalized request.
    /// No I/O; the admin target's existence is checked by the service.
    pub fn validate_for(self, actor_role: Role) -> Result<ValidOrderRequest, ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };

        let customer_type = self.customer_type.parse::<CustomerType>().ok();

        if !self.has_document(DocumentType::Nid) {
            errors.add("nid_file", required("nid file"));
        }
        if !self.has_document(DocumentType::TradeLicense) {
            errors.add("trade_license", required("trade license file"));
        }
        // Authorization letter is mandatory for individuals only
        if customer_type == Some(CustomerType::Individual)
            && !self.has_document(DocumentType::AuthorizationLetter)
        {
            errors.add("auth_letter", required("auth letter file"));
        }

        if actor_role == Role::Admin && self.customer_id.is_none() {
            errors.add("customer_id", required("customer id"));
        }

        let suffix = tld::extract_suffix(&self.domain_name);
        if !self.domain_name.is_empty() && suffix.is_none() {
            let mut e = ValidationError::new("invalid_domain");
            e.message = Some("Invalid domain format".into());
            errors.add("domain_name", e);
        }

        // An invalid customer_type or domain already put an error in the
        // set, so the fallthrough arm always has something to report.
        match (customer_type, suffix) {
            (Some(customer_type), Some(suffix)) if errors.is_empty() => Ok(ValidOrderRequest {
                suffix,
                domain_name: self.domain_name,
                years: self.years,
                customer_type,
                documents: self.documents,
            }),
            _ => Err(errors),
        }
    }
}

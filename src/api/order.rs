//! Domain order API handlers
//!
//! Order creation is a multipart form: scalar fields plus the required
//! document uploads.

use crate::api::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::domain::{Actor, CreateOrderRequest, DocumentType, DocumentUpload, OrderStatus};
use crate::error::{AppError, Result};
use crate::repository::OrderListFilter;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use validator::{ValidationError, ValidationErrors};

/// Per-file upload cap (5 MiB)
const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilterQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub customer_id: Option<i64>,
}

fn doc_type_for_field(field_name: &str) -> Option<DocumentType> {
    match field_name {
        "nid_file" => Some(DocumentType::Nid),
        "trade_license" => Some(DocumentType::TradeLicense),
        "auth_letter" => Some(DocumentType::AuthorizationLetter),
        "other_doc" => Some(DocumentType::Other),
        _ => None,
    }
}

fn file_too_large(field: &'static str) -> AppError {
    let mut errors = ValidationErrors::new();
    let mut e = ValidationError::new("max_size");
    e.message = Some("The file may not be larger than 5 MB.".into());
    errors.add(field, e);
    AppError::Validation(errors)
}

async fn parse_multipart(multipart: &mut Multipart) -> Result<CreateOrderRequest> {
    let mut domain_name = String::new();
    let mut years: i32 = 0;
    let mut customer_type = String::new();
    let mut customer_id: Option<i64> = None;
    let mut documents: Vec<DocumentUpload> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(doc_type) = doc_type_for_field(&name) {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload {}: {}", name, e)))?
                .to_vec();

            if content.is_empty() {
                continue;
            }
            if content.len() > MAX_DOCUMENT_BYTES {
                return Err(match doc_type {
                    DocumentType::Nid => file_too_large("nid_file"),
                    DocumentType::TradeLicense => file_too_large("trade_license"),
                    DocumentType::AuthorizationLetter => file_too_large("auth_letter"),
                    DocumentType::Other => file_too_large("other_doc"),
                });
            }

            documents.push(DocumentUpload {
                doc_type,
                file_name,
                content,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read field {}: {}", name, e)))?;

        match name.as_str() {
            "domain_name" => domain_name = value.trim().to_string(),
            "years" => {
                years = value.trim().parse().map_err(|_| {
                    AppError::BadRequest("years must be an integer".to_string())
                })?;
            }
            "customer_type" => customer_type = value.trim().to_string(),
            "customer_id" => {
                customer_id = Some(value.trim().parse().map_err(|_| {
                    AppError::BadRequest("customer_id must be an integer".to_string())
                })?);
            }
            _ => {}
        }
    }

    Ok(CreateOrderRequest {
        domain_name,
        years,
        customer_type,
        customer_id,
        documents,
    })
}

/// Create an order: customers order for themselves, admins on behalf of
/// a customer via `customer_id`.
pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let request = parse_multipart(&mut multipart).await?;
    let placement = state.order_service.create(&actor, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Order placed successfully",
            placement,
        )),
    ))
}

/// List orders: customers see their own, admins see everyone's
pub async fn list(
    State(state): State<AppState>,
    actor: Actor,
    Query(pagination): Query<PaginationQuery>,
    Query(query): Query<OrderFilterQuery>,
) -> Result<impl IntoResponse> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let filter = OrderListFilter {
        customer_id: query.customer_id,
        status,
        search: query.search,
    };

    let (orders, total) = state
        .order_service
        .list(&actor, filter, pagination.offset(), pagination.per_page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        orders,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get one order with its documents
pub async fn get(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let order = state.order_service.get(&actor, id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// Download one of an order's attached documents
pub async fn download_document(
    State(state): State<AppState>,
    actor: Actor,
    Path((id, document_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse> {
    let (attachment, bytes) = state
        .order_service
        .document(&actor, id, document_id)
        .await?;

    let file_name = attachment
        .file_path
        .rsplit('/')
        .next()
        .unwrap_or("document")
        .to_string();
    let disposition = format!("attachment; filename=\"{}\"", file_name);
    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Delete an order (owner or admin; refused once invoiced)
pub async fn delete(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.order_service.delete(&actor, id).await?;
    Ok(Json(ApiResponse::message("Order deleted successfully")))
}

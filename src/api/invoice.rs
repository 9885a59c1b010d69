//! Invoice API handlers

use crate::api::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::domain::{Actor, InvoiceStatus};
use crate::error::{AppError, Result};
use crate::repository::InvoiceListFilter;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceFilterQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub customer_id: Option<i64>,
}

fn parse_status(status: Option<&str>) -> Result<Option<InvoiceStatus>> {
    status
        .map(str::parse::<InvoiceStatus>)
        .transpose()
        .map_err(AppError::BadRequest)
}

/// List all invoices (admin), filterable by customer, status and
/// invoice number search
pub async fn list(
    State(state): State<AppState>,
    actor: Actor,
    Query(pagination): Query<PaginationQuery>,
    Query(query): Query<InvoiceFilterQuery>,
) -> Result<impl IntoResponse> {
    let filter = InvoiceListFilter {
        customer_id: query.customer_id,
        status: parse_status(query.status.as_deref())?,
        search: query.search,
    };

    let (invoices, total) = state
        .invoice_service
        .list(&actor, &filter, pagination.offset(), pagination.per_page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        invoices,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// The calling customer's own invoices
pub async fn list_own(
    State(state): State<AppState>,
    actor: Actor,
    Query(pagination): Query<PaginationQuery>,
    Query(query): Query<InvoiceFilterQuery>,
) -> Result<impl IntoResponse> {
    let status = parse_status(query.status.as_deref())?;
    let (invoices, total) = state
        .invoice_service
        .list_own(
            &actor,
            status,
            query.search,
            pagination.offset(),
            pagination.per_page,
        )
        .await?;

    Ok(Json(PaginatedResponse::new(
        invoices,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get one invoice
pub async fn get(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let invoice = state.invoice_service.get(&actor, id).await?;
    Ok(Json(ApiResponse::ok(invoice)))
}

/// Mark an invoice paid (admin)
pub async fn mark_paid(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let invoice = state.invoice_service.mark_paid(&actor, id).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "Invoice marked as paid",
        invoice,
    )))
}

/// Cancel an invoice (admin)
pub async fn cancel(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let invoice = state.invoice_service.mark_cancelled(&actor, id).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "Invoice cancelled",
        invoice,
    )))
}

/// Download the printable invoice document
pub async fn download(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let (invoice, html) = state.invoice_service.render_document(&actor, id).await?;

    let disposition = format!("inline; filename=\"{}.html\"", invoice.invoice_no);
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        html,
    ))
}

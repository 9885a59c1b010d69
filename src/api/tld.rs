//! TLD catalog API handlers

use crate::api::{require_admin, ApiResponse, PaginatedResponse, PaginationQuery};
use crate::domain::{Actor, CreateTldInput, UpdateTldInput};
use crate::error::Result;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// List TLDs with their price tiers (public catalog)
pub async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let (tlds, total) = state
        .pricing_service
        .list_tlds(pagination.offset(), pagination.per_page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        tlds,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get one TLD with its price tiers
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<impl IntoResponse> {
    let tld = state.pricing_service.get_tld(id).await?;
    Ok(Json(ApiResponse::ok(tld)))
}

/// Create a TLD (admin)
pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<CreateTldInput>,
) -> Result<impl IntoResponse> {
    require_admin(&actor)?;
    let tld = state.pricing_service.create_tld(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message("TLD created successfully", tld)),
    ))
}

/// Update a TLD's status or price tiers (admin)
pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTldInput>,
) -> Result<impl IntoResponse> {
    require_admin(&actor)?;
    let tld = state.pricing_service.update_tld(id, input).await?;
    Ok(Json(ApiResponse::ok_with_message(
        "TLD updated successfully",
        tld,
    )))
}

/// Delete a TLD (admin)
pub async fn delete(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    require_admin(&actor)?;
    state.pricing_service.delete_tld(id).await?;
    Ok(Json(ApiResponse::message("TLD deleted successfully")))
}

use super::common::success_response;
use crate::{
    auth::{permissions::PURCHASING, AuthRouterExt, PermissionTable},
    entities::quotation,
    errors::{ApiError, ErrorResponse},
    handlers::AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuotationListQuery {
    pub rfq_id: Uuid,
}

/// Get a quotation
#[utoipa::path(
    get,
    path = "/api/v1/quotation/{id}",
    params(("id" = Uuid, Path, description = "Quotation ID")),
    responses(
        (status = 200, description = "Quotation", body = quotation::Model),
        (status = 404, description = "Quotation not found", body = ErrorResponse)
    ),
    tag = "quotations"
)]
pub async fn get_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    Ok(success_response(state.services.quotations.get(id).await?))
}

/// Quotations received for an RFQ, cheapest first
#[utoipa::path(
    get,
    path = "/api/v1/quotation",
    params(QuotationListQuery),
    responses(
        (status = 200, description = "Quotations", body = [quotation::Model]),
        (status = 404, description = "RFQ not found", body = ErrorResponse)
    ),
    tag = "quotations"
)]
pub async fn list_quotations(
    State(state): State<AppState>,
    Query(query): Query<QuotationListQuery>,
) -> Result<Response, ApiError> {
    Ok(success_response(
        state.services.quotations.list_by_rfq(query.rfq_id).await?,
    ))
}

pub fn quotation_routes(permissions: Arc<PermissionTable>) -> Router<AppState> {
    Router::new()
        .route("/", get(list_quotations))
        .route("/{id}", get(get_quotation))
        .with_categories(permissions, &[PURCHASING])
}

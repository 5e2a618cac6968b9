//! CSV exports. Every file starts with a UTF-8 BOM so spreadsheet tools pick
//! up the Thai labels correctly.

use super::common::csv_response;
use crate::{
    auth::{permissions::REPORT, AuthRouterExt, AuthUser, PermissionTable},
    errors::{ApiError, ErrorResponse},
    handlers::AppState,
};
use axum::{extract::State, response::Response, routing::get, Router};
use chrono::Utc;
use std::sync::Arc;

fn dated(name: &str) -> String {
    format!("{}-{}.csv", name, Utc::now().format("%Y%m%d"))
}

/// Items visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/reports/items.csv",
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv"),
        (status = 403, description = "Report access not granted", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn export_items(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    let visible = state.permissions.visible_categories(&user.role);
    let body = state.services.reports.items_csv(visible).await?;
    Ok(csv_response(&dated("items"), body))
}

/// All purchase requisitions
#[utoipa::path(
    get,
    path = "/api/v1/reports/requisitions.csv",
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv"),
        (status = 403, description = "Report access not granted", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn export_requisitions(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state.services.reports.requisitions_csv().await?;
    Ok(csv_response(&dated("requisitions"), body))
}

/// All requests for quotation
#[utoipa::path(
    get,
    path = "/api/v1/reports/rfqs.csv",
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv"),
        (status = 403, description = "Report access not granted", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn export_rfqs(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state.services.reports.rfqs_csv().await?;
    Ok(csv_response(&dated("rfqs"), body))
}

/// All purchase orders with totals
#[utoipa::path(
    get,
    path = "/api/v1/reports/purchase-orders.csv",
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv"),
        (status = 403, description = "Report access not granted", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn export_purchase_orders(
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let body = state.services.reports.purchase_orders_csv().await?;
    Ok(csv_response(&dated("purchase-orders"), body))
}

/// All goods receipts
#[utoipa::path(
    get,
    path = "/api/v1/reports/goods-receipts.csv",
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv"),
        (status = 403, description = "Report access not granted", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn export_goods_receipts(
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let body = state.services.reports.goods_receipts_csv().await?;
    Ok(csv_response(&dated("goods-receipts"), body))
}

/// Stock movement ledger
#[utoipa::path(
    get,
    path = "/api/v1/reports/stock-movements.csv",
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv"),
        (status = 403, description = "Report access not granted", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn export_stock_movements(
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let body = state.services.reports.stock_movements_csv().await?;
    Ok(csv_response(&dated("stock-movements"), body))
}

pub fn report_routes(permissions: Arc<PermissionTable>) -> Router<AppState> {
    Router::new()
        .route("/items.csv", get(export_items))
        .route("/requisitions.csv", get(export_requisitions))
        .route("/rfqs.csv", get(export_rfqs))
        .route("/purchase-orders.csv", get(export_purchase_orders))
        .route("/goods-receipts.csv", get(export_goods_receipts))
        .route("/stock-movements.csv", get(export_stock_movements))
        .with_categories(permissions, &[REPORT])
}

use super::common::{
    created_response, default_page, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    auth::{permissions::PURCHASING, AuthRouterExt, AuthUser, PermissionTable},
    entities::goods_receipt,
    errors::{ApiError, ErrorResponse, ServiceError},
    handlers::AppState,
    services::goods_receipts::{GoodsReceiptView, PostGoodsReceiptInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

/// Store keepers of any category receive deliveries alongside purchasing.
const RECEIVER_TAGS: &[&str] = &[
    "medicine",
    "medsup",
    "equipment",
    "meddevice",
    "general",
    PURCHASING,
];

/// Purchasing may receive anything it ordered; store keepers only receive
/// items in their own categories. Items missing from the catalog are left for
/// the receipt itself to reject.
async fn authorize_lines(
    state: &AppState,
    user: &AuthUser,
    payload: &PostGoodsReceiptInput,
) -> Result<(), ServiceError> {
    if state
        .permissions
        .check_categories(Some(&user.role), &[PURCHASING])
        .is_ok()
    {
        return Ok(());
    }
    for line in &payload.lines {
        match state.services.catalog.item_category(line.item_id).await {
            Ok(category) => state.permissions.check_category(&user.role, category)?,
            Err(ServiceError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GoodsReceiptListQuery {
    /// Only receipts against this purchase order
    pub po_id: Option<Uuid>,
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
}

/// Post a goods receipt against an approved purchase order
#[utoipa::path(
    post,
    path = "/api/v1/gr",
    request_body = PostGoodsReceiptInput,
    responses(
        (status = 201, description = "Goods receipt posted", body = GoodsReceiptView),
        (status = 400, description = "Order not approved, unknown item or over-receipt", body = ErrorResponse),
        (status = 403, description = "Item category not granted", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse),
        (status = 409, description = "Order lines changed concurrently", body = ErrorResponse)
    ),
    tag = "goods_receipts"
)]
pub async fn post_goods_receipt(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PostGoodsReceiptInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    authorize_lines(&state, &user, &payload).await?;
    let gr = state
        .services
        .goods_receipts
        .post(payload, &user.user_id)
        .await?;
    info!(
        gr_no = %gr.goods_receipt.gr_no,
        po_completed = gr.po_completed,
        "Goods receipt posted"
    );
    Ok(created_response(gr))
}

/// List goods receipts
#[utoipa::path(
    get,
    path = "/api/v1/gr",
    params(GoodsReceiptListQuery),
    responses(
        (status = 200, description = "Goods receipts", body = PaginatedResponse<goods_receipt::Model>)
    ),
    tag = "goods_receipts"
)]
pub async fn list_goods_receipts(
    State(state): State<AppState>,
    Query(query): Query<GoodsReceiptListQuery>,
) -> Result<Response, ApiError> {
    let (page, per_page) = PaginationParams {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve(&state.config);
    let (rows, total) = state
        .services
        .goods_receipts
        .list(query.po_id, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        rows, page, per_page, total,
    )))
}

/// Get a goods receipt with its lines
#[utoipa::path(
    get,
    path = "/api/v1/gr/{id}",
    params(("id" = Uuid, Path, description = "Goods receipt ID")),
    responses(
        (status = 200, description = "Goods receipt", body = GoodsReceiptView),
        (status = 404, description = "Goods receipt not found", body = ErrorResponse)
    ),
    tag = "goods_receipts"
)]
pub async fn get_goods_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    Ok(success_response(
        state.services.goods_receipts.get(id).await?,
    ))
}

pub fn goods_receipt_routes(permissions: Arc<PermissionTable>) -> Router<AppState> {
    Router::new()
        .route("/", post(post_goods_receipt).get(list_goods_receipts))
        .route("/{id}", get(get_goods_receipt))
        .with_categories(permissions, RECEIVER_TAGS)
}

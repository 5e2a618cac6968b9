use super::common::{
    created_response, default_page, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    auth::{
        permissions::{APPROVE, PURCHASING},
        AuthRouterExt, AuthUser, PermissionTable,
    },
    entities::{
        po_attachment,
        purchase_order::{self, PoStatus},
    },
    errors::{ApiError, ErrorResponse},
    handlers::AppState,
    services::purchase_orders::{
        AddAttachmentInput, CreatePurchaseOrderInput, LinePricingInput, PurchaseOrderView,
        ReceiptStatus,
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PurchaseOrderListQuery {
    pub status: Option<PoStatus>,
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
}

/// Replacement prices for the lines of a draft order
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLinePricingRequest {
    pub lines: Vec<LinePricingInput>,
}

/// Create a draft purchase order from a quotation
#[utoipa::path(
    post,
    path = "/api/v1/po",
    request_body = CreatePurchaseOrderInput,
    responses(
        (status = 201, description = "Purchase order created", body = PurchaseOrderView),
        (status = 400, description = "RFQ cannot be awarded", body = ErrorResponse),
        (status = 404, description = "Quotation not found", body = ErrorResponse)
    ),
    tag = "purchase_orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePurchaseOrderInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let po = state
        .services
        .purchase_orders
        .create_from_quotation(payload, &user.user_id)
        .await?;
    info!(po_no = %po.purchase_order.po_no, "Purchase order created");
    Ok(created_response(po))
}

/// List purchase orders
#[utoipa::path(
    get,
    path = "/api/v1/po",
    params(PurchaseOrderListQuery),
    responses(
        (status = 200, description = "Purchase orders", body = PaginatedResponse<purchase_order::Model>)
    ),
    tag = "purchase_orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(query): Query<PurchaseOrderListQuery>,
) -> Result<Response, ApiError> {
    let (page, per_page) = PaginationParams {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve(&state.config);
    let (rows, total) = state
        .services
        .purchase_orders
        .list(query.status, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        rows, page, per_page, total,
    )))
}

/// Get a purchase order with lines and attachments
#[utoipa::path(
    get,
    path = "/api/v1/po/{id}",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order", body = PurchaseOrderView),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    tag = "purchase_orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    Ok(success_response(
        state.services.purchase_orders.get(id).await?,
    ))
}

/// Reprice the lines of a draft purchase order
#[utoipa::path(
    put,
    path = "/api/v1/po/{id}/lines",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    request_body = UpdateLinePricingRequest,
    responses(
        (status = 200, description = "Lines repriced", body = PurchaseOrderView),
        (status = 400, description = "Order is not a draft or pricing is invalid", body = ErrorResponse),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    tag = "purchase_orders"
)]
pub async fn update_line_pricing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLinePricingRequest>,
) -> Result<Response, ApiError> {
    if payload.lines.is_empty() {
        return Err(ApiError::ValidationError(
            "At least one line is required".to_string(),
        ));
    }
    let po = state
        .services
        .purchase_orders
        .update_line_pricing(id, payload.lines, &user.user_id)
        .await?;
    Ok(success_response(po))
}

/// Submit a draft purchase order for approval
#[utoipa::path(
    post,
    path = "/api/v1/po/{id}/submit",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order submitted", body = PurchaseOrderView),
        (status = 400, description = "Transition not allowed", body = ErrorResponse)
    ),
    tag = "purchase_orders"
)]
pub async fn submit_purchase_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let po = state
        .services
        .purchase_orders
        .submit(id, &user.user_id)
        .await?;
    Ok(success_response(po))
}

/// Approve a submitted purchase order
#[utoipa::path(
    post,
    path = "/api/v1/po/{id}/approve",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order approved", body = PurchaseOrderView),
        (status = 400, description = "Transition not allowed", body = ErrorResponse),
        (status = 409, description = "Status changed concurrently", body = ErrorResponse)
    ),
    tag = "purchase_orders"
)]
pub async fn approve_purchase_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let po = state
        .services
        .purchase_orders
        .approve(id, &user.user_id)
        .await?;
    info!(po_no = %po.purchase_order.po_no, approver = %user.user_id, "Purchase order approved");
    Ok(success_response(po))
}

/// Cancel a purchase order that has not been received against
#[utoipa::path(
    post,
    path = "/api/v1/po/{id}/cancel",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order canceled", body = PurchaseOrderView),
        (status = 400, description = "Transition not allowed", body = ErrorResponse)
    ),
    tag = "purchase_orders"
)]
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let po = state
        .services
        .purchase_orders
        .cancel(id, &user.user_id)
        .await?;
    Ok(success_response(po))
}

/// Attach a document reference to a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/po/{id}/attachments",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    request_body = AddAttachmentInput,
    responses(
        (status = 201, description = "Attachment added", body = po_attachment::Model),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    tag = "purchase_orders"
)]
pub async fn add_attachment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddAttachmentInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let attachment = state
        .services
        .purchase_orders
        .add_attachment(id, payload, &user.user_id)
        .await?;
    Ok(created_response(attachment))
}

/// List attachments of a purchase order
#[utoipa::path(
    get,
    path = "/api/v1/po/{id}/attachments",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Attachments", body = [po_attachment::Model]),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    tag = "purchase_orders"
)]
pub async fn list_attachments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    Ok(success_response(
        state.services.purchase_orders.list_attachments(id).await?,
    ))
}

/// Per-line receipt progress of a purchase order
#[utoipa::path(
    get,
    path = "/api/v1/po/{id}/receipt-status",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Receipt status", body = ReceiptStatus),
        (status = 404, description = "Purchase order not found", body = ErrorResponse)
    ),
    tag = "purchase_orders"
)]
pub async fn receipt_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    Ok(success_response(
        state.services.purchase_orders.receipt_status(id).await?,
    ))
}

pub fn purchase_order_routes(permissions: Arc<PermissionTable>) -> Router<AppState> {
    let approvals = Router::new()
        .route("/{id}/approve", post(approve_purchase_order))
        .with_categories(permissions.clone(), &[APPROVE]);

    Router::new()
        .route("/", post(create_purchase_order).get(list_purchase_orders))
        .route("/{id}", get(get_purchase_order))
        .route("/{id}/lines", put(update_line_pricing))
        .route("/{id}/submit", post(submit_purchase_order))
        .route("/{id}/cancel", post(cancel_purchase_order))
        .route("/{id}/attachments", get(list_attachments).post(add_attachment))
        .route("/{id}/receipt-status", get(receipt_status))
        .with_categories(permissions, &[PURCHASING])
        .merge(approvals)
}

use super::common::{
    created_response, default_page, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    auth::{permissions::PURCHASING, AuthRouterExt, AuthUser, PermissionTable},
    entities::{
        quotation,
        rfq::{self, RfqStatus},
    },
    errors::{ApiError, ErrorResponse},
    handlers::AppState,
    services::{quotations::RecordQuotationInput, rfqs::RfqView},
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
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRfqRequest {
    /// Approved requisition to quote for
    pub pr_id: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RfqListQuery {
    pub status: Option<RfqStatus>,
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
}

/// Create an RFQ from an approved requisition
#[utoipa::path(
    post,
    path = "/api/v1/rfq",
    request_body = CreateRfqRequest,
    responses(
        (status = 201, description = "RFQ created", body = RfqView),
        (status = 400, description = "Requisition is not approved", body = ErrorResponse),
        (status = 404, description = "Requisition not found", body = ErrorResponse),
        (status = 409, description = "Requisition already processed concurrently", body = ErrorResponse)
    ),
    tag = "rfqs"
)]
pub async fn create_rfq(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateRfqRequest>,
) -> Result<Response, ApiError> {
    let rfq = state
        .services
        .rfqs
        .create_from_requisition(payload.pr_id, &user.user_id)
        .await?;
    info!(rfq_no = %rfq.rfq.rfq_no, "RFQ created");
    Ok(created_response(rfq))
}

/// List RFQs
#[utoipa::path(
    get,
    path = "/api/v1/rfq",
    params(RfqListQuery),
    responses((status = 200, description = "RFQs", body = PaginatedResponse<rfq::Model>)),
    tag = "rfqs"
)]
pub async fn list_rfqs(
    State(state): State<AppState>,
    Query(query): Query<RfqListQuery>,
) -> Result<Response, ApiError> {
    let (page, per_page) = PaginationParams {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve(&state.config);
    let (rows, total) = state
        .services
        .rfqs
        .list(query.status, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        rows, page, per_page, total,
    )))
}

/// Get an RFQ with its lines and quotations
#[utoipa::path(
    get,
    path = "/api/v1/rfq/{id}",
    params(("id" = Uuid, Path, description = "RFQ ID")),
    responses(
        (status = 200, description = "RFQ", body = RfqView),
        (status = 404, description = "RFQ not found", body = ErrorResponse)
    ),
    tag = "rfqs"
)]
pub async fn get_rfq(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    Ok(success_response(state.services.rfqs.get(id).await?))
}

/// Open an RFQ for quotations
#[utoipa::path(
    post,
    path = "/api/v1/rfq/{id}/open",
    params(("id" = Uuid, Path, description = "RFQ ID")),
    responses(
        (status = 200, description = "RFQ opened", body = RfqView),
        (status = 400, description = "Transition not allowed", body = ErrorResponse),
        (status = 404, description = "RFQ not found", body = ErrorResponse)
    ),
    tag = "rfqs"
)]
pub async fn open_rfq(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let rfq = state.services.rfqs.open(id, &user.user_id).await?;
    Ok(success_response(rfq))
}

/// Stop accepting quotations
#[utoipa::path(
    post,
    path = "/api/v1/rfq/{id}/close",
    params(("id" = Uuid, Path, description = "RFQ ID")),
    responses(
        (status = 200, description = "RFQ closed", body = RfqView),
        (status = 400, description = "Transition not allowed", body = ErrorResponse),
        (status = 404, description = "RFQ not found", body = ErrorResponse)
    ),
    tag = "rfqs"
)]
pub async fn close_rfq(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let rfq = state.services.rfqs.close(id, &user.user_id).await?;
    Ok(success_response(rfq))
}

/// Cancel an RFQ
#[utoipa::path(
    post,
    path = "/api/v1/rfq/{id}/cancel",
    params(("id" = Uuid, Path, description = "RFQ ID")),
    responses(
        (status = 200, description = "RFQ canceled", body = RfqView),
        (status = 400, description = "Transition not allowed", body = ErrorResponse),
        (status = 404, description = "RFQ not found", body = ErrorResponse)
    ),
    tag = "rfqs"
)]
pub async fn cancel_rfq(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let rfq = state.services.rfqs.cancel(id, &user.user_id).await?;
    Ok(success_response(rfq))
}

/// Record a supplier quotation against an RFQ
#[utoipa::path(
    post,
    path = "/api/v1/rfq/{id}/quotations",
    params(("id" = Uuid, Path, description = "RFQ ID")),
    request_body = RecordQuotationInput,
    responses(
        (status = 201, description = "Quotation recorded", body = quotation::Model),
        (status = 400, description = "RFQ no longer accepts quotations", body = ErrorResponse),
        (status = 404, description = "RFQ not found", body = ErrorResponse)
    ),
    tag = "rfqs"
)]
pub async fn record_quotation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordQuotationInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let recorded = state
        .services
        .quotations
        .record(id, payload, &user.user_id)
        .await?;
    Ok(created_response(recorded))
}

/// Quotations of an RFQ, cheapest first
#[utoipa::path(
    get,
    path = "/api/v1/rfq/{id}/quotations",
    params(("id" = Uuid, Path, description = "RFQ ID")),
    responses(
        (status = 200, description = "Quotations", body = [quotation::Model]),
        (status = 404, description = "RFQ not found", body = ErrorResponse)
    ),
    tag = "rfqs"
)]
pub async fn list_rfq_quotations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    Ok(success_response(
        state.services.quotations.list_by_rfq(id).await?,
    ))
}

pub fn rfq_routes(permissions: Arc<PermissionTable>) -> Router<AppState> {
    Router::new()
        .route("/", post(create_rfq).get(list_rfqs))
        .route("/{id}", get(get_rfq))
        .route("/{id}/open", post(open_rfq))
        .route("/{id}/close", post(close_rfq))
        .route("/{id}/cancel", post(cancel_rfq))
        .route(
            "/{id}/quotations",
            post(record_quotation).get(list_rfq_quotations),
        )
        .with_categories(permissions, &[PURCHASING])
}

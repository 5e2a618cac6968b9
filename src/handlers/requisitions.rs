use super::common::{
    created_response, default_page, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::{
    auth::{
        permissions::{APPROVE, PURCHASING},
        AuthRouterExt, AuthUser, PermissionTable,
    },
    entities::purchase_requisition::{self, PrStatus},
    errors::{ApiError, ErrorResponse},
    handlers::AppState,
    services::requisitions::{CreateRequisitionInput, DecisionInput, RequisitionView},
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

/// Anyone who handles stock may raise a requisition.
const REQUESTER_TAGS: &[&str] = &[
    "medicine",
    "medsup",
    "equipment",
    "meddevice",
    "general",
    PURCHASING,
    APPROVE,
];

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequisitionListQuery {
    pub status: Option<PrStatus>,
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
}

/// Create a purchase requisition
#[utoipa::path(
    post,
    path = "/api/v1/pr",
    request_body = CreateRequisitionInput,
    responses(
        (status = 201, description = "Requisition created", body = RequisitionView),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "requisitions"
)]
pub async fn create_requisition(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateRequisitionInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    let pr = state
        .services
        .requisitions
        .create(&user.user_id, payload)
        .await?;
    info!(pr_no = %pr.requisition.pr_no, "Purchase requisition created");
    Ok(created_response(pr))
}

/// List purchase requisitions
#[utoipa::path(
    get,
    path = "/api/v1/pr",
    params(RequisitionListQuery),
    responses(
        (status = 200, description = "Requisitions", body = PaginatedResponse<purchase_requisition::Model>)
    ),
    tag = "requisitions"
)]
pub async fn list_requisitions(
    State(state): State<AppState>,
    Query(query): Query<RequisitionListQuery>,
) -> Result<Response, ApiError> {
    let (page, per_page) = PaginationParams {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve(&state.config);
    let (rows, total) = state
        .services
        .requisitions
        .list(query.status, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        rows, page, per_page, total,
    )))
}

/// Get a purchase requisition with its lines
#[utoipa::path(
    get,
    path = "/api/v1/pr/{id}",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    responses(
        (status = 200, description = "Requisition", body = RequisitionView),
        (status = 404, description = "Requisition not found", body = ErrorResponse)
    ),
    tag = "requisitions"
)]
pub async fn get_requisition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let pr = state.services.requisitions.get(id).await?;
    Ok(success_response(pr))
}

/// Submit a draft requisition
#[utoipa::path(
    post,
    path = "/api/v1/pr/{id}/submit",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    responses(
        (status = 200, description = "Requisition submitted", body = RequisitionView),
        (status = 400, description = "Transition not allowed", body = ErrorResponse)
    ),
    tag = "requisitions"
)]
pub async fn submit_requisition(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let pr = state
        .services
        .requisitions
        .submit(id, &user.user_id)
        .await?;
    Ok(success_response(pr))
}

/// Cancel a draft or submitted requisition
#[utoipa::path(
    post,
    path = "/api/v1/pr/{id}/cancel",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    responses(
        (status = 200, description = "Requisition canceled", body = RequisitionView),
        (status = 400, description = "Transition not allowed", body = ErrorResponse)
    ),
    tag = "requisitions"
)]
pub async fn cancel_requisition(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let pr = state
        .services
        .requisitions
        .cancel(id, &user.user_id)
        .await?;
    Ok(success_response(pr))
}

/// Approve a submitted requisition
#[utoipa::path(
    post,
    path = "/api/v1/pr/{id}/approve",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    request_body = DecisionInput,
    responses(
        (status = 200, description = "Requisition approved", body = RequisitionView),
        (status = 400, description = "Requisition is not submitted", body = ErrorResponse),
        (status = 404, description = "Requisition not found", body = ErrorResponse),
        (status = 409, description = "Status changed concurrently", body = ErrorResponse)
    ),
    tag = "requisitions"
)]
pub async fn approve_requisition(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<DecisionInput>>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    validate_input(&payload)?;
    let pr = state
        .services
        .requisitions
        .approve(id, &user.user_id, payload)
        .await?;
    info!(pr_no = %pr.requisition.pr_no, approver = %user.user_id, "Purchase requisition approved");
    Ok(success_response(pr))
}

/// Reject a submitted requisition
#[utoipa::path(
    post,
    path = "/api/v1/pr/{id}/reject",
    params(("id" = Uuid, Path, description = "Requisition ID")),
    request_body = DecisionInput,
    responses(
        (status = 200, description = "Requisition rejected", body = RequisitionView),
        (status = 400, description = "Requisition is not submitted", body = ErrorResponse),
        (status = 404, description = "Requisition not found", body = ErrorResponse)
    ),
    tag = "requisitions"
)]
pub async fn reject_requisition(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<DecisionInput>>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    validate_input(&payload)?;
    let pr = state
        .services
        .requisitions
        .reject(id, &user.user_id, payload)
        .await?;
    Ok(success_response(pr))
}

pub fn requisition_routes(permissions: Arc<PermissionTable>) -> Router<AppState> {
    let decisions = Router::new()
        .route("/{id}/approve", post(approve_requisition))
        .route("/{id}/reject", post(reject_requisition))
        .with_categories(permissions.clone(), &[APPROVE]);

    Router::new()
        .route("/", post(create_requisition).get(list_requisitions))
        .route("/{id}", get(get_requisition))
        .route("/{id}/submit", post(submit_requisition))
        .route("/{id}/cancel", post(cancel_requisition))
        .with_categories(permissions, REQUESTER_TAGS)
        .merge(decisions)
}

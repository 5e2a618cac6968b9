use super::common::{
    created_response, default_page, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    auth::{permissions::ANY_ITEM_CATEGORY, AuthRouterExt, AuthUser, PermissionTable},
    entities::{item::ItemCategory, stock_movement},
    errors::{ApiError, ErrorResponse},
    handlers::AppState,
    services::catalog::{
        CreateItemInput, ItemFilter, ItemView, StockMovementInput, UpdateItemInput,
    },
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

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemListQuery {
    pub category: Option<ItemCategory>,
    /// Case-insensitive name search
    pub search: Option<String>,
    /// Only items below their minimum quantity
    #[serde(default)]
    pub low_stock: bool,
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
}

/// Loads the item's category and checks the caller may see it.
async fn authorize_item(state: &AppState, user: &AuthUser, id: Uuid) -> Result<(), ApiError> {
    let category = state.services.catalog.item_category(id).await?;
    state.permissions.check_category(&user.role, category)?;
    Ok(())
}

/// List items visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(ItemListQuery),
    responses(
        (status = 200, description = "Items", body = PaginatedResponse<ItemView>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "No item category granted", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ItemListQuery>,
) -> Result<Response, ApiError> {
    let (page, per_page) = PaginationParams {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve(&state.config);

    if let Some(category) = query.category {
        state.permissions.check_category(&user.role, category)?;
    }
    let filter = ItemFilter {
        category: query.category,
        search: query.search,
        low_stock: query.low_stock,
        visible_categories: state.permissions.visible_categories(&user.role),
    };

    let (items, total) = state
        .services
        .catalog
        .list_items(filter, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        items, page, per_page, total,
    )))
}

/// Create an item with its category detail
#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemInput,
    responses(
        (status = 201, description = "Item created", body = ItemView),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Category not granted", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateItemInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    state
        .permissions
        .check_category(&user.role, payload.detail.category())?;

    let item = state
        .services
        .catalog
        .create_item(payload, &user.user_id)
        .await?;
    info!(item_id = %item.item.id, "Item created");
    Ok(created_response(item))
}

/// Get an item with its detail
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item", body = ItemView),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    authorize_item(&state, &user, id).await?;
    let item = state.services.catalog.get_item(id).await?;
    Ok(success_response(item))
}

/// Update base fields and/or the detail of an item
#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = UpdateItemInput,
    responses(
        (status = 200, description = "Item updated", body = ItemView),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateItemInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    authorize_item(&state, &user, id).await?;
    let item = state.services.catalog.update_item(id, payload).await?;
    Ok(success_response(item))
}

/// Soft-delete an item
#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    authorize_item(&state, &user, id).await?;
    state.services.catalog.delete_item(id, &user.user_id).await?;
    Ok(no_content_response())
}

/// Receive stock into an item
#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/stock-in",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = StockMovementInput,
    responses(
        (status = 201, description = "Movement recorded", body = stock_movement::Model),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn stock_in(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockMovementInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    authorize_item(&state, &user, id).await?;
    let movement = state
        .services
        .catalog
        .stock_in(id, payload, &user.user_id)
        .await?;
    Ok(created_response(movement))
}

/// Issue stock out of an item
#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/stock-out",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = StockMovementInput,
    responses(
        (status = 201, description = "Movement recorded", body = stock_movement::Model),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 422, description = "Not enough stock on hand", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn stock_out(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockMovementInput>,
) -> Result<Response, ApiError> {
    validate_input(&payload)?;
    authorize_item(&state, &user, id).await?;
    let movement = state
        .services
        .catalog
        .stock_out(id, payload, &user.user_id)
        .await?;
    Ok(created_response(movement))
}

/// Stock movement history of an item, newest first
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}/movements",
    params(("id" = Uuid, Path, description = "Item ID"), PaginationParams),
    responses(
        (status = 200, description = "Movements", body = PaginatedResponse<stock_movement::Model>),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    authorize_item(&state, &user, id).await?;
    let (page, per_page) = params.resolve(&state.config);
    let (rows, total) = state
        .services
        .catalog
        .list_movements(Some(id), page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        rows, page, per_page, total,
    )))
}

pub fn item_routes(permissions: Arc<PermissionTable>) -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/{id}/stock-in", post(stock_in))
        .route("/{id}/stock-out", post(stock_out))
        .route("/{id}/movements", get(list_movements))
        .with_categories(permissions, ANY_ITEM_CATEGORY)
}

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::routing::{
        AddMediaRequest, ItemApprovalRequest, LockProductRequest, RouteProductRequest,
        UpdateProductRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{OrderItem, OrderMedia, OrderProduct},
    response::ApiResponse,
    services::{product_service, routing_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", patch(update_product).delete(delete_product))
        .route("/{id}/route", post(route_product))
        .route("/{id}/lock", post(set_lock))
        .route("/{id}/media", post(add_media))
}

pub fn items_router() -> Router<AppState> {
    Router::new().route("/{id}/approval", patch(update_item_approval))
}

pub fn media_router() -> Router<AppState> {
    Router::new().route("/{id}", delete(delete_media))
}

#[utoipa::path(
    post,
    path = "/api/order-products/{id}/route",
    params(("id" = Uuid, Path, description = "Order product ID")),
    request_body = RouteProductRequest,
    responses(
        (status = 200, description = "Product routed", body = ApiResponse<OrderProduct>),
        (status = 400, description = "Transition not allowed from the current state"),
        (status = 403, description = "Action not allowed for this role"),
        (status = 409, description = "Product changed since it was loaded"),
    ),
    security(("bearer_auth" = [])),
    tag = "Routing"
)]
pub async fn route_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RouteProductRequest>,
) -> AppResult<Json<ApiResponse<OrderProduct>>> {
    let resp = routing_service::route_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order-products/{id}/lock",
    params(("id" = Uuid, Path, description = "Order product ID")),
    request_body = LockProductRequest,
    responses(
        (status = 200, description = "Lock state applied", body = ApiResponse<OrderProduct>),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Product changed since it was loaded"),
    ),
    security(("bearer_auth" = [])),
    tag = "Routing"
)]
pub async fn set_lock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<LockProductRequest>,
) -> AppResult<Json<ApiResponse<OrderProduct>>> {
    let resp = routing_service::set_lock(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/order-products/{id}",
    params(("id" = Uuid, Path, description = "Order product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Fields updated", body = ApiResponse<OrderProduct>),
        (status = 403, description = "Field not editable by this role"),
        (status = 409, description = "Product changed since it was loaded"),
    ),
    security(("bearer_auth" = [])),
    tag = "Order products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<OrderProduct>>> {
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/order-products/{id}",
    params(("id" = Uuid, Path, description = "Order product ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Order products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_order_product(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order-products/{id}/media",
    params(("id" = Uuid, Path, description = "Order product ID")),
    request_body = AddMediaRequest,
    responses(
        (status = 201, description = "Media registered", body = ApiResponse<OrderMedia>),
        (status = 400, description = "Unsupported file type"),
    ),
    security(("bearer_auth" = [])),
    tag = "Media"
)]
pub async fn add_media(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddMediaRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderMedia>>)> {
    let resp = product_service::add_product_media(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/media/{id}",
    params(("id" = Uuid, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Only the uploader or an admin may delete"),
    ),
    security(("bearer_auth" = [])),
    tag = "Media"
)]
pub async fn delete_media(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_media(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/order-items/{id}/approval",
    params(("id" = Uuid, Path, description = "Order item ID")),
    request_body = ItemApprovalRequest,
    responses(
        (status = 200, description = "Approval recorded", body = ApiResponse<OrderItem>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Order products"
)]
pub async fn update_item_approval(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ItemApprovalRequest>,
) -> AppResult<Json<ApiResponse<OrderItem>>> {
    let resp = product_service::update_item_approval(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

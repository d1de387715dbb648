use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        history::HistoryList,
        orders::{
            CreateOrderRequest, OrderDetail, OrderList, UpdatePaymentRequest, UpdateSampleRequest,
        },
        routing::{AddMediaRequest, RouteAllRequest, RouteAllResponse},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, OrderMedia},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{history_service, order_service, product_service, routing_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order))
        .route("/{id}/sample", patch(update_sample))
        .route("/{id}/sample/media", post(add_sample_media))
        .route("/{id}/payment", patch(update_payment))
        .route("/{id}/route-all", post(route_all))
        .route("/{id}/history", get(order_history))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Orders visible to the caller", body = ApiResponse<OrderList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderDetail>>)> {
    let resp = order_service::create_order(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with the products visible to the caller", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/sample",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateSampleRequest,
    responses(
        (status = 200, description = "Sample fields updated", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_sample(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSampleRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_sample(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/sample/media",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AddMediaRequest,
    responses(
        (status = 201, description = "Sample media registered", body = ApiResponse<OrderMedia>),
        (status = 400, description = "Unsupported file type"),
    ),
    security(("bearer_auth" = [])),
    tag = "Media"
)]
pub async fn add_sample_media(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddMediaRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderMedia>>)> {
    let resp = product_service::add_media(&state, &user, id, None, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/payment",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Paid flag updated", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_payment(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/route-all",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = RouteAllRequest,
    responses(
        (status = 200, description = "Per-product routing results", body = ApiResponse<RouteAllResponse>),
        (status = 403, description = "Action not allowed for this role"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Routing"
)]
pub async fn route_all(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RouteAllRequest>,
) -> AppResult<Json<ApiResponse<RouteAllResponse>>> {
    let resp = routing_service::route_all(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/history",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Rendered audit history, newest first", body = ApiResponse<HistoryList>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn order_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<HistoryList>>> {
    let resp = history_service::order_history(&state, &user, id).await?;
    Ok(Json(resp))
}

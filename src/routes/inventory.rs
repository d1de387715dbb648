use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::inventory::{
        AccessoryTypeList, AccessoryTypeQuery, CreateAccessoryTypeRequest, CreateInventoryRequest,
        InventoryAdjustRequest, InventoryList, InventoryQuery, UpdateAccessoryTypeRequest,
        UpdateInventoryRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{AccessoryType, InventoryItem},
    response::ApiResponse,
    services::inventory_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory).post(create_inventory))
        .route("/low-stock", get(list_low_stock))
        .route("/types", get(list_accessory_types).post(create_accessory_type))
        .route(
            "/types/{id}",
            patch(update_accessory_type).delete(delete_accessory_type),
        )
        .route("/{id}", patch(update_inventory).delete(delete_inventory))
        .route("/{id}/adjust", post(adjust_inventory))
}

#[utoipa::path(
    get,
    path = "/api/inventory/types",
    params(
        ("manufacturer_id" = Option<Uuid>, Query, description = "Filter by manufacturer (admins)"),
        ("lang" = Option<String>, Query, description = "Render text in this language")
    ),
    responses(
        (status = 200, description = "Accessory types", body = ApiResponse<AccessoryTypeList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn list_accessory_types(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AccessoryTypeQuery>,
) -> AppResult<Json<ApiResponse<AccessoryTypeList>>> {
    let resp = inventory_service::list_accessory_types(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/inventory/types",
    request_body = CreateAccessoryTypeRequest,
    responses(
        (status = 201, description = "Accessory type created", body = ApiResponse<AccessoryType>),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn create_accessory_type(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAccessoryTypeRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AccessoryType>>)> {
    let resp = inventory_service::create_accessory_type(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/inventory/types/{id}",
    params(("id" = Uuid, Path, description = "Accessory type ID")),
    request_body = UpdateAccessoryTypeRequest,
    responses(
        (status = 200, description = "Accessory type updated", body = ApiResponse<AccessoryType>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn update_accessory_type(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAccessoryTypeRequest>,
) -> AppResult<Json<ApiResponse<AccessoryType>>> {
    let resp = inventory_service::update_accessory_type(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/inventory/types/{id}",
    params(("id" = Uuid, Path, description = "Accessory type ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 409, description = "Accessory type is in use"),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn delete_accessory_type(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = inventory_service::delete_accessory_type(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/inventory",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("manufacturer_id" = Option<Uuid>, Query, description = "Filter by manufacturer (admins)"),
        ("client_id" = Option<Uuid>, Query, description = "Filter by client"),
        ("low_stock_only" = Option<bool>, Query, description = "Only rows at or below their threshold"),
        ("lang" = Option<String>, Query, description = "Render notes in this language")
    ),
    responses(
        (status = 200, description = "Stock rows", body = ApiResponse<InventoryList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<InventoryQuery>,
) -> AppResult<Json<ApiResponse<InventoryList>>> {
    let resp = inventory_service::list_inventory(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/inventory/low-stock",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("manufacturer_id" = Option<Uuid>, Query, description = "Filter by manufacturer (admins)"),
        ("client_id" = Option<Uuid>, Query, description = "Filter by client")
    ),
    responses(
        (status = 200, description = "Rows at or below their threshold", body = ApiResponse<InventoryList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<InventoryQuery>,
) -> AppResult<Json<ApiResponse<InventoryList>>> {
    let resp = inventory_service::list_low_stock(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/inventory",
    request_body = CreateInventoryRequest,
    responses(
        (status = 201, description = "Stock row created", body = ApiResponse<InventoryItem>),
        (status = 409, description = "Row already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn create_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateInventoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<InventoryItem>>)> {
    let resp = inventory_service::create_inventory(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/inventory/{id}",
    params(("id" = Uuid, Path, description = "Stock row ID")),
    request_body = UpdateInventoryRequest,
    responses(
        (status = 200, description = "Stock row updated", body = ApiResponse<InventoryItem>),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn update_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInventoryRequest>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    let resp = inventory_service::update_inventory(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/inventory/{id}/adjust",
    params(("id" = Uuid, Path, description = "Stock row ID")),
    request_body = InventoryAdjustRequest,
    responses(
        (status = 200, description = "Quantity adjusted", body = ApiResponse<InventoryItem>),
        (status = 400, description = "Adjustment would make stock negative"),
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InventoryAdjustRequest>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    let resp = inventory_service::adjust_inventory(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/inventory/{id}",
    params(("id" = Uuid, Path, description = "Stock row ID")),
    responses((status = 200, description = "Deleted")),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn delete_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = inventory_service::delete_inventory(&state, &user, id).await?;
    Ok(Json(resp))
}

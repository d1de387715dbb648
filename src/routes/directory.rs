use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::orders::CompanyList,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients))
        .route("/manufacturers", get(list_manufacturers))
}

#[utoipa::path(
    get,
    path = "/api/clients",
    responses(
        (status = 200, description = "All clients", body = ApiResponse<CompanyList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn list_clients(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CompanyList>>> {
    let resp = order_service::list_clients(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/manufacturers",
    responses(
        (status = 200, description = "All manufacturers", body = ApiResponse<CompanyList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Directory"
)]
pub async fn list_manufacturers(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CompanyList>>> {
    let resp = order_service::list_manufacturers(&state, &user).await?;
    Ok(Json(resp))
}

use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::email::{SendEmailResponse, SendToManufacturerRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    services::email_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/send-to-manufacturer", post(send_to_manufacturer))
}

#[utoipa::path(
    post,
    path = "/api/email/send-to-manufacturer",
    request_body = SendToManufacturerRequest,
    responses(
        (status = 200, description = "Email accepted by the provider", body = SendEmailResponse),
        (status = 400, description = "Manufacturer has no email address"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Email provider not configured"),
        (status = 502, description = "Email provider rejected the request"),
    ),
    security(("bearer_auth" = [])),
    tag = "Email"
)]
pub async fn send_to_manufacturer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SendToManufacturerRequest>,
) -> AppResult<Json<SendEmailResponse>> {
    let resp = email_service::send_to_manufacturer(&state, &user, payload).await?;
    Ok(Json(resp))
}

use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod directory;
pub mod doc;
pub mod email;
pub mod health;
pub mod inventory;
pub mod notifications;
pub mod order_products;
pub mod orders;
pub mod params;
pub mod products;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/orders", orders::router())
        .nest("/order-products", order_products::router())
        .nest("/order-items", order_products::items_router())
        .nest("/media", order_products::media_router())
        .nest("/inventory", inventory::router())
        .nest("/users", users::router())
        .nest("/email", email::router())
        .nest("/notifications", notifications::router())
        .nest("/products", products::router())
        .merge(directory::router())
}

pub mod auth_service;
pub mod email_service;
pub mod history_service;
pub mod inventory_service;
pub mod notification_service;
pub mod order_service;
pub mod product_service;
pub mod routing_service;
pub mod user_service;

pub mod auth;
pub mod email;
pub mod history;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod routing;
pub mod users;

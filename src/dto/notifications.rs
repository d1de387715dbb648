use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::Notification,
    routes::params::{Pagination, paginated},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotificationQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationList {
    pub items: Vec<Notification>,
}

paginated!(NotificationQuery);

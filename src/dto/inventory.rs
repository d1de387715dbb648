use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{AccessoryType, InventoryItem},
    routes::params::{Pagination, paginated},
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateAccessoryTypeRequest {
    /// Required for admins; manufacturer users always act on their own manufacturer.
    pub manufacturer_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateAccessoryTypeRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateInventoryRequest {
    pub manufacturer_id: Option<Uuid>,
    pub client_id: Uuid,
    pub accessory_type_id: Uuid,
    #[validate(range(min = 0))]
    pub quantity_on_hand: i32,
    #[validate(range(min = 0))]
    pub low_stock_threshold: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateInventoryRequest {
    #[validate(range(min = 0))]
    pub quantity_on_hand: Option<i32>,
    #[validate(range(min = 0))]
    pub low_stock_threshold: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AccessoryTypeQuery {
    pub manufacturer_id: Option<Uuid>,
    /// Render names and descriptions in this language.
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub manufacturer_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub low_stock_only: bool,
    pub lang: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessoryTypeList {
    pub items: Vec<AccessoryType>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryList {
    pub items: Vec<InventoryItem>,
}

paginated!(InventoryQuery);

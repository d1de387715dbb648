use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Company, Order, OrderItem, OrderMedia, OrderProduct};

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateOrderRequest {
    pub client_id: Uuid,
    pub manufacturer_id: Uuid,
    pub sub_manufacturer_id: Option<Uuid>,
    #[validate(length(min = 1, message = "an order needs at least one product"), nested)]
    pub products: Vec<NewOrderProduct>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewOrderProduct {
    pub product_id: Uuid,
    pub internal_notes: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewOrderItem {
    #[validate(length(min = 1))]
    pub variant_combo: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Sample side-track fields. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSampleRequest {
    pub sample_required: Option<bool>,
    pub sample_fee: Option<i64>,
    pub sample_eta: Option<NaiveDate>,
    pub sample_status: Option<String>,
    pub sample_notes: Option<String>,
    pub sample_routed_to: Option<String>,
    pub sample_workflow_status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentRequest {
    pub is_paid: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: OrderProduct,
    pub product_name: String,
    pub items: Vec<OrderItem>,
    pub media: Vec<OrderMedia>,
}

/// An order as seen by one party: only the products visible to it, with other
/// audiences' prices and notes removed.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub client: Option<Company>,
    pub manufacturer: Option<Company>,
    pub products: Vec<ProductDetail>,
    pub sample_media: Vec<OrderMedia>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyList {
    pub items: Vec<Company>,
}

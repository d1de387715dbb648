use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::ErrorClass, models::OrderProduct, workflow::RoutingAction};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RouteProductRequest {
    pub action: RoutingAction,
    pub notes: Option<String>,
    /// Version the caller last saw; a mismatch is rejected with 409.
    pub expected_version: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LockProductRequest {
    pub locked: bool,
    pub expected_version: Option<i32>,
}

/// Editable order-product fields. Absent fields are left unchanged.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct ProductUpdates {
    pub manufacturer_standard_price: Option<i64>,
    pub manufacturer_bulk_price: Option<i64>,
    pub client_standard_price: Option<i64>,
    pub client_bulk_price: Option<i64>,
    pub admin_notes: Option<String>,
    pub manufacturer_notes: Option<String>,
    pub client_notes: Option<String>,
    pub internal_notes: Option<String>,
    pub is_invoiced: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    #[serde(flatten)]
    pub updates: ProductUpdates,
    pub expected_version: Option<i32>,
}

/// Unsaved edits for one product, persisted before the bulk route is applied to it.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PendingEdit {
    pub order_product_id: Uuid,
    pub expected_version: Option<i32>,
    #[serde(default)]
    pub updates: ProductUpdates,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RouteAllRequest {
    pub action: RoutingAction,
    pub notes: Option<String>,
    #[serde(default)]
    pub edits: Vec<PendingEdit>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RouteItemResult {
    pub order_product_id: Uuid,
    pub success: bool,
    pub error: Option<String>,
    pub error_class: Option<ErrorClass>,
    pub product: Option<OrderProduct>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RouteAllResponse {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<RouteItemResult>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ItemApprovalRequest {
    pub status: crate::workflow::ApprovalStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMediaRequest {
    pub file_url: String,
    pub file_type: String,
}

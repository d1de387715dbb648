use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    accessory_types, audit_log, clients, inventory, manufacturers, notifications, order_items,
    order_media, order_products, orders, products,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub client_id: Option<Uuid>,
    pub manufacturer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Catalog product an order product refers to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub status: String,
    pub is_paid: bool,
    pub client_id: Uuid,
    pub manufacturer_id: Uuid,
    pub sub_manufacturer_id: Option<Uuid>,
    pub created_by: Uuid,
    pub sample_required: bool,
    pub sample_fee: Option<i64>,
    pub sample_eta: Option<NaiveDate>,
    pub sample_status: Option<String>,
    pub sample_notes: Option<String>,
    pub sample_routed_to: Option<String>,
    pub sample_workflow_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog product placed on an order. Price and notes fields belonging to another
/// audience are blanked before the record leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderProduct {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_status: String,
    pub routed_to: String,
    pub is_locked: bool,
    pub is_invoiced: bool,
    pub requires_sample: bool,
    pub requires_client_approval: bool,
    pub manufacturer_standard_price: Option<i64>,
    pub manufacturer_bulk_price: Option<i64>,
    pub client_standard_price: Option<i64>,
    pub client_bulk_price: Option<i64>,
    pub admin_notes: Option<String>,
    pub manufacturer_notes: Option<String>,
    pub client_notes: Option<String>,
    pub internal_notes: Option<String>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_product_id: Uuid,
    pub variant_combo: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub admin_status: String,
    pub manufacturer_status: String,
    pub standard_price: Option<i64>,
    pub bulk_price: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderMedia {
    pub id: Uuid,
    pub order_id: Uuid,
    pub order_product_id: Option<Uuid>,
    pub file_url: String,
    pub file_type: String,
    pub uploaded_by: Uuid,
    pub is_sample: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_name: String,
    pub action_type: String,
    pub target_type: String,
    pub target_id: Uuid,
    pub order_id: Option<Uuid>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    #[schema(value_type = Object)]
    pub changes: serde_json::Value,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub order_product_id: Option<Uuid>,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessoryType {
    pub id: Uuid,
    pub manufacturer_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub source_language: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryItem {
    pub id: Uuid,
    pub manufacturer_id: Uuid,
    pub client_id: Uuid,
    pub accessory_type_id: Uuid,
    pub quantity_on_hand: i32,
    pub low_stock_threshold: i32,
    pub stock_status: String,
    pub notes: Option<String>,
    pub source_language: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<clients::Model> for Company {
    fn from(model: clients::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<manufacturers::Model> for Company {
    fn from(model: manufacturers::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            sku: model.sku,
            description: model.description,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            status: model.status,
            is_paid: model.is_paid,
            client_id: model.client_id,
            manufacturer_id: model.manufacturer_id,
            sub_manufacturer_id: model.sub_manufacturer_id,
            created_by: model.created_by,
            sample_required: model.sample_required,
            sample_fee: model.sample_fee,
            sample_eta: model.sample_eta,
            sample_status: model.sample_status,
            sample_notes: model.sample_notes,
            sample_routed_to: model.sample_routed_to,
            sample_workflow_status: model.sample_workflow_status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_products::Model> for OrderProduct {
    fn from(model: order_products::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_status: model.product_status,
            routed_to: model.routed_to,
            is_locked: model.is_locked,
            is_invoiced: model.is_invoiced,
            requires_sample: model.requires_sample,
            requires_client_approval: model.requires_client_approval,
            manufacturer_standard_price: model.manufacturer_standard_price,
            manufacturer_bulk_price: model.manufacturer_bulk_price,
            client_standard_price: model.client_standard_price,
            client_bulk_price: model.client_bulk_price,
            admin_notes: model.admin_notes,
            manufacturer_notes: model.manufacturer_notes,
            client_notes: model.client_notes,
            internal_notes: model.internal_notes,
            shipped_date: model.shipped_date.map(|dt| dt.with_timezone(&Utc)),
            version: model.version,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_product_id: model.order_product_id,
            variant_combo: model.variant_combo,
            quantity: model.quantity,
            notes: model.notes,
            admin_status: model.admin_status,
            manufacturer_status: model.manufacturer_status,
            standard_price: model.standard_price,
            bulk_price: model.bulk_price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<order_media::Model> for OrderMedia {
    fn from(model: order_media::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            order_product_id: model.order_product_id,
            file_url: model.file_url,
            file_type: model.file_type,
            uploaded_by: model.uploaded_by,
            is_sample: model.is_sample,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<audit_log::Model> for AuditLogEntry {
    fn from(model: audit_log::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            user_name: model.user_name,
            action_type: model.action_type,
            target_type: model.target_type,
            target_id: model.target_id,
            order_id: model.order_id,
            old_value: model.old_value,
            new_value: model.new_value,
            changes: model.changes,
            note: model.note,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<notifications::Model> for Notification {
    fn from(model: notifications::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            order_product_id: model.order_product_id,
            kind: model.kind,
            message: model.message,
            is_read: model.is_read,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<accessory_types::Model> for AccessoryType {
    fn from(model: accessory_types::Model) -> Self {
        Self {
            id: model.id,
            manufacturer_id: model.manufacturer_id,
            name: model.name,
            description: model.description,
            unit: model.unit,
            source_language: model.source_language,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<inventory::Model> for InventoryItem {
    fn from(model: inventory::Model) -> Self {
        let stock_status =
            crate::services::inventory_service::stock_status(model.quantity_on_hand, model.low_stock_threshold);
        Self {
            id: model.id,
            manufacturer_id: model.manufacturer_id,
            client_id: model.client_id,
            accessory_type_id: model.accessory_type_id,
            quantity_on_hand: model.quantity_on_hand,
            low_stock_threshold: model.low_stock_threshold,
            stock_status: stock_status.to_string(),
            notes: model.notes,
            source_language: model.source_language,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

//! Structured audit trail.
//!
//! Every state-changing operation appends one [`AuditEvent`] per logical change, written
//! on the same connection (normally the operation's transaction) as the change itself.
//! What changed is kept as a list of [`FieldChange`]s rather than a display string; the
//! human-readable form is produced by `services::history_service`.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::audit_log::{ActiveModel as AuditActive, Model as AuditModel},
    error::AppResult,
    middleware::auth::AuthUser,
    workflow::RoutingAction,
};

/// One field-level difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldChange {
    pub field: String,
    #[schema(value_type = Object)]
    pub old: Value,
    #[schema(value_type = Object)]
    pub new: Value,
}

impl FieldChange {
    pub fn new(field: impl Into<String>, old: impl Serialize, new: impl Serialize) -> Self {
        Self {
            field: field.into(),
            old: serde_json::to_value(old).unwrap_or(Value::Null),
            new: serde_json::to_value(new).unwrap_or(Value::Null),
        }
    }
}

/// Collects field changes, skipping fields whose value did not change.
#[derive(Debug, Default, Clone)]
pub struct ChangeSet(Vec<FieldChange>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<T: PartialEq + Serialize>(&mut self, field: &str, old: &T, new: &T) {
        if old != new {
            self.0.push(FieldChange::new(field, old, new));
        }
    }

    pub fn push(&mut self, change: FieldChange) {
        self.0.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<FieldChange> {
        self.0
    }
}

/// Tagged action recorded in `audit_log.action_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    ProductRouted(RoutingAction),
    RoutingNote,
    ProductLocked,
    ProductUnlocked,
    ProductUpdated,
    ProductDeleted,
    ItemApproval,
    SampleUpdated,
    PaymentUpdated,
    OrderCreated,
    MediaAdded,
    MediaDeleted,
    AccessoryTypeCreated,
    AccessoryTypeUpdated,
    AccessoryTypeDeleted,
    InventoryCreated,
    InventoryUpdated,
    InventoryAdjusted,
    InventoryDeleted,
    UserCreated,
    UserUpdated,
    UserDeleted,
    UserLogin,
    EmailSent,
}

const PLAIN_ACTIONS: &[(AuditAction, &str)] = &[
    (AuditAction::RoutingNote, "routing_note"),
    (AuditAction::ProductLocked, "product_locked"),
    (AuditAction::ProductUnlocked, "product_unlocked"),
    (AuditAction::ProductUpdated, "product_updated"),
    (AuditAction::ProductDeleted, "product_deleted"),
    (AuditAction::ItemApproval, "item_approval"),
    (AuditAction::SampleUpdated, "sample_updated"),
    (AuditAction::PaymentUpdated, "payment_updated"),
    (AuditAction::OrderCreated, "order_created"),
    (AuditAction::MediaAdded, "media_added"),
    (AuditAction::MediaDeleted, "media_deleted"),
    (AuditAction::AccessoryTypeCreated, "accessory_type_created"),
    (AuditAction::AccessoryTypeUpdated, "accessory_type_updated"),
    (AuditAction::AccessoryTypeDeleted, "accessory_type_deleted"),
    (AuditAction::InventoryCreated, "inventory_created"),
    (AuditAction::InventoryUpdated, "inventory_updated"),
    (AuditAction::InventoryAdjusted, "inventory_adjusted"),
    (AuditAction::InventoryDeleted, "inventory_deleted"),
    (AuditAction::UserCreated, "user_created"),
    (AuditAction::UserUpdated, "user_updated"),
    (AuditAction::UserDeleted, "user_deleted"),
    (AuditAction::UserLogin, "user_login"),
    (AuditAction::EmailSent, "email_sent"),
];

impl AuditAction {
    pub fn action_type(&self) -> String {
        match self {
            AuditAction::ProductRouted(action) => action.audit_action_type(),
            plain => PLAIN_ACTIONS
                .iter()
                .find(|(a, _)| a == plain)
                .map(|(_, s)| (*s).to_string())
                .unwrap_or_default(),
        }
    }

    pub fn parse(action_type: &str) -> Option<Self> {
        if let Some(action) = action_type.strip_prefix("product_routed_") {
            return action.parse().ok().map(AuditAction::ProductRouted);
        }
        PLAIN_ACTIONS
            .iter()
            .find(|(_, s)| *s == action_type)
            .map(|(a, _)| *a)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TargetType {
    Order,
    OrderProduct,
    OrderItem,
    OrderMedia,
    AccessoryType,
    InventoryItem,
    User,
}

/// An audit row about to be written.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub target_type: TargetType,
    pub target_id: Uuid,
    pub order_id: Option<Uuid>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changes: Vec<FieldChange>,
    pub note: Option<String>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, target_type: TargetType, target_id: Uuid) -> Self {
        Self {
            action,
            target_type,
            target_id,
            order_id: None,
            old_value: None,
            new_value: None,
            changes: Vec::new(),
            note: None,
        }
    }

    pub fn order(mut self, order_id: Uuid) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn values(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.old_value = Some(old.into());
        self.new_value = Some(new.into());
        self
    }

    pub fn changes(mut self, changes: Vec<FieldChange>) -> Self {
        self.changes = changes;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Append one audit row on `conn`.
pub async fn log_audit<C: ConnectionTrait>(
    conn: &C,
    actor: &AuthUser,
    event: AuditEvent,
) -> AppResult<AuditModel> {
    let changes = serde_json::to_value(&event.changes).unwrap_or(Value::Array(Vec::new()));
    let row = AuditActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(actor.user_id)),
        user_name: Set(actor.name.clone()),
        action_type: Set(event.action.action_type()),
        target_type: Set(event.target_type.to_string()),
        target_id: Set(event.target_id),
        order_id: Set(event.order_id),
        old_value: Set(event.old_value),
        new_value: Set(event.new_value),
        changes: Set(changes),
        note: Set(event.note),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    Ok(row)
}

//! Presentation of the audit log as order history.
//!
//! Audit rows store typed actions and structured field changes; this module is the one
//! place that turns them into display text.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit::{AuditAction, FieldChange},
    dto::history::{HistoryLine, HistoryList},
    entity::{
        audit_log::{Column as AuditCol, Entity as AuditLog, Model as AuditModel},
        order_items::{Column as ItemCol, Entity as OrderItems},
        order_media::{Column as MediaCol, Entity as OrderMedia},
        order_products::{Column as ProductCol, Entity as OrderProducts},
        orders::Entity as Orders,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::{order_service::ensure_order_access, routing_service::product_state},
    state::AppState,
    workflow::{Actor, RoutingAction, visible_to},
};

const STATUS_FIELDS: &[&str] = &[
    "product_status",
    "routed_to",
    "status",
    "admin_status",
    "manufacturer_status",
    "sample_routed_to",
    "sample_workflow_status",
    "sample_status",
];

const CLIENT_HIDDEN: &[&str] = &[
    "manufacturer_standard_price",
    "manufacturer_bulk_price",
    "admin_notes",
    "manufacturer_notes",
    "internal_notes",
];

const MANUFACTURER_HIDDEN: &[&str] = &[
    "client_standard_price",
    "client_bulk_price",
    "admin_notes",
    "client_notes",
    "internal_notes",
];

/// Icon and label shown for an audit action type.
pub fn action_display(action_type: &str) -> (&'static str, String) {
    let Some(action) = AuditAction::parse(action_type) else {
        return ("info", humanize(action_type));
    };
    match action {
        AuditAction::ProductRouted(routing) => {
            let icon = match routing {
                RoutingAction::SendToProduction | RoutingAction::InProduction => "factory",
                RoutingAction::RequestSample => "flask",
                RoutingAction::SendForApproval => "user-check",
                RoutingAction::SendBackToManufacturer | RoutingAction::RequestChanges => "undo",
                RoutingAction::MarkCompleted => "flag",
                RoutingAction::SendToAdmin => "send",
                RoutingAction::Shipped => "truck",
                RoutingAction::Approve => "check",
            };
            (icon, format!("Product routed: {}", humanize(routing.as_ref())))
        }
        AuditAction::RoutingNote => ("message", "Routing note".into()),
        AuditAction::ProductLocked => ("lock", "Product locked".into()),
        AuditAction::ProductUnlocked => ("unlock", "Product unlocked".into()),
        AuditAction::ProductUpdated => ("edit", "Product updated".into()),
        AuditAction::ProductDeleted => ("trash", "Product removed".into()),
        AuditAction::ItemApproval => ("check-square", "Item approval".into()),
        AuditAction::SampleUpdated => ("flask", "Sample updated".into()),
        AuditAction::PaymentUpdated => ("dollar", "Payment updated".into()),
        AuditAction::OrderCreated => ("plus", "Order created".into()),
        AuditAction::MediaAdded => ("image", "Media added".into()),
        AuditAction::MediaDeleted => ("image", "Media removed".into()),
        AuditAction::AccessoryTypeCreated
        | AuditAction::AccessoryTypeUpdated
        | AuditAction::AccessoryTypeDeleted
        | AuditAction::InventoryCreated
        | AuditAction::InventoryUpdated
        | AuditAction::InventoryAdjusted
        | AuditAction::InventoryDeleted => ("box", humanize(action_type)),
        AuditAction::UserCreated
        | AuditAction::UserUpdated
        | AuditAction::UserDeleted
        | AuditAction::UserLogin => ("user", humanize(action_type)),
        AuditAction::EmailSent => ("mail", "Email sent to manufacturer".into()),
    }
}

/// `product_status` → `Product status`; `order.status` → `Order status`.
pub fn field_label(field: &str) -> String {
    humanize(&field.replace('.', "_"))
}

pub fn humanize(raw: &str) -> String {
    let spaced = raw.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Cents to `$10.00`.
pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}${}.{:02}", cents / 100, cents % 100)
}

fn is_money(field: &str) -> bool {
    field.ends_with("_fee") || field.ends_with("_price")
}

fn bare_field(field: &str) -> &str {
    field.rsplit('.').next().unwrap_or(field)
}

pub fn format_value(field: &str, value: &Value) -> String {
    let field = bare_field(field);
    match value {
        Value::Null => "(none)".into(),
        Value::Bool(true) => "Yes".into(),
        Value::Bool(false) => "No".into(),
        Value::Number(n) if is_money(field) => match n.as_i64() {
            Some(cents) => format_money(cents),
            None => n.to_string(),
        },
        Value::Number(n) => n.to_string(),
        Value::String(s) if STATUS_FIELDS.contains(&field) => humanize(s),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `Sample fee: $10.00 → $20.00`.
pub fn describe_change(change: &FieldChange) -> String {
    format!(
        "{}: {} → {}",
        field_label(&change.field),
        format_value(&change.field, &change.old),
        format_value(&change.field, &change.new)
    )
}

fn field_visible(actor: Option<Actor>, field: &str) -> bool {
    let field = bare_field(field);
    match actor {
        Some(Actor::Client) => !CLIENT_HIDDEN.contains(&field),
        Some(Actor::Manufacturer) => !MANUFACTURER_HIDDEN.contains(&field),
        Some(Actor::Admin) | None => true,
    }
}

/// Render one audit row for `viewer`, leaving out changes to fields they cannot see.
/// A routing note is dropped unless the viewer can read the notes column it went to.
pub fn render_entry(entry: AuditModel, viewer: Option<Actor>) -> HistoryLine {
    let (icon, label) = action_display(&entry.action_type);
    let note = match AuditAction::parse(&entry.action_type) {
        Some(AuditAction::RoutingNote) => entry
            .note
            .filter(|_| entry.old_value.as_deref().is_some_and(|f| field_visible(viewer, f))),
        _ => entry.note,
    };
    let changes: Vec<FieldChange> = serde_json::from_value(entry.changes).unwrap_or_default();
    let details = changes
        .iter()
        .filter(|c| field_visible(viewer, &c.field))
        .map(describe_change)
        .collect();

    HistoryLine {
        id: entry.id,
        action_type: entry.action_type,
        icon: icon.to_string(),
        label,
        user_name: entry.user_name,
        target_type: entry.target_type,
        target_id: entry.target_id,
        details,
        note,
        created_at: entry.created_at.with_timezone(&Utc),
    }
}

pub async fn order_history(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<HistoryList>> {
    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_order_access(user, &order)?;

    let viewer = user.viewer();
    let hidden = hidden_targets(&state.orm, order.id, viewer).await?;
    let items: Vec<HistoryLine> = AuditLog::find()
        .filter(AuditCol::OrderId.eq(order.id))
        .order_by_desc(AuditCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter(|entry| !hidden.contains(&entry.target_id))
        .map(|entry| render_entry(entry, viewer))
        .collect();

    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("History", HistoryList { items }, Some(meta)))
}

/// Ids of the order's products that `viewer` cannot currently see, together with their
/// items and media.
async fn hidden_targets<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    viewer: Option<Actor>,
) -> AppResult<HashSet<Uuid>> {
    let mut hidden = HashSet::new();
    let products = OrderProducts::find()
        .filter(ProductCol::OrderId.eq(order_id))
        .all(conn)
        .await?;
    for product in products {
        if visible_to(viewer, product_state(&product)?) {
            continue;
        }
        let items = OrderItems::find()
            .select_only()
            .column(ItemCol::Id)
            .filter(ItemCol::OrderProductId.eq(product.id))
            .into_tuple::<Uuid>()
            .all(conn)
            .await?;
        let media = OrderMedia::find()
            .select_only()
            .column(MediaCol::Id)
            .filter(MediaCol::OrderProductId.eq(product.id))
            .into_tuple::<Uuid>()
            .all(conn)
            .await?;
        hidden.insert(product.id);
        hidden.extend(items);
        hidden.extend(media);
    }
    Ok(hidden)
}

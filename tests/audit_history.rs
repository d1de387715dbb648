use orderflow_api::{
    audit::{AuditAction, ChangeSet, FieldChange},
    entity::audit_log::Model as AuditModel,
    services::history_service::{
        action_display, describe_change, format_money, format_value, humanize, render_entry,
    },
    workflow::{Actor, RoutingAction},
};
use serde_json::json;
use uuid::Uuid;

fn audit_row(action_type: &str, changes: Vec<FieldChange>) -> AuditModel {
    AuditModel {
        id: Uuid::new_v4(),
        user_id: Some(Uuid::new_v4()),
        user_name: "Dana Admin".into(),
        action_type: action_type.into(),
        target_type: "order_product".into(),
        target_id: Uuid::new_v4(),
        order_id: Some(Uuid::new_v4()),
        old_value: None,
        new_value: None,
        changes: serde_json::to_value(changes).unwrap(),
        note: None,
        created_at: chrono::Utc::now().fixed_offset(),
    }
}

#[test]
fn money_change_reads_naturally() {
    let change = FieldChange::new("sample_fee", 1000, 2000);
    assert_eq!(describe_change(&change), "Sample fee: $10.00 → $20.00");
}

#[test]
fn status_values_are_humanized() {
    let change = FieldChange::new("product_status", "pending_admin", "pending_client_approval");
    assert_eq!(
        describe_change(&change),
        "Product status: Pending admin → Pending client approval"
    );

    let order_level = FieldChange::new("order.status", "pending", "in_progress");
    assert_eq!(
        describe_change(&order_level),
        "Order status: Pending → In progress"
    );
}

#[test]
fn value_formatting() {
    assert_eq!(format_value("client_notes", &json!(null)), "(none)");
    assert_eq!(format_value("is_locked", &json!(true)), "Yes");
    assert_eq!(format_value("is_invoiced", &json!(false)), "No");
    assert_eq!(format_value("quantity", &json!(12)), "12");
    assert_eq!(format_value("client_bulk_price", &json!(1999)), "$19.99");
    assert_eq!(format_money(-250), "-$2.50");
    assert_eq!(humanize("pending_client_approval"), "Pending client approval");
    assert_eq!(humanize(""), "");
}

#[test]
fn change_set_skips_unchanged_fields() {
    let mut changes = ChangeSet::new();
    changes.record("admin_notes", &Some("a".to_string()), &Some("a".to_string()));
    assert!(changes.is_empty());

    changes.record("client_standard_price", &None::<i64>, &Some(500));
    let changes = changes.into_vec();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].old, json!(null));
    assert_eq!(changes[0].new, json!(500));
}

#[test]
fn action_types_round_trip() {
    let routed = AuditAction::ProductRouted(RoutingAction::RequestSample);
    assert_eq!(routed.action_type(), "product_routed_request_sample");
    assert_eq!(AuditAction::parse(&routed.action_type()), Some(routed));

    for action in [
        AuditAction::RoutingNote,
        AuditAction::ProductLocked,
        AuditAction::InventoryAdjusted,
        AuditAction::EmailSent,
    ] {
        assert_eq!(AuditAction::parse(&action.action_type()), Some(action));
    }
    assert_eq!(AuditAction::parse("product_routed_teleport"), None);
    assert_eq!(AuditAction::parse("something_else"), None);
}

#[test]
fn display_labels() {
    let (icon, label) = action_display("product_routed_shipped");
    assert_eq!(icon, "truck");
    assert_eq!(label, "Product routed: Shipped");

    let (icon, label) = action_display("product_locked");
    assert_eq!(icon, "lock");
    assert_eq!(label, "Product locked");

    let (icon, label) = action_display("legacy_import");
    assert_eq!(icon, "info");
    assert_eq!(label, "Legacy import");
}

#[test]
fn history_hides_fields_the_viewer_cannot_see() {
    let row = audit_row(
        "product_updated",
        vec![
            FieldChange::new("manufacturer_standard_price", 700, 800),
            FieldChange::new("client_standard_price", 1200, 1300),
            FieldChange::new("internal_notes", "old", "new"),
        ],
    );

    let admin = render_entry(row.clone(), Some(Actor::Admin));
    assert_eq!(admin.details.len(), 3);

    let client = render_entry(row.clone(), Some(Actor::Client));
    assert_eq!(
        client.details,
        vec!["Client standard price: $12.00 → $13.00".to_string()]
    );

    let manufacturer = render_entry(row, Some(Actor::Manufacturer));
    assert_eq!(
        manufacturer.details,
        vec!["Manufacturer standard price: $7.00 → $8.00".to_string()]
    );
    assert_eq!(manufacturer.label, "Product updated");
    assert_eq!(manufacturer.user_name, "Dana Admin");
}

#[test]
fn routing_notes_follow_their_audience() {
    let mut row = audit_row("routing_note", Vec::new());
    row.old_value = Some("manufacturer_notes".into());
    row.new_value = Some("manufacturer".into());
    row.note = Some("client margin is 60%, quote low".into());

    let client = render_entry(row.clone(), Some(Actor::Client));
    assert_eq!(client.note, None);
    assert_eq!(client.label, "Routing note");

    let manufacturer = render_entry(row.clone(), Some(Actor::Manufacturer));
    assert_eq!(manufacturer.note.as_deref(), Some("client margin is 60%, quote low"));

    let admin = render_entry(row.clone(), Some(Actor::Admin));
    assert!(admin.note.is_some());

    row.old_value = Some("client_notes".into());
    assert!(render_entry(row.clone(), Some(Actor::Client)).note.is_some());
    assert_eq!(render_entry(row, Some(Actor::Manufacturer)).note, None);
}

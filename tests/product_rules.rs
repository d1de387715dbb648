use chrono::Utc;
use orderflow_api::{
    dto::{
        orders::{CreateOrderRequest, NewOrderItem, NewOrderProduct},
        routing::ProductUpdates,
    },
    error::AppError,
    models::OrderProduct,
    roles::Role,
    services::{
        inventory_service::{StockStatus, stock_status},
        product_service::{check_edit_permission, project_for, validate_media_type},
    },
    workflow::{Actor, ProductState, ProductStatus, RoutedTo},
};
use uuid::Uuid;
use validator::Validate;

fn state(routed_to: RoutedTo) -> ProductState {
    ProductState {
        status: ProductStatus::Pending,
        routed_to,
    }
}

fn priced_product() -> OrderProduct {
    OrderProduct {
        id: Uuid::new_v4(),
        order_id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        product_status: "pending".into(),
        routed_to: "admin".into(),
        is_locked: false,
        is_invoiced: false,
        requires_sample: false,
        requires_client_approval: false,
        manufacturer_standard_price: Some(700),
        manufacturer_bulk_price: Some(600),
        client_standard_price: Some(1200),
        client_bulk_price: Some(1000),
        admin_notes: Some("admin".into()),
        manufacturer_notes: Some("factory".into()),
        client_notes: Some("client".into()),
        internal_notes: Some("internal".into()),
        shipped_date: None,
        version: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn admin_may_edit_anything() {
    let updates = ProductUpdates {
        client_standard_price: Some(100),
        internal_notes: Some("x".into()),
        is_invoiced: Some(true),
        ..Default::default()
    };
    assert!(check_edit_permission(Actor::Admin, state(RoutedTo::Client), true, &updates).is_ok());
}

#[test]
fn manufacturer_edits_own_prices_while_routed_to_them() {
    let updates = ProductUpdates {
        manufacturer_standard_price: Some(900),
        manufacturer_notes: Some("lead time 3w".into()),
        ..Default::default()
    };
    assert!(
        check_edit_permission(
            Actor::Manufacturer,
            state(RoutedTo::Manufacturer),
            false,
            &updates
        )
        .is_ok()
    );

    let locked = check_edit_permission(
        Actor::Manufacturer,
        state(RoutedTo::Manufacturer),
        true,
        &updates,
    );
    assert!(matches!(locked, Err(AppError::BadRequest(_))));

    let elsewhere =
        check_edit_permission(Actor::Manufacturer, state(RoutedTo::Admin), false, &updates);
    assert!(matches!(elsewhere, Err(AppError::Forbidden)));

    let client_price = ProductUpdates {
        client_bulk_price: Some(1),
        ..Default::default()
    };
    let err = check_edit_permission(
        Actor::Manufacturer,
        state(RoutedTo::Manufacturer),
        false,
        &client_price,
    );
    assert!(matches!(err, Err(AppError::Forbidden)));
}

#[test]
fn client_may_only_leave_notes() {
    let notes = ProductUpdates {
        client_notes: Some("looks good".into()),
        ..Default::default()
    };
    assert!(check_edit_permission(Actor::Client, state(RoutedTo::Client), false, &notes).is_ok());
    assert!(matches!(
        check_edit_permission(Actor::Client, state(RoutedTo::Admin), false, &notes),
        Err(AppError::Forbidden)
    ));

    let price = ProductUpdates {
        client_standard_price: Some(1),
        ..Default::default()
    };
    assert!(matches!(
        check_edit_permission(Actor::Client, state(RoutedTo::Client), false, &price),
        Err(AppError::Forbidden)
    ));
}

#[test]
fn client_projection_hides_manufacturer_side() {
    let product = project_for(Some(Actor::Client), priced_product());
    assert_eq!(product.manufacturer_standard_price, None);
    assert_eq!(product.manufacturer_bulk_price, None);
    assert_eq!(product.admin_notes, None);
    assert_eq!(product.manufacturer_notes, None);
    assert_eq!(product.internal_notes, None);
    assert_eq!(product.client_standard_price, Some(1200));
    assert_eq!(product.client_notes.as_deref(), Some("client"));
}

#[test]
fn manufacturer_projection_hides_client_side() {
    let product = project_for(Some(Actor::Manufacturer), priced_product());
    assert_eq!(product.client_standard_price, None);
    assert_eq!(product.client_bulk_price, None);
    assert_eq!(product.client_notes, None);
    assert_eq!(product.internal_notes, None);
    assert_eq!(product.manufacturer_bulk_price, Some(600));
    assert_eq!(product.manufacturer_notes.as_deref(), Some("factory"));
}

#[test]
fn admin_and_read_only_roles_see_everything() {
    for actor in [Some(Actor::Admin), None] {
        let product = project_for(actor, priced_product());
        assert_eq!(product.internal_notes.as_deref(), Some("internal"));
        assert_eq!(product.manufacturer_standard_price, Some(700));
    }
}

#[test]
fn media_types() {
    assert!(validate_media_type("image/png").is_ok());
    assert!(validate_media_type("video/mp4").is_ok());
    assert!(validate_media_type("application/pdf").is_ok());
    assert!(matches!(
        validate_media_type("application/zip"),
        Err(AppError::BadRequest(_))
    ));
}

#[test]
fn stock_levels() {
    assert_eq!(stock_status(0, 5), StockStatus::OutOfStock);
    assert_eq!(stock_status(5, 5), StockStatus::LowStock);
    assert_eq!(stock_status(6, 5), StockStatus::InStock);
    assert_eq!(StockStatus::LowStock.to_string(), "low_stock");
}

fn order_request(quantity: i32) -> CreateOrderRequest {
    CreateOrderRequest {
        client_id: Uuid::new_v4(),
        manufacturer_id: Uuid::new_v4(),
        sub_manufacturer_id: None,
        products: vec![NewOrderProduct {
            product_id: Uuid::new_v4(),
            internal_notes: None,
            items: vec![NewOrderItem {
                variant_combo: "M / Navy".into(),
                quantity,
                notes: None,
            }],
        }],
    }
}

#[test]
fn new_orders_validate_their_items() {
    assert!(order_request(3).validate().is_ok());

    let err = order_request(0).validate().unwrap_err();
    assert!(err.to_string().contains("quantity"), "{err}");

    let empty = CreateOrderRequest {
        products: Vec::new(),
        ..order_request(1)
    };
    assert!(empty.validate().is_err());
}

#[test]
fn inventory_managers_get_the_manufacturer_view() {
    let role = Role::ManufacturerInventoryManager;
    assert_eq!(role.actor(), None);
    assert_eq!(role.viewer(), Some(Actor::Manufacturer));

    let viewed = project_for(role.viewer(), priced_product());
    assert_eq!(viewed.client_standard_price, None);
    assert_eq!(viewed.client_bulk_price, None);
    assert_eq!(viewed.admin_notes, None);
    assert_eq!(viewed.manufacturer_standard_price, Some(700));

    assert_eq!(Role::Warehouse.viewer(), None);
    assert_eq!(Role::Client.viewer(), Some(Actor::Client));
    assert_eq!(Role::OrderApprover.viewer(), Some(Actor::Admin));
}

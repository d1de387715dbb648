mod common;

use common::{
    count_audit, count_notifications, create_catalog_product, create_company, create_user,
    setup_state,
};
use orderflow_api::{
    dto::{
        history::HistoryLine,
        orders::{CreateOrderRequest, NewOrderItem, NewOrderProduct, UpdateSampleRequest},
        routing::{
            AddMediaRequest, ItemApprovalRequest, LockProductRequest, PendingEdit, ProductUpdates,
            RouteAllRequest, RouteProductRequest,
        },
    },
    error::{AppError, ErrorClass},
    roles::Role,
    services::{history_service, order_service, product_service, routing_service},
    workflow::{ApprovalStatus, RoutingAction},
};
use uuid::Uuid;

// Admin creates an order, routes one product through client review and locks the other,
// then the whole order goes through production and shipping in bulk.
#[tokio::test]
async fn order_products_move_between_parties() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let client_id = create_company(&state, "clients", Some("buyer@client.test")).await?;
    let manufacturer_id = create_company(&state, "manufacturers", Some("plant@factory.test")).await?;
    let other_manufacturer_id = create_company(&state, "manufacturers", None).await?;

    let admin = create_user(&state, Role::Admin, None, None).await?;
    let client = create_user(&state, Role::Client, Some(client_id), None).await?;
    let factory = create_user(&state, Role::Manufacturer, None, Some(manufacturer_id)).await?;
    let stranger = create_user(&state, Role::Manufacturer, None, Some(other_manufacturer_id)).await?;
    let keeper = create_user(
        &state,
        Role::ManufacturerInventoryManager,
        None,
        Some(manufacturer_id),
    )
    .await?;

    let hoodie = create_catalog_product(&state).await?;
    let cap = create_catalog_product(&state).await?;

    let created = order_service::create_order(
        &state,
        &admin,
        CreateOrderRequest {
            client_id,
            manufacturer_id,
            sub_manufacturer_id: None,
            products: vec![
                NewOrderProduct {
                    product_id: hoodie,
                    internal_notes: Some("rush".into()),
                    items: vec![NewOrderItem {
                        variant_combo: "Black / L".into(),
                        quantity: 40,
                        notes: None,
                    }],
                },
                NewOrderProduct {
                    product_id: cap,
                    internal_notes: None,
                    items: vec![],
                },
            ],
        },
    )
    .await?
    .data
    .expect("order detail");

    let number = created.order.order_number.strip_prefix("ORD-").expect("ORD- prefix");
    assert!(number.len() >= 4 && number.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(created.order.status, "pending");
    assert_eq!(created.products.len(), 2);

    let order_id = created.order.id;
    let product_id = |catalog: Uuid| {
        created
            .products
            .iter()
            .find(|p| p.product.product_id == catalog)
            .map(|p| p.product.id)
            .expect("order product")
    };
    let hoodie_line = product_id(hoodie);
    let cap_line = product_id(cap);

    // Admin -> client. No notification for sending to the client.
    let routed = routing_service::route_product(
        &state,
        &admin,
        hoodie_line,
        RouteProductRequest {
            action: RoutingAction::SendForApproval,
            notes: None,
            expected_version: Some(1),
        },
    )
    .await?
    .data
    .expect("routed product");
    assert_eq!(routed.product_status, "pending_client_approval");
    assert_eq!(routed.routed_to, "client");
    assert_eq!(routed.version, 2);
    assert_eq!(
        count_audit(&state, hoodie_line, "product_routed_send_for_approval").await?,
        1
    );
    assert_eq!(count_notifications(&state, admin.user_id).await?, 0);

    // The client only sees what is waiting for them, without internal notes.
    let client_view = order_service::get_order(&state, &client, order_id)
        .await?
        .data
        .expect("client view");
    assert_eq!(client_view.order.status, "awaiting_client");
    assert_eq!(client_view.products.len(), 1);
    assert_eq!(client_view.products[0].product.id, hoodie_line);
    assert_eq!(client_view.products[0].product.internal_notes, None);

    // Another manufacturer cannot see the order at all.
    let hidden = order_service::get_order(&state, &stranger, order_id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));

    // The factory cannot act on a product sitting with the client.
    let hoodie_item = created
        .products
        .iter()
        .find(|p| p.product.id == hoodie_line)
        .and_then(|p| p.items.first())
        .map(|i| i.id)
        .expect("hoodie item");
    let approve_item = || ItemApprovalRequest {
        status: ApprovalStatus::Approved,
    };
    let mockup = || AddMediaRequest {
        file_url: "https://cdn.example.test/mockup.png".into(),
        file_type: "image/png".into(),
    };
    let early_approval =
        product_service::update_item_approval(&state, &factory, hoodie_item, approve_item()).await;
    assert!(matches!(early_approval, Err(AppError::NotFound)));
    let early_media =
        product_service::add_product_media(&state, &factory, hoodie_line, mockup()).await;
    assert!(matches!(early_media, Err(AppError::NotFound)));

    // Client asks for changes; the note lands with the admin and the creator is notified.
    let blank = routing_service::route_product(
        &state,
        &client,
        hoodie_line,
        RouteProductRequest {
            action: RoutingAction::RequestChanges,
            notes: Some("   ".into()),
            expected_version: None,
        },
    )
    .await;
    assert!(matches!(blank, Err(AppError::BadRequest(_))));

    routing_service::route_product(
        &state,
        &client,
        hoodie_line,
        RouteProductRequest {
            action: RoutingAction::RequestChanges,
            notes: Some("bigger logo".into()),
            expected_version: Some(2),
        },
    )
    .await?;
    assert_eq!(
        count_audit(&state, hoodie_line, "product_routed_request_changes").await?,
        1
    );
    assert_eq!(count_audit(&state, hoodie_line, "routing_note").await?, 1);
    assert_eq!(count_notifications(&state, admin.user_id).await?, 1);

    let admin_view = order_service::get_order(&state, &admin, order_id)
        .await?
        .data
        .expect("admin view");
    let hoodie_detail = admin_view
        .products
        .iter()
        .find(|p| p.product.id == hoodie_line)
        .expect("hoodie line");
    assert_eq!(hoodie_detail.product.product_status, "revision_requested");
    assert_eq!(hoodie_detail.product.routed_to, "admin");
    assert_eq!(
        hoodie_detail.product.admin_notes.as_deref(),
        Some("Test client: bigger logo")
    );

    // Stale version.
    let stale = routing_service::route_product(
        &state,
        &admin,
        hoodie_line,
        RouteProductRequest {
            action: RoutingAction::SendToProduction,
            notes: None,
            expected_version: Some(1),
        },
    )
    .await;
    assert!(matches!(stale, Err(AppError::Conflict(_))));

    // Lock and unlock the cap; repeating a lock changes nothing.
    let lock = |locked| LockProductRequest {
        locked,
        expected_version: None,
    };
    let locked = routing_service::set_lock(&state, &admin, cap_line, lock(true))
        .await?
        .data
        .expect("locked");
    assert!(locked.is_locked);
    assert_eq!(locked.product_status, "in_production");

    let again = routing_service::set_lock(&state, &admin, cap_line, lock(true))
        .await?
        .data
        .expect("unchanged");
    assert_eq!(again.version, locked.version);

    let unlocked = routing_service::set_lock(&state, &admin, cap_line, lock(false))
        .await?
        .data
        .expect("unlocked");
    assert!(!unlocked.is_locked);
    assert_eq!(unlocked.product_status, "pending");
    assert_eq!(count_audit(&state, cap_line, "product_locked").await?, 1);
    assert_eq!(count_audit(&state, cap_line, "product_unlocked").await?, 1);

    let not_admin = routing_service::set_lock(&state, &factory, cap_line, lock(true)).await;
    assert!(matches!(not_admin, Err(AppError::Forbidden)));

    // Bulk: an edit for an unknown product fails alone, the rest go to production.
    let unknown = Uuid::new_v4();
    let bulk = routing_service::route_all(
        &state,
        &admin,
        order_id,
        RouteAllRequest {
            action: RoutingAction::SendToProduction,
            notes: Some("go".into()),
            edits: vec![
                PendingEdit {
                    order_product_id: cap_line,
                    expected_version: Some(unlocked.version),
                    updates: ProductUpdates {
                        client_standard_price: Some(1500),
                        ..Default::default()
                    },
                },
                PendingEdit {
                    order_product_id: unknown,
                    expected_version: None,
                    updates: ProductUpdates::default(),
                },
            ],
        },
    )
    .await?
    .data
    .expect("bulk result");
    assert_eq!(bulk.succeeded, 2);
    assert_eq!(bulk.failed, 1);
    let failed = bulk
        .results
        .iter()
        .find(|r| !r.success)
        .expect("failed item");
    assert_eq!(failed.order_product_id, unknown);
    assert_eq!(failed.error_class, Some(ErrorClass::NotFound));
    let cap_result = bulk
        .results
        .iter()
        .find(|r| r.order_product_id == cap_line)
        .and_then(|r| r.product.as_ref())
        .expect("cap routed");
    assert_eq!(cap_result.client_standard_price, Some(1500));
    assert_eq!(cap_result.product_status, "in_production");

    // Each party's history only carries notes and prices written for them.
    let admin_history = history_service::order_history(&state, &admin, order_id)
        .await?
        .data
        .expect("admin history");
    let notes = |items: &[HistoryLine]| -> Vec<String> {
        items.iter().filter_map(|l| l.note.clone()).collect()
    };
    let admin_notes = notes(&admin_history.items);
    assert!(admin_notes.iter().any(|n| n == "bigger logo"));
    assert!(admin_notes.iter().any(|n| n == "go"));

    let client_history = history_service::order_history(&state, &client, order_id)
        .await?
        .data
        .expect("client history");
    assert!(
        client_history
            .items
            .iter()
            .any(|l| l.action_type == "routing_note" && l.target_id == cap_line)
    );
    assert!(notes(&client_history.items).is_empty());

    let factory_history = history_service::order_history(&state, &factory, order_id)
        .await?
        .data
        .expect("factory history");
    let factory_notes = notes(&factory_history.items);
    assert!(factory_notes.iter().any(|n| n == "go"));
    assert!(!factory_notes.iter().any(|n| n == "bigger logo"));
    assert!(
        factory_history
            .items
            .iter()
            .flat_map(|l| l.details.iter())
            .all(|d| !d.starts_with("Client standard price"))
    );

    // Inventory staff at the factory read the order the way the factory does.
    let keeper_view = order_service::get_order(&state, &keeper, order_id)
        .await?
        .data
        .expect("keeper view");
    let keeper_cap = keeper_view
        .products
        .iter()
        .find(|p| p.product.id == cap_line)
        .expect("cap visible to factory staff");
    assert_eq!(keeper_cap.product.client_standard_price, None);
    assert_eq!(keeper_cap.product.admin_notes, None);
    assert_eq!(
        keeper_cap.product.manufacturer_notes.as_deref(),
        Some("Test admin: go")
    );
    let keeper_history = history_service::order_history(&state, &keeper, order_id)
        .await?
        .data
        .expect("keeper history");
    assert!(!notes(&keeper_history.items).iter().any(|n| n == "bigger logo"));

    // In production, the hoodie is the factory's to approve and annotate.
    let approved =
        product_service::update_item_approval(&state, &factory, hoodie_item, approve_item())
            .await?
            .data
            .expect("item");
    assert_eq!(approved.manufacturer_status, "approved");
    assert_eq!(approved.admin_status, "pending");
    let media = product_service::add_product_media(&state, &factory, hoodie_line, mockup())
        .await?
        .data
        .expect("media");
    assert_eq!(media.order_product_id, Some(hoodie_line));
    assert!(!media.is_sample);

    let wrong_party = routing_service::route_all(
        &state,
        &client,
        order_id,
        RouteAllRequest {
            action: RoutingAction::SendToProduction,
            notes: None,
            edits: vec![],
        },
    )
    .await;
    assert!(matches!(wrong_party, Err(AppError::Forbidden)));

    let outsider = routing_service::route_all(
        &state,
        &stranger,
        order_id,
        RouteAllRequest {
            action: RoutingAction::Shipped,
            notes: None,
            edits: vec![],
        },
    )
    .await;
    assert!(matches!(outsider, Err(AppError::NotFound)));

    // Manufacturer ships everything; the order rolls up to shipped.
    let shipped = routing_service::route_all(
        &state,
        &factory,
        order_id,
        RouteAllRequest {
            action: RoutingAction::Shipped,
            notes: None,
            edits: vec![],
        },
    )
    .await?
    .data
    .expect("shipped");
    assert_eq!(shipped.succeeded, 2);
    assert_eq!(shipped.failed, 0);
    for result in &shipped.results {
        let product = result.product.as_ref().expect("product");
        assert_eq!(product.product_status, "shipped");
        assert!(product.shipped_date.is_some());
        assert_eq!(product.client_standard_price, None);
    }

    let final_view = order_service::get_order(&state, &admin, order_id)
        .await?
        .data
        .expect("final view");
    assert_eq!(final_view.order.status, "shipped");

    let history = history_service::order_history(&state, &admin, order_id)
        .await?
        .data
        .expect("history");
    assert_eq!(
        history.items.last().map(|l| l.action_type.as_str()),
        Some("order_created")
    );
    assert!(
        history
            .items
            .iter()
            .any(|l| l.details.iter().any(|d| d == "Order status: In production → Shipped"))
    );

    Ok(())
}

#[tokio::test]
async fn requesting_a_sample_routes_the_order_sample_to_the_factory() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let client_id = create_company(&state, "clients", None).await?;
    let manufacturer_id = create_company(&state, "manufacturers", None).await?;
    let admin = create_user(&state, Role::Admin, None, None).await?;
    let factory = create_user(&state, Role::Manufacturer, None, Some(manufacturer_id)).await?;
    let tee = create_catalog_product(&state).await?;

    let created = order_service::create_order(
        &state,
        &admin,
        CreateOrderRequest {
            client_id,
            manufacturer_id,
            sub_manufacturer_id: None,
            products: vec![NewOrderProduct {
                product_id: tee,
                internal_notes: None,
                items: vec![],
            }],
        },
    )
    .await?
    .data
    .expect("order detail");
    let order_id = created.order.id;
    let line = created.products[0].product.id;
    assert!(!created.order.sample_required);

    let routed = routing_service::route_product(
        &state,
        &admin,
        line,
        RouteProductRequest {
            action: RoutingAction::RequestSample,
            notes: Some("swatch first".into()),
            expected_version: None,
        },
    )
    .await?
    .data
    .expect("routed product");
    assert_eq!(routed.product_status, "sample_requested");
    assert_eq!(routed.routed_to, "manufacturer");

    let order = order_service::get_order(&state, &factory, order_id)
        .await?
        .data
        .expect("factory view")
        .order;
    assert!(order.sample_required);
    assert_eq!(order.sample_routed_to.as_deref(), Some("manufacturer"));
    assert_eq!(order.sample_workflow_status.as_deref(), Some("requested"));

    let history = history_service::order_history(&state, &factory, order_id)
        .await?
        .data
        .expect("history");
    let routed_line = history
        .items
        .iter()
        .find(|l| l.action_type == "product_routed_request_sample")
        .expect("routing entry");
    assert!(
        routed_line
            .details
            .iter()
            .any(|d| d == "Order sample routed to: (none) → Manufacturer")
    );
    assert!(
        history
            .items
            .iter()
            .any(|l| l.note.as_deref() == Some("swatch first"))
    );

    // With the sample on its side, the factory may fill in the fee but not re-route it.
    let fee = order_service::update_sample(
        &state,
        &factory,
        order_id,
        UpdateSampleRequest {
            sample_fee: Some(2500),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("sample updated");
    assert_eq!(fee.sample_fee, Some(2500));

    let reroute = order_service::update_sample(
        &state,
        &factory,
        order_id,
        UpdateSampleRequest {
            sample_routed_to: Some("admin".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(reroute, Err(AppError::Forbidden)));

    Ok(())
}

// A product row with an unreadable status aborts the roll-up instead of being skipped.
#[tokio::test]
async fn unreadable_sibling_status_aborts_routing() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let client_id = create_company(&state, "clients", None).await?;
    let manufacturer_id = create_company(&state, "manufacturers", None).await?;
    let admin = create_user(&state, Role::Admin, None, None).await?;
    let polo = create_catalog_product(&state).await?;
    let scarf = create_catalog_product(&state).await?;

    let created = order_service::create_order(
        &state,
        &admin,
        CreateOrderRequest {
            client_id,
            manufacturer_id,
            sub_manufacturer_id: None,
            products: [polo, scarf]
                .into_iter()
                .map(|product_id| NewOrderProduct {
                    product_id,
                    internal_notes: None,
                    items: vec![],
                })
                .collect(),
        },
    )
    .await?
    .data
    .expect("order detail");
    let line = |catalog: Uuid| {
        created
            .products
            .iter()
            .find(|p| p.product.product_id == catalog)
            .map(|p| p.product.id)
            .expect("order product")
    };

    sqlx::query("UPDATE order_products SET product_status = 'paused' WHERE id = $1")
        .bind(line(scarf))
        .execute(&state.pool)
        .await?;

    let routed = routing_service::route_product(
        &state,
        &admin,
        line(polo),
        RouteProductRequest {
            action: RoutingAction::SendForApproval,
            notes: None,
            expected_version: None,
        },
    )
    .await;
    assert!(matches!(routed, Err(AppError::BadRequest(_))));

    let (status, routed_to): (String, String) =
        sqlx::query_as("SELECT product_status, routed_to FROM order_products WHERE id = $1")
            .bind(line(polo))
            .fetch_one(&state.pool)
            .await?;
    assert_eq!((status.as_str(), routed_to.as_str()), ("pending", "admin"));
    assert_eq!(
        count_audit(&state, line(polo), "product_routed_send_for_approval").await?,
        0
    );

    Ok(())
}

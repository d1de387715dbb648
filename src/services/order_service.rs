use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{AuditAction, AuditEvent, ChangeSet, TargetType, log_audit},
    dto::orders::{
        CompanyList, CreateOrderRequest, OrderDetail, OrderList, ProductDetail,
        UpdatePaymentRequest, UpdateSampleRequest,
    },
    entity::{
        Clients, Manufacturers,
        clients::Column as ClientCol,
        manufacturers::Column as ManufacturerCol,
        order_items::{ActiveModel as ItemActive, Column as ItemCol, Entity as OrderItems},
        order_media::{Column as MediaCol, Entity as OrderMedia},
        order_products::{ActiveModel as ProductActive, Column as ProductCol, Entity as OrderProducts},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as CatalogCol, Entity as CatalogProducts},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Company, Order, OrderItem, OrderMedia as Media, OrderProduct},
    response::{ApiResponse, Meta},
    roles::Role,
    routes::params::{OrderListQuery, SortOrder},
    services::{
        product_service::project_for,
        routing_service::{lock_order, product_state},
    },
    state::AppState,
    workflow::{ApprovalStatus, OrderStatus, ProductStatus, RoutedTo, visible_to},
};

/// Whether `user` may see `order` at all. Orders outside the caller's scope are reported
/// as missing.
pub fn ensure_order_access(user: &AuthUser, order: &OrderModel) -> AppResult<()> {
    let allowed = if user.role == Role::Client {
        user.client_id == Some(order.client_id)
    } else if user.role.is_manufacturer_side() {
        user.manufacturer_id.is_some_and(|id| {
            id == order.manufacturer_id || Some(id) == order.sub_manufacturer_id
        })
    } else {
        true
    };
    if allowed { Ok(()) } else { Err(AppError::NotFound) }
}

fn scope_condition(user: &AuthUser) -> Condition {
    if user.role == Role::Client {
        // A client account without a company sees nothing.
        let id = user.client_id.unwrap_or_else(Uuid::nil);
        Condition::all().add(OrderCol::ClientId.eq(id))
    } else if user.role.is_manufacturer_side() {
        let id = user.manufacturer_id.unwrap_or_else(Uuid::nil);
        Condition::any()
            .add(OrderCol::ManufacturerId.eq(id))
            .add(OrderCol::SubManufacturerId.eq(id))
    } else {
        Condition::all()
    }
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(scope_condition(user));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::Status.eq(status.to_string()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    if !user.role.can_create_orders() {
        return Err(AppError::Forbidden);
    }
    payload.validate()?;

    let txn = state.orm.begin().await?;

    if Clients::find_by_id(payload.client_id).one(&txn).await?.is_none() {
        return Err(AppError::BadRequest("unknown client".into()));
    }
    let manufacturer_ids: Vec<Uuid> = std::iter::once(payload.manufacturer_id)
        .chain(payload.sub_manufacturer_id)
        .collect();
    let known = Manufacturers::find()
        .filter(ManufacturerCol::Id.is_in(manufacturer_ids.clone()))
        .count(&txn)
        .await?;
    if known as usize != manufacturer_ids.len() {
        return Err(AppError::BadRequest("unknown manufacturer".into()));
    }
    let catalog_ids: Vec<Uuid> = payload.products.iter().map(|p| p.product_id).collect();
    let found = CatalogProducts::find()
        .filter(CatalogCol::Id.is_in(catalog_ids.clone()))
        .count(&txn)
        .await?;
    let mut distinct = catalog_ids.clone();
    distinct.sort();
    distinct.dedup();
    if found as usize != distinct.len() {
        return Err(AppError::BadRequest("unknown product".into()));
    }

    let order_number = next_order_number(&txn).await?;
    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number),
        status: Set(OrderStatus::Pending.to_string()),
        is_paid: Set(false),
        client_id: Set(payload.client_id),
        manufacturer_id: Set(payload.manufacturer_id),
        sub_manufacturer_id: Set(payload.sub_manufacturer_id),
        created_by: Set(user.user_id),
        sample_required: Set(false),
        sample_fee: Set(None),
        sample_eta: Set(None),
        sample_status: Set(None),
        sample_notes: Set(None),
        sample_routed_to: Set(None),
        sample_workflow_status: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    for new_product in payload.products {
        let product = ProductActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(new_product.product_id),
            product_status: Set(ProductStatus::Pending.to_string()),
            routed_to: Set(RoutedTo::Admin.to_string()),
            is_locked: Set(false),
            is_invoiced: Set(false),
            requires_sample: Set(false),
            requires_client_approval: Set(false),
            manufacturer_standard_price: Set(None),
            manufacturer_bulk_price: Set(None),
            client_standard_price: Set(None),
            client_bulk_price: Set(None),
            admin_notes: Set(None),
            manufacturer_notes: Set(None),
            client_notes: Set(None),
            internal_notes: Set(new_product.internal_notes),
            shipped_date: Set(None),
            version: Set(1),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        for item in new_product.items {
            ItemActive {
                id: Set(Uuid::new_v4()),
                order_product_id: Set(product.id),
                variant_combo: Set(item.variant_combo),
                quantity: Set(item.quantity),
                notes: Set(item.notes),
                admin_status: Set(ApprovalStatus::Pending.to_string()),
                manufacturer_status: Set(ApprovalStatus::Pending.to_string()),
                standard_price: Set(None),
                bulk_price: Set(None),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await?;
        }
    }

    log_audit(
        &txn,
        user,
        AuditEvent::new(AuditAction::OrderCreated, TargetType::Order, order.id)
            .order(order.id)
            .values("", order.order_number.clone()),
    )
    .await?;

    let detail = load_detail(&txn, user, order).await?;
    txn.commit().await?;

    tracing::info!(order_number = %detail.order.order_number, "order created");
    Ok(ApiResponse::success("Order created", detail, Some(Meta::empty())))
}

async fn next_order_number<C: ConnectionTrait>(conn: &C) -> AppResult<String> {
    let row = conn
        .query_one(Statement::from_string(
            DbBackend::Postgres,
            "SELECT nextval('order_number_seq') AS n",
        ))
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order number sequence returned nothing")))?;
    let n: i64 = row.try_get("", "n")?;
    Ok(format_order_number(n))
}

pub fn format_order_number(n: i64) -> String {
    format!("ORD-{:04}", n)
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_order_access(user, &order)?;

    let detail = load_detail(&state.orm, user, order).await?;
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

/// Assemble the order graph as `user` is allowed to see it.
pub(crate) async fn load_detail<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    order: OrderModel,
) -> AppResult<OrderDetail> {
    let viewer = user.viewer();
    let client = Clients::find_by_id(order.client_id).one(conn).await?.map(Company::from);
    let manufacturer = Manufacturers::find_by_id(order.manufacturer_id)
        .one(conn)
        .await?
        .map(Company::from);

    let rows = OrderProducts::find()
        .filter(ProductCol::OrderId.eq(order.id))
        .find_also_related(CatalogProducts)
        .order_by_asc(ProductCol::CreatedAt)
        .all(conn)
        .await?;

    let mut products = Vec::with_capacity(rows.len());
    for (product, catalog) in rows {
        if !visible_to(viewer, product_state(&product)?) {
            continue;
        }
        let items = OrderItems::find()
            .filter(ItemCol::OrderProductId.eq(product.id))
            .order_by_asc(ItemCol::CreatedAt)
            .all(conn)
            .await?
            .into_iter()
            .map(OrderItem::from)
            .collect();
        let media = OrderMedia::find()
            .filter(MediaCol::OrderProductId.eq(product.id))
            .order_by_asc(MediaCol::CreatedAt)
            .all(conn)
            .await?
            .into_iter()
            .map(Media::from)
            .collect();
        products.push(ProductDetail {
            product: project_for(viewer, OrderProduct::from(product)),
            product_name: catalog.map(|c| c.name).unwrap_or_default(),
            items,
            media,
        });
    }

    let sample_media = OrderMedia::find()
        .filter(MediaCol::OrderId.eq(order.id))
        .filter(MediaCol::IsSample.eq(true))
        .order_by_asc(MediaCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(Media::from)
        .collect();

    Ok(OrderDetail {
        order: Order::from(order),
        client,
        manufacturer,
        products,
        sample_media,
    })
}

/// Edit the order's sample side-track. The manufacturer side may fill in fee, ETA,
/// status and notes while the sample is with them.
pub async fn update_sample(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateSampleRequest,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id).await?;
    ensure_order_access(user, &order)?;

    if !user.role.is_admin() {
        let with_manufacturer =
            order.sample_routed_to.as_deref().and_then(|s| s.parse::<RoutedTo>().ok())
                == Some(RoutedTo::Manufacturer);
        let touches_routing = payload.sample_required.is_some()
            || payload.sample_routed_to.is_some()
            || payload.sample_workflow_status.is_some();
        if !user.role.is_manufacturer_side() || !with_manufacturer || touches_routing {
            return Err(AppError::Forbidden);
        }
    }
    if payload.sample_fee.is_some_and(|fee| fee < 0) {
        return Err(AppError::BadRequest("sample fee cannot be negative".into()));
    }
    let routed_to = payload
        .sample_routed_to
        .as_deref()
        .map(str::parse::<RoutedTo>)
        .transpose()?
        .map(|r| r.to_string());

    let mut changes = ChangeSet::new();
    let mut active: OrderActive = order.clone().into();
    if let Some(required) = payload.sample_required {
        changes.record("sample_required", &order.sample_required, &required);
        active.sample_required = Set(required);
    }
    if let Some(fee) = payload.sample_fee {
        changes.record("sample_fee", &order.sample_fee, &Some(fee));
        active.sample_fee = Set(Some(fee));
    }
    if let Some(eta) = payload.sample_eta {
        changes.record("sample_eta", &order.sample_eta, &Some(eta));
        active.sample_eta = Set(Some(eta));
    }
    if let Some(status) = payload.sample_status {
        changes.record("sample_status", &order.sample_status, &Some(status.clone()));
        active.sample_status = Set(Some(status));
    }
    if let Some(notes) = payload.sample_notes {
        changes.record("sample_notes", &order.sample_notes, &Some(notes.clone()));
        active.sample_notes = Set(Some(notes));
    }
    if let Some(routed_to) = routed_to {
        changes.record("sample_routed_to", &order.sample_routed_to, &Some(routed_to.clone()));
        active.sample_routed_to = Set(Some(routed_to));
    }
    if let Some(workflow) = payload.sample_workflow_status {
        changes.record(
            "sample_workflow_status",
            &order.sample_workflow_status,
            &Some(workflow.clone()),
        );
        active.sample_workflow_status = Set(Some(workflow));
    }

    if changes.is_empty() {
        txn.commit().await?;
        return Ok(ApiResponse::success("Unchanged", Order::from(order), Some(Meta::empty())));
    }

    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    log_audit(
        &txn,
        user,
        AuditEvent::new(AuditAction::SampleUpdated, TargetType::Order, updated.id)
            .order(updated.id)
            .changes(changes.into_vec()),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Sample updated", Order::from(updated), Some(Meta::empty())))
}

pub async fn update_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePaymentRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id).await?;

    if order.is_paid == payload.is_paid {
        txn.commit().await?;
        return Ok(ApiResponse::success("Unchanged", Order::from(order), Some(Meta::empty())));
    }

    let mut changes = ChangeSet::new();
    changes.record("is_paid", &order.is_paid, &payload.is_paid);
    let mut active: OrderActive = order.into();
    active.is_paid = Set(payload.is_paid);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    log_audit(
        &txn,
        user,
        AuditEvent::new(AuditAction::PaymentUpdated, TargetType::Order, updated.id)
            .order(updated.id)
            .changes(changes.into_vec()),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Payment recorded",
        Order::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn list_clients(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CompanyList>> {
    ensure_admin(user)?;
    let items: Vec<Company> = Clients::find()
        .order_by_asc(ClientCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Company::from)
        .collect();
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Clients", CompanyList { items }, Some(meta)))
}

pub async fn list_manufacturers(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CompanyList>> {
    ensure_admin(user)?;
    let items: Vec<Company> = Manufacturers::find()
        .order_by_asc(ManufacturerCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Company::from)
        .collect();
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Manufacturers", CompanyList { items }, Some(meta)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, client_id: Option<Uuid>, manufacturer_id: Option<Uuid>) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            name: "Test".into(),
            email: "test@example.com".into(),
            role,
            client_id,
            manufacturer_id,
        }
    }

    fn order(client_id: Uuid, manufacturer_id: Uuid, sub: Option<Uuid>) -> OrderModel {
        let now = Utc::now();
        OrderModel {
            id: Uuid::new_v4(),
            order_number: format_order_number(1),
            status: "pending".into(),
            is_paid: false,
            client_id,
            manufacturer_id,
            sub_manufacturer_id: sub,
            created_by: Uuid::new_v4(),
            sample_required: false,
            sample_fee: None,
            sample_eta: None,
            sample_status: None,
            sample_notes: None,
            sample_routed_to: None,
            sample_workflow_status: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn order_numbers_are_zero_padded() {
        assert_eq!(format_order_number(1), "ORD-0001");
        assert_eq!(format_order_number(12345), "ORD-12345");
    }

    #[test]
    fn access_is_scoped_by_company() {
        let (client, maker, sub) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let o = order(client, maker, Some(sub));

        assert!(ensure_order_access(&user(Role::Admin, None, None), &o).is_ok());
        assert!(ensure_order_access(&user(Role::Warehouse, None, None), &o).is_ok());
        assert!(ensure_order_access(&user(Role::Client, Some(client), None), &o).is_ok());
        assert!(ensure_order_access(&user(Role::SubManufacturer, None, Some(sub)), &o).is_ok());

        let other = Some(Uuid::new_v4());
        assert!(matches!(
            ensure_order_access(&user(Role::Client, other, None), &o),
            Err(AppError::NotFound)
        ));
        assert!(ensure_order_access(&user(Role::Manufacturer, None, other), &o).is_err());
        assert!(ensure_order_access(&user(Role::Manufacturer, None, None), &o).is_err());
    }
}

//! Persisting routing transitions.
//!
//! Each operation runs inside one transaction: the order and product rows are locked,
//! the optional version check is applied, then the product update, order roll-up, audit
//! entries and notifications are written together. Bulk routing gives every product its
//! own savepoint so one failure does not undo the others.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, AuditEvent, ChangeSet, TargetType, log_audit},
    dto::routing::{
        LockProductRequest, RouteAllRequest, RouteAllResponse, RouteItemResult,
        RouteProductRequest,
    },
    entity::{
        order_products::{
            ActiveModel as ProductActive, Column as ProductCol, Entity as OrderProducts,
            Model as ProductModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::Entity as CatalogProducts,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::OrderProduct,
    response::{ApiResponse, Meta},
    services::{
        notification_service::{NewNotification, notify},
        order_service::ensure_order_access,
        product_service::{apply_updates, project_for},
    },
    state::AppState,
    workflow::{
        Actor, NoteField, ProductState, ProductStatus, RoutedTo, RoutingAction, TransitionPlan,
        plan_transition, rollup_order_status, stage_for_lock, visible_to,
    },
};

/// Sample workflow status set on the order when a sample is requested.
const SAMPLE_REQUESTED: &str = "requested";

pub async fn route_product(
    state: &AppState,
    user: &AuthUser,
    order_product_id: Uuid,
    payload: RouteProductRequest,
) -> AppResult<ApiResponse<OrderProduct>> {
    let actor = user.require_actor()?;
    let txn = state.orm.begin().await?;

    let product = route_in_txn(
        &txn,
        user,
        actor,
        order_product_id,
        payload.expected_version,
        payload.action,
        payload.notes.as_deref(),
    )
    .await?;

    txn.commit().await?;

    tracing::info!(
        order_product_id = %product.id,
        action = %payload.action,
        status = %product.product_status,
        routed_to = %product.routed_to,
        "product routed"
    );

    Ok(ApiResponse::success(
        "Product routed",
        project_for(Some(actor), OrderProduct::from(product)),
        Some(Meta::empty()),
    ))
}

/// "Save all & route": persist pending edits, then apply one action to every product of
/// the order the caller can see.
pub async fn route_all(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: RouteAllRequest,
) -> AppResult<ApiResponse<RouteAllResponse>> {
    let actor = user.require_actor()?;
    if payload.action.actor() != actor {
        return Err(AppError::Forbidden);
    }

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, order_id).await?;
    ensure_order_access(user, &order)?;

    let products = OrderProducts::find()
        .filter(ProductCol::OrderId.eq(order.id))
        .order_by_asc(ProductCol::CreatedAt)
        .all(&txn)
        .await?;

    let mut edits: HashMap<Uuid, _> = payload
        .edits
        .into_iter()
        .map(|edit| (edit.order_product_id, edit))
        .collect();

    let mut results = Vec::new();
    for product in products {
        let current = product_state(&product)?;
        if !visible_to(Some(actor), current) {
            continue;
        }
        let edit = edits.remove(&product.id);
        let expected_version = edit.as_ref().and_then(|e| e.expected_version);

        let savepoint = txn.begin().await?;
        let outcome = async {
            if let Some(edit) = edit.as_ref() {
                let locked = lock_product(&savepoint, product.id).await?;
                check_version(expected_version, locked.version)?;
                apply_updates(&savepoint, user, actor, locked, &edit.updates).await?;
            }
            // Edits already consumed the caller's version; route the saved row.
            route_in_txn(
                &savepoint,
                user,
                actor,
                product.id,
                None,
                payload.action,
                payload.notes.as_deref(),
            )
            .await
        }
        .await;

        match outcome {
            Ok(updated) => {
                savepoint.commit().await?;
                results.push(RouteItemResult {
                    order_product_id: updated.id,
                    success: true,
                    error: None,
                    error_class: None,
                    product: Some(project_for(Some(actor), OrderProduct::from(updated))),
                });
            }
            Err(err) => {
                savepoint.rollback().await?;
                tracing::warn!(order_product_id = %product.id, error = %err, "bulk route item failed");
                results.push(failed_item(product.id, &err));
            }
        }
    }

    // Edits for products that are not on this order or not visible to the caller.
    for (id, _) in edits {
        results.push(failed_item(id, &AppError::NotFound));
    }

    txn.commit().await?;

    let succeeded = results.iter().filter(|r| r.success).count();
    let failed = results.len() - succeeded;
    tracing::info!(%order_id, action = %payload.action, succeeded, failed, "bulk route finished");

    let message = if failed == 0 {
        "All products routed"
    } else {
        "Some products could not be routed"
    };
    Ok(ApiResponse::success(
        message,
        RouteAllResponse {
            succeeded,
            failed,
            results,
        },
        Some(Meta::empty()),
    ))
}

/// Admin lock toggle. Locking moves the product into production, unlocking back to
/// pending; asking for the current lock state changes nothing.
pub async fn set_lock(
    state: &AppState,
    user: &AuthUser,
    order_product_id: Uuid,
    payload: LockProductRequest,
) -> AppResult<ApiResponse<OrderProduct>> {
    if user.require_actor()? != Actor::Admin {
        return Err(AppError::Forbidden);
    }

    let txn = state.orm.begin().await?;
    let (order, product) = lock_order_and_product(&txn, order_product_id).await?;
    ensure_order_access(user, &order)?;
    check_version(payload.expected_version, product.version)?;

    if product.is_locked == payload.locked {
        txn.commit().await?;
        return Ok(ApiResponse::success(
            "Lock unchanged",
            OrderProduct::from(product),
            Some(Meta::empty()),
        ));
    }

    let old_status = product.product_status.clone();
    let new_status = stage_for_lock(payload.locked).to_string();

    let mut changes = ChangeSet::new();
    changes.record("is_locked", &product.is_locked, &payload.locked);
    changes.record("product_status", &old_status, &new_status);

    let mut active: ProductActive = product.clone().into();
    active.is_locked = Set(payload.locked);
    active.product_status = Set(new_status.clone());
    active.version = Set(product.version + 1);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    sync_order(&txn, order, None, &mut changes).await?;

    let action = if payload.locked {
        AuditAction::ProductLocked
    } else {
        AuditAction::ProductUnlocked
    };
    log_audit(
        &txn,
        user,
        AuditEvent::new(action, TargetType::OrderProduct, updated.id)
            .order(updated.order_id)
            .values(old_status, new_status)
            .changes(changes.into_vec()),
    )
    .await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        if payload.locked { "Product locked" } else { "Product unlocked" },
        OrderProduct::from(updated),
        Some(Meta::empty()),
    ))
}

/// Apply one routing action on `conn` and write its audit trail and notifications.
pub(crate) async fn route_in_txn<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    actor: Actor,
    order_product_id: Uuid,
    expected_version: Option<i32>,
    action: RoutingAction,
    notes: Option<&str>,
) -> AppResult<ProductModel> {
    let (order, product) = lock_order_and_product(conn, order_product_id).await?;
    ensure_order_access(user, &order)?;
    check_version(expected_version, product.version)?;

    let plan = plan_transition(actor, action, product_state(&product)?, notes)?;

    let mut changes = ChangeSet::new();
    let updated = apply_plan(conn, user, product, &plan, &mut changes).await?;
    let order = sync_order(conn, order, plan.sample_routed_to, &mut changes).await?;

    log_audit(
        conn,
        user,
        AuditEvent::new(
            AuditAction::ProductRouted(action),
            TargetType::OrderProduct,
            updated.id,
        )
        .order(order.id)
        .values(plan.from.status.to_string(), plan.to.status.to_string())
        .changes(changes.into_vec()),
    )
    .await?;

    if let Some((field, note)) = plan.note.as_ref() {
        log_audit(
            conn,
            user,
            AuditEvent::new(AuditAction::RoutingNote, TargetType::OrderProduct, updated.id)
                .order(order.id)
                .values(field.column_name(), plan.to.routed_to.to_string())
                .note(note.clone()),
        )
        .await?;
    }

    if plan.notify_order_creator {
        let product_name = CatalogProducts::find_by_id(updated.product_id)
            .one(conn)
            .await?
            .map(|p| p.name)
            .unwrap_or_else(|| "Product".to_string());
        notify(
            conn,
            NewNotification {
                user_id: order.created_by,
                order_id: Some(order.id),
                order_product_id: Some(updated.id),
                kind: action.to_string(),
                message: notification_message(action, &user.name, &product_name, &order.order_number),
            },
        )
        .await?;
    }

    Ok(updated)
}

async fn apply_plan<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    product: ProductModel,
    plan: &TransitionPlan,
    changes: &mut ChangeSet,
) -> AppResult<ProductModel> {
    let now = Utc::now();
    let mut active: ProductActive = product.clone().into();

    changes.record("product_status", &plan.from.status, &plan.to.status);
    changes.record("routed_to", &plan.from.routed_to, &plan.to.routed_to);
    active.product_status = Set(plan.to.status.to_string());
    active.routed_to = Set(plan.to.routed_to.to_string());

    if let Some(lock) = plan.lock {
        changes.record("is_locked", &product.is_locked, &lock);
        active.is_locked = Set(lock);
    }
    if plan.requires_sample {
        changes.record("requires_sample", &product.requires_sample, &true);
        active.requires_sample = Set(true);
    }
    if plan.requires_client_approval {
        changes.record(
            "requires_client_approval",
            &product.requires_client_approval,
            &true,
        );
        active.requires_client_approval = Set(true);
    }
    if plan.stamp_shipped_date {
        active.shipped_date = Set(Some(now.into()));
    }

    if let Some((field, note)) = plan.note.as_ref() {
        match field {
            NoteField::AdminNotes => {
                active.admin_notes = Set(Some(append_note(product.admin_notes.clone(), &user.name, note)))
            }
            NoteField::ManufacturerNotes => {
                active.manufacturer_notes = Set(Some(append_note(
                    product.manufacturer_notes.clone(),
                    &user.name,
                    note,
                )))
            }
            NoteField::ClientNotes => {
                active.client_notes = Set(Some(append_note(product.client_notes.clone(), &user.name, note)))
            }
        }
    }

    active.version = Set(product.version + 1);
    active.updated_at = Set(now.into());
    Ok(active.update(conn).await?)
}

/// Recompute the order status from its products and apply order-level sample routing.
/// Differences are added to `changes` so they travel with the triggering audit entry.
pub(crate) async fn sync_order<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
    sample_routed_to: Option<RoutedTo>,
    changes: &mut ChangeSet,
) -> AppResult<OrderModel> {
    let statuses: Vec<_> = OrderProducts::find()
        .select_only()
        .column(ProductCol::ProductStatus)
        .filter(ProductCol::OrderId.eq(order.id))
        .into_tuple::<String>()
        .all(conn)
        .await?
        .iter()
        .map(|s| s.parse::<ProductStatus>())
        .collect::<Result<_, _>>()?;

    let mut active: OrderActive = order.clone().into();
    let mut dirty = false;

    if let Some(status) = rollup_order_status(&statuses) {
        let status = status.to_string();
        if status != order.status {
            changes.record("order.status", &order.status, &status);
            active.status = Set(status);
            dirty = true;
        }
    }

    if let Some(target) = sample_routed_to {
        let target = Some(target.to_string());
        let workflow = Some(SAMPLE_REQUESTED.to_string());
        changes.record("order.sample_required", &order.sample_required, &true);
        changes.record("order.sample_routed_to", &order.sample_routed_to, &target);
        changes.record(
            "order.sample_workflow_status",
            &order.sample_workflow_status,
            &workflow,
        );
        active.sample_required = Set(true);
        active.sample_routed_to = Set(target);
        active.sample_workflow_status = Set(workflow);
        dirty = true;
    }

    if !dirty {
        return Ok(order);
    }
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

pub(crate) async fn lock_product<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ProductModel> {
    OrderProducts::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Row-locks an order product together with its order. The order is always locked
/// first, matching `route_all` and every other writer.
pub(crate) async fn lock_order_and_product<C: ConnectionTrait>(
    conn: &C,
    order_product_id: Uuid,
) -> AppResult<(OrderModel, ProductModel)> {
    let order_id = OrderProducts::find_by_id(order_product_id)
        .select_only()
        .column(ProductCol::OrderId)
        .into_tuple::<Uuid>()
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    let order = lock_order(conn, order_id).await?;
    let product = lock_product(conn, order_product_id).await?;
    Ok((order, product))
}

pub(crate) async fn lock_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find()
        .filter(OrderCol::Id.eq(id))
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub(crate) fn check_version(expected: Option<i32>, actual: i32) -> AppResult<()> {
    match expected {
        Some(expected) if expected != actual => Err(AppError::Conflict(format!(
            "product was modified (version {actual}, expected {expected}); reload and retry"
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn product_state(product: &ProductModel) -> AppResult<ProductState> {
    Ok(ProductState {
        status: product.product_status.parse()?,
        routed_to: product.routed_to.parse()?,
    })
}

fn append_note(existing: Option<String>, author: &str, note: &str) -> String {
    let line = format!("{author}: {note}");
    match existing.filter(|e| !e.trim().is_empty()) {
        Some(existing) => format!("{existing}\n{line}"),
        None => line,
    }
}

fn failed_item(order_product_id: Uuid, err: &AppError) -> RouteItemResult {
    RouteItemResult {
        order_product_id,
        success: false,
        error: Some(err.to_string()),
        error_class: Some(err.class()),
        product: None,
    }
}

fn notification_message(
    action: RoutingAction,
    actor_name: &str,
    product_name: &str,
    order_number: &str,
) -> String {
    match action {
        RoutingAction::SendToAdmin => {
            format!("{actor_name} sent {product_name} on {order_number} back for admin review")
        }
        RoutingAction::Approve => {
            format!("{actor_name} approved {product_name} on {order_number}")
        }
        RoutingAction::RequestChanges => {
            format!("{actor_name} requested changes to {product_name} on {order_number}")
        }
        other => format!("{actor_name} routed {product_name} on {order_number}: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_accumulate_one_line_per_author() {
        let first = append_note(None, "Ana", "needs gold thread");
        let second = append_note(Some(first), "Factory", "quoted");
        assert_eq!(second, "Ana: needs gold thread\nFactory: quoted");
    }

    #[test]
    fn stale_version_is_a_conflict() {
        assert!(check_version(None, 4).is_ok());
        assert!(check_version(Some(4), 4).is_ok());
        let err = check_version(Some(3), 4).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(err.is_retryable());
    }
}

//! Manufacturer-held accessory stock, kept per client and accessory type.
//!
//! Manufacturer-side users only ever see and touch their own manufacturer's rows; admins
//! work across manufacturers. Free text is translated to English on the way in and
//! optionally rendered back in the reader's language on the way out.

use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{AuditAction, AuditEvent, ChangeSet, TargetType, log_audit},
    dto::inventory::{
        AccessoryTypeList, AccessoryTypeQuery, CreateAccessoryTypeRequest, CreateInventoryRequest,
        InventoryAdjustRequest, InventoryList, InventoryQuery, UpdateAccessoryTypeRequest,
        UpdateInventoryRequest,
    },
    entity::{
        Clients, Manufacturers,
        accessory_types::{
            ActiveModel as TypeActive, Column as TypeCol, Entity as AccessoryTypes,
            Model as TypeModel,
        },
        inventory::{
            ActiveModel as StockActive, Column as StockCol, Entity as Inventory,
            Model as StockModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_inventory_manager},
    models::{AccessoryType, InventoryItem},
    response::{ApiResponse, Meta},
    state::AppState,
    translate::{for_display, for_storage},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

pub fn stock_status(quantity_on_hand: i32, low_stock_threshold: i32) -> StockStatus {
    if quantity_on_hand <= 0 {
        StockStatus::OutOfStock
    } else if quantity_on_hand <= low_stock_threshold {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}

/// Manufacturer a write applies to: the caller's own for manufacturer-side users,
/// the requested one for admins.
fn resolve_manufacturer(user: &AuthUser, requested: Option<Uuid>) -> AppResult<Uuid> {
    if user.role.is_manufacturer_side() {
        let own = user.manufacturer_id.ok_or(AppError::Forbidden)?;
        if requested.is_some_and(|id| id != own) {
            return Err(AppError::Forbidden);
        }
        return Ok(own);
    }
    requested.ok_or_else(|| AppError::BadRequest("manufacturer_id is required".into()))
}

/// Rows of other manufacturers do not exist for manufacturer-side users.
fn ensure_scope(user: &AuthUser, manufacturer_id: Uuid) -> AppResult<()> {
    if user.role.is_manufacturer_side() && user.manufacturer_id != Some(manufacturer_id) {
        return Err(AppError::NotFound);
    }
    Ok(())
}

fn list_filter(user: &AuthUser, requested: Option<Uuid>) -> AppResult<Option<Uuid>> {
    if user.role.is_manufacturer_side() {
        return resolve_manufacturer(user, requested).map(Some);
    }
    Ok(requested)
}

async fn render_type(state: &AppState, model: TypeModel, lang: Option<&str>) -> AccessoryType {
    let mut out = AccessoryType::from(model);
    if lang.is_some() {
        out.name = for_display(state.translator.as_ref(), &out.name, lang).await;
        if let Some(description) = out.description.take() {
            out.description =
                Some(for_display(state.translator.as_ref(), &description, lang).await);
        }
    }
    out
}

async fn render_stock(state: &AppState, model: StockModel, lang: Option<&str>) -> InventoryItem {
    let mut out = InventoryItem::from(model);
    if lang.is_some() {
        if let Some(notes) = out.notes.take() {
            out.notes = Some(for_display(state.translator.as_ref(), &notes, lang).await);
        }
    }
    out
}

pub async fn list_accessory_types(
    state: &AppState,
    user: &AuthUser,
    query: AccessoryTypeQuery,
) -> AppResult<ApiResponse<AccessoryTypeList>> {
    ensure_inventory_manager(user)?;
    let mut finder = AccessoryTypes::find().order_by_asc(TypeCol::Name);
    if let Some(manufacturer_id) = list_filter(user, query.manufacturer_id)? {
        finder = finder.filter(TypeCol::ManufacturerId.eq(manufacturer_id));
    }

    let mut items = Vec::new();
    for model in finder.all(&state.orm).await? {
        items.push(render_type(state, model, query.lang.as_deref()).await);
    }
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success(
        "Accessory types",
        AccessoryTypeList { items },
        Some(meta),
    ))
}

pub async fn create_accessory_type(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAccessoryTypeRequest,
) -> AppResult<ApiResponse<AccessoryType>> {
    ensure_inventory_manager(user)?;
    payload.validate()?;
    let manufacturer_id = resolve_manufacturer(user, payload.manufacturer_id)?;
    if Manufacturers::find_by_id(manufacturer_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("unknown manufacturer".into()));
    }

    let name = for_storage(state.translator.as_ref(), payload.name.trim()).await;
    let description = match payload.description.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(d) => Some(for_storage(state.translator.as_ref(), d).await.text),
        None => None,
    };

    let txn = state.orm.begin().await?;
    let created = TypeActive {
        id: Set(Uuid::new_v4()),
        manufacturer_id: Set(manufacturer_id),
        name: Set(name.text),
        description: Set(description),
        unit: Set(payload.unit),
        source_language: Set(name.source_language),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    log_audit(
        &txn,
        user,
        AuditEvent::new(
            AuditAction::AccessoryTypeCreated,
            TargetType::AccessoryType,
            created.id,
        )
        .values("", created.name.clone()),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Accessory type created",
        AccessoryType::from(created),
        Some(Meta::empty()),
    ))
}

pub async fn update_accessory_type(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAccessoryTypeRequest,
) -> AppResult<ApiResponse<AccessoryType>> {
    ensure_inventory_manager(user)?;
    payload.validate()?;

    let name = match payload.name.as_deref() {
        Some(n) => Some(for_storage(state.translator.as_ref(), n.trim()).await),
        None => None,
    };
    let description = match payload.description.as_deref() {
        Some(d) => Some(for_storage(state.translator.as_ref(), d).await.text),
        None => None,
    };

    let txn = state.orm.begin().await?;
    let existing = AccessoryTypes::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_scope(user, existing.manufacturer_id)?;

    let mut changes = ChangeSet::new();
    let mut active: TypeActive = existing.clone().into();
    if let Some(name) = name {
        changes.record("name", &existing.name, &name.text);
        active.name = Set(name.text);
        active.source_language = Set(name.source_language);
    }
    if let Some(description) = description {
        let description = Some(description);
        changes.record("description", &existing.description, &description);
        active.description = Set(description);
    }
    if let Some(unit) = payload.unit {
        let unit = Some(unit);
        changes.record("unit", &existing.unit, &unit);
        active.unit = Set(unit);
    }

    if changes.is_empty() {
        txn.commit().await?;
        return Ok(ApiResponse::success(
            "Unchanged",
            AccessoryType::from(existing),
            Some(Meta::empty()),
        ));
    }

    let updated = active.update(&txn).await?;
    log_audit(
        &txn,
        user,
        AuditEvent::new(
            AuditAction::AccessoryTypeUpdated,
            TargetType::AccessoryType,
            updated.id,
        )
        .changes(changes.into_vec()),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Accessory type updated",
        AccessoryType::from(updated),
        Some(Meta::empty()),
    ))
}

/// Delete an accessory type nobody stocks. The reference check and the delete share one
/// transaction.
pub async fn delete_accessory_type(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_inventory_manager(user)?;
    let txn = state.orm.begin().await?;

    let existing = AccessoryTypes::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_scope(user, existing.manufacturer_id)?;

    let in_use = Inventory::find()
        .filter(StockCol::AccessoryTypeId.eq(id))
        .count(&txn)
        .await?;
    if in_use > 0 {
        return Err(AppError::Conflict("Accessory type is in use".into()));
    }

    let name = existing.name.clone();
    existing.delete(&txn).await?;
    log_audit(
        &txn,
        user,
        AuditEvent::new(AuditAction::AccessoryTypeDeleted, TargetType::AccessoryType, id)
            .values(name, ""),
    )
    .await?;
    txn.commit().await?;

    tracing::info!(accessory_type_id = %id, "accessory type deleted");
    Ok(ApiResponse::empty("Deleted"))
}

pub async fn list_inventory(
    state: &AppState,
    user: &AuthUser,
    query: InventoryQuery,
) -> AppResult<ApiResponse<InventoryList>> {
    ensure_inventory_manager(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(manufacturer_id) = list_filter(user, query.manufacturer_id)? {
        condition = condition.add(StockCol::ManufacturerId.eq(manufacturer_id));
    }
    if let Some(client_id) = query.client_id {
        condition = condition.add(StockCol::ClientId.eq(client_id));
    }
    if query.low_stock_only {
        condition = condition
            .add(Expr::col(StockCol::QuantityOnHand).lte(Expr::col(StockCol::LowStockThreshold)));
    }

    let finder = Inventory::find()
        .filter(condition)
        .order_by_asc(StockCol::QuantityOnHand)
        .order_by_desc(StockCol::UpdatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let mut items = Vec::new();
    for model in finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
    {
        items.push(render_stock(state, model, query.lang.as_deref()).await);
    }

    let message = if query.low_stock_only { "Low stock" } else { "Inventory" };
    Ok(ApiResponse::success(
        message,
        InventoryList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    mut query: InventoryQuery,
) -> AppResult<ApiResponse<InventoryList>> {
    query.low_stock_only = true;
    list_inventory(state, user, query).await
}

pub async fn create_inventory(
    state: &AppState,
    user: &AuthUser,
    payload: CreateInventoryRequest,
) -> AppResult<ApiResponse<InventoryItem>> {
    ensure_inventory_manager(user)?;
    payload.validate()?;
    let manufacturer_id = resolve_manufacturer(user, payload.manufacturer_id)?;

    let notes = match payload.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        Some(n) => Some(for_storage(state.translator.as_ref(), n).await),
        None => None,
    };

    let txn = state.orm.begin().await?;
    let accessory = AccessoryTypes::find_by_id(payload.accessory_type_id)
        .one(&txn)
        .await?
        .filter(|t| t.manufacturer_id == manufacturer_id)
        .ok_or_else(|| AppError::BadRequest("unknown accessory type".into()))?;
    if Clients::find_by_id(payload.client_id).one(&txn).await?.is_none() {
        return Err(AppError::BadRequest("unknown client".into()));
    }

    let duplicate = Inventory::find()
        .filter(StockCol::ManufacturerId.eq(manufacturer_id))
        .filter(StockCol::ClientId.eq(payload.client_id))
        .filter(StockCol::AccessoryTypeId.eq(accessory.id))
        .count(&txn)
        .await?;
    if duplicate > 0 {
        return Err(AppError::Conflict(
            "stock for this client and accessory type already exists".into(),
        ));
    }

    let (notes, source_language) = match notes {
        Some(n) => (Some(n.text), n.source_language),
        None => (None, None),
    };
    let created = StockActive {
        id: Set(Uuid::new_v4()),
        manufacturer_id: Set(manufacturer_id),
        client_id: Set(payload.client_id),
        accessory_type_id: Set(accessory.id),
        quantity_on_hand: Set(payload.quantity_on_hand),
        low_stock_threshold: Set(payload.low_stock_threshold),
        notes: Set(notes),
        source_language: Set(source_language),
        updated_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    log_audit(
        &txn,
        user,
        AuditEvent::new(
            AuditAction::InventoryCreated,
            TargetType::InventoryItem,
            created.id,
        )
        .values("", created.quantity_on_hand.to_string()),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Inventory created",
        InventoryItem::from(created),
        Some(Meta::empty()),
    ))
}

pub async fn update_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateInventoryRequest,
) -> AppResult<ApiResponse<InventoryItem>> {
    ensure_inventory_manager(user)?;
    payload.validate()?;

    let notes = match payload.notes.as_deref() {
        Some(n) => Some(for_storage(state.translator.as_ref(), n).await),
        None => None,
    };

    let txn = state.orm.begin().await?;
    let existing = Inventory::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_scope(user, existing.manufacturer_id)?;

    let mut changes = ChangeSet::new();
    let mut active: StockActive = existing.clone().into();
    if let Some(quantity) = payload.quantity_on_hand {
        changes.record("quantity_on_hand", &existing.quantity_on_hand, &quantity);
        active.quantity_on_hand = Set(quantity);
    }
    if let Some(threshold) = payload.low_stock_threshold {
        changes.record("low_stock_threshold", &existing.low_stock_threshold, &threshold);
        active.low_stock_threshold = Set(threshold);
    }
    if let Some(notes) = notes {
        let text = Some(notes.text);
        changes.record("notes", &existing.notes, &text);
        active.notes = Set(text);
        active.source_language = Set(notes.source_language);
    }

    if changes.is_empty() {
        txn.commit().await?;
        return Ok(ApiResponse::success(
            "Unchanged",
            InventoryItem::from(existing),
            Some(Meta::empty()),
        ));
    }

    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    log_audit(
        &txn,
        user,
        AuditEvent::new(
            AuditAction::InventoryUpdated,
            TargetType::InventoryItem,
            updated.id,
        )
        .changes(changes.into_vec()),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Inventory updated",
        InventoryItem::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<InventoryItem>> {
    ensure_inventory_manager(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let existing = Inventory::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_scope(user, existing.manufacturer_id)?;

    let new_quantity = existing
        .quantity_on_hand
        .checked_add(payload.delta)
        .filter(|q| *q >= 0)
        .ok_or_else(|| AppError::BadRequest("stock cannot be negative".into()))?;

    let old_quantity = existing.quantity_on_hand;
    let mut active: StockActive = existing.into();
    active.quantity_on_hand = Set(new_quantity);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    let mut changes = ChangeSet::new();
    changes.record("quantity_on_hand", &old_quantity, &new_quantity);
    log_audit(
        &txn,
        user,
        AuditEvent::new(
            AuditAction::InventoryAdjusted,
            TargetType::InventoryItem,
            updated.id,
        )
        .values(old_quantity.to_string(), new_quantity.to_string())
        .changes(changes.into_vec()),
    )
    .await?;
    txn.commit().await?;

    tracing::debug!(inventory_id = %id, delta = payload.delta, new_quantity, "inventory adjusted");
    Ok(ApiResponse::success(
        "Inventory updated",
        InventoryItem::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn delete_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_inventory_manager(user)?;
    let txn = state.orm.begin().await?;
    let existing = Inventory::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_scope(user, existing.manufacturer_id)?;

    let quantity = existing.quantity_on_hand;
    existing.delete(&txn).await?;
    log_audit(
        &txn,
        user,
        AuditEvent::new(AuditAction::InventoryDeleted, TargetType::InventoryItem, id)
            .values(quantity.to_string(), ""),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::empty("Deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;

    fn user(role: Role, manufacturer_id: Option<Uuid>) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            name: "Stock".into(),
            email: "stock@example.com".into(),
            role,
            client_id: None,
            manufacturer_id,
        }
    }

    #[test]
    fn manufacturer_users_are_pinned_to_their_company() {
        let own = Uuid::new_v4();
        let manager = user(Role::ManufacturerInventoryManager, Some(own));
        assert_eq!(resolve_manufacturer(&manager, None).unwrap(), own);
        assert!(matches!(
            resolve_manufacturer(&manager, Some(Uuid::new_v4())),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            ensure_scope(&manager, Uuid::new_v4()),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn admins_must_name_the_manufacturer() {
        let admin = user(Role::Admin, None);
        assert!(matches!(
            resolve_manufacturer(&admin, None),
            Err(AppError::BadRequest(_))
        ));
        let target = Uuid::new_v4();
        assert_eq!(resolve_manufacturer(&admin, Some(target)).unwrap(), target);
        assert!(ensure_scope(&admin, target).is_ok());
    }
}

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{AuditAction, AuditEvent, ChangeSet, TargetType, log_audit},
    dto::products::{CreateProductRequest, ProductList},
    dto::routing::{AddMediaRequest, ItemApprovalRequest, ProductUpdates, UpdateProductRequest},
    entity::{
        order_items::{ActiveModel as ItemActive, Entity as OrderItems},
        order_media::{ActiveModel as MediaActive, Entity as OrderMedia},
        order_products::{ActiveModel as ProductActive, Model as ProductModel},
        products::{ActiveModel as CatalogActive, Column as CatalogCol, Entity as CatalogProducts},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{OrderItem, OrderMedia as Media, OrderProduct, Product},
    response::{ApiResponse, Meta},
    roles::Role,
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::{
        order_service::ensure_order_access,
        routing_service::{
            check_version, lock_order, lock_order_and_product, lock_product, product_state,
            sync_order,
        },
    },
    state::AppState,
    workflow::{Actor, ProductState, RoutedTo, visible_to},
};

const MEDIA_TYPE_PREFIXES: &[&str] = &["image/", "video/"];
const MEDIA_TYPES: &[&str] = &["application/pdf"];

/// Field-level edit permission for an order product.
pub fn check_edit_permission(
    actor: Actor,
    current: ProductState,
    is_locked: bool,
    updates: &ProductUpdates,
) -> AppResult<()> {
    match actor {
        Actor::Admin => Ok(()),
        Actor::Manufacturer => {
            if updates.client_standard_price.is_some()
                || updates.client_bulk_price.is_some()
                || updates.admin_notes.is_some()
                || updates.client_notes.is_some()
                || updates.internal_notes.is_some()
                || updates.is_invoiced.is_some()
            {
                return Err(AppError::Forbidden);
            }
            if is_locked {
                return Err(AppError::BadRequest("product is locked".into()));
            }
            if current.routed_to != RoutedTo::Manufacturer {
                return Err(AppError::Forbidden);
            }
            Ok(())
        }
        Actor::Client => {
            if updates.manufacturer_standard_price.is_some()
                || updates.manufacturer_bulk_price.is_some()
                || updates.client_standard_price.is_some()
                || updates.client_bulk_price.is_some()
                || updates.admin_notes.is_some()
                || updates.manufacturer_notes.is_some()
                || updates.internal_notes.is_some()
                || updates.is_invoiced.is_some()
            {
                return Err(AppError::Forbidden);
            }
            if current.routed_to != RoutedTo::Client {
                return Err(AppError::Forbidden);
            }
            Ok(())
        }
    }
}

/// Blank out the price and notes fields the given party must not see.
pub fn project_for(actor: Option<Actor>, mut product: OrderProduct) -> OrderProduct {
    match actor {
        Some(Actor::Client) => {
            product.manufacturer_standard_price = None;
            product.manufacturer_bulk_price = None;
            product.admin_notes = None;
            product.manufacturer_notes = None;
            product.internal_notes = None;
        }
        Some(Actor::Manufacturer) => {
            product.client_standard_price = None;
            product.client_bulk_price = None;
            product.admin_notes = None;
            product.client_notes = None;
            product.internal_notes = None;
        }
        Some(Actor::Admin) | None => {}
    }
    product
}

/// Validate and write `updates` to an already locked product row, bumping its version.
pub(crate) async fn apply_updates<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    actor: Actor,
    product: ProductModel,
    updates: &ProductUpdates,
) -> AppResult<ProductModel> {
    check_edit_permission(actor, product_state(&product)?, product.is_locked, updates)?;
    for price in [
        updates.manufacturer_standard_price,
        updates.manufacturer_bulk_price,
        updates.client_standard_price,
        updates.client_bulk_price,
    ]
    .into_iter()
    .flatten()
    {
        if price < 0 {
            return Err(AppError::BadRequest("prices cannot be negative".into()));
        }
    }

    let mut changes = ChangeSet::new();
    let mut active: ProductActive = product.clone().into();

    macro_rules! apply {
        ($($field:ident),+ $(,)?) => {
            $(if let Some(value) = updates.$field.clone() {
                let value = Some(value);
                changes.record(stringify!($field), &product.$field, &value);
                active.$field = Set(value);
            })+
        };
    }
    apply!(
        manufacturer_standard_price,
        manufacturer_bulk_price,
        client_standard_price,
        client_bulk_price,
        admin_notes,
        manufacturer_notes,
        client_notes,
        internal_notes,
    );
    if let Some(invoiced) = updates.is_invoiced {
        changes.record("is_invoiced", &product.is_invoiced, &invoiced);
        active.is_invoiced = Set(invoiced);
    }

    if changes.is_empty() {
        return Ok(product);
    }

    active.version = Set(product.version + 1);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(conn).await?;

    log_audit(
        conn,
        user,
        AuditEvent::new(AuditAction::ProductUpdated, TargetType::OrderProduct, updated.id)
            .order(updated.order_id)
            .changes(changes.into_vec()),
    )
    .await?;

    Ok(updated)
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<OrderProduct>> {
    let actor = user.require_actor()?;
    let txn = state.orm.begin().await?;

    let (order, product) = lock_order_and_product(&txn, id).await?;
    ensure_order_access(user, &order)?;
    check_version(payload.expected_version, product.version)?;

    let updated = apply_updates(&txn, user, actor, product, &payload.updates).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Updated",
        project_for(Some(actor), OrderProduct::from(updated)),
        Some(Meta::empty()),
    ))
}

/// Remove a product from its order. Invoiced products can only be removed by a super admin.
pub async fn delete_order_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let (order, product) = lock_order_and_product(&txn, id).await?;
    if product.is_invoiced && user.role != Role::SuperAdmin {
        return Err(AppError::Forbidden);
    }

    let status = product.product_status.clone();
    let order_id = order.id;
    product.delete(&txn).await?;

    let mut changes = ChangeSet::new();
    sync_order(&txn, order, None, &mut changes).await?;

    log_audit(
        &txn,
        user,
        AuditEvent::new(AuditAction::ProductDeleted, TargetType::OrderProduct, id)
            .order(order_id)
            .values(status, "deleted")
            .changes(changes.into_vec()),
    )
    .await?;

    txn.commit().await?;
    tracing::info!(order_product_id = %id, "order product deleted");

    Ok(ApiResponse::empty("Deleted"))
}

pub async fn update_item_approval(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: ItemApprovalRequest,
) -> AppResult<ApiResponse<OrderItem>> {
    let actor = user.require_actor()?;
    let txn = state.orm.begin().await?;

    let item = OrderItems::find_by_id(item_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let (order, product) = lock_order_and_product(&txn, item.order_product_id).await?;
    ensure_order_access(user, &order)?;
    if !visible_to(Some(actor), product_state(&product)?) {
        return Err(AppError::NotFound);
    }

    let status = payload.status.to_string();
    let mut changes = ChangeSet::new();
    let mut active: ItemActive = item.clone().into();
    match actor {
        Actor::Admin => {
            changes.record("admin_status", &item.admin_status, &status);
            active.admin_status = Set(status);
        }
        Actor::Manufacturer => {
            changes.record("manufacturer_status", &item.manufacturer_status, &status);
            active.manufacturer_status = Set(status);
        }
        Actor::Client => return Err(AppError::Forbidden),
    }

    if changes.is_empty() {
        txn.commit().await?;
        return Ok(ApiResponse::success(
            "Unchanged",
            OrderItem::from(item),
            Some(Meta::empty()),
        ));
    }

    let updated = active.update(&txn).await?;
    log_audit(
        &txn,
        user,
        AuditEvent::new(AuditAction::ItemApproval, TargetType::OrderItem, updated.id)
            .order(order.id)
            .changes(changes.into_vec()),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Item approval updated",
        OrderItem::from(updated),
        Some(Meta::empty()),
    ))
}

pub fn validate_media_type(file_type: &str) -> AppResult<()> {
    let file_type = file_type.trim().to_ascii_lowercase();
    let allowed = MEDIA_TYPE_PREFIXES
        .iter()
        .any(|p| file_type.starts_with(p) && file_type.len() > p.len())
        || MEDIA_TYPES.contains(&file_type.as_str());
    if !allowed {
        return Err(AppError::BadRequest(format!(
            "unsupported file type {file_type}"
        )));
    }
    Ok(())
}

/// Attach a file reference to a product, or to the order itself as sample media.
pub async fn add_media(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    order_product_id: Option<Uuid>,
    payload: AddMediaRequest,
) -> AppResult<ApiResponse<Media>> {
    let actor = user.require_actor()?;
    validate_media_type(&payload.file_type)?;
    if payload.file_url.trim().is_empty() {
        return Err(AppError::BadRequest("file_url is required".into()));
    }

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, order_id).await?;
    ensure_order_access(user, &order)?;
    if let Some(product_id) = order_product_id {
        let product = lock_product(&txn, product_id).await?;
        if product.order_id != order.id || !visible_to(Some(actor), product_state(&product)?) {
            return Err(AppError::NotFound);
        }
    }

    let media = MediaActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        order_product_id: Set(order_product_id),
        file_url: Set(payload.file_url.trim().to_string()),
        file_type: Set(payload.file_type.trim().to_ascii_lowercase()),
        uploaded_by: Set(user.user_id),
        is_sample: Set(order_product_id.is_none()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    log_audit(
        &txn,
        user,
        AuditEvent::new(AuditAction::MediaAdded, TargetType::OrderMedia, media.id)
            .order(order.id)
            .values("", media.file_url.clone()),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Media added",
        Media::from(media),
        Some(Meta::empty()),
    ))
}

pub async fn add_product_media(
    state: &AppState,
    user: &AuthUser,
    order_product_id: Uuid,
    payload: AddMediaRequest,
) -> AppResult<ApiResponse<Media>> {
    let product = crate::entity::OrderProducts::find_by_id(order_product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    add_media(state, user, product.order_id, Some(product.id), payload).await
}

/// Only the uploader or an admin actor may remove media.
pub async fn delete_media(
    state: &AppState,
    user: &AuthUser,
    media_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let media = OrderMedia::find_by_id(media_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let order = lock_order(&txn, media.order_id).await?;
    ensure_order_access(user, &order)?;
    if media.uploaded_by != user.user_id && !user.role.is_admin() {
        return Err(AppError::Forbidden);
    }

    let url = media.file_url.clone();
    media.delete(&txn).await?;
    log_audit(
        &txn,
        user,
        AuditEvent::new(AuditAction::MediaDeleted, TargetType::OrderMedia, media_id)
            .order(order.id)
            .values(url, ""),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::empty("Deleted"))
}

pub async fn list_catalog(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(CatalogCol::Name).ilike(pattern.clone()))
                .add(Expr::col(CatalogCol::Sku).ilike(pattern.clone()))
                .add(Expr::col(CatalogCol::Description).ilike(pattern)),
        );
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => CatalogCol::CreatedAt,
        ProductSortBy::Name => CatalogCol::Name,
    };
    let mut finder = CatalogProducts::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_catalog_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;

    let exists = CatalogProducts::find()
        .filter(CatalogCol::Name.eq(payload.name.trim()))
        .count(&state.orm)
        .await?;
    if exists > 0 {
        return Err(AppError::Conflict("a product with this name already exists".into()));
    }

    let product = CatalogActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        sku: Set(payload.sku),
        description: Set(payload.description),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = %product.id, "catalog product created");
    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

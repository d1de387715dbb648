use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::notifications::{NotificationList, NotificationQuery},
    entity::notifications::{
        ActiveModel as NotificationActive, Column as NotificationCol, Entity as Notifications,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Notification,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// A message for one user, inserted on the caller's connection.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub order_product_id: Option<Uuid>,
    pub kind: String,
    pub message: String,
}

pub async fn notify<C: ConnectionTrait>(conn: &C, notification: NewNotification) -> AppResult<()> {
    NotificationActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(notification.user_id),
        order_id: Set(notification.order_id),
        order_product_id: Set(notification.order_product_id),
        kind: Set(notification.kind),
        message: Set(notification.message),
        is_read: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

pub async fn list_notifications(
    state: &AppState,
    user: &AuthUser,
    query: NotificationQuery,
) -> AppResult<ApiResponse<NotificationList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(NotificationCol::UserId.eq(user.user_id));
    if query.unread_only {
        condition = condition.add(NotificationCol::IsRead.eq(false));
    }

    let finder = Notifications::find()
        .filter(condition)
        .order_by_desc(NotificationCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Notification::from)
        .collect();

    Ok(ApiResponse::success(
        "Notifications",
        NotificationList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn mark_read(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Notification>> {
    let existing = Notifications::find_by_id(id)
        .filter(NotificationCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.is_read {
        return Ok(ApiResponse::success(
            "Notification",
            Notification::from(existing),
            Some(Meta::empty()),
        ));
    }

    let mut active: NotificationActive = existing.into();
    active.is_read = Set(true);
    let updated = active.update(&state.orm).await?;
    Ok(ApiResponse::success(
        "Notification read",
        Notification::from(updated),
        Some(Meta::empty()),
    ))
}

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{AuditAction, AuditEvent, ChangeSet, FieldChange, TargetType, log_audit},
    db::DbPool,
    dto::users::{
        CreateUserRequest, DeleteUserRequest, UpdateUserRequest, UserList, UserListQuery,
        UserType,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_user_manager},
    models::User,
    response::{ApiResponse, Meta},
    roles::Role,
    services::auth_service::hash_password,
    state::AppState,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub client_id: Option<Uuid>,
    pub manufacturer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            role: self.role,
            is_active: self.is_active,
            client_id: self.client_id,
            manufacturer_id: self.manufacturer_id,
            created_at: self.created_at,
        }
    }
}

pub async fn fetch_user(pool: &DbPool, id: Uuid) -> AppResult<Option<UserRow>> {
    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn fetch_user_by_email(pool: &DbPool, email: &str) -> AppResult<Option<UserRow>> {
    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// The role must fit the kind of account being managed.
pub fn check_role_matches_type(user_type: UserType, role: Role) -> AppResult<()> {
    let ok = match user_type {
        UserType::Client => role == Role::Client,
        UserType::Manufacturer => role.is_manufacturer_side(),
        UserType::Staff => role != Role::Client && !role.is_manufacturer_side(),
    };
    if ok {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "role {role} does not fit a {user_type} account"
        )))
    }
}

/// Only a super admin may touch super admin accounts or hand out that role.
fn check_super_admin_guard(actor: &AuthUser, involved: &[Role]) -> AppResult<()> {
    if involved.contains(&Role::SuperAdmin) && actor.role != Role::SuperAdmin {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub async fn list_users(
    state: &AppState,
    actor: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_user_manager(actor)?;
    let (page, limit, offset) = query.pagination().normalize();
    let role = query.role.map(|r| r.to_string());

    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT * FROM users
        WHERE ($1::text IS NULL OR role = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(role.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) =
        sqlx::query_as("SELECT count(*) FROM users WHERE ($1::text IS NULL OR role = $1)")
            .bind(role.as_deref())
            .fetch_one(&state.pool)
            .await?;

    let items = rows.into_iter().map(UserRow::into_user).collect();
    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total.0)),
    ))
}

pub async fn create_user(
    state: &AppState,
    actor: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_user_manager(actor)?;
    payload.validate()?;
    check_super_admin_guard(actor, &[payload.role])?;
    check_role_matches_type(payload.user_type, payload.role)?;

    if fetch_user_by_email(&state.pool, &payload.email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;
    let company_name = payload
        .company_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| payload.name.clone());

    let mut tx = state.pool.begin().await?;

    let mut client_id = None;
    let mut manufacturer_id = None;
    match payload.user_type {
        UserType::Client => {
            let id = Uuid::new_v4();
            sqlx::query("INSERT INTO clients (id, name, email) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(&company_name)
                .bind(&payload.email)
                .execute(&mut *tx)
                .await?;
            client_id = Some(id);
        }
        UserType::Manufacturer => {
            let id = Uuid::new_v4();
            sqlx::query("INSERT INTO manufacturers (id, name, email) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(&company_name)
                .bind(&payload.email)
                .execute(&mut *tx)
                .await?;
            manufacturer_id = Some(id);
        }
        UserType::Staff => {}
    }

    let user: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, password_hash, role, client_id, manufacturer_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.email.trim())
    .bind(payload.name.trim())
    .bind(password_hash)
    .bind(payload.role.to_string())
    .bind(client_id)
    .bind(manufacturer_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    if let Err(err) = log_audit(
        &state.orm,
        actor,
        AuditEvent::new(AuditAction::UserCreated, TargetType::User, user.id)
            .values("", user.role.clone())
            .changes(vec![
                FieldChange::new("email", None::<String>, &user.email),
                FieldChange::new("role", None::<String>, &user.role),
            ]),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    Ok(ApiResponse::success(
        "User created",
        user.into_user(),
        Some(Meta::empty()),
    ))
}

pub async fn update_user(
    state: &AppState,
    actor: &AuthUser,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_user_manager(actor)?;
    payload.validate()?;
    let UpdateUserRequest {
        user_id,
        updates,
        user_type,
    } = payload;

    let existing = fetch_user(&state.pool, user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let existing_role: Role = existing.role.parse()?;

    let mut involved = vec![existing_role];
    involved.extend(updates.role);
    check_super_admin_guard(actor, &involved)?;

    if user_id == actor.user_id
        && (updates.is_active == Some(false) || updates.role.is_some_and(|r| r != existing_role))
    {
        return Err(AppError::BadRequest(
            "You cannot deactivate yourself or change your own role".into(),
        ));
    }
    if let (Some(user_type), Some(role)) = (user_type, updates.role) {
        check_role_matches_type(user_type, role)?;
    }
    if let Some(email) = updates.email.as_deref() {
        if let Some(other) = fetch_user_by_email(&state.pool, email).await? {
            if other.id != user_id {
                return Err(AppError::BadRequest("Email is already taken".to_string()));
            }
        }
    }

    let password_hash = updates.password.as_deref().map(hash_password).transpose()?;

    let mut tx = state.pool.begin().await?;
    let user: UserRow = sqlx::query_as(
        r#"
        UPDATE users SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            role = COALESCE($4, role),
            is_active = COALESCE($5, is_active),
            password_hash = COALESCE($6, password_hash),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(updates.name.as_deref().map(str::trim))
    .bind(updates.email.as_deref().map(str::trim))
    .bind(updates.role.map(|r| r.to_string()))
    .bind(updates.is_active)
    .bind(password_hash.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    // Keep the linked company's contact details in step with its account.
    let company = match user_type {
        Some(UserType::Client) => user.client_id.map(|id| ("clients", id)),
        Some(UserType::Manufacturer) => user.manufacturer_id.map(|id| ("manufacturers", id)),
        _ => None,
    };
    if let Some((table, id)) = company {
        sqlx::query(&format!(
            "UPDATE {table} SET name = COALESCE($2, name), email = COALESCE($3, email) WHERE id = $1"
        ))
        .bind(id)
        .bind(updates.name.as_deref().map(str::trim))
        .bind(updates.email.as_deref().map(str::trim))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let mut changes = ChangeSet::new();
    changes.record("name", &existing.name, &user.name);
    changes.record("email", &existing.email, &user.email);
    changes.record("role", &existing.role, &user.role);
    changes.record("is_active", &existing.is_active, &user.is_active);
    if password_hash.is_some() {
        changes.push(FieldChange::new("password", None::<String>, "reset"));
    }

    if let Err(err) = log_audit(
        &state.orm,
        actor,
        AuditEvent::new(AuditAction::UserUpdated, TargetType::User, user.id)
            .changes(changes.into_vec()),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "User updated",
        user.into_user(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_user(
    state: &AppState,
    actor: &AuthUser,
    payload: DeleteUserRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_user_manager(actor)?;
    if payload.user_id == actor.user_id {
        return Err(AppError::BadRequest("You cannot delete your own account".into()));
    }

    let existing = fetch_user(&state.pool, payload.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    check_super_admin_guard(actor, &[existing.role.parse()?])?;

    let references: (i64,) = sqlx::query_as(
        r#"
        SELECT (SELECT count(*) FROM orders WHERE created_by = $1)
             + (SELECT count(*) FROM order_media WHERE uploaded_by = $1)
        "#,
    )
    .bind(existing.id)
    .fetch_one(&state.pool)
    .await?;
    if references.0 > 0 {
        return Err(AppError::Conflict(
            "User has order history; deactivate the account instead".into(),
        ));
    }

    let mut tx = state.pool.begin().await?;
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(existing.id)
        .execute(&mut *tx)
        .await?;

    // A company row goes with its last account unless orders still point at it.
    let company = match payload.user_type {
        Some(UserType::Client) => existing.client_id.map(|id| ("clients", "client_id", id)),
        Some(UserType::Manufacturer) => existing
            .manufacturer_id
            .map(|id| ("manufacturers", "manufacturer_id", id)),
        _ => None,
    };
    if let Some((table, column, id)) = company {
        let in_use: (i64,) = sqlx::query_as(&format!(
            "SELECT (SELECT count(*) FROM orders WHERE {column} = $1) + (SELECT count(*) FROM users WHERE {column} = $1)"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if in_use.0 == 0 {
            sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        } else {
            tracing::info!(company_id = %id, table, "company kept, still referenced");
        }
    }

    tx.commit().await?;

    if let Err(err) = log_audit(
        &state.orm,
        actor,
        AuditEvent::new(AuditAction::UserDeleted, TargetType::User, existing.id)
            .values(existing.email.clone(), ""),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::empty("User deleted"))
}

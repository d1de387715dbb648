use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::users::{Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    roles::Role,
    state::AppState,
    workflow::Actor,
};

/// The caller of a request. Built from the database row, never from token claims alone,
/// so role changes and deactivation take effect immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub client_id: Option<Uuid>,
    pub manufacturer_id: Option<Uuid>,
}

impl AuthUser {
    pub fn actor(&self) -> Option<Actor> {
        self.role.actor()
    }

    /// Projection and visibility to apply to what this user reads.
    pub fn viewer(&self) -> Option<Actor> {
        self.role.viewer()
    }

    /// The routing party of this user, or `Forbidden` for roles that cannot route.
    pub fn require_actor(&self) -> AppResult<Actor> {
        self.actor().ok_or(AppError::Forbidden)
    }

    pub fn from_model(model: &UserModel) -> AppResult<Self> {
        Ok(Self {
            user_id: model.id,
            name: model.name.clone(),
            email: model.email.clone(),
            role: model.role.parse()?,
            client_id: model.client_id,
            manufacturer_id: model.manufacturer_id,
        })
    }
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_user_manager(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.can_manage_users() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_inventory_manager(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.can_manage_inventory() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn jwt_secret() -> AppResult<String> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Misconfigured("JWT_SECRET is not set".into()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::Unauthorized("Invalid Authorization scheme".into()));
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = jwt_secret()?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

        let user = Users::find_by_id(user_id)
            .one(&state.orm)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("Account is inactive or missing".into()))?;

        AuthUser::from_model(&user)
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::RuntimeErr;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    mailer::MailError,
    response::{ApiResponse, Meta},
    workflow::TransitionError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict {0}")]
    Conflict(String),

    #[error("{0}")]
    Misconfigured(String),

    #[error("Upstream error {0}")]
    Upstream(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

/// Coarse error classification reported to callers so they know whether retrying helps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Validation,
    Permission,
    NotFound,
    Conflict,
    Transient,
    Terminal,
}

impl AppError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::NotFound => ErrorClass::NotFound,
            AppError::BadRequest(_) => ErrorClass::Validation,
            AppError::Unauthorized(_) | AppError::Forbidden => ErrorClass::Permission,
            AppError::Conflict(_) => ErrorClass::Conflict,
            AppError::Upstream(_) => ErrorClass::Transient,
            AppError::DbError(err) => {
                if matches!(
                    err,
                    sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
                ) || is_concurrency_abort(err)
                {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Terminal
                }
            }
            AppError::OrmError(err) => match err {
                sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_) => {
                    ErrorClass::Transient
                }
                sea_orm::DbErr::Exec(RuntimeErr::SqlxError(inner))
                | sea_orm::DbErr::Query(RuntimeErr::SqlxError(inner))
                    if is_concurrency_abort(inner) =>
                {
                    ErrorClass::Transient
                }
                _ => ErrorClass::Terminal,
            },
            AppError::Misconfigured(_) | AppError::Internal(_) => ErrorClass::Terminal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.class(), ErrorClass::Transient | ErrorClass::Conflict)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Misconfigured(_)
            | AppError::DbError(_)
            | AppError::OrmError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    error_class: ErrorClass,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match &self {
            AppError::DbError(err) => tracing::error!(error = %err, "database error"),
            AppError::OrmError(err) => tracing::error!(error = %err, "orm error"),
            AppError::Internal(err) => tracing::error!(error = %err, "internal error"),
            AppError::Upstream(err) => tracing::warn!(error = %err, "upstream error"),
            _ => {}
        }

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData {
                error: message,
                error_class: self.class(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        if err.is_permission() {
            AppError::Forbidden
        } else {
            AppError::BadRequest(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<strum::ParseError> for AppError {
    fn from(err: strum::ParseError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::NotConfigured(msg) => AppError::Misconfigured(msg),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// Deadlock (`40P01`) or serialization failure (`40001`): Postgres aborted the
/// transaction and the whole operation can be retried.
fn is_concurrency_abort(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(db.code().as_deref(), Some("40P01" | "40001")),
        _ => false,
    }
}

pub type AppResult<T> = Result<T, AppError>;

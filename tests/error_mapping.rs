use std::borrow::Cow;

use axum::http::StatusCode;
use orderflow_api::{
    error::{AppError, ErrorClass},
    workflow::{Actor, ProductStatus, RoutingAction, TransitionError},
};
use sea_orm::{DbErr, RuntimeErr};
use sqlx::error::{DatabaseError, ErrorKind};

#[test]
fn classes_and_statuses() {
    let cases = [
        (AppError::NotFound, StatusCode::NOT_FOUND, ErrorClass::NotFound),
        (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, ErrorClass::Validation),
        (AppError::Forbidden, StatusCode::FORBIDDEN, ErrorClass::Permission),
        (AppError::Conflict("x".into()), StatusCode::CONFLICT, ErrorClass::Conflict),
        (AppError::Upstream("x".into()), StatusCode::BAD_GATEWAY, ErrorClass::Transient),
    ];
    for (err, status, class) in cases {
        assert_eq!(err.status(), status, "{err}");
        assert_eq!(err.class(), class, "{err}");
    }
}

#[test]
fn only_transient_and_conflict_are_retryable() {
    assert!(AppError::Conflict("stale".into()).is_retryable());
    assert!(AppError::Upstream("timeout".into()).is_retryable());
    assert!(!AppError::Forbidden.is_retryable());
    assert!(!AppError::BadRequest("bad".into()).is_retryable());
}

#[test]
fn workflow_errors_map_to_permission_or_validation() {
    let wrong_actor: AppError = TransitionError::WrongActor {
        actor: Actor::Client,
        action: RoutingAction::MarkCompleted,
    }
    .into();
    assert!(matches!(wrong_actor, AppError::Forbidden));

    let invalid: AppError = TransitionError::InvalidState {
        action: RoutingAction::MarkCompleted,
        status: ProductStatus::Pending,
    }
    .into();
    assert_eq!(invalid.class(), ErrorClass::Validation);
}

#[test]
fn unknown_stored_values_are_rejected() {
    let err: AppError = "paused".parse::<ProductStatus>().unwrap_err().into();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.class(), ErrorClass::Validation);
    assert!("in_production".parse::<ProductStatus>().is_ok());
}

#[derive(Debug)]
struct PgAbort(&'static str);

impl std::fmt::Display for PgAbort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "aborted with {}", self.0)
    }
}

impl std::error::Error for PgAbort {}

impl DatabaseError for PgAbort {
    fn message(&self) -> &str {
        "could not complete transaction"
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.0))
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

fn pg_error(code: &'static str) -> sqlx::Error {
    sqlx::Error::Database(Box::new(PgAbort(code)))
}

#[test]
fn deadlocks_and_serialization_failures_are_transient() {
    for code in ["40P01", "40001"] {
        let direct = AppError::DbError(pg_error(code));
        assert_eq!(direct.class(), ErrorClass::Transient, "{code}");
        assert!(direct.is_retryable());

        let via_orm = AppError::OrmError(DbErr::Exec(RuntimeErr::SqlxError(pg_error(code))));
        assert_eq!(via_orm.class(), ErrorClass::Transient, "{code}");

        let query = AppError::OrmError(DbErr::Query(RuntimeErr::SqlxError(pg_error(code))));
        assert_eq!(query.class(), ErrorClass::Transient, "{code}");
    }

    let unique_violation =
        AppError::OrmError(DbErr::Exec(RuntimeErr::SqlxError(pg_error("23505"))));
    assert_eq!(unique_violation.class(), ErrorClass::Terminal);
    assert!(!unique_violation.is_retryable());
}

#![allow(dead_code)]

use orderflow_api::{db::create_pool, middleware::auth::AuthUser, roles::Role, state::AppState};
use uuid::Uuid;

/// State against the test database, or `None` when no database is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run flow tests.");
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(Some(AppState::new(pool)))
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub async fn create_company(state: &AppState, table: &str, email: Option<&str>) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(&format!(
        "INSERT INTO {table} (id, name, email) VALUES ($1, $2, $3)"
    ))
    .bind(id)
    .bind(unique(table))
    .bind(email)
    .execute(&state.pool)
    .await?;
    Ok(id)
}

pub async fn create_user(
    state: &AppState,
    role: Role,
    client_id: Option<Uuid>,
    manufacturer_id: Option<Uuid>,
) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    let email = format!("{}@example.test", unique(role.as_ref()));
    let name = format!("Test {role}");
    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, password_hash, role, client_id, manufacturer_id)
        VALUES ($1, $2, $3, 'not-a-hash', $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(&email)
    .bind(&name)
    .bind(role.to_string())
    .bind(client_id)
    .bind(manufacturer_id)
    .execute(&state.pool)
    .await?;

    Ok(AuthUser {
        user_id: id,
        name,
        email,
        role,
        client_id,
        manufacturer_id,
    })
}

pub async fn create_catalog_product(state: &AppState) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO products (id, name, sku) VALUES ($1, $2, 'SKU-T')")
        .bind(id)
        .bind(unique("product"))
        .execute(&state.pool)
        .await?;
    Ok(id)
}

pub async fn count_audit(state: &AppState, target_id: Uuid, action_type: &str) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_log WHERE target_id = $1 AND action_type = $2",
    )
    .bind(target_id)
    .bind(action_type)
    .fetch_one(&state.pool)
    .await?;
    Ok(count)
}

pub async fn count_notifications(state: &AppState, user_id: Uuid) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(count)
}

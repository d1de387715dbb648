use orderflow_api::{
    config::AppConfig, db::create_pool, roles::Role, services::auth_service::hash_password,
};
use uuid::Uuid;

const DEMO_PASSWORD: &str = "password123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let client_id = ensure_company(&pool, "clients", "Acme Apparel", "orders@acme.test").await?;
    let manufacturer_id =
        ensure_company(&pool, "manufacturers", "Northwind Factory", "factory@northwind.test")
            .await?;

    let accounts = [
        ("superadmin@example.com", "Super Admin", Role::SuperAdmin, None, None),
        ("admin@example.com", "Admin", Role::Admin, None, None),
        ("creator@example.com", "Order Creator", Role::OrderCreator, None, None),
        ("warehouse@example.com", "Warehouse", Role::Warehouse, None, None),
        ("client@example.com", "Acme Buyer", Role::Client, Some(client_id), None),
        (
            "factory@example.com",
            "Northwind Lead",
            Role::Manufacturer,
            None,
            Some(manufacturer_id),
        ),
        (
            "stock@example.com",
            "Northwind Stock",
            Role::ManufacturerInventoryManager,
            None,
            Some(manufacturer_id),
        ),
    ];
    for (email, name, role, client, manufacturer) in accounts {
        ensure_user(&pool, email, name, role, client, manufacturer).await?;
    }

    seed_products(&pool).await?;

    println!("Seed completed. Demo password for every account: {DEMO_PASSWORD}");
    Ok(())
}

async fn ensure_company(
    pool: &sqlx::PgPool,
    table: &str,
    name: &str,
    email: &str,
) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as(&format!("SELECT id FROM {table} WHERE name = $1"))
            .bind(name)
            .fetch_optional(pool)
            .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    sqlx::query(&format!(
        "INSERT INTO {table} (id, name, email) VALUES ($1, $2, $3)"
    ))
    .bind(id)
    .bind(name)
    .bind(email)
    .execute(pool)
    .await?;
    println!("Created {table} row {name}");
    Ok(id)
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    name: &str,
    role: Role,
    client_id: Option<Uuid>,
    manufacturer_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(DEMO_PASSWORD)?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, password_hash, role, client_id, manufacturer_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (email) DO UPDATE
            SET role = EXCLUDED.role,
                client_id = EXCLUDED.client_id,
                manufacturer_id = EXCLUDED.manufacturer_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(role.to_string())
    .bind(client_id)
    .bind(manufacturer_id)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = [
        ("Embroidered Hoodie", "HD-001", "Heavyweight hoodie with chest embroidery"),
        ("Logo Cap", "CP-010", "Six-panel cap with woven label"),
        ("Canvas Tote", "TT-200", "Natural canvas tote with screen print"),
        ("Team Jersey", "JR-042", "Sublimated jersey in custom colorways"),
    ];

    for (name, sku, description) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, sku, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(sku)
        .bind(description)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

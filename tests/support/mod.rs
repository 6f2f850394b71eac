#![allow(dead_code)]

use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use std::env;
use std::sync::OnceLock;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use resale_market::AppState;
use resale_market::accounts::{self, RegisterRequest};
use resale_market::support::SupportResponder;

pub const TEST_JWT_SECRET: &str = "test-secret";

fn split_db_url(url: &str) -> Result<(String, String), String> {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base.to_string(), Some(query)),
        None => (url.to_string(), None),
    };

    let db_start = base
        .rfind('/')
        .ok_or_else(|| "invalid database url".to_string())?;
    if db_start + 1 >= base.len() {
        return Err("database name is empty".to_string());
    }

    let db_name = base[db_start + 1..].to_string();
    let mut admin_url = format!("{}postgres", &base[..db_start + 1]);
    if let Some(query) = query {
        admin_url = format!("{admin_url}?{query}");
    }

    Ok((admin_url, db_name))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

/// Fresh, migrated database, or `None` when `TEST_DATABASE_URL` is unset.
pub async fn init_test_db() -> Option<TestDb> {
    dotenvy::dotenv().ok();
    let Ok(test_url) = env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping database test");
        return None;
    };
    let (admin_url, db_name) =
        split_db_url(&test_url).expect("invalid TEST_DATABASE_URL format");

    let lock = TEST_DB_LOCK.get_or_init(|| Mutex::new(()));
    let guard = lock.lock().await;

    let admin_pool = PgPool::connect(&admin_url)
        .await
        .expect("connect admin db");

    let _ = sqlx::query("SELECT pg_advisory_lock(424242)")
        .execute(&admin_pool)
        .await;

    let quoted_name = quote_identifier(&db_name);
    let drop_sql = format!("DROP DATABASE IF EXISTS {quoted_name} WITH (FORCE)");
    let create_sql = format!("CREATE DATABASE {quoted_name}");

    let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
    let create_result = sqlx::query(&create_sql).execute(&admin_pool).await;
    if let Err(e) = create_result {
        eprintln!("create test db error: {e}");
        let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
        sqlx::query(&create_sql)
            .execute(&admin_pool)
            .await
            .expect("create test db retry");
    }

    let _ = sqlx::query("SELECT pg_advisory_unlock(424242)")
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;

    let pool = PgPool::connect(&test_url)
        .await
        .expect("connect test db");
    sqlx::migrate!().run(&pool).await.expect("migrations");
    Some(TestDb { pool, _guard: guard })
}

pub fn build_state(pool: PgPool) -> AppState {
    AppState {
        pool,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        support: SupportResponder::fallback_only(),
    }
}

pub fn bearer(user_id: i32) -> (&'static str, String) {
    let token = accounts::issue_token(TEST_JWT_SECRET, user_id).expect("issue token");
    ("Authorization", format!("Bearer {token}"))
}

/// Registers a user (and its profile) through the normal path.
pub async fn create_user(pool: &PgPool, name: &str) -> i32 {
    let suffix = Uuid::new_v4().simple().to_string();
    accounts::register_user(
        pool,
        &RegisterRequest {
            username: format!("{name}_{suffix}"),
            email: format!("{name}_{suffix}@example.com"),
            password: "secret-password".to_string(),
        },
    )
    .await
    .expect("register user")
}

pub async fn create_category(pool: &PgPool) -> i32 {
    let suffix = Uuid::new_v4().simple().to_string();
    sqlx::query("INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id")
        .bind(format!("Category {suffix}"))
        .bind(format!("category-{suffix}"))
        .fetch_one(pool)
        .await
        .expect("insert category")
        .get("id")
}

/// Inserts an available product directly, without crediting the seller.
pub async fn create_product(pool: &PgPool, seller_id: i32, category_id: i32, price: Decimal) -> i32 {
    let suffix = Uuid::new_v4().simple().to_string();
    sqlx::query(
        r#"INSERT INTO products (title, slug, category_id, seller_id, price, condition, status, published_at)
           VALUES ($1, $2, $3, $4, $5, 'good', 'available', NOW())
           RETURNING id"#,
    )
    .bind(format!("Item {suffix}"))
    .bind(format!("item-{suffix}"))
    .bind(category_id)
    .bind(seller_id)
    .bind(price)
    .fetch_one(pool)
    .await
    .expect("insert product")
    .get("id")
}

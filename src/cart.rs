// src/cart.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool, Row};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::{Cart, CartLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartTotals {
    pub total_items: i64,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct UpdateOutcome {
    pub totals: CartTotals,
    /// Line total after the update, zero once the line is gone.
    pub item_total: Decimal,
    pub removed: bool,
}

/// Returns the user's cart id, creating the cart on first access.
pub async fn get_or_create_cart(conn: &mut PgConnection, user_id: i32) -> Result<i32, AppError> {
    // The no-op update makes RETURNING yield the existing row on conflict.
    let id: i32 = sqlx::query(
        r#"INSERT INTO carts (user_id) VALUES ($1)
           ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
           RETURNING id"#,
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?
    .try_get("id")?;

    Ok(id)
}

async fn find_cart(conn: &mut PgConnection, user_id: i32) -> Result<Option<i32>, AppError> {
    let row = sqlx::query("SELECT id FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(|r| r.get("id")))
}

const LINE_QUERY: &str = r#"SELECT ci.product_id, p.title, p.slug, p.price AS unit_price, ci.quantity
    FROM cart_items ci
    JOIN products p ON p.id = ci.product_id
    WHERE ci.cart_id = $1
    ORDER BY ci.added_at, ci.id"#;

/// Cart lines priced at the products' current prices.
pub async fn fetch_lines(conn: &mut PgConnection, cart_id: i32) -> Result<Vec<CartLine>, AppError> {
    let lines = sqlx::query_as::<_, CartLine>(LINE_QUERY)
        .bind(cart_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(lines)
}

/// Like [`fetch_lines`], but row-locks every line until the transaction ends.
///
/// An in-flight quantity upsert is waited out and its committed quantity is
/// what gets returned, so nothing added before the lock is lost.
pub async fn lock_lines(conn: &mut PgConnection, cart_id: i32) -> Result<Vec<CartLine>, AppError> {
    let lines = sqlx::query_as::<_, CartLine>(&format!("{LINE_QUERY} FOR UPDATE OF ci"))
        .bind(cart_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(lines)
}

async fn totals(conn: &mut PgConnection, cart_id: i32) -> Result<CartTotals, AppError> {
    let row = sqlx::query(
        r#"SELECT COALESCE(SUM(ci.quantity), 0)::BIGINT AS total_items,
                  COALESCE(SUM(ci.quantity * p.price), 0)::NUMERIC AS total_price
           FROM cart_items ci
           JOIN products p ON p.id = ci.product_id
           WHERE ci.cart_id = $1"#,
    )
    .bind(cart_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(CartTotals {
        total_items: row.try_get("total_items")?,
        total_price: row.try_get("total_price")?,
    })
}

pub async fn view_cart(pool: &PgPool, user_id: i32) -> Result<Cart, AppError> {
    let mut conn = pool.acquire().await?;
    let id = get_or_create_cart(&mut conn, user_id).await?;
    let items = fetch_lines(&mut conn, id).await?;

    Ok(Cart { id, user_id, items })
}

/// Adds `quantity` of an available product, accumulating onto an existing
/// line. The increment happens inside one upsert so concurrent adds of the
/// same product never lose a count.
pub async fn add_item(
    pool: &PgPool,
    user_id: i32,
    product_id: i32,
    quantity: i32,
) -> Result<CartTotals, AppError> {
    if quantity < 1 {
        return Err(AppError::validation("Quantity must be at least 1"));
    }

    let mut conn = pool.acquire().await?;

    let available = sqlx::query("SELECT 1 FROM products WHERE id = $1 AND status = 'available'")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;
    if available.is_none() {
        return Err(AppError::NotFound("Product"));
    }

    let cart_id = get_or_create_cart(&mut conn, user_id).await?;

    sqlx::query(
        r#"INSERT INTO cart_items (cart_id, product_id, quantity)
           VALUES ($1, $2, $3)
           ON CONFLICT (cart_id, product_id)
           DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity"#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    totals(&mut conn, cart_id).await
}

pub async fn remove_item(pool: &PgPool, user_id: i32, product_id: i32) -> Result<CartTotals, AppError> {
    let mut conn = pool.acquire().await?;
    let cart_id = find_cart(&mut conn, user_id)
        .await?
        .ok_or(AppError::NotFound("Cart item"))?;

    let deleted = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound("Cart item"));
    }

    totals(&mut conn, cart_id).await
}

/// Sets the line's quantity exactly. Zero or below removes the line.
pub async fn update_item(
    pool: &PgPool,
    user_id: i32,
    product_id: i32,
    quantity: i32,
) -> Result<UpdateOutcome, AppError> {
    let mut conn = pool.acquire().await?;
    let cart_id = find_cart(&mut conn, user_id)
        .await?
        .ok_or(AppError::NotFound("Cart item"))?;

    if quantity <= 0 {
        let deleted = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(AppError::NotFound("Cart item"));
        }

        return Ok(UpdateOutcome {
            totals: totals(&mut conn, cart_id).await?,
            item_total: Decimal::ZERO,
            removed: true,
        });
    }

    let item_total: Decimal = sqlx::query(
        r#"UPDATE cart_items ci
           SET quantity = $3
           FROM products p
           WHERE ci.cart_id = $1 AND ci.product_id = $2 AND p.id = ci.product_id
           RETURNING (ci.quantity * p.price)::NUMERIC AS item_total"#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("Cart item"))?
    .try_get("item_total")?;

    Ok(UpdateOutcome {
        totals: totals(&mut conn, cart_id).await?,
        item_total,
        removed: false,
    })
}

/// Empties the cart. A user who never had one has nothing to clear.
pub async fn clear(pool: &PgPool, user_id: i32) -> Result<(), AppError> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM carts WHERE user_id = $1)")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

// src/orders.rs

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool, Row};
use utoipa::ToSchema;

use crate::cart;
use crate::error::AppError;
use crate::models::{
    Cart, Order, OrderItem, OrderStatus, PaymentMethod, Refund, TrackingEntry,
};

pub const ORDER_NUMBER_PREFIX: &str = "ECF";
pub const DEFAULT_COUNTRY: &str = "India";

const MAX_ORDER_NUMBER_ATTEMPTS: usize = 8;

static ORDER_SEQUENCE: AtomicU32 = AtomicU32::new(0);
static ORDER_SEED: OnceLock<u32> = OnceLock::new();

/// Bijective on u32: every step is an xor-shift or a multiply by an odd
/// constant, both invertible.
fn mix32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// `ECF` followed by 8 uppercase hex digits.
///
/// A per-process counter goes through [`mix32`] from a random starting
/// point, so numbers never repeat within a process and look unrelated to
/// each other. The `orders.order_number` unique key covers collisions
/// between processes.
pub fn next_order_number() -> String {
    let seed = *ORDER_SEED.get_or_init(|| {
        let bytes = uuid::Uuid::new_v4().into_bytes();
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    });
    let n = ORDER_SEQUENCE.fetch_add(1, Ordering::Relaxed);

    format!("{ORDER_NUMBER_PREFIX}{:08X}", mix32(seed.wrapping_add(n)))
}

pub fn is_order_number(value: &str) -> bool {
    value.strip_prefix(ORDER_NUMBER_PREFIX).is_some_and(|hex| {
        hex.len() == 8 && hex.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    })
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ShippingInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub country: Option<String>,
}

impl ShippingInfo {
    pub fn country(&self) -> &str {
        self.country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_COUNTRY)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let s = &self.shipping;
        let missing: Vec<&str> = [
            ("name", &s.name),
            ("phone", &s.phone),
            ("address", &s.address),
            ("city", &s.city),
            ("state", &s.state),
            ("pincode", &s.pincode),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(format!(
                "Missing shipping fields: {}",
                missing.join(", ")
            )))
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderReceipt {
    pub order_id: i32,
    pub order_number: String,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub tracking: Vec<TrackingEntry>,
    pub refund: Option<Refund>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackingView {
    pub order_number: String,
    pub status: OrderStatus,
    pub tracking: Vec<TrackingEntry>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdvanceRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

async fn append_tracking(
    conn: &mut PgConnection,
    order_id: i32,
    status: &str,
    description: &str,
    location: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO order_tracking (order_id, status, description, location)
           VALUES ($1, $2, $3, $4)"#,
    )
    .bind(order_id)
    .bind(status)
    .bind(description)
    .bind(location)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Turns the user's cart into an order.
///
/// Copying the lines and clearing the cart commit together: a failure at any
/// step leaves the cart untouched and no order behind.
pub async fn create_order(
    pool: &PgPool,
    user_id: i32,
    request: &CheckoutRequest,
) -> Result<OrderReceipt, AppError> {
    request.validate()?;

    let mut tx = pool.begin().await?;

    // The cart row lock holds off new lines (their FK check needs a key-share
    // lock on it); the line locks below hold off increments to existing ones.
    let cart_id: i32 = sqlx::query("SELECT id FROM carts WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::EmptyCart)?
        .try_get("id")?;

    let cart = Cart {
        id: cart_id,
        user_id,
        items: cart::lock_lines(&mut tx, cart_id).await?,
    };
    if cart.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let subtotal = cart.total_price();
    let shipping_cost = Decimal::ZERO;
    let total_amount = subtotal + shipping_cost;
    let shipping = &request.shipping;

    let mut placed: Option<(i32, String)> = None;
    for _ in 0..MAX_ORDER_NUMBER_ATTEMPTS {
        let order_number = next_order_number();
        let row = sqlx::query(
            r#"INSERT INTO orders
                   (order_number, user_id, payment_method, subtotal, shipping_cost, total_amount,
                    shipping_name, shipping_phone, shipping_address, shipping_city,
                    shipping_state, shipping_pincode, shipping_country)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
               ON CONFLICT (order_number) DO NOTHING
               RETURNING id"#,
        )
        .bind(&order_number)
        .bind(user_id)
        .bind(request.payment_method.as_str())
        .bind(subtotal)
        .bind(shipping_cost)
        .bind(total_amount)
        .bind(shipping.name.trim())
        .bind(shipping.phone.trim())
        .bind(shipping.address.trim())
        .bind(shipping.city.trim())
        .bind(shipping.state.trim())
        .bind(shipping.pincode.trim())
        .bind(shipping.country())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = row {
            placed = Some((row.try_get("id")?, order_number));
            break;
        }
        log::warn!("order number collision on {order_number}, retrying");
    }
    let (order_id, order_number) = placed.ok_or(AppError::OrderNumberExhausted)?;

    for line in &cart.items {
        sqlx::query(
            r#"INSERT INTO order_items (order_id, product_id, quantity, price)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .execute(&mut *tx)
        .await?;
    }

    append_tracking(&mut tx, order_id, OrderStatus::Pending.as_str(), "Order placed", "").await?;

    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    log::info!(
        "order created user_id={} order={} items={} total={}",
        user_id,
        order_number,
        cart.items.len(),
        total_amount
    );

    Ok(OrderReceipt {
        order_id,
        order_number,
        total_amount,
    })
}

const ORDER_COLUMNS: &str = r#"id, order_number, user_id, status, payment_status, payment_method,
    subtotal, shipping_cost, total_amount, shipping_name, shipping_phone, shipping_address,
    shipping_city, shipping_state, shipping_pincode, shipping_country, created_at, updated_at,
    shipped_at, delivered_at"#;

pub async fn list_orders(pool: &PgPool, user_id: i32) -> Result<Vec<Order>, AppError> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
    );
    let orders = sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(orders)
}

async fn fetch_owned_order(pool: &PgPool, user_id: i32, order_id: i32) -> Result<Order, AppError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2");
    sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Order"))
}

async fn fetch_tracking(pool: &PgPool, order_id: i32) -> Result<Vec<TrackingEntry>, AppError> {
    let tracking = sqlx::query_as::<_, TrackingEntry>(
        r#"SELECT id, order_id, status, description, location, created_at
           FROM order_tracking
           WHERE order_id = $1
           ORDER BY created_at DESC, id DESC"#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(tracking)
}

pub async fn order_detail(pool: &PgPool, user_id: i32, order_id: i32) -> Result<OrderDetail, AppError> {
    let order = fetch_owned_order(pool, user_id, order_id).await?;

    let items = sqlx::query_as::<_, OrderItem>(
        r#"SELECT oi.id, oi.order_id, oi.product_id, p.title, oi.quantity, oi.price
           FROM order_items oi
           JOIN products p ON p.id = oi.product_id
           WHERE oi.order_id = $1
           ORDER BY oi.id"#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    let refund = sqlx::query_as::<_, Refund>(
        "SELECT id, order_id, reason, status, amount, created_at FROM refunds WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    Ok(OrderDetail {
        tracking: fetch_tracking(pool, order_id).await?,
        order,
        items,
        refund,
    })
}

pub async fn track_order(pool: &PgPool, user_id: i32, order_id: i32) -> Result<TrackingView, AppError> {
    let order = fetch_owned_order(pool, user_id, order_id).await?;

    Ok(TrackingView {
        tracking: fetch_tracking(pool, order_id).await?,
        order_number: order.order_number,
        status: order.status,
    })
}

/// Buyer-side cancellation, allowed while the order is pending or confirmed.
pub async fn cancel_order(pool: &PgPool, user_id: i32, order_id: i32) -> Result<OrderStatus, AppError> {
    let mut tx = pool.begin().await?;

    let status: OrderStatus = sqlx::query(
        "SELECT status FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Order"))?
    .try_get::<String, _>("status")?
    .parse()?;

    if !status.is_cancellable() {
        return Err(AppError::InvalidTransition {
            from: status,
            to: OrderStatus::Cancelled,
        });
    }

    sqlx::query("UPDATE orders SET status = 'cancelled', updated_at = NOW() WHERE id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    append_tracking(
        &mut tx,
        order_id,
        OrderStatus::Cancelled.as_str(),
        "Order cancelled by customer",
        "",
    )
    .await?;

    tx.commit().await?;

    log::info!("order cancelled order_id={} from={}", order_id, status);

    Ok(OrderStatus::Cancelled)
}

fn default_description(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Order placed",
        OrderStatus::Confirmed => "Order confirmed by seller",
        OrderStatus::Shipped => "Order shipped",
        OrderStatus::Delivered => "Order delivered",
        OrderStatus::Cancelled => "Order cancelled",
        OrderStatus::Returned => "Order returned",
    }
}

/// Seller-side fulfilment. Only a seller of at least one item in the order
/// may move it along.
pub async fn advance_order(
    pool: &PgPool,
    seller_id: i32,
    order_id: i32,
    request: &AdvanceRequest,
) -> Result<OrderStatus, AppError> {
    let mut tx = pool.begin().await?;

    let status: OrderStatus = sqlx::query(
        r#"SELECT o.status
           FROM orders o
           WHERE o.id = $1
             AND EXISTS (
                 SELECT 1 FROM order_items oi
                 JOIN products p ON p.id = oi.product_id
                 WHERE oi.order_id = o.id AND p.seller_id = $2
             )
           FOR UPDATE OF o"#,
    )
    .bind(order_id)
    .bind(seller_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Order"))?
    .try_get::<String, _>("status")?
    .parse()?;

    let next = request.status;
    if !status.can_advance_to(next) {
        return Err(AppError::InvalidTransition { from: status, to: next });
    }

    sqlx::query(
        r#"UPDATE orders
           SET status = $2,
               updated_at = NOW(),
               shipped_at = CASE WHEN $2 = 'shipped' THEN NOW() ELSE shipped_at END,
               delivered_at = CASE WHEN $2 = 'delivered' THEN NOW() ELSE delivered_at END,
               payment_status = CASE
                   WHEN $2 = 'delivered' AND payment_method = 'cash_on_delivery' THEN 'paid'
                   ELSE payment_status
               END
           WHERE id = $1"#,
    )
    .bind(order_id)
    .bind(next.as_str())
    .execute(&mut *tx)
    .await?;

    if next == OrderStatus::Delivered {
        sqlx::query(
            r#"UPDATE user_profiles up
               SET total_products_sold = up.total_products_sold + sold.quantity,
                   updated_at = NOW()
               FROM (
                   SELECT p.seller_id, SUM(oi.quantity)::INTEGER AS quantity
                   FROM order_items oi
                   JOIN products p ON p.id = oi.product_id
                   WHERE oi.order_id = $1
                   GROUP BY p.seller_id
               ) sold
               WHERE up.user_id = sold.seller_id"#,
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"UPDATE products SET status = 'sold', updated_at = NOW()
               WHERE id IN (SELECT product_id FROM order_items WHERE order_id = $1)"#,
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
    }

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(default_description(next));
    let location = request.location.as_deref().map(str::trim).unwrap_or("");

    append_tracking(&mut tx, order_id, next.as_str(), description, location).await?;

    tx.commit().await?;

    log::info!(
        "order status changed order_id={} seller_id={} {} -> {}",
        order_id,
        seller_id,
        status,
        next
    );

    Ok(next)
}

/// One refund request per order, for the full order amount.
pub async fn request_refund(
    pool: &PgPool,
    user_id: i32,
    order_id: i32,
    reason: &str,
) -> Result<Refund, AppError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::validation("A refund reason is required"));
    }

    let mut tx = pool.begin().await?;

    let total_amount: Decimal =
        sqlx::query("SELECT total_amount FROM orders WHERE id = $1 AND user_id = $2")
            .bind(order_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("Order"))?
            .try_get("total_amount")?;

    let refund = sqlx::query_as::<_, Refund>(
        r#"INSERT INTO refunds (order_id, reason, amount)
           VALUES ($1, $2, $3)
           ON CONFLICT (order_id) DO NOTHING
           RETURNING id, order_id, reason, status, amount, created_at"#,
    )
    .bind(order_id)
    .bind(reason)
    .bind(total_amount)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::AlreadyExists("Refund request"))?;

    append_tracking(
        &mut tx,
        order_id,
        "refund_requested",
        "Refund requested by customer",
        "",
    )
    .await?;

    tx.commit().await?;

    Ok(refund)
}

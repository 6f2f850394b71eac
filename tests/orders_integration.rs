use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use resale_market::cart;
use resale_market::error::AppError;
use resale_market::models::{OrderStatus, PaymentMethod, PaymentStatus};
use resale_market::orders::{
    self, AdvanceRequest, CheckoutRequest, ShippingInfo, is_order_number,
};

mod support;

fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal")
}

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        shipping: ShippingInfo {
            name: "Asha".to_string(),
            phone: "9999999999".to_string(),
            address: "12 Lake Road".to_string(),
            city: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            pincode: "411001".to_string(),
            country: None,
        },
        payment_method: PaymentMethod::CashOnDelivery,
    }
}

fn advance(status: OrderStatus) -> AdvanceRequest {
    AdvanceRequest {
        status,
        description: None,
        location: None,
    }
}

struct Fixture {
    seller: i32,
    buyer: i32,
    lamp: i32,
    chair: i32,
}

async fn fixture(pool: &PgPool) -> Fixture {
    let seller = support::create_user(pool, "seller").await;
    let buyer = support::create_user(pool, "buyer").await;
    let category = support::create_category(pool).await;
    let lamp = support::create_product(pool, seller, category, dec("40.00")).await;
    let chair = support::create_product(pool, seller, category, dec("125.50")).await;

    cart::add_item(pool, buyer, lamp, 2).await.expect("add lamp");
    cart::add_item(pool, buyer, chair, 1).await.expect("add chair");

    Fixture {
        seller,
        buyer,
        lamp,
        chair,
    }
}

#[actix_web::test]
async fn empty_cart_cannot_check_out() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let buyer = support::create_user(pool, "buyer").await;

    assert!(matches!(
        orders::create_order(pool, buyer, &checkout_request()).await,
        Err(AppError::EmptyCart)
    ));

    cart::view_cart(pool, buyer).await.expect("create empty cart");
    assert!(matches!(
        orders::create_order(pool, buyer, &checkout_request()).await,
        Err(AppError::EmptyCart)
    ));
}

#[actix_web::test]
async fn checkout_copies_lines_at_frozen_prices_and_drains_cart() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let f = fixture(pool).await;

    let receipt = orders::create_order(pool, f.buyer, &checkout_request())
        .await
        .expect("checkout");
    assert!(is_order_number(&receipt.order_number));
    assert_eq!(receipt.total_amount, dec("205.50"));

    assert!(cart::view_cart(pool, f.buyer).await.expect("view").is_empty());

    sqlx::query("UPDATE products SET price = price * 3 WHERE id = ANY($1)")
        .bind(vec![f.lamp, f.chair])
        .execute(pool)
        .await
        .expect("reprice");

    let detail = orders::order_detail(pool, f.buyer, receipt.order_id)
        .await
        .expect("detail");
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.payment_status, PaymentStatus::Pending);
    assert_eq!(detail.order.shipping_country, "India");
    assert_eq!(detail.order.subtotal, dec("205.50"));
    assert_eq!(detail.items.len(), 2);

    let lamp = detail.items.iter().find(|i| i.product_id == f.lamp).expect("lamp item");
    assert_eq!(lamp.quantity, 2);
    assert_eq!(lamp.price, dec("40.00"));
    let chair = detail.items.iter().find(|i| i.product_id == f.chair).expect("chair item");
    assert_eq!(chair.price, dec("125.50"));

    assert_eq!(detail.tracking.len(), 1);
    assert_eq!(detail.tracking[0].status, "pending");
}

#[actix_web::test]
async fn orders_are_private_to_the_buyer() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let f = fixture(pool).await;
    let stranger = support::create_user(pool, "stranger").await;

    let receipt = orders::create_order(pool, f.buyer, &checkout_request())
        .await
        .expect("checkout");

    assert!(matches!(
        orders::order_detail(pool, stranger, receipt.order_id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        orders::cancel_order(pool, stranger, receipt.order_id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(orders::list_orders(pool, stranger).await.expect("list").is_empty());
    assert_eq!(orders::list_orders(pool, f.buyer).await.expect("list").len(), 1);
}

#[actix_web::test]
async fn cancel_only_before_shipping() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let f = fixture(pool).await;

    let first = orders::create_order(pool, f.buyer, &checkout_request())
        .await
        .expect("checkout");
    let status = orders::cancel_order(pool, f.buyer, first.order_id)
        .await
        .expect("cancel pending");
    assert_eq!(status, OrderStatus::Cancelled);
    assert!(matches!(
        orders::cancel_order(pool, f.buyer, first.order_id).await,
        Err(AppError::InvalidTransition {
            from: OrderStatus::Cancelled,
            ..
        })
    ));

    let tracking = orders::track_order(pool, f.buyer, first.order_id)
        .await
        .expect("track");
    assert_eq!(tracking.status, OrderStatus::Cancelled);
    assert_eq!(tracking.tracking[0].status, "cancelled");
    assert_eq!(tracking.tracking[0].description, "Order cancelled by customer");

    cart::add_item(pool, f.buyer, f.lamp, 1).await.expect("refill");
    let second = orders::create_order(pool, f.buyer, &checkout_request())
        .await
        .expect("checkout again");
    orders::advance_order(pool, f.seller, second.order_id, &advance(OrderStatus::Confirmed))
        .await
        .expect("confirm");
    orders::advance_order(pool, f.seller, second.order_id, &advance(OrderStatus::Shipped))
        .await
        .expect("ship");

    assert!(matches!(
        orders::cancel_order(pool, f.buyer, second.order_id).await,
        Err(AppError::InvalidTransition {
            from: OrderStatus::Shipped,
            ..
        })
    ));
    let detail = orders::order_detail(pool, f.buyer, second.order_id)
        .await
        .expect("detail");
    assert_eq!(detail.order.status, OrderStatus::Shipped);
    assert!(detail.order.shipped_at.is_some());
}

#[actix_web::test]
async fn delivery_settles_cash_orders_and_counts_sales() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let f = fixture(pool).await;

    let receipt = orders::create_order(pool, f.buyer, &checkout_request())
        .await
        .expect("checkout");

    assert!(matches!(
        orders::advance_order(pool, f.buyer, receipt.order_id, &advance(OrderStatus::Confirmed)).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        orders::advance_order(pool, f.seller, receipt.order_id, &advance(OrderStatus::Delivered)).await,
        Err(AppError::InvalidTransition { .. })
    ));

    for next in [OrderStatus::Confirmed, OrderStatus::Shipped, OrderStatus::Delivered] {
        orders::advance_order(pool, f.seller, receipt.order_id, &advance(next))
            .await
            .expect("advance");
    }

    let detail = orders::order_detail(pool, f.buyer, receipt.order_id)
        .await
        .expect("detail");
    assert_eq!(detail.order.status, OrderStatus::Delivered);
    assert_eq!(detail.order.payment_status, PaymentStatus::Paid);
    assert!(detail.order.delivered_at.is_some());
    assert_eq!(detail.tracking.len(), 4);
    assert_eq!(detail.tracking[0].status, "delivered");

    let sold: i32 = sqlx::query("SELECT total_products_sold FROM user_profiles WHERE user_id = $1")
        .bind(f.seller)
        .fetch_one(pool)
        .await
        .expect("profile")
        .get("total_products_sold");
    assert_eq!(sold, 3);

    let statuses: Vec<String> = sqlx::query("SELECT status FROM products WHERE id = ANY($1)")
        .bind(vec![f.lamp, f.chair])
        .fetch_all(pool)
        .await
        .expect("products")
        .iter()
        .map(|r| r.get("status"))
        .collect();
    assert!(statuses.iter().all(|s| s == "sold"));
}

#[actix_web::test]
async fn one_refund_request_per_order() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let f = fixture(pool).await;

    let receipt = orders::create_order(pool, f.buyer, &checkout_request())
        .await
        .expect("checkout");

    assert!(matches!(
        orders::request_refund(pool, f.buyer, receipt.order_id, "   ").await,
        Err(AppError::Validation(_))
    ));

    let refund = orders::request_refund(pool, f.buyer, receipt.order_id, "Arrived scratched")
        .await
        .expect("refund");
    assert_eq!(refund.amount, receipt.total_amount);
    assert_eq!(refund.reason, "Arrived scratched");

    assert!(matches!(
        orders::request_refund(pool, f.buyer, receipt.order_id, "Again").await,
        Err(AppError::AlreadyExists(_))
    ));

    let refunds: i64 = sqlx::query("SELECT COUNT(*) AS n FROM refunds WHERE order_id = $1")
        .bind(receipt.order_id)
        .fetch_one(pool)
        .await
        .expect("count")
        .get("n");
    assert_eq!(refunds, 1);

    let detail = orders::order_detail(pool, f.buyer, receipt.order_id)
        .await
        .expect("detail");
    assert!(detail.refund.is_some());
    assert_eq!(detail.tracking[0].status, "refund_requested");
}

#[actix_web::test]
async fn checkout_waits_for_an_in_flight_increment() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;
    let seller = support::create_user(pool, "seller").await;
    let buyer = support::create_user(pool, "buyer").await;
    let category = support::create_category(pool).await;
    let vase = support::create_product(pool, seller, category, dec("15.00")).await;
    cart::add_item(pool, buyer, vase, 2).await.expect("add vase");

    // Same upsert as `cart::add_item`, held open across the checkout.
    let mut increment = pool.begin().await.expect("begin");
    sqlx::query(
        r#"INSERT INTO cart_items (cart_id, product_id, quantity)
           SELECT id, $2, 3 FROM carts WHERE user_id = $1
           ON CONFLICT (cart_id, product_id)
           DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity"#,
    )
    .bind(buyer)
    .bind(vase)
    .execute(&mut *increment)
    .await
    .expect("pending increment");

    let checkout_pool = pool.clone();
    let checkout = actix_web::rt::spawn(async move {
        orders::create_order(&checkout_pool, buyer, &checkout_request()).await
    });

    actix_web::rt::time::sleep(Duration::from_millis(300)).await;
    increment.commit().await.expect("commit increment");

    let receipt = checkout.await.expect("join").expect("checkout");
    let detail = orders::order_detail(pool, buyer, receipt.order_id)
        .await
        .expect("detail");
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].quantity, 5);
    assert_eq!(receipt.total_amount, dec("75.00"));
    assert!(cart::view_cart(pool, buyer).await.expect("view").is_empty());
}

use rust_decimal::Decimal;

use resale_market::models::{Cart, CartLine, OrderItem};

fn line(product_id: i32, unit_price: &str, quantity: i32) -> CartLine {
    CartLine {
        product_id,
        title: format!("Item {product_id}"),
        slug: format!("item-{product_id}"),
        unit_price: unit_price.parse().expect("decimal"),
        quantity,
    }
}

#[test]
fn empty_cart_totals_are_zero() {
    let cart = Cart {
        id: 1,
        user_id: 1,
        items: Vec::new(),
    };
    assert!(cart.is_empty());
    assert_eq!(cart.total_items(), 0);
    assert_eq!(cart.total_price(), Decimal::ZERO);
}

#[test]
fn totals_sum_quantities_and_line_prices() {
    let cart = Cart {
        id: 1,
        user_id: 1,
        items: vec![line(1, "199.99", 2), line(2, "49.50", 3), line(3, "0.01", 1)],
    };

    assert_eq!(cart.total_items(), 6);
    assert_eq!(cart.total_price(), "548.49".parse::<Decimal>().expect("decimal"));
    assert_eq!(
        cart.total_price(),
        cart.items.iter().map(CartLine::total_price).sum::<Decimal>()
    );
}

#[test]
fn line_total_is_exact_in_decimal() {
    assert_eq!(line(1, "0.10", 3).total_price(), "0.30".parse::<Decimal>().expect("decimal"));
}

#[test]
fn order_item_total_uses_frozen_price() {
    let item = OrderItem {
        id: 1,
        order_id: 1,
        product_id: 1,
        title: "Lamp".to_string(),
        quantity: 4,
        price: "12.25".parse().expect("decimal"),
    };
    assert_eq!(item.total_price(), "49.00".parse::<Decimal>().expect("decimal"));
}

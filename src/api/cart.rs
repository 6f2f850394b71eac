// src/api/cart.rs

use actix_web::web::ReqData;
use actix_web::{HttpResponse, get, post, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppState;
use crate::cart;
use crate::error::AppError;
use crate::models::CartLine;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartItemBody {
    pub product_id: i32,
    #[serde(default = "one")]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveItemBody {
    pub product_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub success: bool,
    pub items: Vec<CartLineView>,
    pub total_items: i64,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartChanged {
    pub success: bool,
    pub message: String,
    pub cart_total: Decimal,
    pub total_items: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartUpdated {
    pub success: bool,
    pub message: String,
    pub cart_total: Decimal,
    pub total_items: i64,
    pub item_total: Decimal,
}

#[utoipa::path(
    get,
    path = "/cart/",
    tag = "cart",
    responses((status = 200, description = "Current cart", body = CartView))
)]
#[get("/")]
pub async fn view(state: web::Data<AppState>, user_id: ReqData<i32>) -> Result<HttpResponse, AppError> {
    let cart = cart::view_cart(&state.pool, user_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(CartView {
        success: true,
        total_items: cart.total_items(),
        total_price: cart.total_price(),
        items: cart
            .items
            .into_iter()
            .map(|line| CartLineView {
                total_price: line.total_price(),
                line,
            })
            .collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/cart/add/",
    tag = "cart",
    request_body = CartItemBody,
    responses(
        (status = 200, description = "Item added", body = CartChanged),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "Product not found or not available")
    )
)]
#[post("/add/")]
pub async fn add(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    body: web::Json<CartItemBody>,
) -> Result<HttpResponse, AppError> {
    let totals = cart::add_item(&state.pool, user_id.into_inner(), body.product_id, body.quantity).await?;

    Ok(HttpResponse::Ok().json(CartChanged {
        success: true,
        message: "Item added to cart".to_string(),
        cart_total: totals.total_price,
        total_items: totals.total_items,
    }))
}

#[utoipa::path(
    post,
    path = "/cart/update/",
    tag = "cart",
    request_body = CartItemBody,
    responses(
        (status = 200, description = "Quantity set, or line removed when quantity <= 0", body = CartUpdated),
        (status = 404, description = "Item not in cart")
    )
)]
#[post("/update/")]
pub async fn update(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    body: web::Json<CartItemBody>,
) -> Result<HttpResponse, AppError> {
    let outcome = cart::update_item(&state.pool, user_id.into_inner(), body.product_id, body.quantity).await?;

    let message = if outcome.removed { "Item removed from cart" } else { "Cart updated" };
    Ok(HttpResponse::Ok().json(CartUpdated {
        success: true,
        message: message.to_string(),
        cart_total: outcome.totals.total_price,
        total_items: outcome.totals.total_items,
        item_total: outcome.item_total,
    }))
}

#[utoipa::path(
    post,
    path = "/cart/remove/",
    tag = "cart",
    request_body = RemoveItemBody,
    responses(
        (status = 200, description = "Line removed", body = CartChanged),
        (status = 404, description = "Item not in cart")
    )
)]
#[post("/remove/")]
pub async fn remove(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    body: web::Json<RemoveItemBody>,
) -> Result<HttpResponse, AppError> {
    let totals = cart::remove_item(&state.pool, user_id.into_inner(), body.product_id).await?;

    Ok(HttpResponse::Ok().json(CartChanged {
        success: true,
        message: "Item removed from cart".to_string(),
        cart_total: totals.total_price,
        total_items: totals.total_items,
    }))
}

#[utoipa::path(
    post,
    path = "/cart/clear/",
    tag = "cart",
    responses((status = 200, description = "Cart emptied", body = CartChanged))
)]
#[post("/clear/")]
pub async fn clear(state: web::Data<AppState>, user_id: ReqData<i32>) -> Result<HttpResponse, AppError> {
    cart::clear(&state.pool, user_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(CartChanged {
        success: true,
        message: "Cart cleared".to_string(),
        cart_total: Decimal::ZERO,
        total_items: 0,
    }))
}

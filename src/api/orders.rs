// src/api/orders.rs

use actix_web::web::ReqData;
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::AppState;
use crate::error::AppError;
use crate::models::{Order, OrderStatus, Refund};
use crate::orders::{self, AdvanceRequest, CheckoutRequest, OrderDetail, TrackingView};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCreated {
    pub success: bool,
    pub message: String,
    pub order_id: i32,
    pub order_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusChanged {
    pub success: bool,
    pub message: String,
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundBody {
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefundRequested {
    pub success: bool,
    pub message: String,
    pub refund: Refund,
}

#[utoipa::path(
    get,
    path = "/orders/",
    tag = "orders",
    responses((status = 200, description = "Orders, newest first", body = [Order]))
)]
#[get("/")]
pub async fn list(state: web::Data<AppState>, user_id: ReqData<i32>) -> Result<HttpResponse, AppError> {
    let orders = orders::list_orders(&state.pool, user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "orders": orders })))
}

#[utoipa::path(
    post,
    path = "/orders/create/",
    tag = "orders",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order placed and cart emptied", body = OrderCreated),
        (status = 400, description = "Empty cart or missing shipping fields")
    )
)]
#[post("/create/")]
pub async fn create(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let receipt = orders::create_order(&state.pool, user_id.into_inner(), &body).await?;

    Ok(HttpResponse::Ok().json(OrderCreated {
        success: true,
        message: format!("Order {} placed successfully", receipt.order_number),
        order_id: receipt.order_id,
        order_number: receipt.order_number,
    }))
}

#[utoipa::path(
    get,
    path = "/orders/{id}/",
    tag = "orders",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items and tracking", body = OrderDetail),
        (status = 404, description = "No such order for this user")
    )
)]
#[get("/{id}/")]
pub async fn detail(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let order = orders::order_detail(&state.pool, user_id.into_inner(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

#[utoipa::path(
    post,
    path = "/orders/{id}/cancel/",
    tag = "orders",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Cancelled, or success=false when the order is past confirmation", body = StatusChanged),
        (status = 404, description = "No such order for this user")
    )
)]
#[post("/{id}/cancel/")]
pub async fn cancel(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let status = orders::cancel_order(&state.pool, user_id.into_inner(), path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(StatusChanged {
        success: true,
        message: "Order cancelled".to_string(),
        status,
    }))
}

#[utoipa::path(
    get,
    path = "/orders/{id}/track/",
    tag = "orders",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Tracking log, newest first. Also served on POST", body = TrackingView),
        (status = 404, description = "No such order for this user")
    )
)]
pub async fn track(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let view = orders::track_order(&state.pool, user_id.into_inner(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    post,
    path = "/orders/{id}/refund/",
    tag = "orders",
    params(("id" = i32, Path, description = "Order id")),
    request_body = RefundBody,
    responses(
        (status = 200, description = "Refund requested, or success=false when one exists", body = RefundRequested),
        (status = 400, description = "Missing reason"),
        (status = 404, description = "No such order for this user")
    )
)]
#[post("/{id}/refund/")]
pub async fn refund(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
    body: web::Json<RefundBody>,
) -> Result<HttpResponse, AppError> {
    let requested =
        orders::request_refund(&state.pool, user_id.into_inner(), path.into_inner(), &body.reason).await?;

    Ok(HttpResponse::Ok().json(RefundRequested {
        success: true,
        message: "Refund request submitted".to_string(),
        refund: requested,
    }))
}

#[utoipa::path(
    post,
    path = "/orders/{id}/status/",
    tag = "orders",
    params(("id" = i32, Path, description = "Order id")),
    request_body = AdvanceRequest,
    responses(
        (status = 200, description = "Status advanced, or success=false on an invalid move", body = StatusChanged),
        (status = 404, description = "Caller sells nothing in this order")
    )
)]
#[post("/{id}/status/")]
pub async fn advance(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
    body: web::Json<AdvanceRequest>,
) -> Result<HttpResponse, AppError> {
    let status = orders::advance_order(&state.pool, user_id.into_inner(), path.into_inner(), &body).await?;

    Ok(HttpResponse::Ok().json(StatusChanged {
        success: true,
        message: format!("Order marked {status}"),
        status,
    }))
}

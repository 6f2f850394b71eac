// src/api/products.rs

use actix_web::web::ReqData;
use actix_web::{HttpResponse, get, post, web};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::AppState;
use crate::catalog::{
    self, CreatedListing, NewImage, NewProduct, NewReview, ProductDetail, ProductFilter,
    ProductUpdate,
};
use crate::error::AppError;
use crate::models::{Category, Product, ProductImage};

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub success: bool,
    pub count: usize,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingCreated {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub listing: CreatedListing,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistToggled {
    pub success: bool,
    pub in_wishlist: bool,
}

#[utoipa::path(
    get,
    path = "/products/",
    tag = "catalog",
    params(ProductFilter),
    responses((status = 200, description = "Available products matching the filters", body = ProductList))
)]
#[get("/products/")]
pub async fn list_products(
    state: web::Data<AppState>,
    filter: web::Query<ProductFilter>,
) -> Result<HttpResponse, AppError> {
    let products = catalog::list_products(&state.pool, &filter).await?;

    Ok(HttpResponse::Ok().json(ProductList {
        success: true,
        count: products.len(),
        products,
    }))
}

#[utoipa::path(
    get,
    path = "/products/{slug}/",
    tag = "catalog",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product with images and reviews", body = ProductDetail),
        (status = 404, description = "No available product with this slug")
    )
)]
#[get("/products/{slug}/")]
pub async fn product_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let detail = catalog::get_product(&state.pool, &path).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[utoipa::path(
    get,
    path = "/categories/",
    tag = "catalog",
    responses((status = 200, description = "All categories by name", body = [Category]))
)]
#[get("/categories/")]
pub async fn list_categories(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let categories = catalog::list_categories(&state.pool).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "categories": categories })))
}

#[get("/")]
pub async fn my_listings(state: web::Data<AppState>, user_id: ReqData<i32>) -> Result<HttpResponse, AppError> {
    let products = catalog::list_seller_products(&state.pool, user_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ProductList {
        success: true,
        count: products.len(),
        products,
    }))
}

#[utoipa::path(
    post,
    path = "/listings/create/",
    tag = "listings",
    request_body = NewProduct,
    responses(
        (status = 200, description = "Listed; the seller earns listing points", body = ListingCreated),
        (status = 400, description = "Invalid product fields"),
        (status = 404, description = "Unknown category")
    )
)]
#[post("/create/")]
pub async fn create_listing(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    body: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
    let listing = catalog::create_product(&state.pool, user_id.into_inner(), &body).await?;

    let message = if listing.progression.leveled_up() {
        format!(
            "Product listed! You earned points and reached level {}",
            listing.progression.level
        )
    } else {
        "Product listed! You earned points".to_string()
    };

    Ok(HttpResponse::Ok().json(ListingCreated {
        success: true,
        message,
        listing,
    }))
}

#[utoipa::path(
    post,
    path = "/listings/{id}/edit/",
    tag = "listings",
    params(("id" = i32, Path, description = "Product id")),
    request_body = ProductUpdate,
    responses(
        (status = 200, description = "Updated product", body = Product),
        (status = 404, description = "Not one of the caller's products")
    )
)]
#[post("/{id}/edit/")]
pub async fn edit_listing(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
    body: web::Json<ProductUpdate>,
) -> Result<HttpResponse, AppError> {
    let product =
        catalog::update_product(&state.pool, user_id.into_inner(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "product": product })))
}

#[post("/{id}/delete/")]
pub async fn delete_listing(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    catalog::delete_product(&state.pool, user_id.into_inner(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Product deleted" })))
}

#[utoipa::path(
    post,
    path = "/listings/{id}/images/",
    tag = "listings",
    params(("id" = i32, Path, description = "Product id")),
    request_body = NewImage,
    responses(
        (status = 200, description = "Image saved; a new primary replaces the old one", body = ProductImage),
        (status = 404, description = "Not one of the caller's products")
    )
)]
#[post("/{id}/images/")]
pub async fn add_image(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
    body: web::Json<NewImage>,
) -> Result<HttpResponse, AppError> {
    let image = catalog::add_image(&state.pool, user_id.into_inner(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "image": image })))
}

#[post("/{id}/review/")]
pub async fn review(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
    body: web::Json<NewReview>,
) -> Result<HttpResponse, AppError> {
    let outcome =
        catalog::upsert_review(&state.pool, user_id.into_inner(), path.into_inner(), &body).await?;

    let message = if outcome.created { "Review added" } else { "Review updated" };
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": message,
        "review_id": outcome.review_id,
    })))
}

#[utoipa::path(
    post,
    path = "/listings/{id}/wishlist/",
    tag = "listings",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Wishlist state after the toggle", body = WishlistToggled),
        (status = 404, description = "Unknown product")
    )
)]
#[post("/{id}/wishlist/")]
pub async fn toggle_wishlist(
    state: web::Data<AppState>,
    user_id: ReqData<i32>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let in_wishlist =
        catalog::toggle_wishlist(&state.pool, user_id.into_inner(), path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(WishlistToggled {
        success: true,
        in_wishlist,
    }))
}

// src/catalog.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::models::{
    Category, Condition, Product, ProductImage, ProductReview, ProductStatus, WishlistEntry,
};
use crate::progression::{self, LISTING_POINTS, PointsUpdate};

macro_rules! product_columns {
    () => {
        "id, title, slug, description, category_id, seller_id, price, original_price, condition, \
         brand, status, is_featured, city, state, country, created_at, updated_at, published_at"
    };
}

const MAX_SLUG_ATTEMPTS: u32 = 20;

/// Lowercase ASCII words joined by single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: i32,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub condition: Condition,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("Title is required"));
        }
        if self.price <= Decimal::ZERO {
            return Err(AppError::validation("Price must be greater than zero"));
        }
        if self.original_price.is_some_and(|p| p <= Decimal::ZERO) {
            return Err(AppError::validation("Original price must be greater than zero"));
        }
        Ok(())
    }

    pub fn status(&self) -> ProductStatus {
        self.status.unwrap_or(ProductStatus::Available)
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProductUpdate {
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedListing {
    pub product: Product,
    pub progression: PointsUpdate,
}

/// Lists a product and credits the seller for it. The listing, the
/// listed-products counter and the point grant commit together.
pub async fn create_product(
    pool: &PgPool,
    seller_id: i32,
    new: &NewProduct,
) -> Result<CreatedListing, AppError> {
    new.validate()?;

    let mut tx = pool.begin().await?;

    let category = sqlx::query("SELECT 1 FROM categories WHERE id = $1")
        .bind(new.category_id)
        .fetch_optional(&mut *tx)
        .await?;
    if category.is_none() {
        return Err(AppError::NotFound("Category"));
    }

    let base = slugify(&new.title);
    let status = new.status();
    let country = new
        .country
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("India");

    let mut product = None;
    for attempt in 1..=MAX_SLUG_ATTEMPTS + 1 {
        let slug = match attempt {
            1 => base.clone(),
            n if n <= MAX_SLUG_ATTEMPTS => format!("{base}-{n}"),
            _ => format!("{base}-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]),
        };

        product = sqlx::query_as::<_, Product>(concat!(
            "INSERT INTO products (title, slug, description, category_id, seller_id, price, \
             original_price, condition, brand, status, city, state, country, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, \
             CASE WHEN $10 = 'available' THEN NOW() END) \
             ON CONFLICT (slug) DO NOTHING RETURNING ",
            product_columns!()
        ))
        .bind(new.title.trim())
        .bind(&slug)
        .bind(new.description.trim())
        .bind(new.category_id)
        .bind(seller_id)
        .bind(new.price)
        .bind(new.original_price)
        .bind(new.condition.as_str())
        .bind(new.brand.trim())
        .bind(status.as_str())
        .bind(new.city.trim())
        .bind(new.state.trim())
        .bind(country)
        .fetch_optional(&mut *tx)
        .await?;

        if product.is_some() {
            break;
        }
    }
    let product = product.ok_or(AppError::AlreadyExists("Product slug"))?;

    sqlx::query(
        r#"UPDATE user_profiles
           SET total_products_listed = total_products_listed + 1
           WHERE user_id = $1"#,
    )
    .bind(seller_id)
    .execute(&mut *tx)
    .await?;

    let progression = progression::add_points(&mut tx, seller_id, LISTING_POINTS).await?;

    tx.commit().await?;

    log::info!(
        "product listed id={} slug={} seller_id={} points={}",
        product.id,
        product.slug,
        seller_id,
        progression.points
    );

    Ok(CreatedListing {
        product,
        progression,
    })
}

/// Owner-only edit. `published_at` is stamped the first time the product
/// becomes available and never moved afterwards.
pub async fn update_product(
    pool: &PgPool,
    seller_id: i32,
    product_id: i32,
    update: &ProductUpdate,
) -> Result<Product, AppError> {
    if update.price.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(AppError::validation("Price must be greater than zero"));
    }

    sqlx::query_as::<_, Product>(concat!(
        "UPDATE products SET \
             price = COALESCE($3, price), \
             status = COALESCE($4, status), \
             description = COALESCE($5, description), \
             is_featured = COALESCE($6, is_featured), \
             published_at = CASE WHEN COALESCE($4, status) = 'available' \
                 THEN COALESCE(published_at, NOW()) ELSE published_at END, \
             updated_at = NOW() \
         WHERE id = $1 AND seller_id = $2 \
         RETURNING ",
        product_columns!()
    ))
    .bind(product_id)
    .bind(seller_id)
    .bind(update.price)
    .bind(update.status.map(ProductStatus::as_str))
    .bind(update.description.as_deref().map(str::trim))
    .bind(update.is_featured)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Product"))
}

pub async fn delete_product(pool: &PgPool, seller_id: i32, product_id: i32) -> Result<(), AppError> {
    let deleted = sqlx::query("DELETE FROM products WHERE id = $1 AND seller_id = $2")
        .bind(product_id)
        .bind(seller_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Product"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    Oldest,
    PriceLow,
    PriceHigh,
}

impl ProductSort {
    /// Unknown values fall back to newest first.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("oldest") => ProductSort::Oldest,
            Some("price_low") => ProductSort::PriceLow,
            Some("price_high") => ProductSort::PriceHigh,
            _ => ProductSort::Newest,
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            ProductSort::Newest => " ORDER BY created_at DESC, id DESC",
            ProductSort::Oldest => " ORDER BY created_at ASC, id ASC",
            ProductSort::PriceLow => " ORDER BY price ASC, id ASC",
            ProductSort::PriceHigh => " ORDER BY price DESC, id DESC",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub condition: Option<Condition>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<String>,
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Available products matching every filter that is set. An unknown
/// category slug is ignored rather than emptying the result.
pub async fn list_products(pool: &PgPool, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
    let category_id: Option<i32> = match filter.category.as_deref().filter(|s| !s.is_empty()) {
        Some(slug) => sqlx::query("SELECT id FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await?
            .map(|r| r.get("id")),
        None => None,
    };

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(concat!(
        "SELECT ",
        product_columns!(),
        " FROM products WHERE status = 'available'"
    ));

    if let Some(id) = category_id {
        qb.push(" AND category_id = ").push_bind(id);
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(term);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR brand ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(condition) = filter.condition {
        qb.push(" AND condition = ").push_bind(condition.as_str());
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    qb.push(ProductSort::from_param(filter.sort.as_deref()).order_by());

    let products = qb.build_query_as::<Product>().fetch_all(pool).await?;
    Ok(products)
}

pub async fn list_seller_products(pool: &PgPool, seller_id: i32) -> Result<Vec<Product>, AppError> {
    let products = sqlx::query_as::<_, Product>(concat!(
        "SELECT ",
        product_columns!(),
        " FROM products WHERE seller_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(seller_id)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub category: Category,
    pub seller_username: String,
    /// Primary image first.
    pub images: Vec<ProductImage>,
    pub reviews: Vec<ProductReview>,
    pub average_rating: Option<f64>,
    pub discount_percentage: u32,
}

pub async fn get_product(pool: &PgPool, slug: &str) -> Result<ProductDetail, AppError> {
    let product = sqlx::query_as::<_, Product>(concat!(
        "SELECT ",
        product_columns!(),
        " FROM products WHERE slug = $1 AND status = 'available'"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Product"))?;

    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, description FROM categories WHERE id = $1",
    )
    .bind(product.category_id)
    .fetch_one(pool)
    .await?;

    let seller_username: String = sqlx::query("SELECT username FROM users WHERE id = $1")
        .bind(product.seller_id)
        .fetch_one(pool)
        .await?
        .try_get("username")?;

    let images = sqlx::query_as::<_, ProductImage>(
        r#"SELECT id, product_id, image_url, alt_text, is_primary, created_at
           FROM product_images
           WHERE product_id = $1
           ORDER BY is_primary DESC, created_at, id"#,
    )
    .bind(product.id)
    .fetch_all(pool)
    .await?;

    let reviews = sqlx::query_as::<_, ProductReview>(
        r#"SELECT r.id, r.product_id, r.user_id, u.username, r.rating, r.title, r.comment, r.created_at
           FROM product_reviews r
           JOIN users u ON u.id = r.user_id
           WHERE r.product_id = $1
           ORDER BY r.created_at DESC, r.id DESC"#,
    )
    .bind(product.id)
    .fetch_all(pool)
    .await?;

    let average_rating = if reviews.is_empty() {
        None
    } else {
        let sum: i32 = reviews.iter().map(|r| r.rating).sum();
        Some(f64::from(sum) / reviews.len() as f64)
    };

    Ok(ProductDetail {
        discount_percentage: product.discount_percentage(),
        product,
        category,
        seller_username,
        images,
        reviews,
        average_rating,
    })
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewImage {
    pub image_url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub is_primary: bool,
}

/// Saving a primary image demotes the product's previous primary first.
pub async fn add_image(
    pool: &PgPool,
    seller_id: i32,
    product_id: i32,
    image: &NewImage,
) -> Result<ProductImage, AppError> {
    if image.image_url.trim().is_empty() {
        return Err(AppError::validation("Image URL is required"));
    }

    let mut tx = pool.begin().await?;

    let owned = sqlx::query("SELECT 1 FROM products WHERE id = $1 AND seller_id = $2 FOR UPDATE")
        .bind(product_id)
        .bind(seller_id)
        .fetch_optional(&mut *tx)
        .await?;
    if owned.is_none() {
        return Err(AppError::NotFound("Product"));
    }

    if image.is_primary {
        sqlx::query("UPDATE product_images SET is_primary = FALSE WHERE product_id = $1 AND is_primary")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
    }

    let saved = sqlx::query_as::<_, ProductImage>(
        r#"INSERT INTO product_images (product_id, image_url, alt_text, is_primary)
           VALUES ($1, $2, $3, $4)
           RETURNING id, product_id, image_url, alt_text, is_primary, created_at"#,
    )
    .bind(product_id)
    .bind(image.image_url.trim())
    .bind(image.alt_text.trim())
    .bind(image.is_primary)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(saved)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewReview {
    pub rating: i32,
    pub title: String,
    #[serde(default)]
    pub comment: String,
}

impl NewReview {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::validation("Rating must be between 1 and 5"));
        }
        if self.title.trim().is_empty() {
            return Err(AppError::validation("Review title is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct ReviewOutcome {
    pub review_id: i32,
    pub created: bool,
}

/// One review per (product, user); a second submission replaces the first.
pub async fn upsert_review(
    pool: &PgPool,
    user_id: i32,
    product_id: i32,
    review: &NewReview,
) -> Result<ReviewOutcome, AppError> {
    review.validate()?;

    let exists = sqlx::query("SELECT 1 FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Product"));
    }

    let row = sqlx::query(
        r#"INSERT INTO product_reviews (product_id, user_id, rating, title, comment)
           VALUES ($1, $2, $3, $4, $5)
           ON CONFLICT (product_id, user_id) DO UPDATE
           SET rating = EXCLUDED.rating,
               title = EXCLUDED.title,
               comment = EXCLUDED.comment,
               updated_at = NOW()
           RETURNING id, (xmax = 0) AS created"#,
    )
    .bind(product_id)
    .bind(user_id)
    .bind(review.rating)
    .bind(review.title.trim())
    .bind(review.comment.trim())
    .fetch_one(pool)
    .await?;

    Ok(ReviewOutcome {
        review_id: row.try_get("id")?,
        created: row.try_get("created")?,
    })
}

/// Adds or removes the product; returns whether it is now wishlisted.
pub async fn toggle_wishlist(pool: &PgPool, user_id: i32, product_id: i32) -> Result<bool, AppError> {
    let exists = sqlx::query("SELECT 1 FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Product"));
    }

    let removed = sqlx::query("DELETE FROM wishlist WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?
        .rows_affected();
    if removed > 0 {
        return Ok(false);
    }

    sqlx::query(
        r#"INSERT INTO wishlist (user_id, product_id) VALUES ($1, $2)
           ON CONFLICT (user_id, product_id) DO NOTHING"#,
    )
    .bind(user_id)
    .bind(product_id)
    .execute(pool)
    .await?;

    Ok(true)
}

pub async fn list_wishlist(pool: &PgPool, user_id: i32) -> Result<Vec<WishlistEntry>, AppError> {
    let entries = sqlx::query_as::<_, WishlistEntry>(
        r#"SELECT w.product_id, p.title, p.slug, p.price, w.created_at AS added_at
           FROM wishlist w
           JOIN products p ON p.id = w.product_id
           WHERE w.user_id = $1
           ORDER BY w.created_at DESC, w.id DESC"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, AppError> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, description FROM categories ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

// src/profiles.rs

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::db::is_unique_violation;
use crate::error::AppError;
use crate::models::{Address, AddressType, BusinessType, Milestone, SellerProfile, User, UserMilestone, UserProfile};
use crate::progression;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileOverview {
    pub user: User,
    pub profile: UserProfile,
    pub points_to_next_level: i32,
    pub level_progress: f64,
    pub milestones: Vec<UserMilestone>,
    pub next_milestone: Option<Milestone>,
    pub seller: Option<SellerProfile>,
}

const PROFILE_COLUMNS: &str = "id, user_id, phone, bio, address, city, state, pincode, country, \
    points, level, total_products_sold, total_products_listed, created_at, updated_at";

async fn fetch_profile(pool: &PgPool, user_id: i32) -> Result<UserProfile, AppError> {
    sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Profile"))
}

pub async fn profile_overview(pool: &PgPool, user_id: i32) -> Result<ProfileOverview, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT id, username, email, created_at FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let profile = fetch_profile(pool, user_id).await?;
    let milestones = progression::user_milestones(pool, user_id).await?;
    let next_milestone = progression::next_milestone(pool, user_id).await?;

    let seller = sqlx::query_as::<_, SellerProfile>(
        r#"SELECT id, user_id, business_name, business_type, is_verified, created_at
           FROM seller_profiles WHERE user_id = $1"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(ProfileOverview {
        points_to_next_level: progression::points_to_next_level(profile.points, profile.level),
        level_progress: progression::level_progress(profile.points, profile.level),
        user,
        profile,
        milestones,
        next_milestone,
        seller,
    })
}

/// Personal fields. Anything left out keeps its stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProfileEdit {
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: Option<String>,
}

pub async fn edit_profile(pool: &PgPool, user_id: i32, edit: &ProfileEdit) -> Result<UserProfile, AppError> {
    let trimmed = |v: &Option<String>| v.as_deref().map(str::trim).map(str::to_string);

    sqlx::query_as::<_, UserProfile>(&format!(
        r#"UPDATE user_profiles SET
               phone = COALESCE($2, phone),
               bio = COALESCE($3, bio),
               address = COALESCE($4, address),
               city = COALESCE($5, city),
               state = COALESCE($6, state),
               pincode = COALESCE($7, pincode),
               country = COALESCE(NULLIF($8, ''), country),
               updated_at = NOW()
           WHERE user_id = $1
           RETURNING {PROFILE_COLUMNS}"#
    ))
    .bind(user_id)
    .bind(trimmed(&edit.phone))
    .bind(trimmed(&edit.bio))
    .bind(trimmed(&edit.address))
    .bind(trimmed(&edit.city))
    .bind(trimmed(&edit.state))
    .bind(trimmed(&edit.pincode))
    .bind(trimmed(&edit.country))
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Profile"))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewAddress {
    #[serde(default = "default_address_type")]
    pub address_type: AddressType,
    pub name: String,
    pub phone: String,
    pub address_line_1: String,
    #[serde(default)]
    pub address_line_2: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

fn default_address_type() -> AddressType {
    AddressType::Home
}

impl NewAddress {
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("address_line_1", &self.address_line_1),
            ("city", &self.city),
            ("state", &self.state),
            ("pincode", &self.pincode),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!("Missing address fields: {}", missing.join(", "))))
        }
    }
}

const ADDRESS_COLUMNS: &str = "id, user_id, address_type, name, phone, address_line_1, address_line_2, \
    city, state, pincode, country, is_default, created_at";

pub async fn list_addresses(pool: &PgPool, user_id: i32) -> Result<Vec<Address>, AppError> {
    let addresses = sqlx::query_as::<_, Address>(&format!(
        "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 \
         ORDER BY is_default DESC, created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(addresses)
}

/// A new default address takes over from the previous one.
pub async fn add_address(pool: &PgPool, user_id: i32, new: &NewAddress) -> Result<Address, AppError> {
    new.validate()?;

    let mut tx = pool.begin().await?;

    if new.is_default {
        sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND is_default")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    let country = new
        .country
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("India");

    let address = sqlx::query_as::<_, Address>(&format!(
        "INSERT INTO addresses (user_id, address_type, name, phone, address_line_1, address_line_2, \
         city, state, pincode, country, is_default) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {ADDRESS_COLUMNS}"
    ))
    .bind(user_id)
    .bind(new.address_type.as_str())
    .bind(new.name.trim())
    .bind(new.phone.trim())
    .bind(new.address_line_1.trim())
    .bind(new.address_line_2.trim())
    .bind(new.city.trim())
    .bind(new.state.trim())
    .bind(new.pincode.trim())
    .bind(country)
    .bind(new.is_default)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(address)
}

pub async fn delete_address(pool: &PgPool, user_id: i32, address_id: i32) -> Result<(), AppError> {
    let deleted = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(address_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Address"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SellerRegistration {
    pub business_name: String,
    #[serde(default = "default_business_type")]
    pub business_type: BusinessType,
}

fn default_business_type() -> BusinessType {
    BusinessType::Individual
}

pub async fn register_seller(
    pool: &PgPool,
    user_id: i32,
    reg: &SellerRegistration,
) -> Result<SellerProfile, AppError> {
    if reg.business_name.trim().is_empty() {
        return Err(AppError::validation("Business name is required"));
    }

    let inserted = sqlx::query_as::<_, SellerProfile>(
        r#"INSERT INTO seller_profiles (user_id, business_name, business_type)
           VALUES ($1, $2, $3)
           RETURNING id, user_id, business_name, business_type, is_verified, created_at"#,
    )
    .bind(user_id)
    .bind(reg.business_name.trim())
    .bind(reg.business_type.as_str())
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(seller) => Ok(seller),
        Err(e) if is_unique_violation(&e) => Err(AppError::AlreadyExists("Seller profile")),
        Err(e) => Err(e.into()),
    }
}

// src/accounts.rs

use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use utoipa::ToSchema;

use crate::db::is_unique_violation;
use crate::error::AppError;

pub const TOKEN_TTL_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub exp: usize,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty() {
            return Err(AppError::validation("Username is required"));
        }
        if !self.email.contains('@') {
            return Err(AppError::validation("A valid email is required"));
        }
        if self.password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Creates the user and its profile together so no user ever exists
/// without a profile to carry points.
pub async fn register_user(pool: &PgPool, req: &RegisterRequest) -> Result<i32, AppError> {
    req.validate()?;

    let password_hash = hash(&req.password, DEFAULT_COST)?;

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"INSERT INTO users (username, email, password_hash)
           VALUES ($1, $2, $3)
           RETURNING id"#,
    )
    .bind(req.username.trim())
    .bind(req.email.trim().to_lowercase())
    .bind(password_hash)
    .fetch_one(&mut *tx)
    .await;

    let user_id: i32 = match inserted {
        Ok(row) => row.try_get("id")?,
        Err(e) if is_unique_violation(&e) => return Err(AppError::AlreadyExists("User")),
        Err(e) => return Err(e.into()),
    };

    sqlx::query("INSERT INTO user_profiles (user_id) VALUES ($1)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    log::info!("user registered id={user_id}");

    Ok(user_id)
}

pub async fn authenticate(pool: &PgPool, req: &LoginRequest) -> Result<i32, AppError> {
    let row = sqlx::query("SELECT id, password_hash FROM users WHERE email = $1")
        .bind(req.email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::Unauthorized("Invalid credentials"))?;

    let user_id: i32 = row.try_get("id")?;
    let password_hash: String = row.try_get("password_hash")?;

    if !verify(&req.password, &password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials"));
    }

    Ok(user_id)
}

pub fn issue_token(secret: &str, user_id: i32) -> Result<String, AppError> {
    let exp = (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize;
    let claims = Claims { sub: user_id, exp };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Returns the user id carried by a valid, unexpired token.
pub fn decode_token(secret: &str, token: &str) -> Result<i32, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid token"))?;

    Ok(data.claims.sub)
}

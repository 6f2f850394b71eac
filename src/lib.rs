pub mod accounts;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod messaging;
pub mod models;
pub mod orders;
pub mod profiles;
pub mod progression;
pub mod support;

use sqlx::PgPool;

use crate::support::SupportResponder;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jwt_secret: String,
    pub support: SupportResponder,
}

// src/api/mod.rs

pub mod auth;
pub mod cart;
pub mod chatbot;
pub mod gemini_client;
pub mod orders;
pub mod products;
pub mod profile;

use actix_web::web;

use crate::error::{json_error_handler, path_error_handler, query_error_handler};
use auth::JwtMiddleware;

/// Every route of the service. Shared by `main` and the endpoint tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        // Public
        .service(auth::register)
        .service(auth::login)
        .service(products::list_products)
        .service(products::product_detail)
        .service(products::list_categories)
        .service(chatbot::chat)
        // Protected
        .service(
            web::scope("/cart")
                .wrap(JwtMiddleware)
                .service(cart::view)
                .service(cart::add)
                .service(cart::update)
                .service(cart::remove)
                .service(cart::clear),
        )
        .service(
            web::scope("/orders")
                .wrap(JwtMiddleware)
                .service(orders::list)
                .service(orders::create)
                .service(orders::detail)
                .service(orders::cancel)
                .service(
                    web::resource("/{id}/track/")
                        .route(web::get().to(orders::track))
                        .route(web::post().to(orders::track)),
                )
                .service(orders::refund)
                .service(orders::advance),
        )
        .service(
            web::scope("/listings")
                .wrap(JwtMiddleware)
                .service(products::my_listings)
                .service(products::create_listing)
                .service(products::edit_listing)
                .service(products::delete_listing)
                .service(products::add_image)
                .service(products::review)
                .service(products::toggle_wishlist),
        )
        .service(
            web::scope("/profile")
                .wrap(JwtMiddleware)
                .service(profile::overview)
                .service(profile::edit)
                .service(profile::addresses)
                .service(profile::add_address)
                .service(profile::delete_address)
                .service(profile::register_seller)
                .service(profile::wishlist)
                .service(profile::milestones)
                .service(profile::claim_milestone)
                .service(profile::chats)
                .service(profile::chat_detail)
                .service(profile::send_message)
                .service(profile::start_chat)
                .service(profile::start_product_chat),
        );
}

// src/main.rs
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use resale_market::config::AppConfig;
use resale_market::support::SupportResponder;
use resale_market::{AppState, api, db, docs};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Marketplace ready!")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Also captures `log` records from the app and from actix.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    let pool = db::connect(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;

    let support = SupportResponder::from_config(config.gemini.as_ref());
    if !support.is_ai_enabled() {
        log::warn!("GEMINI_API_KEY not configured, support chat uses scripted responses");
    }

    let state = web::Data::new(AppState {
        pool,
        jwt_secret: config.jwt_secret.clone(),
        support,
    });

    log::info!("listening on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            .configure(api::configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}

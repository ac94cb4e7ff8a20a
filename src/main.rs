use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod rules;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::store::Store;
use crate::store::postgres::PgStore;
use crate::utils::shift_cache::ShiftCache;
use tracing::{Level, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "HRM rules service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let parsed_level = Level::from_str(&config.log_level).ok();
    let level = parsed_level.unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    if parsed_level.is_none() {
        warn!(log_level = %config.log_level, "Unknown LOG_LEVEL, using info");
    }
    info!(offset_minutes = config.work_utc_offset_minutes, "Server starting...");

    let pool = init_db(&config).await?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let store = Data::from(store);
    let shift_cache = Data::new(ShiftCache::new(Duration::from_secs(
        config.shift_cache_ttl_secs,
    )));

    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(shift_cache.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            // Configure protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpServer};
use anyhow::Context;
use blog_api::data::blog_repository::{BlogRepository, PostgresBlogRepository};
use blog_api::data::category_repository::{CategoryRepository, PostgresCategoryRepository};
use blog_api::data::memory_repository::InMemoryStore;
use blog_api::infrastructure::config::AppConfig;
use blog_api::infrastructure::database::{create_pool, run_migrations};
use blog_api::infrastructure::logging::init_logging;
use blog_api::infrastructure::media::MediaStorage;
use blog_api::presentation::form::UploadLimit;
use blog_api::presentation::middleware::RequestTracing;
use blog_api::presentation::routes::{self, AppState};
use tracing::{info, warn};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let (categories, blogs): (Arc<dyn CategoryRepository>, Arc<dyn BlogRepository>) =
        if config.uses_memory_store() {
            warn!("DATABASE_URL=memory, records are lost on shutdown");
            let store = Arc::new(InMemoryStore::new());
            (store.clone(), store)
        } else {
            let pool = create_pool(&config.database_url)
                .await
                .context("failed to connect to database")?;
            run_migrations(&pool)
                .await
                .context("failed to run migrations")?;
            (
                Arc::new(PostgresCategoryRepository::new(pool.clone())),
                Arc::new(PostgresBlogRepository::new(pool)),
            )
        };

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("failed to create {}", config.media_root.display()))?;
    let media = MediaStorage::new(config.media_root.clone(), config.media_url.clone());

    let state = AppState::new(
        categories,
        blogs,
        media,
        UploadLimit(config.max_upload_bytes),
    );
    let config_data = config.clone();

    info!(host = %config.host, port = config.port, "HTTP server starting");

    HttpServer::new(move || {
        let cors = build_cors(&config_data);
        App::new()
            .wrap(Logger::default())
            .wrap(RequestTracing)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(cors)
            .configure(routes::configure(state.clone()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
        ])
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = if origin == "*" {
            cors.allow_any_origin()
        } else {
            cors.allowed_origin(origin)
        };
    }

    cors
}

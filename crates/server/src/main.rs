use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dbcalm_server::config::{ConfigLoader, ConfigValidator};
use dbcalm_server::db::init_pool_with_config;
use dbcalm_server::{handlers, AppState};
use dotenv::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ConfigLoader::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "failed to load config file, falling back to defaults + env");
        dbcalm_server::DbcalmConfig::default()
    });

    match ConfigValidator::new().validate(&config) {
        Ok(warnings) => {
            for warning in warnings {
                tracing::warn!("{warning}");
            }
        }
        Err(errors) => {
            for err in &errors {
                tracing::error!("{err}");
            }
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "configuration validation failed"));
        }
    }

    let pool = init_pool_with_config(
        &format!("sqlite://{}/db.sqlite3", config.state_dir),
        10,
        std::time::Duration::from_secs(5),
    )
    .await
    .map_err(|e| std::io::Error::other(e.to_string()))?;

    let host = config.api_host.clone();
    let port = config.api_port;
    let state = web::Data::new(AppState::new(Arc::new(config), pool));

    tracing::info!(host = %host, port, "starting dbcalm API front door");

    HttpServer::new(move || {
        let cors = Cors::permissive().supports_credentials().max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::JsonConfig::default().limit(1024 * 1024))
            .app_data(state.clone())
            .route("/health", web::get().to(handlers::health::health))
            .route("/auth/token", web::post().to(handlers::auth::token))
            .route("/auth/authorize", web::post().to(handlers::auth::authorize))
            .route("/backups", web::post().to(handlers::backups::create_backup))
            .route("/restores", web::post().to(handlers::restores::create_restore))
            .route("/cleanup", web::post().to(handlers::cleanup::cleanup_backups))
            .route("/status/{command_id}", web::get().to(handlers::status::status))
    })
    .bind((host, port))?
    .run()
    .await
}

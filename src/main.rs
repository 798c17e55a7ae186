use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

mod api;
mod attendance;
mod auth;
mod config;
mod db;
mod docs;
mod model;
mod routes;
mod utils;

use attendance::biometric::{BiometricVerifier, DisabledVerifier, RemoteFaceVerifier};
use attendance::ledger::AttendanceLedger;
use attendance::mysql_store::MySqlAttendanceStore;
use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "HRM attendance service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let verifier: Arc<dyn BiometricVerifier> = match &config.face_verify_url {
        Some(url) => {
            info!(url = %url, "Face verification enabled");
            Arc::new(RemoteFaceVerifier::new(
                url.clone(),
                Duration::from_secs(config.face_verify_timeout_secs),
            )?)
        }
        None => {
            warn!("FACE_VERIFY_URL not set, face verification disabled");
            Arc::new(DisabledVerifier)
        }
    };

    let ledger = Data::new(AttendanceLedger::new(
        Arc::new(MySqlAttendanceStore::new(pool)),
        verifier,
        config.attendance.clone(),
    ));

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
            .app_data(ledger.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            // Protected attendance routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}

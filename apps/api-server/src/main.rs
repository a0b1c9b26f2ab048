//! # Gofera API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use api_server::config::AppConfig;
use api_server::middleware::error::set_dev_mode;
use api_server::observability::{RequestIdMiddleware, RequestIdRootSpan};
use api_server::state::AppState;
use api_server::telemetry::{TelemetryConfig, init_telemetry};
use api_server::{configure_app, handlers};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    set_dev_mode(config.environment.is_development());

    tracing::info!(
        host = %config.host,
        port = config.port,
        environment = ?config.environment,
        "Starting Gofera API Server"
    );

    let state = AppState::new(&config).await;

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::<RequestIdRootSpan>::new())
            // Outermost, so the id exists before the logger opens its span.
            .wrap(RequestIdMiddleware)
            .configure(configure_app(state.clone()))
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run()
    .await
    .context("server terminated with an error")?;

    tracing::info!("Server stopped");
    Ok(())
}

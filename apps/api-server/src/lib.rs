//! # Gofera API Server
//!
//! HTTP surface of the ride-sharing backend: routing, session extraction,
//! error rendering and application wiring. `main.rs` only loads
//! configuration and starts the server.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;

use actix_web::web;

use middleware::error::{json_error_handler, path_error_handler, query_error_handler};
use middleware::rate_limit::RateLimitMiddleware;
use state::AppState;

/// Request bodies above this size are rejected.
pub const JSON_LIMIT_BYTES: usize = 10 * 1024;

/// Register state, extractor configuration and the rate-limited `/api`
/// scope. Pair with `App::default_service(web::to(handlers::not_found))`.
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        let limiter = RateLimitMiddleware::new(state.rate_limiter.clone())
            .trust_forwarded_headers(state.trust_proxy);

        cfg.app_data(web::Data::new(state))
            .app_data(
                web::JsonConfig::default()
                    .limit(JSON_LIMIT_BYTES)
                    .error_handler(json_error_handler),
            )
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .service(
                web::scope("/api")
                    .wrap(limiter)
                    .configure(handlers::configure_routes),
            );
    }
}

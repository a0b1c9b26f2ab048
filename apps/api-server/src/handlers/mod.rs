//! HTTP handlers and route configuration.

mod auth;
mod health;
mod rides;
mod users;
mod views;

use actix_web::{HttpRequest, HttpResponse, web};

use crate::middleware::error::{AppError, AppResult};

/// Register the `/api` routes. Literal segments go before `/{id}`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/users")
                .route("/signup", web::post().to(auth::signup))
                .route("/login", web::post().to(auth::login))
                .route("/logout", web::get().to(auth::logout))
                .route("/forgot-password", web::post().to(auth::forgot_password))
                .route("/reset-password/{token}", web::patch().to(auth::reset_password))
                .route("/update-my-password", web::patch().to(auth::update_my_password))
                .service(
                    web::resource("/me")
                        .route(web::get().to(users::get_me))
                        .route(web::patch().to(users::update_me))
                        .route(web::delete().to(users::delete_me)),
                )
                .route("/become-driver", web::patch().to(users::become_driver))
                .route("/drivers", web::get().to(users::list_drivers))
                .route("/search", web::get().to(users::search_users))
                .route("/stats", web::get().to(users::user_stats))
                .route("/notifications/subscribe", web::post().to(users::subscribe))
                .route("", web::get().to(users::list_users))
                .route("/{id}", web::get().to(users::get_user))
                .route("/{id}/rate", web::post().to(users::rate_user)),
        )
        .service(
            web::scope("/rides")
                .route("/my-rides", web::get().to(rides::my_rides))
                .route("/my-rides/stats", web::get().to(rides::my_ride_stats))
                .service(
                    web::resource("")
                        .route(web::get().to(rides::list_rides))
                        .route(web::post().to(rides::create_ride)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(rides::get_ride))
                        .route(web::patch().to(rides::update_ride))
                        .route(web::delete().to(rides::delete_ride)),
                )
                .route("/{id}/book", web::post().to(rides::book_ride))
                .route("/{id}/cancel-booking", web::delete().to(rides::cancel_booking))
                .route("/{id}/complete", web::patch().to(rides::complete_ride))
                .route("/{id}/cancel", web::patch().to(rides::cancel_ride)),
        );
}

/// Fallback for unmatched routes.
pub async fn not_found(req: HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!(
        "Can't find {} on this server!",
        req.path()
    )))
}

//! Profile, discovery, statistics and rating handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use gofera_core::domain::{ProfileChanges, UserRole};
use gofera_core::services::restrict_to;
use gofera_shared::ApiResponse;
use gofera_shared::dto::{
    BecomeDriverRequest, DriversData, RateUserRequest, UpdateMeRequest, UserData,
    UserSearchQuery, UsersData,
};

use super::views::{
    driver_summary, public_user, rated_user, search_result, user_response, vehicle_from_dto,
};
use crate::middleware::auth::CurrentUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/users/me
pub async fn get_me(user: CurrentUser) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(UserData {
        user: user_response(&user),
    }))
}

/// PATCH /api/users/me
pub async fn update_me(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<UpdateMeRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    if req.password.is_some() {
        return Err(AppError::BadRequest(
            "This route is not for password updates. Please use /update-my-password.".to_string(),
        ));
    }

    let changes = ProfileChanges {
        name: req.name,
        email: req.email,
        phone: req.phone,
        vehicle: req.vehicle_info.map(vehicle_from_dto),
    };
    let updated = state.users.update_me(&user, changes).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(UserData {
        user: user_response(&updated),
    })))
}

/// DELETE /api/users/me
pub async fn delete_me(state: web::Data<AppState>, user: CurrentUser) -> AppResult<HttpResponse> {
    state.users.deactivate_me(&user).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// PATCH /api/users/become-driver
pub async fn become_driver(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<BecomeDriverRequest>,
) -> AppResult<HttpResponse> {
    let vehicle = body.into_inner().vehicle_info.ok_or_else(|| {
        AppError::BadRequest("Vehicle information is required to become a driver".to_string())
    })?;

    let updated = state
        .users
        .become_driver(&user, vehicle_from_dto(vehicle))
        .await?;

    Ok(HttpResponse::Ok().json(
        ApiResponse::ok(UserData {
            user: user_response(&updated),
        })
        .with_message("Successfully became a driver!"),
    ))
}

/// GET /api/users/drivers
pub async fn list_drivers(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let drivers: Vec<_> = state
        .users
        .list_drivers()
        .await?
        .iter()
        .map(driver_summary)
        .collect();

    let results = drivers.len();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(DriversData { drivers }).with_results(results)))
}

/// GET /api/users/search?name=&email=&isDriver=
pub async fn search_users(
    state: web::Data<AppState>,
    query: web::Query<UserSearchQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let users: Vec<_> = state
        .users
        .search(q.name, q.email, q.is_driver)
        .await?
        .iter()
        .map(search_result)
        .collect();

    let results = users.len();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(UsersData { users }).with_results(results)))
}

/// GET /api/users/stats
pub async fn user_stats(state: web::Data<AppState>, user: CurrentUser) -> AppResult<HttpResponse> {
    let stats = state.users.stats(&user).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(stats)))
}

/// GET /api/users/{id}
pub async fn get_user(state: web::Data<AppState>, id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let user = state.users.get_profile(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(UserData {
        user: public_user(&user),
    })))
}

/// GET /api/users (admin)
pub async fn list_users(state: web::Data<AppState>, user: CurrentUser) -> AppResult<HttpResponse> {
    restrict_to(&user, &[UserRole::Admin])?;

    let users: Vec<_> = state
        .users
        .list_all()
        .await?
        .iter()
        .map(user_response)
        .collect();

    let results = users.len();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(UsersData { users }).with_results(results)))
}

/// POST /api/users/{id}/rate
pub async fn rate_user(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
    body: web::Json<RateUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let score = req.rating.ok_or_else(|| {
        AppError::BadRequest("Please provide a valid rating between 1 and 5".to_string())
    })?;
    if req.comment.is_some() {
        tracing::debug!(rater_id = %user.id, "Rating comment received and discarded");
    }

    let ratee = state.users.rate(&user, id.into_inner(), score).await?;

    Ok(HttpResponse::Ok().json(
        ApiResponse::ok(UserData {
            user: rated_user(&ratee),
        })
        .with_message("Rating submitted successfully"),
    ))
}

/// POST /api/users/notifications/subscribe
pub async fn subscribe(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<serde_json::Value>,
) -> AppResult<HttpResponse> {
    let subscription = body.into_inner();
    if !subscription.is_object() {
        return Err(AppError::BadRequest(
            "Please provide a push subscription object".to_string(),
        ));
    }

    state.users.subscribe_push(&user, subscription).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message(
        "Subscribed to notifications successfully",
    )))
}

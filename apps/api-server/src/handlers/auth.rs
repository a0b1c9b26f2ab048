//! Sign-up, login and password handlers.

use actix_web::{HttpResponse, http::StatusCode, web};

use gofera_core::services::{Session, SignupInput};
use gofera_shared::ApiResponse;
use gofera_shared::dto::{
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
    UpdatePasswordRequest, UserData,
};

use super::views::user_response;
use crate::middleware::auth::{CurrentUser, logout_cookie, session_cookie};
use crate::middleware::error::{AppError, AppResult};
use crate::state::{AppState, SessionSettings};

const RESET_SENT: &str = "If that email is registered, a password reset token has been sent.";

/// Token in the body and in the `jwt` cookie, user in `data`.
fn session_response(status: StatusCode, session: Session, settings: &SessionSettings) -> HttpResponse {
    HttpResponse::build(status)
        .cookie(session_cookie(&session.token, settings))
        .json(
            ApiResponse::ok(UserData {
                user: user_response(&session.user),
            })
            .with_token(session.token),
        )
}

/// POST /api/users/signup
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let session = state
        .auth
        .signup(SignupInput {
            name: req.name,
            email: req.email,
            password: req.password,
            phone: req.phone,
            is_driver: req.is_driver,
        })
        .await?;

    Ok(session_response(StatusCode::CREATED, session, &state.session))
}

/// POST /api/users/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let session = state.auth.login(&body.email, &body.password).await?;
    Ok(session_response(StatusCode::OK, session, &state.session))
}

/// GET /api/users/logout
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok()
        .cookie(logout_cookie())
        .json(ApiResponse::empty())
}

/// PATCH /api/users/update-my-password
pub async fn update_my_password(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<UpdatePasswordRequest>,
) -> AppResult<HttpResponse> {
    let session = state
        .auth
        .change_password(&user, &body.current_password, &body.new_password)
        .await?;
    Ok(session_response(StatusCode::OK, session, &state.session))
}

/// POST /api/users/forgot-password
///
/// Answers the same way whether or not the address is registered.
pub async fn forgot_password(
    state: web::Data<AppState>,
    body: web::Json<ForgotPasswordRequest>,
) -> AppResult<HttpResponse> {
    if body.email.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Please provide your email address".to_string(),
        ));
    }

    state.auth.forgot_password(&body.email).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message(RESET_SENT)))
}

/// PATCH /api/users/reset-password/{token}
pub async fn reset_password(
    state: web::Data<AppState>,
    token: web::Path<String>,
    body: web::Json<ResetPasswordRequest>,
) -> AppResult<HttpResponse> {
    let session = state
        .auth
        .reset_password(&token.into_inner(), &body.password)
        .await?;
    Ok(session_response(StatusCode::OK, session, &state.session))
}

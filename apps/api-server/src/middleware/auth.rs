//! Session extractors and the `jwt` cookie.

use std::future::Future;
use std::pin::Pin;

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};

use gofera_core::domain::User;
use gofera_core::ports::AuthError;

use crate::middleware::error::AppError;
use crate::state::{AppState, SessionSettings};

pub const SESSION_COOKIE: &str = "jwt";

/// The authenticated caller.
///
/// The token comes from `Authorization: Bearer` or the `jwt` cookie and is
/// re-checked against the user record on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

impl std::ops::Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = session_token(req);

        Box::pin(async move {
            let state =
                state.ok_or_else(|| AppError::Internal("AppState not registered".to_string()))?;
            let token = token.ok_or(AuthError::MissingAuth)?;

            match state.auth.authenticate(&token).await {
                Ok(user) => Ok(CurrentUser(user)),
                Err(e) => {
                    tracing::debug!(reason = %e, "Session rejected");
                    Err(e.into())
                }
            }
        })
    }
}

/// Like [`CurrentUser`] but yields `None` for a missing or rejected session.
/// Server-side failures still propagate.
#[derive(Debug, Clone)]
pub struct OptionalCurrentUser(pub Option<User>);

impl FromRequest for OptionalCurrentUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = CurrentUser::from_request(req, payload);
        Box::pin(async move {
            match fut.await {
                Ok(user) => Ok(OptionalCurrentUser(Some(user.into_inner()))),
                Err(AppError::Internal(detail)) => Err(AppError::Internal(detail)),
                Err(_) => Ok(OptionalCurrentUser(None)),
            }
        })
    }
}

fn session_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    bearer.or_else(|| {
        req.cookie(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// HTTP-only cookie carrying a freshly issued session token.
pub fn session_cookie(token: &str, settings: &SessionSettings) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(settings.cookie_expires_days))
        .finish()
}

/// An already-expired cookie that overwrites the session.
pub fn logout_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_wins_over_cookie() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer from-header"))
            .cookie(Cookie::new(SESSION_COOKIE, "from-cookie"))
            .to_http_request();
        assert_eq!(session_token(&req).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_cookie_fallback_and_cleared_cookie() {
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "from-cookie"))
            .to_http_request();
        assert_eq!(session_token(&req).as_deref(), Some("from-cookie"));

        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, ""))
            .to_http_request();
        assert_eq!(session_token(&req), None);

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert_eq!(session_token(&req), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let settings = SessionSettings {
            cookie_expires_days: 7,
            secure: true,
        };
        let cookie = session_cookie("tok", &settings);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(CookieDuration::days(7)));

        let removal = logout_cookie();
        assert_eq!(removal.max_age(), Some(CookieDuration::ZERO));
    }
}

//! Per-IP rate limiting middleware.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{HeaderName, HeaderValue},
};
use gofera_core::ports::RateLimiter;
use gofera_shared::ErrorResponse;

const LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again in an hour!";

/// Rate limiting middleware factory. Without a limiter every request passes.
///
/// Clients are keyed by socket peer address unless forwarded headers are
/// explicitly trusted.
pub struct RateLimitMiddleware {
    limiter: Option<Arc<dyn RateLimiter>>,
    trust_proxy: bool,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Option<Arc<dyn RateLimiter>>) -> Self {
        Self {
            limiter,
            trust_proxy: false,
        }
    }

    pub fn trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_proxy = trust;
        self
    }
}

fn client_key(req: &ServiceRequest, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(addr) = req.connection_info().realip_remote_addr() {
            return addr.to_string();
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            trust_proxy: self.trust_proxy,
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Option<Arc<dyn RateLimiter>>,
    trust_proxy: bool,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let Some(limiter) = self.limiter.clone() else {
            return Box::pin(async move { Ok(service.call(req).await?.map_into_left_body()) });
        };

        let key = client_key(&req, self.trust_proxy);

        Box::pin(async move {
            match limiter.check(&key).await {
                Ok(result) if !result.allowed => {
                    tracing::warn!(client = %key, "Rate limit exceeded");

                    let retry_after = result.reset_after.as_secs().max(1);
                    let response = HttpResponse::TooManyRequests()
                        .insert_header(("X-RateLimit-Remaining", "0"))
                        .insert_header(("Retry-After", retry_after.to_string()))
                        .json(ErrorResponse::for_status(429, LIMIT_MESSAGE));

                    let (http_req, _payload) = req.into_parts();
                    Ok(ServiceResponse::new(http_req, response).map_into_right_body())
                }
                Ok(result) => {
                    let mut res = service.call(req).await?;
                    res.headers_mut().insert(
                        HeaderName::from_static("x-ratelimit-remaining"),
                        HeaderValue::from(result.remaining),
                    );
                    Ok(res.map_into_left_body())
                }
                Err(e) => {
                    tracing::error!(error = %e, "Rate limiter error, failing open");
                    Ok(service.call(req).await?.map_into_left_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use actix_web::{App, http::StatusCode, test, web};
    use async_trait::async_trait;
    use gofera_core::ports::{RateLimitError, RateLimitResult};

    /// Allows the first `limit` requests, then refuses.
    struct CountingLimiter {
        limit: u32,
        seen: AtomicU32,
    }

    #[async_trait]
    impl RateLimiter for CountingLimiter {
        async fn check(&self, _key: &str) -> Result<RateLimitResult, RateLimitError> {
            let n = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(RateLimitResult {
                allowed: n <= self.limit,
                remaining: self.limit.saturating_sub(n),
                reset_after: Duration::from_secs(30),
            })
        }
    }

    #[actix_web::test]
    async fn test_blocks_after_limit() {
        let limiter: Arc<dyn RateLimiter> = Arc::new(CountingLimiter {
            limit: 2,
            seen: AtomicU32::new(0),
        });
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(Some(limiter)))
                .route("/", web::get().to(|| async { "ok" })),
        )
        .await;

        for _ in 0..2 {
            let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
            assert_eq!(res.status(), StatusCode::OK);
        }

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers().get("Retry-After").unwrap(), "30");
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["status"], "fail");
    }

    /// Records every key it is asked about and always allows.
    #[derive(Default)]
    struct KeyRecorder {
        keys: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RateLimiter for KeyRecorder {
        async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
            self.keys.lock().unwrap().push(key.to_string());
            Ok(RateLimitResult {
                allowed: true,
                remaining: 10,
                reset_after: Duration::from_secs(30),
            })
        }
    }

    async fn keys_seen(trust_proxy: bool) -> Vec<String> {
        let recorder = Arc::new(KeyRecorder::default());
        let limiter: Arc<dyn RateLimiter> = recorder.clone();
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(Some(limiter)).trust_forwarded_headers(trust_proxy))
                .route("/", web::get().to(|| async { "ok" })),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .peer_addr("10.1.2.3:40000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "203.0.113.9"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let keys = recorder.keys.lock().unwrap().clone();
        keys
    }

    #[actix_web::test]
    async fn test_forwarded_header_ignored_by_default() {
        assert_eq!(keys_seen(false).await, vec!["10.1.2.3".to_string()]);
    }

    #[actix_web::test]
    async fn test_forwarded_header_used_behind_trusted_proxy() {
        assert_eq!(keys_seen(true).await, vec!["203.0.113.9".to_string()]);
    }

    #[actix_web::test]
    async fn test_passes_through_without_limiter() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(None))
                .route("/", web::get().to(|| async { "ok" })),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}

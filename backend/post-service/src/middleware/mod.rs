/// HTTP middleware for post-service
///
/// - `JwtAuthMiddleware`: resolves a Bearer token into a `Caller`
/// - `MetricsMiddleware`: request duration histogram per route pattern
/// - `permissions`: ownership checks used by the post service
pub mod permissions;

use crate::error::AppError;
use crate::metrics::posts::HTTP_REQUEST_DURATION_SECONDS;
use crate::models::Caller;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use crypto_core::{restore_session, JwtKeys, SessionState};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

// =====================================================================
// JWT Authentication
// =====================================================================

/// Why a presented token was not accepted. Stored in request extensions in
/// place of a `Caller` so the extractor can report it.
#[derive(Debug, Clone)]
struct AuthRejection(String);

/// Actix middleware that resolves a Bearer token into a `Caller`.
///
/// It never rejects a request by itself: public routes stay reachable with a
/// bad token, and routes that take a `Caller` argument answer 401.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    keys: Arc<JwtKeys>,
}

impl JwtAuthMiddleware {
    pub fn new(keys: Arc<JwtKeys>) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    keys: Arc<JwtKeys>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        let header = req
            .headers()
            .get("Authorization")
            .map(|h| h.to_str().unwrap_or_default().to_string());

        if let Some(header) = header {
            match authenticate(&self.keys, &header) {
                Ok(caller) => {
                    req.extensions_mut().insert(caller);
                }
                Err(reason) => {
                    tracing::debug!(path = %req.path(), %reason, "bearer token rejected");
                    req.extensions_mut().insert(AuthRejection(reason));
                }
            }
        }

        Box::pin(async move { service.call(req).await })
    }
}

fn authenticate(keys: &JwtKeys, header: &str) -> Result<Caller, String> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| "Invalid Authorization scheme".to_string())?;

    match restore_session(keys, token.trim()) {
        SessionState::Authenticated(claims) => Caller::from_claims(&claims)
            .map_err(|_| "Invalid user ID".to_string()),
        SessionState::Expired(_) => Err("Token has expired".to_string()),
        SessionState::Invalid(_) => Err("Invalid token".to_string()),
    }
}

impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let extensions = req.extensions();
        let result = match extensions.get::<Caller>() {
            Some(caller) => Ok(caller.clone()),
            None => Err(AppError::Unauthorized(
                extensions
                    .get::<AuthRejection>()
                    .map(|r| r.0.clone())
                    .unwrap_or_else(|| "Missing Authorization header".to_string()),
            )),
        };
        ready(result)
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        // Pattern rather than raw path keeps label cardinality bounded
        let route = req
            .match_pattern()
            .unwrap_or_else(|| "unmatched".to_string());
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed();

            let status = match &res {
                Ok(res) => res.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[method.as_str(), route.as_str(), status.as_str()])
                .observe(elapsed.as_secs_f64());

            tracing::debug!(%method, %route, status = status.as_u16(), elapsed_ms = elapsed.as_millis() as u64, "request completed");
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crypto_core::testing::signing_keys;
    use crypto_core::TokenSubject;
    use uuid::Uuid;

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: Uuid::new_v4(),
            name: "Ada".to_string(),
            avatar: "//gravatar/ada".to_string(),
        }
    }

    #[test]
    fn valid_bearer_token_yields_caller() {
        let keys = signing_keys();
        let subject = subject();
        let token = keys.generate_access_token(&subject).unwrap();

        let caller = authenticate(&keys, &format!("Bearer {token}")).unwrap();
        assert_eq!(caller.id, subject.user_id);
        assert_eq!(caller.name, "Ada");
        assert_eq!(caller.avatar, "//gravatar/ada");
    }

    #[test]
    fn rejects_wrong_scheme_and_expired_tokens() {
        let keys = signing_keys();
        let token = keys.generate_access_token(&subject()).unwrap();
        assert!(authenticate(&keys, &format!("Token {token}")).is_err());

        let expired = keys
            .generate_token_with_ttl(&subject(), Duration::seconds(-120))
            .unwrap();
        assert_eq!(
            authenticate(&keys, &format!("Bearer {expired}")).unwrap_err(),
            "Token has expired"
        );
        assert!(authenticate(&keys, "Bearer not.a.jwt").is_err());
    }
}

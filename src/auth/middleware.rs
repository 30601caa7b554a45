use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::verify_token;

/// Verifies bearer tokens and stores their [`Claims`](super::Claims) in the
/// request extensions.
///
/// Anonymous requests pass through untouched; routes that need a user ask
/// for one with the [`AuthenticatedUser`](super::AuthenticatedUser) family of
/// extractors. A token that is present but invalid or expired is rejected
/// with 401 on every route.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        if let Some(token) = token {
            match verify_token(token) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                }
                Err(app_err) => {
                    log::debug!("Rejected bearer token on {}: {}", req.path(), app_err);
                    return Box::pin(async move { Err(app_err.into()) });
                }
            }
        }

        Box::pin(self.service.call(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::tests::run_with_temp_jwt_secret;
    use crate::auth::{generate_token, Claims};
    use actix_web::{test as actix_test, web, App, HttpRequest, HttpResponse};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match req.extensions().get::<Claims>() {
            Some(claims) => HttpResponse::Ok().body(claims.sub.to_string()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    fn call_with(header: Option<String>) -> (u16, String) {
        actix_rt::System::new().block_on(async move {
            let app = actix_test::init_service(
                App::new().wrap(AuthMiddleware).route("/", web::get().to(whoami)),
            )
            .await;

            let mut req = actix_test::TestRequest::get().uri("/");
            if let Some(value) = header {
                req = req.insert_header(("Authorization", value));
            }

            match actix_test::try_call_service(&app, req.to_request()).await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let body = actix_test::read_body(resp).await;
                    (status, String::from_utf8_lossy(&body).into_owned())
                }
                Err(err) => (err.as_response_error().status_code().as_u16(), String::new()),
            }
        })
    }

    #[test]
    fn test_anonymous_request_passes_through() {
        run_with_temp_jwt_secret("middleware_secret", || {
            assert_eq!(call_with(None), (200, "anonymous".to_string()));
        });
    }

    #[test]
    fn test_valid_token_exposes_claims() {
        run_with_temp_jwt_secret("middleware_secret", || {
            let token = generate_token(42).unwrap();
            assert_eq!(
                call_with(Some(format!("Bearer {}", token))),
                (200, "42".to_string())
            );
        });
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        run_with_temp_jwt_secret("middleware_secret", || {
            let (status, _) = call_with(Some("Bearer garbage".to_string()));
            assert_eq!(status, 401);
        });
    }
}

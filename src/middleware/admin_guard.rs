//! Access-guard middleware for privileged routes.
//!
//! Validates the Bearer access token from the Authorization header and
//! injects the claims into request extensions for downstream handlers.
//! Rejections use the same `{status, message}` envelope as `AppError`.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::jwt::verify_access_token;
use crate::configuration::JwtSettings;
use crate::error::AuthError;

pub struct AdminGuard {
    jwt_config: JwtSettings,
}

impl AdminGuard {
    pub fn new(jwt_config: JwtSettings) -> Self {
        Self { jwt_config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AdminGuardService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
        }))
    }
}

pub struct AdminGuardService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
}

fn unauthorized(error: &AuthError) -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({
        "status": "fail",
        "message": error.to_string(),
    }))
}

impl<S, B> Service<ServiceRequest> for AdminGuardService<S>
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
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string);

        let token = match bearer {
            Some(token) if !token.is_empty() => token,
            _ => {
                tracing::warn!("Missing or malformed Authorization header");
                let response = unauthorized(&AuthError::MissingToken);
                return Box::pin(async move {
                    Err(actix_web::error::InternalError::from_response(
                        "Unauthorized",
                        response,
                    )
                    .into())
                });
            }
        };

        match verify_access_token(&token, &self.jwt_config) {
            Ok(claims) => {
                req.extensions_mut().insert(claims.clone());

                tracing::debug!(site_id = %claims.sub, "Access token validated");

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!("Access token validation failed: {}", e);
                let response = unauthorized(&AuthError::InvalidToken);
                Box::pin(async move {
                    Err(actix_web::error::InternalError::from_response(
                        "Invalid token",
                        response,
                    )
                    .into())
                })
            }
        }
    }
}

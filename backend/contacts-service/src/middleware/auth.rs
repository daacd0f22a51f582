/// Bearer token authentication middleware
/// Verifies the token, loads the account and compares against the
/// stored session token before admitting the request
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::db::user_repo;
use crate::error::AppError;
use crate::models::Subscription;
use crate::AppState;

/// Authenticated identity injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub subscription: Subscription,
    pub avatar_url: String,
}

fn not_authorized() -> Error {
    AppError::Authentication("Not authorized".to_string()).into()
}

/// Authentication middleware factory
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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

        Box::pin(async move {
            // Read headers and app data before touching extensions_mut;
            // both go through the same RefCell.
            let auth_header = match req.headers().get("Authorization") {
                Some(header) => match header.to_str() {
                    Ok(h) => h.to_string(),
                    Err(_) => return Err(not_authorized()),
                },
                None => return Err(not_authorized()),
            };

            let Some(token) = auth_header.strip_prefix("Bearer ") else {
                return Err(not_authorized());
            };

            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| {
                    Error::from(AppError::Internal("Application state missing".to_string()))
                })?;

            let claims = match state.token_issuer.verify(token) {
                Ok(claims) => claims,
                Err(e) => {
                    tracing::debug!(error = %e, "token verification failed");
                    return Err(not_authorized());
                }
            };

            let user_id = match Uuid::parse_str(&claims.sub) {
                Ok(id) => id,
                Err(_) => return Err(not_authorized()),
            };

            let user = user_repo::find_by_id(&state.db, user_id)
                .await
                .map_err(AppError::from)?;

            let Some(user) = user else {
                return Err(not_authorized());
            };

            // A token that is valid in itself is still rejected unless it
            // matches the stored session token. Logout and re-login both
            // change the stored value, revoking everything issued before.
            if user.token.as_deref() != Some(token) {
                return Err(not_authorized());
            }

            req.extensions_mut().insert(AuthUser {
                id: user.id,
                email: user.email,
                subscription: user.subscription,
                avatar_url: user.avatar_url,
            });

            let res = service.call(req).await?;
            Ok(res)
        })
    }
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => ready(Err(not_authorized())),
        }
    }
}

/// Auth Gate Middleware
///
/// Runs before every protected handler: takes the access token from the
/// `accessToken` cookie or the `Authorization: Bearer` header, resolves it to
/// a user, and stores that `PublicUser` in request extensions. Any failure
/// short-circuits with 401 before the handler runs.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{extract_access_token, AuthService, ACCESS_TOKEN_COOKIE};

/// Wrap a resource or scope with this to require a valid access token
pub struct AuthGate {
    auth: web::Data<AuthService>,
}

impl AuthGate {
    pub fn new(auth: web::Data<AuthService>) -> Self {
        Self { auth }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthGateService {
            service: Rc::new(service),
            auth: self.auth.clone(),
        }))
    }
}

pub struct AuthGateService<S> {
    service: Rc<S>,
    auth: web::Data<AuthService>,
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
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
        let cookie = req.cookie(ACCESS_TOKEN_COOKIE);
        let presented = extract_access_token(
            cookie.as_ref().map(|c| c.value()),
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok()),
        );

        let auth = self.auth.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let user = auth.authenticate(presented.as_deref()).await?;

            tracing::debug!(
                user_id = %user.id,
                path = %req.path(),
                "Access token validated"
            );
            req.extensions_mut().insert(user);

            service.call(req).await
        })
    }
}

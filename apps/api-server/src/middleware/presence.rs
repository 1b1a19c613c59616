//! Presence middleware - records `last_seen` for authenticated requests.

use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use chrono::Utc;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;

use crate::middleware::auth::bearer_claims;
use crate::state::AppState;

/// Touches the caller's `last_seen` before the request is handled.
///
/// Requests without a valid token pass through untouched; rejecting them is
/// the `Identity` extractor's job. A failed update never fails the request.
pub struct PresenceMiddleware;

impl<S, B> Transform<S, ServiceRequest> for PresenceMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = PresenceService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PresenceService {
            service: Rc::new(service),
        }))
    }
}

pub struct PresenceService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for PresenceService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let user_id = bearer_claims(req.request()).ok().map(|c| c.user_id);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            if let (Some(user_id), Some(state)) = (user_id, state) {
                state.presence.touch(user_id, Utc::now()).await;
            }
            service.call(req).await
        })
    }
}

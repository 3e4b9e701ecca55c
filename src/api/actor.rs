//! Actix-web extractor for the acting user.
//!
//! Authentication happens upstream; this layer only reads which user the
//! request acts for and stamps the current time.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::config::ACTOR_ID_HEADER;
use crate::error::AppError;
use crate::models::ActorContext;

/// The acting user of a request, taken from the `X-Actor-Id` header.
///
/// ```ignore
/// async fn handler(actor: Actor) -> impl Responder {
///     let ctx = actor.context();
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Actor(ActorContext);

impl Actor {
    pub fn context(&self) -> &ActorContext {
        &self.0
    }
}

fn actor_id(req: &HttpRequest) -> Result<Uuid, AppError> {
    let raw = req
        .headers()
        .get(ACTOR_ID_HEADER)
        .ok_or_else(|| {
            AppError::Validation(format!("Missing {} header", ACTOR_ID_HEADER))
        })?
        .to_str()
        .map_err(|_| AppError::Validation(format!("Invalid {} header", ACTOR_ID_HEADER)))?;

    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("{} must be a UUID", ACTOR_ID_HEADER)))
}

impl FromRequest for Actor {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(actor_id(req).map(|id| Actor(ActorContext::now(id))))
    }
}

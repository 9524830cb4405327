// server/src/web/extractors.rs

//! Caller identity extraction. Token issuance and verification live in the
//! external identity context; this server only consumes the resolved
//! identity, carried on `X-Actor-ID` / `X-Actor-Role` headers (e.g. set by an
//! authenticating reverse proxy), and hands it to the engine as an explicit
//! `Actor` argument.

use actix_web::{FromRequest, HttpRequest};
use leash::{Actor, Role};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug)]
pub struct CallerIdentity(pub Actor);

fn parse_role(raw: &str) -> Option<Role> {
  match raw.to_ascii_uppercase().as_str() {
    "USER" => Some(Role::User),
    "SHELTER" => Some(Role::Shelter),
    "ADMIN" => Some(Role::Admin),
    "SPONSOR" => Some(Role::Sponsor),
    "STAFF" => Some(Role::Staff),
    // SYSTEM is internal-only and never accepted from a request.
    _ => None,
  }
}

impl FromRequest for CallerIdentity {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let header = |name: &str| {
      req
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
    };

    let result = match (header("X-Actor-ID"), header("X-Actor-Role")) {
      (Some(id_raw), Some(role_raw)) => match (Uuid::parse_str(&id_raw), parse_role(&role_raw)) {
        (Ok(id), Some(role)) => Ok(CallerIdentity(Actor::new(id, role))),
        _ => {
          warn!(id = %id_raw, role = %role_raw, "CallerIdentity: unparseable identity headers");
          Err(AppError::Auth(
            "Invalid X-Actor-ID or X-Actor-Role header.".to_string(),
          ))
        }
      },
      _ => {
        warn!("CallerIdentity: missing identity headers");
        Err(AppError::Auth(
          "Caller identity required. Missing X-Actor-ID / X-Actor-Role headers.".to_string(),
        ))
      }
    };
    futures_util::future::ready(result)
  }
}

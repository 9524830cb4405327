// server/src/web/handlers/adoption_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CallerIdentity;
use leash::CaseDecision;

#[derive(Deserialize, Debug)]
pub struct DecisionPayload {
  pub decision: CaseDecision,
  pub expected_version: u64,
}

#[derive(Deserialize, Debug)]
pub struct CancelPayload {
  pub expected_version: u64,
}

/// `POST /listings/{id}/adoptions` — a user opens a case against an
/// available listing. 412 when the listing is not available or already has
/// an open case.
#[instrument(
  name = "handler::open_adoption",
  skip(app_state, caller),
  fields(actor_id = %caller.0.id, actor_role = %caller.0.role)
)]
pub async fn open_adoption_handler(
  app_state: web::Data<AppState>,
  caller: CallerIdentity,
  listing_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let case = app_state
    .engine
    .open_case(listing_id.into_inner(), &caller.0)
    .await?;
  info!(case_id = %case.id, "adoption case opened");
  Ok(HttpResponse::Created().json(case))
}

#[instrument(name = "handler::get_adoption", skip(app_state))]
pub async fn get_adoption_handler(
  app_state: web::Data<AppState>,
  case_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let id = case_id.into_inner();
  let case = app_state
    .store
    .load_case(id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Adoption case {} not found", id)))?;
  Ok(HttpResponse::Ok().json(case))
}

/// `POST /adoptions/{id}/decision` — the owning shelter approves or rejects.
/// An approval carries the listing to adopted in the same atomic unit; 412
/// when that compound precondition no longer holds.
#[instrument(
  name = "handler::decide_adoption",
  skip(app_state, payload, caller),
  fields(actor_role = %caller.0.role, decision = ?payload.decision)
)]
pub async fn decide_adoption_handler(
  app_state: web::Data<AppState>,
  caller: CallerIdentity,
  case_id: web::Path<Uuid>,
  payload: web::Json<DecisionPayload>,
) -> Result<HttpResponse, AppError> {
  let outcome = app_state
    .engine
    .decide_case(
      case_id.into_inner(),
      payload.expected_version,
      payload.decision,
      &caller.0,
    )
    .await?;
  info!(case_id = %outcome.case.id, status = %outcome.case.status, "adoption case decided");
  Ok(HttpResponse::Ok().json(json!({
    "case": outcome.case,
    "listing": outcome.listing,
  })))
}

/// `POST /adoptions/{id}/cancel` — requester-only withdrawal of an open case.
#[instrument(
  name = "handler::cancel_adoption",
  skip(app_state, payload, caller),
  fields(actor_id = %caller.0.id, actor_role = %caller.0.role)
)]
pub async fn cancel_adoption_handler(
  app_state: web::Data<AppState>,
  caller: CallerIdentity,
  case_id: web::Path<Uuid>,
  payload: web::Json<CancelPayload>,
) -> Result<HttpResponse, AppError> {
  let case = app_state
    .engine
    .cancel_case(case_id.into_inner(), payload.expected_version, &caller.0)
    .await?;
  Ok(HttpResponse::Ok().json(case))
}

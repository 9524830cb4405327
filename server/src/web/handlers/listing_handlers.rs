// server/src/web/handlers/listing_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CallerIdentity;
use leash::ListingStatus;

#[derive(Deserialize, Debug)]
pub struct CreateListingPayload {
  pub name: String,
  pub species: String,
}

#[derive(Deserialize, Debug)]
pub struct ListingStatusPayload {
  pub to_status: ListingStatus,
  pub expected_version: u64,
}

#[instrument(
  name = "handler::create_listing",
  skip(app_state, payload, caller),
  fields(actor_id = %caller.0.id, actor_role = %caller.0.role)
)]
pub async fn create_listing_handler(
  app_state: web::Data<AppState>,
  caller: CallerIdentity,
  payload: web::Json<CreateListingPayload>,
) -> Result<HttpResponse, AppError> {
  if payload.name.trim().is_empty() || payload.species.trim().is_empty() {
    return Err(AppError::Validation(
      "Listing name and species are required.".to_string(),
    ));
  }
  let listing = app_state
    .engine
    .create_listing(&caller.0, payload.name.trim(), payload.species.trim())
    .await?;
  info!(listing_id = %listing.id, "listing created");
  Ok(HttpResponse::Created().json(listing))
}

#[instrument(name = "handler::get_listing", skip(app_state))]
pub async fn get_listing_handler(
  app_state: web::Data<AppState>,
  listing_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let id = listing_id.into_inner();
  let listing = app_state
    .store
    .load_listing(id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))?;
  Ok(HttpResponse::Ok().json(listing))
}

/// `POST /listings/{id}/status` — review decisions (admin) and shelter
/// withdrawal. 409 on a stale snapshot, 403 when the gate denies, 422 when
/// the state machine rejects the move.
#[instrument(
  name = "handler::change_listing_status",
  skip(app_state, payload, caller),
  fields(actor_role = %caller.0.role, to_status = ?payload.to_status)
)]
pub async fn change_listing_status_handler(
  app_state: web::Data<AppState>,
  caller: CallerIdentity,
  listing_id: web::Path<Uuid>,
  payload: web::Json<ListingStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let id = listing_id.into_inner();
  // The caller's snapshot is re-read to derive `from`; the engine holds the
  // authoritative stale check against expected_version.
  let current = app_state
    .store
    .load_listing(id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))?;

  let updated = app_state
    .engine
    .apply_listing(
      id,
      payload.expected_version,
      current.status,
      payload.to_status,
      &caller.0,
    )
    .await?;
  Ok(HttpResponse::Ok().json(updated))
}

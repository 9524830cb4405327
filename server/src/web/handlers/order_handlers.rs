// server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CallerIdentity;
use leash::{FulfillmentStatus, PaymentOutcome, ReconcileReport, Role, TransitionError};

#[derive(Deserialize, Debug)]
pub struct CreateOrderPayload {
  pub total_amount_cents: i64,
  pub currency: String,
}

#[derive(Deserialize, Debug)]
pub struct PaymentCallbackPayload {
  pub outcome: PaymentOutcome,
}

#[derive(Deserialize, Debug)]
pub struct FulfillmentPayload {
  pub to_status: FulfillmentStatus,
  pub expected_version: u64,
}

#[instrument(
  name = "handler::create_order",
  skip(app_state, payload, caller),
  fields(actor_id = %caller.0.id, actor_role = %caller.0.role)
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  caller: CallerIdentity,
  payload: web::Json<CreateOrderPayload>,
) -> Result<HttpResponse, AppError> {
  if payload.total_amount_cents <= 0 {
    return Err(AppError::Validation(
      "Order amount must be greater than zero.".to_string(),
    ));
  }
  if payload.currency.len() != 3 {
    return Err(AppError::Validation(
      "Currency must be a 3-letter code.".to_string(),
    ));
  }
  let order = app_state
    .engine
    .create_order(&caller.0, payload.total_amount_cents, &payload.currency)
    .await?;
  info!(order_id = %order.id, "order created");
  Ok(HttpResponse::Created().json(order))
}

/// `GET /orders/{id}` — the poll target for the final `payment_status` after
/// a callback was accepted.
#[instrument(name = "handler::get_order", skip(app_state))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let id = order_id.into_inner();
  let order = app_state
    .store
    .load_order(id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;
  Ok(HttpResponse::Ok().json(order))
}

/// `POST /orders/{id}/payment-callback` — invoked by the gateway-redirect
/// handler. Once the request is accepted (signature verified, body parsed)
/// this always answers 200; the settlement result is reported in the body
/// and durably via `GET /orders/{id}`. Safe to deliver twice: the engine's
/// idempotence rule absorbs replays.
#[instrument(
  name = "handler::payment_callback",
  skip(app_state, req, payload),
  fields(outcome = ?payload.outcome)
)]
pub async fn payment_callback_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  order_id: web::Path<Uuid>,
  payload: web::Json<PaymentCallbackPayload>,
) -> Result<HttpResponse, AppError> {
  let id = order_id.into_inner();

  // Verify the gateway's shared-secret signature when one is configured.
  if let Some(secret) = &app_state.config.gateway_webhook_secret {
    let presented = req
      .headers()
      .get("x-gateway-signature")
      .and_then(|v| v.to_str().ok());
    if presented != Some(secret.as_str()) {
      warn!(order_id = %id, "payment callback rejected: bad gateway signature");
      return Err(AppError::Auth(
        "Payment callback signature verification failed.".to_string(),
      ));
    }
  }

  match app_state.worker.reconcile(id, payload.outcome).await {
    Ok(ReconcileReport::Settled(order)) => Ok(HttpResponse::Ok().json(json!({
      "status": "settled",
      "order": order,
    }))),
    Ok(ReconcileReport::DeadLettered { attempts, last_error }) => {
      // Retries exhausted; the discrepancy is recorded for follow-up rather
      // than shown as a silent failure.
      warn!(order_id = %id, attempts, "payment callback dead-lettered");
      Ok(HttpResponse::Ok().json(json!({
        "status": "dead_lettered",
        "attempts": attempts,
        "detail": last_error,
      })))
    }
    // A definitive rejection (terminal conflict, unknown order) still
    // acknowledges the callback so the gateway stops redelivering; the
    // reason travels in the body.
    Err(e @ TransitionError::IllegalTransition { .. }) => Ok(HttpResponse::Ok().json(json!({
      "status": "rejected",
      "detail": e.to_string(),
    }))),
    Err(e) => Err(e.into()),
  }
}

/// `POST /orders/{id}/fulfillment` — staff/admin advance the fulfillment
/// axis; the owner may cancel while it is still open.
#[instrument(
  name = "handler::advance_fulfillment",
  skip(app_state, payload, caller),
  fields(actor_role = %caller.0.role, to_status = ?payload.to_status)
)]
pub async fn advance_fulfillment_handler(
  app_state: web::Data<AppState>,
  caller: CallerIdentity,
  order_id: web::Path<Uuid>,
  payload: web::Json<FulfillmentPayload>,
) -> Result<HttpResponse, AppError> {
  let id = order_id.into_inner();
  let current = app_state
    .store
    .load_order(id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;

  let updated = app_state
    .engine
    .apply_fulfillment(
      id,
      payload.expected_version,
      current.order_status,
      payload.to_status,
      &caller.0,
    )
    .await?;
  Ok(HttpResponse::Ok().json(updated))
}

/// `GET /orders/{id}/dead-letters` — admin visibility into reconciliations
/// that exhausted their retry budget.
#[instrument(
  name = "handler::list_dead_letters",
  skip(app_state, caller),
  fields(actor_role = %caller.0.role)
)]
pub async fn list_dead_letters_handler(
  app_state: web::Data<AppState>,
  caller: CallerIdentity,
  order_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if caller.0.role != Role::Admin {
    return Err(AppError::Forbidden(
      "Dead-letter inspection requires the ADMIN role.".to_string(),
    ));
  }
  let letters = app_state
    .store
    .dead_letters_for(order_id.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(letters))
}

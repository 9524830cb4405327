// leash/src/model/dead_letter.rs

use crate::reconcile::PaymentOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable record of a payment reconciliation that could not complete after
/// bounded retries. Append-only; awaits manual or scheduled reprocessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
  pub order_id: Uuid,
  pub attempted: PaymentOutcome,
  pub attempts: u32,
  pub last_error: String,
  pub recorded_at: DateTime<Utc>,
}

impl DeadLetter {
  pub fn new(order_id: Uuid, attempted: PaymentOutcome, attempts: u32, last_error: String) -> Self {
    Self {
      order_id,
      attempted,
      attempts,
      last_error,
      recorded_at: Utc::now(),
    }
  }
}

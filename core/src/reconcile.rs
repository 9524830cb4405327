// leash/src/reconcile.rs

//! Reconciliation of an order's payment outcome after the gateway redirect.
//!
//! The confirmation call into the transition engine can itself fail
//! transiently (store I/O, a lost optimistic-concurrency race), so the worker
//! wraps it in a bounded exponential-backoff retry. After the retry budget is
//! spent the discrepancy is surfaced as a dead-letter record — never dropped,
//! and never retried forever. The wait between attempts is an async sleep;
//! it suspends this task only.

use crate::actor::Actor;
use crate::engine::TransitionEngine;
use crate::error::{LeashResult, TransitionError};
use crate::model::{DeadLetter, EntityKind, Order, PaymentStatus};
use crate::store::StateStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// What the gateway redirect reported for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOutcome {
  Paid,
  Failed,
}

impl PaymentOutcome {
  pub fn status(self) -> PaymentStatus {
    match self {
      PaymentOutcome::Paid => PaymentStatus::Paid,
      PaymentOutcome::Failed => PaymentStatus::Failed,
    }
  }
}

impl std::fmt::Display for PaymentOutcome {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      PaymentOutcome::Paid => "paid",
      PaymentOutcome::Failed => "failed",
    })
  }
}

/// Seam between the worker and the engine, so tests can substitute a failing
/// confirmer. One call = one settlement attempt.
#[async_trait]
pub trait PaymentConfirmer: Send + Sync {
  async fn confirm(&self, order_id: Uuid, outcome: PaymentOutcome) -> LeashResult<Order>;
}

#[async_trait]
impl PaymentConfirmer for TransitionEngine {
  /// Re-reads the current version on every attempt (a retried attempt must
  /// not replay a stale snapshot), then applies `Pending -> outcome` as the
  /// system actor. A replay of an already-settled identical outcome succeeds
  /// idempotently inside the engine.
  async fn confirm(&self, order_id: Uuid, outcome: PaymentOutcome) -> LeashResult<Order> {
    let current = self
      .store()
      .load_order(order_id)
      .await?
      .ok_or(TransitionError::NotFound {
        kind: EntityKind::OrderPayment,
        id: order_id,
      })?;
    self
      .apply_payment(
        order_id,
        current.version,
        PaymentStatus::Pending,
        outcome.status(),
        &Actor::system(),
      )
      .await
  }
}

/// Retry budget for the worker. Delay before attempt n+1 is
/// `base_delay * 2^(n-1)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub base_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      base_delay: Duration::from_millis(50),
    }
  }
}

impl RetryPolicy {
  fn backoff_after(&self, attempt: u32) -> Duration {
    self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
  }
}

/// How a reconciliation run ended.
#[derive(Debug, Clone)]
pub enum ReconcileReport {
  /// The store reflects the observed outcome.
  Settled(Order),
  /// Retries exhausted; exactly one dead-letter record was appended for
  /// manual or scheduled follow-up.
  DeadLettered { attempts: u32, last_error: String },
}

pub struct ReconciliationWorker {
  confirmer: Arc<dyn PaymentConfirmer>,
  store: Arc<dyn StateStore>,
  policy: RetryPolicy,
}

impl ReconciliationWorker {
  pub fn new(
    confirmer: Arc<dyn PaymentConfirmer>,
    store: Arc<dyn StateStore>,
    policy: RetryPolicy,
  ) -> Self {
    Self {
      confirmer,
      store,
      policy,
    }
  }

  /// Drives the store to the observed gateway outcome.
  ///
  /// Retryable failures (transient I/O, lost version races) are retried up to
  /// the policy budget; definitive rejections — a settled order moving to a
  /// different terminal value, a missing order — are returned to the caller
  /// unchanged and never dead-lettered. Invoking this twice for the same
  /// redirect is safe: the engine's idempotence rule absorbs the replay.
  #[instrument(skip(self), fields(%order_id, %outcome))]
  pub async fn reconcile(
    &self,
    order_id: Uuid,
    outcome: PaymentOutcome,
  ) -> LeashResult<ReconcileReport> {
    let mut last_error: Option<TransitionError> = None;

    for attempt in 1..=self.policy.max_attempts {
      match self.confirmer.confirm(order_id, outcome).await {
        Ok(order) => {
          info!(attempt, "payment outcome settled");
          return Ok(ReconcileReport::Settled(order));
        }
        Err(e) if e.is_retryable() => {
          warn!(attempt, error = %e, "confirmation attempt failed, will retry");
          last_error = Some(e);
          if attempt < self.policy.max_attempts {
            tokio::time::sleep(self.policy.backoff_after(attempt)).await;
          }
        }
        Err(e) => return Err(e),
      }
    }

    let last = last_error
      .map(|e| e.to_string())
      .unwrap_or_else(|| "unknown".to_string());
    warn!(attempts = self.policy.max_attempts, last_error = %last,
      "retries exhausted, dead-lettering order");
    self
      .store
      .append_dead_letter(DeadLetter::new(
        order_id,
        outcome,
        self.policy.max_attempts,
        last.clone(),
      ))
      .await?;
    Ok(ReconcileReport::DeadLettered {
      attempts: self.policy.max_attempts,
      last_error: last,
    })
  }
}

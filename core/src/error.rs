// leash/src/error.rs

use crate::model::EntityKind;
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

/// Failure taxonomy for the transition engine and everything above it.
///
/// Only `Transient` (and a lost optimistic-concurrency race) is retryable,
/// and only the reconciliation worker retries; every other caller receives a
/// definitive answer synchronously.
#[derive(Debug, Error)]
pub enum TransitionError {
  #[error("{kind} {id} not found")]
  NotFound { kind: EntityKind, id: Uuid },

  #[error("{role} may not move {kind} {id} from {from} to {to}")]
  Forbidden {
    role: crate::actor::Role,
    kind: EntityKind,
    id: Uuid,
    from: String,
    to: String,
  },

  #[error("illegal transition on {kind} {id}: {from} -> {to}")]
  IllegalTransition {
    kind: EntityKind,
    id: Uuid,
    from: String,
    to: String,
  },

  #[error("stale snapshot of {kind} {id}: expected version {expected_version}, found {found_version}")]
  StaleState {
    kind: EntityKind,
    id: Uuid,
    expected_version: u64,
    found_version: u64,
  },

  #[error("precondition failed for {kind} {id}: {reason}")]
  PreconditionFailed {
    kind: EntityKind,
    id: Uuid,
    reason: String,
  },

  #[error("transient infrastructure failure: {source}")]
  Transient {
    #[source]
    source: AnyhowError,
  },
}

impl TransitionError {
  /// True for failures the reconciliation worker may retry: infrastructure
  /// hiccups and lost optimistic-concurrency races. Everything else is a
  /// definitive rejection.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      TransitionError::Transient { .. } | TransitionError::StaleState { .. }
    )
  }
}

// Infrastructure errors surfaced through anyhow (store I/O, timeouts) land in
// the retryable class.
impl From<AnyhowError> for TransitionError {
  fn from(err: AnyhowError) -> Self {
    TransitionError::Transient { source: err }
  }
}

pub type LeashResult<T, E = TransitionError> = std::result::Result<T, E>;

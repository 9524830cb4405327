// src/lib.rs

//! Leash: the lifecycle and reconciliation engine behind an adoption
//! marketplace.
//!
//! Three entities carry real state-transition logic — animal listings,
//! adoption cases, and orders (with an independently tracked payment status).
//! Leash provides:
//!  - The legal state machine for each entity (`machine`).
//!  - A deny-by-default authorization gate mapping
//!    `(role, entity, from, to)` to allow/deny, with ownership folded into
//!    the same predicate (`gate`).
//!  - A transition engine that applies status changes idempotently under
//!    optimistic concurrency, including the atomic compound
//!    case-approval / listing-adoption move (`engine`).
//!  - A reconciliation worker that settles an order's payment outcome after
//!    a gateway redirect, with bounded exponential backoff and a dead-letter
//!    terminal state (`reconcile`).
//!
//! All mutation goes through the engine; reads may bypass it freely.

pub mod actor;
pub mod engine;
pub mod error;
pub mod gate;
pub mod machine;
pub mod model;
pub mod reconcile;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::actor::{Actor, Role};
pub use crate::engine::{CaseDecision, CaseDecisionOutcome, TransitionEngine};
pub use crate::error::{LeashResult, TransitionError};
pub use crate::machine::Transition;
pub use crate::model::{
  AdoptionCase, CaseStatus, DeadLetter, EntityKind, FulfillmentStatus, Listing, ListingStatus,
  Order, PaymentStatus,
};
pub use crate::reconcile::{
  PaymentConfirmer, PaymentOutcome, ReconcileReport, ReconciliationWorker, RetryPolicy,
};
pub use crate::store::{MemoryStore, StateStore};

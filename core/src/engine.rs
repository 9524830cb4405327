// leash/src/engine.rs

//! The transition engine: the only component permitted to mutate entity
//! status. Every apply validates, in order: idempotent replay, terminal
//! guard, optimistic-concurrency snapshot, authorization gate, state-machine
//! topology — then commits a single CAS write. The engine never retries
//! anything internally; retry policy belongs to the reconciliation worker.

use crate::actor::{Actor, Role};
use crate::error::{LeashResult, TransitionError};
use crate::gate;
use crate::machine::{self, Transition};
use crate::model::{
  AdoptionCase, CaseStatus, EntityKind, FulfillmentStatus, Listing, ListingStatus, Order,
  PaymentStatus,
};
use crate::store::StateStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A shelter's verdict on a pending adoption case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CaseDecision {
  Approved,
  Rejected,
}

/// Result of a case decision. `listing` is present when the decision was an
/// approval that carried the listing to `Adopted` in the same atomic unit.
#[derive(Debug, Clone)]
pub struct CaseDecisionOutcome {
  pub case: AdoptionCase,
  pub listing: Option<Listing>,
}

enum Validated {
  /// The entity is already in the requested target state; the original write
  /// succeeded and this is a replay. Return the current record unchanged.
  AlreadyApplied,
  Proceed,
}

/// Shared validation for every apply. The ordering matters: a replay of an
/// already-applied transition must succeed before any other check can reject
/// it, and a settled entity must answer `IllegalTransition` (not a stale
/// snapshot) to any attempt to move it elsewhere.
#[allow(clippy::too_many_arguments)]
fn validate<S: Copy + Eq + std::fmt::Display>(
  kind: EntityKind,
  id: Uuid,
  role: Role,
  current: S,
  current_version: u64,
  from: S,
  to: S,
  expected_version: u64,
  is_terminal: impl Fn(S) -> bool,
  topology_legal: bool,
  permitted: bool,
) -> LeashResult<Validated> {
  if current == to {
    return Ok(Validated::AlreadyApplied);
  }
  if is_terminal(current) {
    return Err(TransitionError::IllegalTransition {
      kind,
      id,
      from: current.to_string(),
      to: to.to_string(),
    });
  }
  if current != from || current_version != expected_version {
    return Err(TransitionError::StaleState {
      kind,
      id,
      expected_version,
      found_version: current_version,
    });
  }
  if !permitted {
    return Err(TransitionError::Forbidden {
      role,
      kind,
      id,
      from: from.to_string(),
      to: to.to_string(),
    });
  }
  if !topology_legal {
    return Err(TransitionError::IllegalTransition {
      kind,
      id,
      from: from.to_string(),
      to: to.to_string(),
    });
  }
  Ok(Validated::Proceed)
}

/// Applies role-gated, version-checked status transitions against the state
/// store. Cheap to clone; holds only the store handle.
#[derive(Clone)]
pub struct TransitionEngine {
  store: Arc<dyn StateStore>,
}

impl TransitionEngine {
  pub fn new(store: Arc<dyn StateStore>) -> Self {
    Self { store }
  }

  pub fn store(&self) -> Arc<dyn StateStore> {
    Arc::clone(&self.store)
  }

  // --- Listings ---

  /// Creates a listing in `Pending` at version 0. Shelter actors only; the
  /// caller becomes the owner.
  #[instrument(skip(self, actor), fields(actor_role = %actor.role))]
  pub async fn create_listing(
    &self,
    actor: &Actor,
    name: &str,
    species: &str,
  ) -> LeashResult<Listing> {
    if actor.role != Role::Shelter {
      return Err(TransitionError::Forbidden {
        role: actor.role,
        kind: EntityKind::Listing,
        id: Uuid::nil(),
        from: "(new)".to_string(),
        to: ListingStatus::Pending.to_string(),
      });
    }
    let listing = Listing::new(actor.id, name, species);
    self.store.insert_listing(listing.clone()).await?;
    info!(listing_id = %listing.id, shelter_id = %listing.shelter_id, "listing created");
    Ok(listing)
  }

  #[instrument(skip(self, actor), fields(actor_role = %actor.role, %from, %to))]
  pub async fn apply_listing(
    &self,
    id: Uuid,
    expected_version: u64,
    from: ListingStatus,
    to: ListingStatus,
    actor: &Actor,
  ) -> LeashResult<Listing> {
    let current = self
      .store
      .load_listing(id)
      .await?
      .ok_or(TransitionError::NotFound {
        kind: EntityKind::Listing,
        id,
      })?;

    match validate(
      EntityKind::Listing,
      id,
      actor.role,
      current.status,
      current.version,
      from,
      to,
      expected_version,
      machine::listing_terminal,
      machine::is_legal(Transition::Listing { from, to }),
      gate::permits_listing(actor, &current, from, to),
    )? {
      Validated::AlreadyApplied => return Ok(current),
      Validated::Proceed => {}
    }

    let mut updated = current;
    updated.status = to;
    updated.version += 1;
    updated.updated_at = Utc::now();
    self.store.store_listing(&updated, expected_version).await?;
    info!(listing_id = %id, version = updated.version, "listing transition applied");
    Ok(updated)
  }

  // --- Adoption cases ---

  /// Opens a case against an `Available` listing. User actors only. At most
  /// one pending case may exist per listing; a second request fails at
  /// creation rather than queueing.
  #[instrument(skip(self, actor), fields(actor_role = %actor.role))]
  pub async fn open_case(&self, listing_id: Uuid, actor: &Actor) -> LeashResult<AdoptionCase> {
    if actor.role != Role::User {
      return Err(TransitionError::Forbidden {
        role: actor.role,
        kind: EntityKind::AdoptionCase,
        id: Uuid::nil(),
        from: "(new)".to_string(),
        to: CaseStatus::Pending.to_string(),
      });
    }
    let listing = self
      .store
      .load_listing(listing_id)
      .await?
      .ok_or(TransitionError::NotFound {
        kind: EntityKind::Listing,
        id: listing_id,
      })?;
    if listing.status != ListingStatus::Available {
      return Err(TransitionError::PreconditionFailed {
        kind: EntityKind::Listing,
        id: listing_id,
        reason: format!("listing is {}, not available for adoption", listing.status),
      });
    }

    let case = AdoptionCase::open(listing_id, actor.id, listing.shelter_id);
    // The store rejects this atomically if another pending case exists.
    self.store.insert_case(case.clone()).await?;
    info!(case_id = %case.id, %listing_id, requester_id = %actor.id, "adoption case opened");
    Ok(case)
  }

  /// Decides a pending case. `Approved` is a compound transition: the case
  /// move and the listing's `Available -> Adopted` commit atomically, or the
  /// whole decision fails and the case stays pending.
  #[instrument(skip(self, actor), fields(actor_role = %actor.role, ?decision))]
  pub async fn decide_case(
    &self,
    id: Uuid,
    expected_version: u64,
    decision: CaseDecision,
    actor: &Actor,
  ) -> LeashResult<CaseDecisionOutcome> {
    let to = match decision {
      CaseDecision::Approved => CaseStatus::Approved,
      CaseDecision::Rejected => CaseStatus::Rejected,
    };
    let current = self
      .store
      .load_case(id)
      .await?
      .ok_or(TransitionError::NotFound {
        kind: EntityKind::AdoptionCase,
        id,
      })?;

    match validate(
      EntityKind::AdoptionCase,
      id,
      actor.role,
      current.status,
      current.version,
      CaseStatus::Pending,
      to,
      expected_version,
      machine::case_terminal,
      machine::is_legal(Transition::Case {
        from: CaseStatus::Pending,
        to,
      }),
      gate::permits_case(actor, &current, CaseStatus::Pending, to),
    )? {
      Validated::AlreadyApplied => {
        return Ok(CaseDecisionOutcome {
          case: current,
          listing: None,
        })
      }
      Validated::Proceed => {}
    }

    let mut decided = current.clone();
    decided.status = to;
    decided.version += 1;
    decided.decided_at = Some(Utc::now());

    if decision == CaseDecision::Rejected {
      self.store.store_case(&decided, expected_version).await?;
      info!(case_id = %id, "adoption case rejected");
      return Ok(CaseDecisionOutcome {
        case: decided,
        listing: None,
      });
    }

    // Approval: the referenced listing must still be available, and its
    // adoption is applied by the engine itself as the system actor.
    let listing = self
      .store
      .load_listing(current.listing_id)
      .await?
      .ok_or(TransitionError::NotFound {
        kind: EntityKind::Listing,
        id: current.listing_id,
      })?;
    if listing.status != ListingStatus::Available {
      warn!(case_id = %id, listing_id = %listing.id, listing_status = %listing.status,
        "approval rejected: listing no longer available");
      return Err(TransitionError::PreconditionFailed {
        kind: EntityKind::AdoptionCase,
        id,
        reason: format!("listing {} is {}, not available", listing.id, listing.status),
      });
    }
    let system = Actor::system();
    if !gate::permits_listing(
      &system,
      &listing,
      ListingStatus::Available,
      ListingStatus::Adopted,
    ) {
      return Err(TransitionError::Forbidden {
        role: system.role,
        kind: EntityKind::Listing,
        id: listing.id,
        from: ListingStatus::Available.to_string(),
        to: ListingStatus::Adopted.to_string(),
      });
    }

    let listing_expected = listing.version;
    let mut adopted = listing;
    adopted.status = ListingStatus::Adopted;
    adopted.version += 1;
    adopted.updated_at = Utc::now();

    match self
      .store
      .store_case_and_listing(&decided, expected_version, &adopted, listing_expected)
      .await
    {
      Ok(()) => {
        info!(case_id = %id, listing_id = %adopted.id, "adoption case approved, listing adopted");
        Ok(CaseDecisionOutcome {
          case: decided,
          listing: Some(adopted),
        })
      }
      Err(TransitionError::StaleState {
        kind: EntityKind::Listing,
        ..
      }) => {
        // Lost a commit-time race on the listing. If another approval won,
        // the caller gets the precondition failure; the case stays pending.
        let now = self.store.load_listing(decided.listing_id).await?;
        match now {
          Some(l) if l.status != ListingStatus::Available => {
            Err(TransitionError::PreconditionFailed {
              kind: EntityKind::AdoptionCase,
              id,
              reason: format!("listing {} is {}, not available", l.id, l.status),
            })
          }
          _ => Err(TransitionError::StaleState {
            kind: EntityKind::Listing,
            id: decided.listing_id,
            expected_version: listing_expected,
            found_version: now.map(|l| l.version).unwrap_or(0),
          }),
        }
      }
      Err(e) => Err(e),
    }
  }

  /// Withdraws a pending case. Only the original requester may cancel, and
  /// only while the case is still open; settled cases answer
  /// `IllegalTransition`.
  #[instrument(skip(self, actor), fields(actor_role = %actor.role))]
  pub async fn cancel_case(
    &self,
    id: Uuid,
    expected_version: u64,
    actor: &Actor,
  ) -> LeashResult<AdoptionCase> {
    let current = self
      .store
      .load_case(id)
      .await?
      .ok_or(TransitionError::NotFound {
        kind: EntityKind::AdoptionCase,
        id,
      })?;

    match validate(
      EntityKind::AdoptionCase,
      id,
      actor.role,
      current.status,
      current.version,
      CaseStatus::Pending,
      CaseStatus::Cancelled,
      expected_version,
      machine::case_terminal,
      machine::is_legal(Transition::Case {
        from: CaseStatus::Pending,
        to: CaseStatus::Cancelled,
      }),
      gate::permits_case(actor, &current, CaseStatus::Pending, CaseStatus::Cancelled),
    )? {
      Validated::AlreadyApplied => return Ok(current),
      Validated::Proceed => {}
    }

    let mut cancelled = current;
    cancelled.status = CaseStatus::Cancelled;
    cancelled.version += 1;
    cancelled.decided_at = Some(Utc::now());
    self.store.store_case(&cancelled, expected_version).await?;
    info!(case_id = %id, "adoption case cancelled by requester");
    Ok(cancelled)
  }

  // --- Orders ---

  /// Creates an order at checkout, `Pending` on both axes, version 0. User
  /// actors only; the caller becomes the owner.
  #[instrument(skip(self, actor), fields(actor_role = %actor.role))]
  pub async fn create_order(
    &self,
    actor: &Actor,
    total_amount_cents: i64,
    currency: &str,
  ) -> LeashResult<Order> {
    if actor.role != Role::User {
      return Err(TransitionError::Forbidden {
        role: actor.role,
        kind: EntityKind::OrderFulfillment,
        id: Uuid::nil(),
        from: "(new)".to_string(),
        to: FulfillmentStatus::Pending.to_string(),
      });
    }
    let order = Order::new(actor.id, total_amount_cents, currency);
    self.store.insert_order(order.clone()).await?;
    info!(order_id = %order.id, user_id = %order.user_id, "order created");
    Ok(order)
  }

  /// Applies a payment-axis transition. In production the only callers are
  /// the reconciliation worker (as `System`) and owner/admin cancellation of
  /// an unpaid order.
  #[instrument(skip(self, actor), fields(actor_role = %actor.role, %from, %to))]
  pub async fn apply_payment(
    &self,
    order_id: Uuid,
    expected_version: u64,
    from: PaymentStatus,
    to: PaymentStatus,
    actor: &Actor,
  ) -> LeashResult<Order> {
    let current = self
      .store
      .load_order(order_id)
      .await?
      .ok_or(TransitionError::NotFound {
        kind: EntityKind::OrderPayment,
        id: order_id,
      })?;

    match validate(
      EntityKind::OrderPayment,
      order_id,
      actor.role,
      current.payment_status,
      current.version,
      from,
      to,
      expected_version,
      machine::payment_terminal,
      machine::is_legal(Transition::Payment { from, to }),
      gate::permits_order(actor, &current, Transition::Payment { from, to }),
    )? {
      Validated::AlreadyApplied => return Ok(current),
      Validated::Proceed => {}
    }

    let mut updated = current;
    updated.payment_status = to;
    updated.version += 1;
    updated.updated_at = Utc::now();
    self.store.store_order(&updated, expected_version).await?;
    info!(%order_id, payment_status = %to, version = updated.version, "payment transition applied");
    Ok(updated)
  }

  /// Applies a fulfillment-axis transition (confirm, ship, complete, cancel).
  #[instrument(skip(self, actor), fields(actor_role = %actor.role, %from, %to))]
  pub async fn apply_fulfillment(
    &self,
    order_id: Uuid,
    expected_version: u64,
    from: FulfillmentStatus,
    to: FulfillmentStatus,
    actor: &Actor,
  ) -> LeashResult<Order> {
    let current = self
      .store
      .load_order(order_id)
      .await?
      .ok_or(TransitionError::NotFound {
        kind: EntityKind::OrderFulfillment,
        id: order_id,
      })?;

    match validate(
      EntityKind::OrderFulfillment,
      order_id,
      actor.role,
      current.order_status,
      current.version,
      from,
      to,
      expected_version,
      machine::fulfillment_terminal,
      machine::is_legal(Transition::Fulfillment { from, to }),
      gate::permits_order(actor, &current, Transition::Fulfillment { from, to }),
    )? {
      Validated::AlreadyApplied => return Ok(current),
      Validated::Proceed => {}
    }

    let mut updated = current;
    updated.order_status = to;
    updated.version += 1;
    updated.updated_at = Utc::now();
    self.store.store_order(&updated, expected_version).await?;
    info!(%order_id, order_status = %to, version = updated.version, "fulfillment transition applied");
    Ok(updated)
  }
}

// leash/src/gate.rs

//! Authorization gate: `(role, entity, from, to) -> allow | deny`.
//!
//! Two layers, both pure and side-effect free. `role_allows` is the static
//! policy table (deny by default). The `permits_*` predicates are what the
//! engine consults: the role table plus the ownership binding, evaluated
//! against the live record in one place so there is no gap between checking
//! ownership and checking the role.

use crate::actor::{Actor, Role};
use crate::machine::Transition;
use crate::model::{
  AdoptionCase, CaseStatus, FulfillmentStatus, Listing, ListingStatus, Order, PaymentStatus,
};

/// The static policy table. Any `(role, transition)` pair not listed here is
/// denied. `Sponsor` deliberately holds no rows.
pub fn role_allows(role: Role, transition: Transition) -> bool {
  use Transition::*;
  match transition {
    Listing { from, to } => match (from, to) {
      (ListingStatus::Pending, ListingStatus::Available)
      | (ListingStatus::Pending, ListingStatus::Rejected) => role == Role::Admin,
      // Only the engine itself adopts a listing, as the tail of a case approval.
      (ListingStatus::Available, ListingStatus::Adopted) => role == Role::System,
      (ListingStatus::Available, ListingStatus::Rescued) => {
        matches!(role, Role::Shelter | Role::Admin)
      }
      _ => false,
    },
    Case { from, to } => match (from, to) {
      (CaseStatus::Pending, CaseStatus::Approved) | (CaseStatus::Pending, CaseStatus::Rejected) => {
        role == Role::Shelter
      }
      (CaseStatus::Pending, CaseStatus::Cancelled) => role == Role::User,
      _ => false,
    },
    Payment { from, to } => match (from, to) {
      // Writable only by the reconciliation worker.
      (PaymentStatus::Pending, PaymentStatus::Paid)
      | (PaymentStatus::Pending, PaymentStatus::Failed) => role == Role::System,
      (PaymentStatus::Pending, PaymentStatus::Cancelled) => {
        matches!(role, Role::User | Role::Admin)
      }
      _ => false,
    },
    Fulfillment { from, to } => match (from, to) {
      (FulfillmentStatus::Pending, FulfillmentStatus::Confirmed)
      | (FulfillmentStatus::Confirmed, FulfillmentStatus::Shipping)
      | (FulfillmentStatus::Shipping, FulfillmentStatus::Completed) => {
        matches!(role, Role::Admin | Role::Staff)
      }
      (FulfillmentStatus::Pending, FulfillmentStatus::Cancelled)
      | (FulfillmentStatus::Confirmed, FulfillmentStatus::Cancelled) => {
        matches!(role, Role::User | Role::Admin)
      }
      _ => false,
    },
  }
}

/// Full predicate for listing transitions: role table plus ownership. A
/// shelter actor must own the listing; admin and system carry no binding.
pub fn permits_listing(actor: &Actor, listing: &Listing, from: ListingStatus, to: ListingStatus) -> bool {
  if !role_allows(actor.role, Transition::Listing { from, to }) {
    return false;
  }
  match actor.role {
    Role::Shelter => actor.id == listing.shelter_id,
    _ => true,
  }
}

/// Full predicate for case transitions: the deciding shelter must own the
/// referenced listing, the cancelling user must be the original requester.
pub fn permits_case(actor: &Actor, case: &AdoptionCase, from: CaseStatus, to: CaseStatus) -> bool {
  if !role_allows(actor.role, Transition::Case { from, to }) {
    return false;
  }
  match actor.role {
    Role::Shelter => actor.id == case.shelter_id,
    Role::User => actor.id == case.requester_id,
    _ => true,
  }
}

/// Full predicate for both order axes: a user actor must own the order.
pub fn permits_order(actor: &Actor, order: &Order, transition: Transition) -> bool {
  debug_assert!(matches!(
    transition,
    Transition::Payment { .. } | Transition::Fulfillment { .. }
  ));
  if !role_allows(actor.role, transition) {
    return false;
  }
  match actor.role {
    Role::User => actor.id == order.user_id,
    _ => true,
  }
}

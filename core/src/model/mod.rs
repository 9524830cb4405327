// leash/src/model/mod.rs

//! Durable records and their status enums. Status fields only change through
//! the transition engine; `version` totally orders accepted writes on each
//! record.

pub mod case;
pub mod dead_letter;
pub mod listing;
pub mod order;

pub use case::{AdoptionCase, CaseStatus};
pub use dead_letter::DeadLetter;
pub use listing::{Listing, ListingStatus};
pub use order::{FulfillmentStatus, Order, PaymentStatus};

use serde::{Deserialize, Serialize};

/// Which entity a transition (or failure) refers to. The two order axes are
/// distinct kinds because they are authorized and validated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
  Listing,
  AdoptionCase,
  OrderPayment,
  OrderFulfillment,
}

impl std::fmt::Display for EntityKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      EntityKind::Listing => "listing",
      EntityKind::AdoptionCase => "adoption case",
      EntityKind::OrderPayment => "order payment",
      EntityKind::OrderFulfillment => "order fulfillment",
    };
    f.write_str(name)
  }
}

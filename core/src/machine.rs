// leash/src/machine.rs

//! Static state machines for every entity: which moves are topologically
//! legal, and which statuses are terminal. Pure tables, no I/O. Whether an
//! actor may perform a legal move is a separate question answered by `gate`.

use crate::model::{CaseStatus, FulfillmentStatus, ListingStatus, PaymentStatus};

/// One requested status change, tagged with the entity axis it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Listing { from: ListingStatus, to: ListingStatus },
  Case { from: CaseStatus, to: CaseStatus },
  Fulfillment { from: FulfillmentStatus, to: FulfillmentStatus },
  Payment { from: PaymentStatus, to: PaymentStatus },
}

/// Is this move present in the entity's state machine? Deny by default.
pub fn is_legal(transition: Transition) -> bool {
  use Transition::*;
  match transition {
    Listing { from, to } => matches!(
      (from, to),
      (ListingStatus::Pending, ListingStatus::Available)
        | (ListingStatus::Pending, ListingStatus::Rejected)
        | (ListingStatus::Available, ListingStatus::Adopted)
        | (ListingStatus::Available, ListingStatus::Rescued)
    ),
    Case { from, to } => matches!(
      (from, to),
      (CaseStatus::Pending, CaseStatus::Approved)
        | (CaseStatus::Pending, CaseStatus::Rejected)
        | (CaseStatus::Pending, CaseStatus::Cancelled)
    ),
    Fulfillment { from, to } => matches!(
      (from, to),
      (FulfillmentStatus::Pending, FulfillmentStatus::Confirmed)
        | (FulfillmentStatus::Confirmed, FulfillmentStatus::Shipping)
        | (FulfillmentStatus::Shipping, FulfillmentStatus::Completed)
        | (FulfillmentStatus::Pending, FulfillmentStatus::Cancelled)
        | (FulfillmentStatus::Confirmed, FulfillmentStatus::Cancelled)
    ),
    Payment { from, to } => matches!(
      (from, to),
      (PaymentStatus::Pending, PaymentStatus::Paid)
        | (PaymentStatus::Pending, PaymentStatus::Failed)
        | (PaymentStatus::Pending, PaymentStatus::Cancelled)
    ),
  }
}

pub fn listing_terminal(status: ListingStatus) -> bool {
  matches!(
    status,
    ListingStatus::Adopted | ListingStatus::Rejected | ListingStatus::Rescued
  )
}

pub fn case_terminal(status: CaseStatus) -> bool {
  status != CaseStatus::Pending
}

pub fn fulfillment_terminal(status: FulfillmentStatus) -> bool {
  matches!(
    status,
    FulfillmentStatus::Completed | FulfillmentStatus::Cancelled
  )
}

pub fn payment_terminal(status: PaymentStatus) -> bool {
  status != PaymentStatus::Pending
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn listing_machine_has_no_path_out_of_terminal_states() {
    let all = [
      ListingStatus::Pending,
      ListingStatus::Available,
      ListingStatus::Rescued,
      ListingStatus::Adopted,
      ListingStatus::Rejected,
    ];
    for from in all {
      for to in all {
        if listing_terminal(from) {
          assert!(
            !is_legal(Transition::Listing { from, to }),
            "terminal {from} must not move to {to}"
          );
        }
      }
    }
  }

  #[test]
  fn payment_leaves_pending_exactly_once() {
    let all = [
      PaymentStatus::Pending,
      PaymentStatus::Paid,
      PaymentStatus::Failed,
      PaymentStatus::Cancelled,
    ];
    for from in all {
      for to in all {
        let legal = is_legal(Transition::Payment { from, to });
        assert_eq!(legal, from == PaymentStatus::Pending && to != PaymentStatus::Pending);
      }
    }
  }

  #[test]
  fn fulfillment_happy_path_is_linear() {
    assert!(is_legal(Transition::Fulfillment {
      from: FulfillmentStatus::Pending,
      to: FulfillmentStatus::Confirmed,
    }));
    assert!(is_legal(Transition::Fulfillment {
      from: FulfillmentStatus::Confirmed,
      to: FulfillmentStatus::Shipping,
    }));
    assert!(is_legal(Transition::Fulfillment {
      from: FulfillmentStatus::Shipping,
      to: FulfillmentStatus::Completed,
    }));
    // No skipping straight to completed.
    assert!(!is_legal(Transition::Fulfillment {
      from: FulfillmentStatus::Pending,
      to: FulfillmentStatus::Completed,
    }));
  }
}

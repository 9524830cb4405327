// leash/src/store/memory.rs

use crate::error::{LeashResult, TransitionError};
use crate::model::{AdoptionCase, CaseStatus, DeadLetter, EntityKind, Listing, Order};
use crate::store::StateStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
  listings: HashMap<Uuid, Listing>,
  cases: HashMap<Uuid, AdoptionCase>,
  orders: HashMap<Uuid, Order>,
  dead_letters: Vec<DeadLetter>,
}

/// In-memory `StateStore`. Everything sits behind one `parking_lot::RwLock`,
/// which makes the compound case+listing commit and the open-case uniqueness
/// check naturally atomic. Lock guards are never held across an await.
#[derive(Default)]
pub struct MemoryStore {
  inner: RwLock<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn cas<T: Clone>(
  slot: &mut HashMap<Uuid, T>,
  id: Uuid,
  kind: EntityKind,
  expected_version: u64,
  current_version: impl Fn(&T) -> u64,
  record: &T,
) -> LeashResult<()> {
  match slot.get(&id) {
    None => Err(TransitionError::NotFound { kind, id }),
    Some(existing) => {
      let found = current_version(existing);
      if found != expected_version {
        return Err(TransitionError::StaleState {
          kind,
          id,
          expected_version,
          found_version: found,
        });
      }
      slot.insert(id, record.clone());
      Ok(())
    }
  }
}

#[async_trait]
impl StateStore for MemoryStore {
  async fn insert_listing(&self, listing: Listing) -> LeashResult<()> {
    self.inner.write().listings.insert(listing.id, listing);
    Ok(())
  }

  async fn load_listing(&self, id: Uuid) -> LeashResult<Option<Listing>> {
    Ok(self.inner.read().listings.get(&id).cloned())
  }

  async fn store_listing(&self, listing: &Listing, expected_version: u64) -> LeashResult<()> {
    let mut inner = self.inner.write();
    cas(
      &mut inner.listings,
      listing.id,
      EntityKind::Listing,
      expected_version,
      |l| l.version,
      listing,
    )
  }

  async fn insert_case(&self, case: AdoptionCase) -> LeashResult<()> {
    let mut inner = self.inner.write();
    let occupied = inner
      .cases
      .values()
      .any(|c| c.listing_id == case.listing_id && c.status == CaseStatus::Pending);
    if occupied {
      return Err(TransitionError::PreconditionFailed {
        kind: EntityKind::AdoptionCase,
        id: case.id,
        reason: format!("listing {} already has an open adoption case", case.listing_id),
      });
    }
    inner.cases.insert(case.id, case);
    Ok(())
  }

  async fn load_case(&self, id: Uuid) -> LeashResult<Option<AdoptionCase>> {
    Ok(self.inner.read().cases.get(&id).cloned())
  }

  async fn store_case(&self, case: &AdoptionCase, expected_version: u64) -> LeashResult<()> {
    let mut inner = self.inner.write();
    cas(
      &mut inner.cases,
      case.id,
      EntityKind::AdoptionCase,
      expected_version,
      |c| c.version,
      case,
    )
  }

  async fn find_open_case(&self, listing_id: Uuid) -> LeashResult<Option<AdoptionCase>> {
    Ok(
      self
        .inner
        .read()
        .cases
        .values()
        .find(|c| c.listing_id == listing_id && c.status == CaseStatus::Pending)
        .cloned(),
    )
  }

  async fn store_case_and_listing(
    &self,
    case: &AdoptionCase,
    case_expected_version: u64,
    listing: &Listing,
    listing_expected_version: u64,
  ) -> LeashResult<()> {
    let mut inner = self.inner.write();

    // Validate both versions before touching either record, so a conflict on
    // the second write cannot leave the first one applied.
    let case_found = inner
      .cases
      .get(&case.id)
      .ok_or(TransitionError::NotFound {
        kind: EntityKind::AdoptionCase,
        id: case.id,
      })?
      .version;
    if case_found != case_expected_version {
      return Err(TransitionError::StaleState {
        kind: EntityKind::AdoptionCase,
        id: case.id,
        expected_version: case_expected_version,
        found_version: case_found,
      });
    }
    let listing_found = inner
      .listings
      .get(&listing.id)
      .ok_or(TransitionError::NotFound {
        kind: EntityKind::Listing,
        id: listing.id,
      })?
      .version;
    if listing_found != listing_expected_version {
      return Err(TransitionError::StaleState {
        kind: EntityKind::Listing,
        id: listing.id,
        expected_version: listing_expected_version,
        found_version: listing_found,
      });
    }

    inner.cases.insert(case.id, case.clone());
    inner.listings.insert(listing.id, listing.clone());
    Ok(())
  }

  async fn insert_order(&self, order: Order) -> LeashResult<()> {
    self.inner.write().orders.insert(order.id, order);
    Ok(())
  }

  async fn load_order(&self, id: Uuid) -> LeashResult<Option<Order>> {
    Ok(self.inner.read().orders.get(&id).cloned())
  }

  async fn store_order(&self, order: &Order, expected_version: u64) -> LeashResult<()> {
    let mut inner = self.inner.write();
    cas(
      &mut inner.orders,
      order.id,
      EntityKind::OrderPayment,
      expected_version,
      |o| o.version,
      order,
    )
  }

  async fn append_dead_letter(&self, entry: DeadLetter) -> LeashResult<()> {
    self.inner.write().dead_letters.push(entry);
    Ok(())
  }

  async fn dead_letters_for(&self, order_id: Uuid) -> LeashResult<Vec<DeadLetter>> {
    Ok(
      self
        .inner
        .read()
        .dead_letters
        .iter()
        .filter(|d| d.order_id == order_id)
        .cloned()
        .collect(),
    )
  }
}

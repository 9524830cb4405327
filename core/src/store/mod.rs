// leash/src/store/mod.rs

//! The state store: the single shared mutable resource. All status writes go
//! through the transition engine and land here as compare-and-swap operations
//! on the record's version; conflicting writers lose at commit time with
//! `StaleState` instead of holding locks.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::LeashResult;
use crate::model::{AdoptionCase, DeadLetter, Listing, Order};
use async_trait::async_trait;
use uuid::Uuid;

/// Durable record store for listings, adoption cases, and orders.
///
/// Contract for every `store_*` method: the write succeeds only if the
/// record's current version equals `expected_version`, and the stored record
/// carries `expected_version + 1`. A version mismatch is `StaleState`;
/// infrastructure failures are `Transient`.
#[async_trait]
pub trait StateStore: Send + Sync {
  async fn insert_listing(&self, listing: Listing) -> LeashResult<()>;
  async fn load_listing(&self, id: Uuid) -> LeashResult<Option<Listing>>;
  async fn store_listing(&self, listing: &Listing, expected_version: u64) -> LeashResult<()>;

  /// Inserts a new case. Fails with `PreconditionFailed` if another pending
  /// case already exists for the same listing; the uniqueness check and the
  /// insert are one atomic operation.
  async fn insert_case(&self, case: AdoptionCase) -> LeashResult<()>;
  async fn load_case(&self, id: Uuid) -> LeashResult<Option<AdoptionCase>>;
  async fn store_case(&self, case: &AdoptionCase, expected_version: u64) -> LeashResult<()>;
  async fn find_open_case(&self, listing_id: Uuid) -> LeashResult<Option<AdoptionCase>>;

  /// Commits a decided case together with its listing as one atomic unit:
  /// both CAS writes succeed or neither is applied. No reader may observe
  /// one side without the other.
  async fn store_case_and_listing(
    &self,
    case: &AdoptionCase,
    case_expected_version: u64,
    listing: &Listing,
    listing_expected_version: u64,
  ) -> LeashResult<()>;

  async fn insert_order(&self, order: Order) -> LeashResult<()>;
  async fn load_order(&self, id: Uuid) -> LeashResult<Option<Order>>;
  async fn store_order(&self, order: &Order, expected_version: u64) -> LeashResult<()>;

  /// Appends to the dead-letter log. Append-only; never deduplicated here.
  async fn append_dead_letter(&self, entry: DeadLetter) -> LeashResult<()>;
  async fn dead_letters_for(&self, order_id: Uuid) -> LeashResult<Vec<DeadLetter>>;
}

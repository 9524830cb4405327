// tests/common/mod.rs
#![allow(dead_code)] // Allow unused helpers in this common test module

use leash::{Actor, Listing, ListingStatus, MemoryStore, Role, StateStore, TransitionEngine};
use std::sync::Arc;
use uuid::Uuid;

pub fn setup_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    )
    .with_test_writer()
    .try_init();
}

pub fn shelter() -> Actor {
  Actor::new(Uuid::new_v4(), Role::Shelter)
}

pub fn user() -> Actor {
  Actor::new(Uuid::new_v4(), Role::User)
}

pub fn admin() -> Actor {
  Actor::new(Uuid::new_v4(), Role::Admin)
}

pub fn staff() -> Actor {
  Actor::new(Uuid::new_v4(), Role::Staff)
}

pub fn sponsor() -> Actor {
  Actor::new(Uuid::new_v4(), Role::Sponsor)
}

pub fn engine_with_store() -> (TransitionEngine, Arc<MemoryStore>) {
  let store = Arc::new(MemoryStore::new());
  let engine = TransitionEngine::new(store.clone() as Arc<dyn StateStore>);
  (engine, store)
}

/// Creates a listing owned by `owner` and publishes it through the admin
/// review step, leaving it `Available` at version 1.
pub async fn available_listing(engine: &TransitionEngine, owner: &Actor) -> Listing {
  let listing = engine
    .create_listing(owner, "Biscuit", "dog")
    .await
    .expect("create listing");
  engine
    .apply_listing(
      listing.id,
      0,
      ListingStatus::Pending,
      ListingStatus::Available,
      &admin(),
    )
    .await
    .expect("publish listing")
}

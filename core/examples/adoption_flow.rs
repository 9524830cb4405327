// core/examples/adoption_flow.rs
//
// Walks the full marketplace lifecycle against the in-memory store: a shelter
// submits a listing, an admin publishes it, a user adopts, and an order's
// payment is reconciled after a (simulated) gateway redirect.
//
// Run with: cargo run --example adoption_flow

use leash::{
  Actor, CaseDecision, ListingStatus, MemoryStore, PaymentOutcome, ReconciliationWorker,
  RetryPolicy, Role, StateStore, TransitionEngine,
};
use std::sync::Arc;
use uuid::Uuid;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .init();

  let store = Arc::new(MemoryStore::new());
  let engine = TransitionEngine::new(store.clone() as Arc<dyn StateStore>);

  let shelter = Actor::new(Uuid::new_v4(), Role::Shelter);
  let admin = Actor::new(Uuid::new_v4(), Role::Admin);
  let adopter = Actor::new(Uuid::new_v4(), Role::User);

  // Listing lifecycle: Pending -> Available -> Adopted.
  let listing = engine.create_listing(&shelter, "Waffles", "dog").await?;
  let listing = engine
    .apply_listing(
      listing.id,
      listing.version,
      ListingStatus::Pending,
      ListingStatus::Available,
      &admin,
    )
    .await?;
  let case = engine.open_case(listing.id, &adopter).await?;
  let outcome = engine
    .decide_case(case.id, case.version, CaseDecision::Approved, &shelter)
    .await?;
  println!(
    "case {} -> {}, listing {} -> {}",
    outcome.case.id,
    outcome.case.status,
    listing.id,
    outcome.listing.as_ref().map(|l| l.status.to_string()).unwrap_or_default()
  );

  // Order settlement after a gateway redirect.
  let worker = ReconciliationWorker::new(
    Arc::new(engine.clone()),
    store.clone() as Arc<dyn StateStore>,
    RetryPolicy::default(),
  );
  let order = engine.create_order(&adopter, 2_499, "usd").await?;
  let report = worker.reconcile(order.id, PaymentOutcome::Paid).await?;
  println!("order {}: {report:?}", order.id);

  Ok(())
}

// tests/lifecycle_tests.rs
//
// End-to-end scenarios across the whole core: listing review, adoption
// decision, and payment settlement after a gateway redirect.

mod common;

use common::*;
use leash::{
  CaseDecision, CaseStatus, ListingStatus, MemoryStore, PaymentOutcome, PaymentStatus,
  ReconcileReport, ReconciliationWorker, RetryPolicy, StateStore, TransitionEngine,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn adoption_happy_path_ends_with_both_records_at_version_two() {
  setup_tracing();
  let (engine, store) = engine_with_store();
  let owner = shelter();
  let adopter = user();

  // Shelter submits the animal; an admin publishes it.
  let listing = engine.create_listing(&owner, "Luna", "dog").await.unwrap();
  assert_eq!(listing.status, ListingStatus::Pending);
  assert_eq!(listing.version, 0);

  let listing = engine
    .apply_listing(
      listing.id,
      0,
      ListingStatus::Pending,
      ListingStatus::Available,
      &admin(),
    )
    .await
    .unwrap();
  assert_eq!(listing.version, 1);

  // Adopter opens a case; the owning shelter approves it.
  let case = engine.open_case(listing.id, &adopter).await.unwrap();
  assert_eq!(case.status, CaseStatus::Pending);
  assert_eq!(case.version, 1);

  let outcome = engine
    .decide_case(case.id, case.version, CaseDecision::Approved, &owner)
    .await
    .unwrap();
  assert_eq!(outcome.case.status, CaseStatus::Approved);
  assert_eq!(outcome.case.version, 2);
  let adopted = outcome.listing.unwrap();
  assert_eq!(adopted.status, ListingStatus::Adopted);
  assert_eq!(adopted.version, 2);

  // Readers bypassing the engine see the committed pair.
  let l = store.load_listing(listing.id).await.unwrap().unwrap();
  let c = store.load_case(case.id).await.unwrap().unwrap();
  assert_eq!(l.status, ListingStatus::Adopted);
  assert_eq!(c.status, CaseStatus::Approved);
}

#[tokio::test]
async fn failed_redirect_settles_the_order_and_blocks_a_paid_flip() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let engine = TransitionEngine::new(store.clone() as Arc<dyn StateStore>);
  let worker = ReconciliationWorker::new(
    Arc::new(engine.clone()),
    store.clone() as Arc<dyn StateStore>,
    RetryPolicy {
      max_attempts: 3,
      base_delay: Duration::from_millis(1),
    },
  );
  let buyer = user();

  let order = engine.create_order(&buyer, 7_900, "usd").await.unwrap();
  assert_eq!(order.payment_status, PaymentStatus::Pending);

  // Gateway redirect reports a failure; the worker applies it.
  let report = worker.reconcile(order.id, PaymentOutcome::Failed).await.unwrap();
  assert!(matches!(report, ReconcileReport::Settled(_)));
  let settled = store.load_order(order.id).await.unwrap().unwrap();
  assert_eq!(settled.payment_status, PaymentStatus::Failed);
  assert_eq!(settled.version, 1);

  // A second redirect claiming success for the same order must be rejected.
  let err = worker.reconcile(order.id, PaymentOutcome::Paid).await.unwrap_err();
  assert!(matches!(err, leash::TransitionError::IllegalTransition { .. }));
  let unchanged = store.load_order(order.id).await.unwrap().unwrap();
  assert_eq!(unchanged.payment_status, PaymentStatus::Failed);
  assert_eq!(unchanged.version, 1);
}

#[tokio::test]
async fn a_cancelled_case_frees_the_listing_for_the_next_adopter() {
  setup_tracing();
  let (engine, _) = engine_with_store();
  let owner = shelter();
  let first = user();
  let second = user();
  let listing = available_listing(&engine, &owner).await;

  let case = engine.open_case(listing.id, &first).await.unwrap();

  // While the first case is open the listing is occupied.
  assert!(engine.open_case(listing.id, &second).await.is_err());

  engine.cancel_case(case.id, case.version, &first).await.unwrap();

  // Cancellation reopens the single open-case slot.
  let replacement = engine.open_case(listing.id, &second).await.unwrap();
  assert_eq!(replacement.status, CaseStatus::Pending);
  assert_eq!(replacement.requester_id, second.id);
}

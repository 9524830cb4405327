// server/src/state.rs
use crate::config::AppConfig;
use leash::{ReconciliationWorker, StateStore, TransitionEngine};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn StateStore>,
  pub engine: Arc<TransitionEngine>,
  pub worker: Arc<ReconciliationWorker>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the engine and worker over the given store, with the retry policy
  /// taken from configuration.
  pub fn build(store: Arc<dyn StateStore>, config: Arc<AppConfig>) -> Self {
    let engine = Arc::new(TransitionEngine::new(store.clone()));
    let worker = Arc::new(ReconciliationWorker::new(
      Arc::new(engine.as_ref().clone()),
      store.clone(),
      leash::RetryPolicy {
        max_attempts: config.reconcile_max_attempts,
        base_delay: config.reconcile_base_delay,
      },
    ));
    Self {
      store,
      engine,
      worker,
      config,
    }
  }
}

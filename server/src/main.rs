// server/src/main.rs

use adoption_app::config::AppConfig;
use adoption_app::state::AppState;
use adoption_app::storage::PgStateStore;
use adoption_app::web;

use actix_web::{web as actix_data, App, HttpServer};
use leash::{MemoryStore, StateStore};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting adoption marketplace server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  let store: Arc<dyn StateStore> = match app_config.database_url.as_deref() {
    Some(url) => match PgStateStore::connect(url).await {
      Ok(store) => {
        tracing::info!("Successfully connected to the database.");
        Arc::new(store)
      }
      Err(e) => {
        tracing::error!(error = %e, "Failed to connect to the database.");
        panic!("Database connection error: {}", e);
      }
    },
    None => {
      tracing::warn!(
        "DATABASE_URL not set; using the in-memory store. State will not survive a restart."
      );
      Arc::new(MemoryStore::new())
    }
  };

  let app_state = AppState::build(store, app_config.clone());

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::routes::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}

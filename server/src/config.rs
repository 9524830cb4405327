// server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  /// Postgres connection string. When absent the server runs on the
  /// in-memory store (useful for development and tests).
  pub database_url: Option<String>,

  /// Shared secret the payment gateway presents in `X-Gateway-Signature`.
  /// Consumed opaquely; when unset the callback accepts unsigned requests.
  pub gateway_webhook_secret: Option<String>,

  pub reconcile_max_attempts: u32,
  pub reconcile_base_delay: Duration,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| env::var(var_name).ok();

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let database_url = get_env("DATABASE_URL");
    let gateway_webhook_secret = get_env("GATEWAY_WEBHOOK_SECRET");

    let reconcile_max_attempts = get_env("RECONCILE_MAX_ATTEMPTS")
      .unwrap_or_else(|| "3".to_string())
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid RECONCILE_MAX_ATTEMPTS: {}", e)))?;
    let reconcile_base_delay = get_env("RECONCILE_BASE_DELAY_MS")
      .unwrap_or_else(|| "50".to_string())
      .parse::<u64>()
      .map(Duration::from_millis)
      .map_err(|e| AppError::Config(format!("Invalid RECONCILE_BASE_DELAY_MS: {}", e)))?;

    if reconcile_max_attempts == 0 {
      return Err(AppError::Config(
        "RECONCILE_MAX_ATTEMPTS must be at least 1".to_string(),
      ));
    }

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      gateway_webhook_secret,
      reconcile_max_attempts,
      reconcile_base_delay,
    })
  }
}

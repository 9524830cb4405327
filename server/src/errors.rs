// server/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use leash::TransitionError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Transition Error: {source}")]
  Transition {
    #[from]
    source: TransitionError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

// Allow anyhow::Error to be converted into AppError::Internal for convenience
// in handlers using `?` on functions returning anyhow::Result.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    if err.is::<TransitionError>() {
      return AppError::Transition {
        source: err.downcast::<TransitionError>().unwrap(),
      };
    }
    AppError::Internal(err.to_string())
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::Auth(m) => HttpResponse::Unauthorized().json(json!({"error": m})),
      AppError::Forbidden(m) => HttpResponse::Forbidden().json(json!({"error": m})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Sqlx(_) => HttpResponse::InternalServerError().json(json!({"error": "Database operation failed"})),
      // The core taxonomy maps one-to-one onto HTTP statuses: stale snapshot
      // 409, denied 403, state-machine violation 422, broken compound
      // precondition 412, missing record 404, infrastructure hiccup 503.
      AppError::Transition { source } => {
        let body = json!({"error": source.to_string()});
        match source {
          TransitionError::StaleState { .. } => HttpResponse::Conflict().json(body),
          TransitionError::Forbidden { .. } => HttpResponse::Forbidden().json(body),
          TransitionError::IllegalTransition { .. } => HttpResponse::UnprocessableEntity().json(body),
          TransitionError::PreconditionFailed { .. } => HttpResponse::PreconditionFailed().json(body),
          TransitionError::NotFound { .. } => HttpResponse::NotFound().json(body),
          TransitionError::Transient { .. } => HttpResponse::ServiceUnavailable().json(body),
        }
      }
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;

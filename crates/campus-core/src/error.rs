//! Error types for `campus-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or malformed input. The caller can resubmit corrected input.
  #[error("validation failed: {0}")]
  Validation(String),

  /// A natural key or login key is already taken.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("not found: {0}")]
  NotFound(String),

  /// The acting role is not permitted to perform the operation.
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("account is inactive")]
  AccountInactive,

  #[error("secret hashing failed: {0}")]
  Hashing(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

  pub fn conflict(msg: impl Into<String>) -> Self { Self::Conflict(msg.into()) }

  pub fn not_found(msg: impl Into<String>) -> Self { Self::NotFound(msg.into()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

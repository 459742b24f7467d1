//! Error type for `campus-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] campus_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  /// A `UNIQUE` or `PRIMARY KEY` constraint rejected a write.
  #[error("{0} already exists")]
  Conflict(String),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column held a value that does not decode.
  #[error("decode error: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match &e {
      tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, msg))
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
          || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
      {
        // "UNIQUE constraint failed: identities.login_key"
        let what = msg
          .as_deref()
          .and_then(|m| m.rsplit_once(": "))
          .map(|(_, cols)| cols.to_owned())
          .unwrap_or_else(|| "record".to_owned());
        Error::Conflict(what)
      }
      _ => Error::Database(e),
    }
  }
}

impl From<Error> for campus_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(inner) => inner,
      Error::Conflict(what) => campus_core::Error::Conflict(format!("{what} already exists")),
      other => campus_core::Error::Store(Box::new(other)),
    }
  }
}

//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No usable `Authorization` header was supplied.
  #[error("authentication required")]
  Unauthorized,

  /// The request body was not acceptable JSON for the route.
  #[error("invalid request body: {0}")]
  Body(#[from] JsonRejection),

  /// A path parameter did not parse, e.g. a malformed id.
  #[error("invalid path: {0}")]
  Path(#[from] PathRejection),

  #[error(transparent)]
  Core(#[from] campus_core::Error),
}

/// Convert a backend error into an [`ApiError`] via the core taxonomy.
pub fn store_err<E>(e: E) -> ApiError
where
  campus_core::Error: From<E>,
{
  ApiError::Core(campus_core::Error::from(e))
}

impl ApiError {
  fn status(&self) -> StatusCode {
    use campus_core::Error as E;
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Body(_) | ApiError::Path(_) => StatusCode::BAD_REQUEST,
      ApiError::Core(e) => match e {
        E::Validation(_) => StatusCode::BAD_REQUEST,
        E::InvalidCredentials => StatusCode::UNAUTHORIZED,
        E::Forbidden(_) | E::AccountInactive => StatusCode::FORBIDDEN,
        E::NotFound(_) => StatusCode::NOT_FOUND,
        E::Conflict(_) => StatusCode::CONFLICT,
        E::Hashing(_) | E::Serialization(_) | E::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res =
      (status, Json(json!({ "success": false, "message": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic realm=\"campus\""));
    }
    res
  }
}

//! Request extractors whose rejections use the API error envelope.
//!
//! axum's own `Json` and `Path` reject with plain-text bodies; these wrappers
//! route the rejection through [`ApiError`] instead.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// A JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

//! The `{"success": true, "data": ...}` response envelope.

use axum::{Json, http::StatusCode};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success: bool,
  pub data:    T,
}

pub type Reply<T> = Json<Envelope<T>>;

/// `200 OK` with `data`.
pub fn ok<T: Serialize>(data: T) -> Reply<T> { Json(Envelope { success: true, data }) }

/// `201 Created` with `data`.
pub fn created<T: Serialize>(data: T) -> (StatusCode, Reply<T>) { (StatusCode::CREATED, ok(data)) }

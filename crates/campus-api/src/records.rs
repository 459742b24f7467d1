//! Handlers that write dependent records.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/attendance` | Body: [`MarkAttendance`]; 201 when created, 200 when overwritten |
//! | `POST` | `/attendance/bulk` | Body: `[MarkAttendance]`; per-row outcome |
//! | `POST` | `/remarks` | Body: [`RemarkInput`] |
//! | `POST` | `/performance` | Body: [`PerformanceInput`] |

use axum::{extract::State, http::StatusCode};
use campus_core::{
  Error,
  bulk::{BulkOutcome, decode_rows},
  policy::{Action, Resource},
  provision::Provisioner,
  record::{self, MarkAttendance, Marked, Performance, PerformanceInput, Remark, RemarkInput},
  store::CampusStore,
};
use serde_json::Value;

use crate::{
  auth::Authenticated,
  envelope::{Reply, created, ok},
  error::ApiError,
  extract::Json,
};

/// `POST /attendance`
pub async fn mark<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Json(body): Json<MarkAttendance>,
) -> Result<(StatusCode, Reply<Marked>), ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Create, Resource::Attendance)?;
  let marked = record::mark_attendance(p.store(), body, caller.0.identity_id).await?;
  let status = if marked.created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, ok(marked)))
}

/// `POST /attendance/bulk`
pub async fn mark_bulk<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Json(rows): Json<Vec<Value>>,
) -> Result<Reply<BulkOutcome>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Create, Resource::Attendance)?;
  let rows = decode_rows::<MarkAttendance>(rows, "student");
  Ok(ok(record::mark_attendance_bulk(p.store(), rows, caller.0.identity_id).await))
}

/// `POST /remarks`
pub async fn add_remark<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Json(body): Json<RemarkInput>,
) -> Result<(StatusCode, Reply<Remark>), ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Create, Resource::Remark)?;
  Ok(created(record::add_remark(p.store(), body, caller.0.identity_id).await?))
}

/// `POST /performance`
pub async fn record_performance<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Json(body): Json<PerformanceInput>,
) -> Result<(StatusCode, Reply<Performance>), ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Create, Resource::Performance)?;
  Ok(created(record::record_performance(p.store(), body, caller.0.identity_id).await?))
}

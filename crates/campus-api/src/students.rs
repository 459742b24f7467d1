//! Handlers for `/students` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/students` | Students only see themselves |
//! | `POST`   | `/students` | Body: [`StudentInput`]; 201 + one-time credentials |
//! | `POST`   | `/students/bulk` | Body: `[StudentInput]`; per-row outcome |
//! | `GET`    | `/students/:id` | 404 if not found |
//! | `PUT`    | `/students/:id` | Body: [`StudentPatch`] |
//! | `DELETE` | `/students/:id` | Cascades to attendance, remarks and performance |
//! | `GET`    | `/students/:id/attendance` `/remarks` `/performance` | Dependent reads |

use axum::{extract::State, http::StatusCode};
use campus_core::{
  Error,
  bulk::{BulkOutcome, decode_rows},
  credentials::Credentials,
  policy::{Action, Resource},
  profile::{ProfileKind, Student, StudentInput, StudentPatch},
  provision::Provisioner,
  record::{Attendance, Performance, Remark},
  store::{CampusStore, CascadeReport},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
  auth::Authenticated,
  envelope::{Reply, created, ok},
  error::{ApiError, store_err},
  extract::{Json, Path},
};

/// A student as returned by the API, with their current age.
#[derive(Debug, Serialize)]
pub struct StudentView {
  #[serde(flatten)]
  pub student: Student,
  pub age:     u32,
}

impl From<Student> for StudentView {
  fn from(student: Student) -> Self {
    let age = student.age_on(Utc::now().date_naive());
    Self { student, age }
  }
}

#[derive(Debug, Serialize)]
pub struct CreatedStudent {
  pub profile:     StudentView,
  pub credentials: Credentials,
}

pub(crate) async fn load<S>(p: &Provisioner<S>, id: Uuid) -> Result<Student, ApiError>
where
  S: CampusStore,
  Error: From<S::Error>,
{
  p.store()
    .get_profile(ProfileKind::Student, id)
    .await
    .map_err(store_err)?
    .and_then(|profile| profile.into_student())
    .ok_or_else(|| Error::not_found(format!("student {id} not found")).into())
}

// ─── List / create ───────────────────────────────────────────────────────────

/// `GET /students`
pub async fn list<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
) -> Result<Reply<Vec<StudentView>>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Read, Resource::Student)?;
  let students = p
    .store()
    .list_profiles(ProfileKind::Student)
    .await
    .map_err(store_err)?
    .into_iter()
    .filter_map(|profile| profile.into_student())
    .filter(|s| caller.permit_for(Action::Read, Resource::Student, s.identity_id).is_ok())
    .map(StudentView::from)
    .collect::<Vec<_>>();
  tracing::debug!(count = students.len(), "listed students");
  Ok(ok(students))
}

/// `POST /students`
pub async fn create<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Json(body): Json<StudentInput>,
) -> Result<(StatusCode, Reply<CreatedStudent>), ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Create, Resource::Student)?;
  let provisioned = p.create_student(body).await?;
  Ok(created(CreatedStudent {
    profile:     provisioned.profile.into(),
    credentials: provisioned.credentials,
  }))
}

/// `POST /students/bulk`
pub async fn create_bulk<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Json(rows): Json<Vec<Value>>,
) -> Result<Reply<BulkOutcome>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Create, Resource::Student)?;
  let rows = decode_rows::<StudentInput>(rows, "studentId");
  Ok(ok(p.create_students_bulk(rows).await))
}

// ─── Single student ──────────────────────────────────────────────────────────

/// `GET /students/:id`
pub async fn get_one<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Reply<StudentView>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  let student = load(&p, id).await?;
  caller.permit_for(Action::Read, Resource::Student, student.identity_id)?;
  Ok(ok(student.into()))
}

/// `PUT /students/:id`
pub async fn update<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<StudentPatch>,
) -> Result<Reply<StudentView>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Update, Resource::Student)?;
  Ok(ok(p.update_student(id, patch).await?.into()))
}

/// `DELETE /students/:id`
pub async fn delete<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Reply<CascadeReport>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Delete, Resource::Student)?;
  Ok(ok(p.delete_profile(ProfileKind::Student, id, &caller.actor()).await?))
}

// ─── Dependent reads ─────────────────────────────────────────────────────────

/// `GET /students/:id/attendance`
pub async fn attendance<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Reply<Vec<Attendance>>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  let student = load(&p, id).await?;
  caller.permit_for(Action::Read, Resource::Attendance, student.identity_id)?;
  Ok(ok(p.store().list_attendance(id).await.map_err(store_err)?))
}

/// `GET /students/:id/remarks`
pub async fn remarks<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Reply<Vec<Remark>>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  let student = load(&p, id).await?;
  caller.permit_for(Action::Read, Resource::Remark, student.identity_id)?;
  Ok(ok(p.store().list_remarks(id).await.map_err(store_err)?))
}

/// `GET /students/:id/performance`
pub async fn performance<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Reply<Vec<Performance>>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  let student = load(&p, id).await?;
  caller.permit_for(Action::Read, Resource::Performance, student.identity_id)?;
  Ok(ok(p.store().list_performance(id).await.map_err(store_err)?))
}

//! Handlers for `/faculty` endpoints. Same shape as `/students`; the only
//! dependent read is `GET /faculty/:id/remarks`, the remarks they wrote.

use axum::{extract::State, http::StatusCode};
use campus_core::{
  Error,
  bulk::{BulkOutcome, decode_rows},
  policy::{Action, Resource},
  profile::{Faculty, FacultyInput, FacultyPatch, ProfileKind},
  provision::{Provisioned, Provisioner},
  record::Remark,
  store::{CampusStore, CascadeReport},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  auth::Authenticated,
  envelope::{Reply, created, ok},
  error::{ApiError, store_err},
  extract::{Json, Path},
};

async fn load<S>(p: &Provisioner<S>, id: Uuid) -> Result<Faculty, ApiError>
where
  S: CampusStore,
  Error: From<S::Error>,
{
  p.store()
    .get_profile(ProfileKind::Faculty, id)
    .await
    .map_err(store_err)?
    .and_then(|profile| profile.into_faculty())
    .ok_or_else(|| Error::not_found(format!("faculty {id} not found")).into())
}

/// `GET /faculty`
pub async fn list<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
) -> Result<Reply<Vec<Faculty>>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Read, Resource::Faculty)?;
  let faculty = p
    .store()
    .list_profiles(ProfileKind::Faculty)
    .await
    .map_err(store_err)?
    .into_iter()
    .filter_map(|profile| profile.into_faculty())
    .collect();
  Ok(ok(faculty))
}

/// `POST /faculty`
pub async fn create<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Json(body): Json<FacultyInput>,
) -> Result<(StatusCode, Reply<Provisioned<Faculty>>), ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Create, Resource::Faculty)?;
  Ok(created(p.create_faculty(body).await?))
}

/// `POST /faculty/bulk`
pub async fn create_bulk<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Json(rows): Json<Vec<Value>>,
) -> Result<Reply<BulkOutcome>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Create, Resource::Faculty)?;
  let rows = decode_rows::<FacultyInput>(rows, "facultyId");
  Ok(ok(p.create_faculty_bulk(rows).await))
}

/// `GET /faculty/:id`
pub async fn get_one<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Reply<Faculty>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Read, Resource::Faculty)?;
  Ok(ok(load(&p, id).await?))
}

/// `GET /faculty/:id/remarks`
pub async fn remarks<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Reply<Vec<Remark>>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Read, Resource::Faculty)?;
  let faculty = load(&p, id).await?;
  caller.permit_for(Action::Read, Resource::Remark, faculty.identity_id)?;
  Ok(ok(p.store().list_remarks_by_author(faculty.identity_id).await.map_err(store_err)?))
}

/// `PUT /faculty/:id`
pub async fn update<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<FacultyPatch>,
) -> Result<Reply<Faculty>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Update, Resource::Faculty)?;
  Ok(ok(p.update_faculty(id, patch).await?))
}

/// `DELETE /faculty/:id`
pub async fn delete<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Reply<CascadeReport>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Delete, Resource::Faculty)?;
  Ok(ok(p.delete_profile(ProfileKind::Faculty, id, &caller.actor()).await?))
}

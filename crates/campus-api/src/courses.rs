//! Handlers for `/courses` endpoints: the course / branch / subject catalog.

use axum::{extract::State, http::StatusCode};
use campus_core::{
  Error,
  catalog::{Course, CourseInput},
  policy::{Action, Resource},
  provision::Provisioner,
  store::CampusStore,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
  auth::Authenticated,
  envelope::{Reply, created, ok},
  error::{ApiError, store_err},
  extract::{Json, Path},
};

async fn load<S>(p: &Provisioner<S>, id: Uuid) -> Result<Course, ApiError>
where
  S: CampusStore,
  Error: From<S::Error>,
{
  p.store()
    .get_course(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| Error::not_found(format!("course {id} not found")).into())
}

/// `GET /courses`
pub async fn list<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
) -> Result<Reply<Vec<Course>>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Read, Resource::Course)?;
  Ok(ok(p.store().list_courses().await.map_err(store_err)?))
}

/// `POST /courses`
pub async fn create<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Json(body): Json<CourseInput>,
) -> Result<(StatusCode, Reply<Course>), ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Create, Resource::Course)?;
  let course = body.into_course(Uuid::new_v4(), Utc::now())?;
  p.store().add_course(course.clone()).await.map_err(store_err)?;
  tracing::info!(course = %course.name, id = %course.id, "course added");
  Ok(created(course))
}

/// `GET /courses/:id`
pub async fn get_one<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Reply<Course>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Read, Resource::Course)?;
  Ok(ok(load(&p, id).await?))
}

/// `PUT /courses/:id`, replacing the whole course. Profiles keep their
/// labels; see `GET /maintenance/catalog-drift`.
pub async fn replace<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<CourseInput>,
) -> Result<Reply<Course>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Update, Resource::Course)?;
  let existing = load(&p, id).await?;
  let course = body.into_course(existing.id, existing.created_at)?;
  if !p.store().replace_course(course.clone()).await.map_err(store_err)? {
    return Err(Error::not_found(format!("course {id} not found")).into());
  }
  Ok(ok(course))
}

/// `DELETE /courses/:id`
pub async fn delete<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Reply<Uuid>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Delete, Resource::Course)?;
  if !p.store().delete_course(id).await.map_err(store_err)? {
    return Err(Error::not_found(format!("course {id} not found")).into());
  }
  tracing::info!(%id, "course deleted");
  Ok(ok(id))
}

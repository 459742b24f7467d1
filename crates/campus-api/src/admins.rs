//! Handlers for `/admins` endpoints. Admin-only.

use axum::{extract::State, http::StatusCode};
use campus_core::{
  Error,
  policy::{Action, Resource},
  profile::{Admin, AdminInput, AdminPatch, ProfileKind},
  provision::Provisioner,
  store::{CampusStore, CascadeReport},
};
use uuid::Uuid;

use crate::{
  auth::Authenticated,
  envelope::{Reply, created, ok},
  error::{ApiError, store_err},
  extract::{Json, Path},
};

/// `GET /admins`
pub async fn list<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
) -> Result<Reply<Vec<Admin>>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Read, Resource::Admin)?;
  let admins = p
    .store()
    .list_profiles(ProfileKind::Admin)
    .await
    .map_err(store_err)?
    .into_iter()
    .filter_map(|profile| profile.into_admin())
    .collect();
  Ok(ok(admins))
}

/// `POST /admins`
pub async fn create<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Json(body): Json<AdminInput>,
) -> Result<(StatusCode, Reply<Admin>), ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Create, Resource::Admin)?;
  Ok(created(p.create_admin(body).await?))
}

/// `GET /admins/:id`
pub async fn get_one<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Reply<Admin>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Read, Resource::Admin)?;
  let admin = p
    .store()
    .get_profile(ProfileKind::Admin, id)
    .await
    .map_err(store_err)?
    .and_then(|profile| profile.into_admin())
    .ok_or_else(|| Error::not_found(format!("admin {id} not found")))?;
  Ok(ok(admin))
}

/// `PUT /admins/:id`
pub async fn update<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<AdminPatch>,
) -> Result<Reply<Admin>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Update, Resource::Admin)?;
  Ok(ok(p.update_admin(id, patch).await?))
}

/// `DELETE /admins/:id`; an admin can never delete themselves.
pub async fn delete<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Reply<CascadeReport>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Delete, Resource::Admin)?;
  Ok(ok(p.delete_profile(ProfileKind::Admin, id, &caller.actor()).await?))
}

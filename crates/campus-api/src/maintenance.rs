//! Reconciliation endpoints.

use axum::extract::State;
use campus_core::{
  Error,
  identity::Identity,
  policy::{Action, Resource},
  provision::{DriftEntry, Provisioner},
  store::CampusStore,
};

use crate::{
  auth::Authenticated,
  envelope::{Reply, ok},
  error::ApiError,
};

/// `POST /maintenance/orphans`: delete identities that own no profile.
pub async fn sweep_orphans<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
) -> Result<Reply<Vec<Identity>>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Delete, Resource::Maintenance)?;
  Ok(ok(p.sweep_orphans().await?))
}

/// `GET /maintenance/catalog-drift`
pub async fn catalog_drift<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
) -> Result<Reply<Vec<DriftEntry>>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  caller.permit(Action::Read, Resource::Maintenance)?;
  Ok(ok(p.catalog_drift().await?))
}

//! HTTP Basic-auth extractor plus the `/auth/login` and `/me` handlers.

use axum::{
  extract::{FromRequestParts, State},
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use campus_core::{
  Error,
  identity::Identity,
  policy::{Access, Action, Actor, Resource, authorize},
  profile::Profile,
  provision::Provisioner,
  store::CampusStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  envelope::{Reply, ok},
  error::{ApiError, store_err},
  extract::Json,
};

/// The identity behind a request's `Authorization: Basic` header.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl Authenticated {
  pub fn actor(&self) -> Actor { Actor { identity_id: self.0.identity_id, role: self.0.role } }

  /// Evaluate the policy table for this caller.
  pub fn permit(&self, action: Action, resource: Resource) -> Result<Access, ApiError> {
    Ok(authorize(&self.actor(), action, resource)?)
  }

  /// Like [`permit`](Self::permit), but an `Own` grant only covers records
  /// belonging to `owner` (an identity id).
  pub fn permit_for(
    &self,
    action: Action,
    resource: Resource,
    owner: Uuid,
  ) -> Result<(), ApiError> {
    match self.permit(action, resource)? {
      Access::Own if owner != self.0.identity_id => Err(
        Error::Forbidden(format!("{} may only {action} their own {resource}", self.0.role))
          .into(),
      ),
      _ => Ok(()),
    }
  }
}

/// Split a Basic `Authorization` header into login key and password.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val.strip_prefix("Basic ").ok_or(ApiError::Unauthorized)?;
  let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (login, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((login.to_owned(), password.to_owned()))
}

impl<S> FromRequestParts<Provisioner<S>> for Authenticated
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &Provisioner<S>,
  ) -> Result<Self, Self::Rejection> {
    let (login, password) = basic_credentials(&parts.headers)?;
    let identity = state.authenticate(&login, &password).await?;
    Ok(Authenticated(identity))
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// An identity together with the profile it owns.
#[derive(Debug, Serialize)]
pub struct Session {
  pub identity: Identity,
  pub profile:  Option<Profile>,
}

async fn session<S>(p: &Provisioner<S>, identity: Identity) -> Result<Session, ApiError>
where
  S: CampusStore,
  Error: From<S::Error>,
{
  let profile = p.store().find_profile_by_identity(identity.identity_id).await.map_err(store_err)?;
  Ok(Session { identity, profile })
}

/// `POST /auth/login`, body: `{"email": "...", "password": "..."}`
pub async fn login<S>(
  State(p): State<Provisioner<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Reply<Session>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  let identity = p.authenticate(&body.email, &body.password).await?;
  tracing::info!(login_key = %identity.login_key, role = %identity.role, "login");
  Ok(ok(session(&p, identity).await?))
}

/// `GET /me`
pub async fn me<S>(
  State(p): State<Provisioner<S>>,
  caller: Authenticated,
) -> Result<Reply<Session>, ApiError>
where
  S: CampusStore + 'static,
  Error: From<S::Error>,
{
  Ok(ok(session(&p, caller.0).await?))
}

//! JSON REST API for campus identity and profile provisioning.
//!
//! Exposes an axum [`Router`] backed by a [`Provisioner`] over any
//! [`campus_core::store::CampusStore`]. Every route except `POST
//! /auth/login` requires HTTP Basic credentials; TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", campus_api::api_router(provisioner.clone()))
//! ```

pub mod admins;
pub mod auth;
pub mod courses;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod faculty;
pub mod maintenance;
pub mod records;
pub mod students;

use axum::{
  Router,
  routing::{get, post},
};
use campus_core::{provision::Provisioner, store::CampusStore};

pub use auth::Authenticated;
pub use error::ApiError;

/// Build the API router for `provisioner`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(provisioner: Provisioner<S>) -> Router<()>
where
  S: CampusStore + 'static,
  campus_core::Error: From<S::Error>,
{
  Router::new()
    // Session
    .route("/auth/login", post(auth::login::<S>))
    .route("/me", get(auth::me::<S>))
    // Students
    .route("/students", get(students::list::<S>).post(students::create::<S>))
    .route("/students/bulk", post(students::create_bulk::<S>))
    .route(
      "/students/{id}",
      get(students::get_one::<S>).put(students::update::<S>).delete(students::delete::<S>),
    )
    .route("/students/{id}/attendance", get(students::attendance::<S>))
    .route("/students/{id}/remarks", get(students::remarks::<S>))
    .route("/students/{id}/performance", get(students::performance::<S>))
    // Faculty
    .route("/faculty", get(faculty::list::<S>).post(faculty::create::<S>))
    .route("/faculty/bulk", post(faculty::create_bulk::<S>))
    .route(
      "/faculty/{id}",
      get(faculty::get_one::<S>).put(faculty::update::<S>).delete(faculty::delete::<S>),
    )
    .route("/faculty/{id}/remarks", get(faculty::remarks::<S>))
    // Admins
    .route("/admins", get(admins::list::<S>).post(admins::create::<S>))
    .route(
      "/admins/{id}",
      get(admins::get_one::<S>).put(admins::update::<S>).delete(admins::delete::<S>),
    )
    // Dependent records
    .route("/attendance", post(records::mark::<S>))
    .route("/attendance/bulk", post(records::mark_bulk::<S>))
    .route("/remarks", post(records::add_remark::<S>))
    .route("/performance", post(records::record_performance::<S>))
    // Catalog
    .route("/courses", get(courses::list::<S>).post(courses::create::<S>))
    .route(
      "/courses/{id}",
      get(courses::get_one::<S>).put(courses::replace::<S>).delete(courses::delete::<S>),
    )
    // Reconciliation
    .route("/maintenance/orphans", post(maintenance::sweep_orphans::<S>))
    .route("/maintenance/catalog-drift", get(maintenance::catalog_drift::<S>))
    .with_state(provisioner)
}

#[cfg(test)]
mod tests;

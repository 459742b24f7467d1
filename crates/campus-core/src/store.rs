//! The `CampusStore` trait.
//!
//! Implemented by storage backends (e.g. `campus-store-sqlite`). The
//! provisioning workflows and the HTTP layer depend on this abstraction, not
//! on any concrete backend.
//!
//! Operations that touch more than one collection for a single logical change
//! ([`CampusStore::provision`], [`CampusStore::revise`],
//! [`CampusStore::deprovision`]) must be atomic: either every write lands or
//! none does.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  catalog::Course,
  identity::Identity,
  profile::{Profile, ProfileKind},
  record::{Attendance, Performance, Remark},
};

/// Dependent rows removed alongside a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
  pub attendance:  usize,
  pub remarks:     usize,
  pub performance: usize,
}

/// Abstraction over a campus store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CampusStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identities ────────────────────────────────────────────────────────

  fn get_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  /// Look up an identity by login key (case-insensitive).
  fn find_identity_by_login(
    &self,
    login_key: String,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  fn count_identities(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Identities referenced by no profile of any kind.
  fn orphaned_identities(
    &self,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + '_;

  /// Delete a single identity. Returns `false` if it did not exist.
  fn delete_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Persist a new identity and the profile that references it, atomically.
  ///
  /// Fails with a conflict if the login key, natural key or identity is
  /// already taken.
  fn provision(
    &self,
    identity: Identity,
    profile: Profile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    kind: ProfileKind,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Look up a profile by its natural key (`studentId`, `facultyId`,
  /// `adminId`).
  fn find_profile_by_key(
    &self,
    kind: ProfileKind,
    natural_key: String,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// The profile (of any kind) owning `identity_id`.
  fn find_profile_by_identity(
    &self,
    identity_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  fn list_profiles(
    &self,
    kind: ProfileKind,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  /// Overwrite an existing identity and its profile, atomically.
  fn revise(
    &self,
    identity: Identity,
    profile: Profile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove a profile's dependent records, its identity and the profile
  /// itself, atomically.
  ///
  /// Students lose their attendance, remarks and performance rows; faculty
  /// lose the remarks they authored.
  fn deprovision(
    &self,
    profile: Profile,
  ) -> impl Future<Output = Result<CascadeReport, Self::Error>> + Send + '_;

  // ── Dependent records ─────────────────────────────────────────────────

  /// Insert `candidate`, or overwrite `status`/`marked_by` of the existing
  /// row for the same `(student, date)`. Returns the stored row and whether
  /// it was newly created.
  fn upsert_attendance(
    &self,
    candidate: Attendance,
  ) -> impl Future<Output = Result<(Attendance, bool), Self::Error>> + Send + '_;

  fn list_attendance(
    &self,
    student: Uuid,
  ) -> impl Future<Output = Result<Vec<Attendance>, Self::Error>> + Send + '_;

  fn add_remark(
    &self,
    remark: Remark,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_remarks(
    &self,
    student: Uuid,
  ) -> impl Future<Output = Result<Vec<Remark>, Self::Error>> + Send + '_;

  /// Remarks written by `author` (an identity id).
  fn list_remarks_by_author(
    &self,
    author: Uuid,
  ) -> impl Future<Output = Result<Vec<Remark>, Self::Error>> + Send + '_;

  fn add_performance(
    &self,
    performance: Performance,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_performance(
    &self,
    student: Uuid,
  ) -> impl Future<Output = Result<Vec<Performance>, Self::Error>> + Send + '_;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// Fails with a conflict if a course with the same name exists.
  fn add_course(
    &self,
    course: Course,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup by course name.
  fn find_course_by_name(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  fn list_courses(&self) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  /// Overwrite an existing course. Returns `false` if it did not exist.
  fn replace_course(
    &self,
    course: Course,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

//! The provisioning workflows that keep identities, profiles and dependent
//! records consistent.
//!
//! Each operation validates and checks uniqueness up front, then hands the
//! store a single atomic unit of work ([`CampusStore::provision`],
//! [`CampusStore::revise`], [`CampusStore::deprovision`]). The up-front
//! checks give friendly errors; the store's own uniqueness constraints still
//! catch concurrent requests that race past them.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  bulk::{BulkOutcome, BulkRow},
  catalog::MAX_SEMESTER,
  credentials::{
    Credentials, derive_credentials, login_key_for, normalize_natural_key, parse_birth_date,
  },
  identity::{Identity, Role},
  policy::Actor,
  profile::{
    AccountPatch, Admin, AdminInput, AdminPatch, Faculty, FacultyInput, FacultyPatch, Profile,
    ProfileKind, Student, StudentInput, StudentPatch,
  },
  secret::SecretHasher,
  store::{CampusStore, CascadeReport},
};

/// A newly provisioned profile plus its one-time plaintext credentials.
#[derive(Debug, Clone, Serialize)]
pub struct Provisioned<P> {
  pub profile:     P,
  pub credentials: Credentials,
}

/// A profile whose stored catalog labels no longer resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftEntry {
  pub kind:        ProfileKind,
  pub profile_id:  Uuid,
  pub natural_key: String,
  pub reason:      String,
}

/// Where a new student or faculty member sits in the catalog.
struct Placement<'a> {
  course:   &'a str,
  branch:   &'a str,
  subject:  Option<&'a str>,
  semester: Option<u8>,
}

/// Orchestrates multi-collection writes over a [`CampusStore`].
pub struct Provisioner<S> {
  store:  Arc<S>,
  hasher: Arc<dyn SecretHasher>,
}

impl<S> Clone for Provisioner<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), hasher: Arc::clone(&self.hasher) }
  }
}

impl<S> Provisioner<S>
where
  S: CampusStore,
  Error: From<S::Error>,
{
  pub fn new(store: Arc<S>, hasher: Arc<dyn SecretHasher>) -> Self { Self { store, hasher } }

  pub fn store(&self) -> &S { &self.store }

  // ── Shared checks ─────────────────────────────────────────────────────

  async fn ensure_key_free(
    &self,
    kind: ProfileKind,
    natural_key: &str,
    except: Option<Uuid>,
  ) -> Result<()> {
    let existing = self.store.find_profile_by_key(kind, natural_key.to_owned()).await?;
    match existing {
      Some(p) if Some(p.id()) != except => Err(Error::conflict(format!(
        "{} {natural_key} already exists",
        kind.key_label()
      ))),
      _ => Ok(()),
    }
  }

  async fn ensure_login_free(&self, login_key: &str, except: Option<Uuid>) -> Result<()> {
    let existing = self.store.find_identity_by_login(login_key.to_owned()).await?;
    match existing {
      Some(i) if Some(i.identity_id) != except => {
        Err(Error::conflict(format!("login {login_key} already exists")))
      }
      _ => Ok(()),
    }
  }

  /// Resolve course/branch (and optionally subject) labels against the
  /// catalog.
  async fn resolve_catalog(
    &self,
    course: &str,
    branch: &str,
    subject: Option<&str>,
  ) -> Result<()> {
    let found = self
      .store
      .find_course_by_name(course.to_owned())
      .await?
      .ok_or_else(|| Error::validation(format!("course {course:?} is not in the catalog")))?;
    let found_branch = found.branch(branch).ok_or_else(|| {
      Error::validation(format!("branch {branch:?} is not offered by course {:?}", found.name))
    })?;
    match subject {
      Some(subject) if found_branch.subject(subject).is_none() => Err(Error::validation(
        format!("subject {subject:?} is not taught in branch {:?}", found_branch.name),
      )),
      _ => Ok(()),
    }
  }

  fn check_semester(semester: u8) -> Result<()> {
    if (1..=MAX_SEMESTER).contains(&semester) {
      Ok(())
    } else {
      Err(Error::validation(format!("semester must be between 1 and {MAX_SEMESTER}")))
    }
  }

  async fn require_profile(&self, kind: ProfileKind, id: Uuid) -> Result<Profile> {
    self
      .store
      .get_profile(kind, id)
      .await?
      .ok_or_else(|| Error::not_found(format!("{kind} {id} not found")))
  }

  async fn require_identity(&self, id: Uuid) -> Result<Identity> {
    self
      .store
      .get_identity(id)
      .await?
      .ok_or_else(|| Error::not_found(format!("identity {id} not found")))
  }

  /// Natural key free → derive credentials → login key free → birth date
  /// and placement checks → hash → write.
  async fn provision_derived(
    &self,
    kind: ProfileKind,
    natural_key: &str,
    name: &str,
    dob_raw: &str,
    placement: Placement<'_>,
    build: impl FnOnce(Uuid, NaiveDate) -> Profile,
  ) -> Result<(Profile, Credentials)> {
    self.ensure_key_free(kind, natural_key, None).await?;

    let credentials = derive_credentials(natural_key, dob_raw)?;
    self.ensure_login_free(&credentials.login_key, None).await?;

    let dob = parse_birth_date(dob_raw)?;
    if let Some(semester) = placement.semester {
      Self::check_semester(semester)?;
    }
    self.resolve_catalog(placement.course, placement.branch, placement.subject).await?;

    let hash = self.hasher.hash(&credentials.initial_secret)?;
    let identity = Identity::new(credentials.login_key.clone(), name, hash, kind.role());
    let identity_id = identity.identity_id;
    let profile = build(identity_id, dob);

    self.store.provision(identity, profile.clone()).await?;
    tracing::info!(%kind, natural_key, %identity_id, "profile provisioned");
    Ok((profile, credentials))
  }

  /// Apply the identity half of a patch, re-hashing any new password.
  fn apply_account(&self, identity: &mut Identity, account: AccountPatch) -> Result<()> {
    if let Some(name) = account.name {
      identity.name = name;
    }
    if let Some(password) = account.password {
      identity.password_hash = self.hasher.hash(&password)?;
    }
    if let Some(status) = account.status {
      identity.status = status;
    }
    Ok(())
  }

  // ── Students ──────────────────────────────────────────────────────────

  pub async fn create_student(&self, input: StudentInput) -> Result<Provisioned<Student>> {
    let draft = input.validate()?;
    let key = draft.student_id.clone();
    let name = draft.name.clone();
    let dob_raw = draft.dob_raw.clone();
    let (course, branch) = (draft.course.clone(), draft.branch.clone());
    let placement = Placement {
      course:   &course,
      branch:   &branch,
      subject:  None,
      semester: Some(draft.semester),
    };
    let (profile, credentials) = self
      .provision_derived(ProfileKind::Student, &key, &name, &dob_raw, placement, |id, dob| {
        Profile::Student(draft.into_student(id, dob))
      })
      .await?;

    let profile = profile
      .into_student()
      .ok_or_else(|| Error::validation("provisioned profile is not a student"))?;
    Ok(Provisioned { profile, credentials })
  }

  /// Create students row by row; a failing row never aborts the batch.
  pub async fn create_students_bulk<R>(&self, rows: Vec<R>) -> BulkOutcome
  where
    R: Into<BulkRow<StudentInput>>,
  {
    let mut outcome = BulkOutcome::default();
    for (idx, row) in rows.into_iter().enumerate() {
      let row: BulkRow<StudentInput> = row.into();
      let row = match row {
        BulkRow::Input(row) => row,
        BulkRow::Malformed { key, reason } => {
          outcome.skipped(idx + 1, key.map(|k| normalize_natural_key(&k)), reason);
          continue;
        }
      };
      let key = row.key_hint();
      match self.create_student(row).await {
        Ok(_) => outcome.added(),
        Err(e) => outcome.skipped(idx + 1, key, e.to_string()),
      }
    }
    tracing::info!(
      added = outcome.added_count,
      skipped = outcome.skipped_count,
      "bulk student import finished"
    );
    outcome
  }

  pub async fn update_student(&self, id: Uuid, patch: StudentPatch) -> Result<Student> {
    let mut student = self
      .require_profile(ProfileKind::Student, id)
      .await?
      .into_student()
      .ok_or_else(|| Error::not_found(format!("student {id} not found")))?;
    let mut identity = self.require_identity(student.identity_id).await?;

    if let Some(key) = patch.natural_key().filter(|k| *k != student.student_id) {
      self.ensure_key_free(ProfileKind::Student, &key, Some(student.id)).await?;
      let login_key = login_key_for(&key);
      self.ensure_login_free(&login_key, Some(identity.identity_id)).await?;
      identity.login_key = login_key;
    }

    let before = (student.course.clone(), student.branch.clone());
    let account = patch.apply(&mut student)?;
    Self::check_semester(student.semester)?;
    if before != (student.course.clone(), student.branch.clone()) {
      self.resolve_catalog(&student.course, &student.branch, None).await?;
    }
    self.apply_account(&mut identity, account)?;

    self.store.revise(identity, Profile::Student(student.clone())).await?;
    tracing::info!(student_id = %student.student_id, id = %student.id, "student updated");
    Ok(student)
  }

  // ── Faculty ───────────────────────────────────────────────────────────

  pub async fn create_faculty(&self, input: FacultyInput) -> Result<Provisioned<Faculty>> {
    let draft = input.validate()?;
    let key = draft.faculty_id.clone();
    let name = draft.name.clone();
    let dob_raw = draft.dob_raw.clone();
    let (course, branch) = (draft.course.clone(), draft.branch.clone());
    let subject = draft.subject.clone();
    let placement = Placement {
      course:   &course,
      branch:   &branch,
      subject:  subject.as_deref(),
      semester: None,
    };
    let (profile, credentials) = self
      .provision_derived(ProfileKind::Faculty, &key, &name, &dob_raw, placement, |id, dob| {
        Profile::Faculty(draft.into_faculty(id, dob))
      })
      .await?;

    let profile = profile
      .into_faculty()
      .ok_or_else(|| Error::validation("provisioned profile is not a faculty member"))?;
    Ok(Provisioned { profile, credentials })
  }

  pub async fn create_faculty_bulk<R>(&self, rows: Vec<R>) -> BulkOutcome
  where
    R: Into<BulkRow<FacultyInput>>,
  {
    let mut outcome = BulkOutcome::default();
    for (idx, row) in rows.into_iter().enumerate() {
      let row: BulkRow<FacultyInput> = row.into();
      let row = match row {
        BulkRow::Input(row) => row,
        BulkRow::Malformed { key, reason } => {
          outcome.skipped(idx + 1, key.map(|k| normalize_natural_key(&k)), reason);
          continue;
        }
      };
      let key = row.key_hint();
      match self.create_faculty(row).await {
        Ok(_) => outcome.added(),
        Err(e) => outcome.skipped(idx + 1, key, e.to_string()),
      }
    }
    tracing::info!(
      added = outcome.added_count,
      skipped = outcome.skipped_count,
      "bulk faculty import finished"
    );
    outcome
  }

  pub async fn update_faculty(&self, id: Uuid, patch: FacultyPatch) -> Result<Faculty> {
    let mut faculty = self
      .require_profile(ProfileKind::Faculty, id)
      .await?
      .into_faculty()
      .ok_or_else(|| Error::not_found(format!("faculty {id} not found")))?;
    let mut identity = self.require_identity(faculty.identity_id).await?;

    if let Some(key) = patch.natural_key().filter(|k| *k != faculty.faculty_id) {
      self.ensure_key_free(ProfileKind::Faculty, &key, Some(faculty.id)).await?;
      let login_key = login_key_for(&key);
      self.ensure_login_free(&login_key, Some(identity.identity_id)).await?;
      identity.login_key = login_key;
    }

    let before = (faculty.course.clone(), faculty.branch.clone(), faculty.subject.clone());
    let account = patch.apply(&mut faculty)?;
    if before != (faculty.course.clone(), faculty.branch.clone(), faculty.subject.clone()) {
      self
        .resolve_catalog(&faculty.course, &faculty.branch, faculty.subject.as_deref())
        .await?;
    }
    self.apply_account(&mut identity, account)?;

    self.store.revise(identity, Profile::Faculty(faculty.clone())).await?;
    tracing::info!(faculty_id = %faculty.faculty_id, id = %faculty.id, "faculty updated");
    Ok(faculty)
  }

  // ── Admins ────────────────────────────────────────────────────────────

  /// Admins pick their own login key and password; nothing is derived.
  pub async fn create_admin(&self, input: AdminInput) -> Result<Admin> {
    let draft = input.validate()?;
    self.ensure_key_free(ProfileKind::Admin, &draft.admin_id, None).await?;
    self.ensure_login_free(&draft.login_key, None).await?;

    let hash = self.hasher.hash(&draft.password)?;
    let identity = Identity::new(draft.login_key.clone(), draft.name.clone(), hash, Role::Admin);
    let admin = draft.into_admin(identity.identity_id);

    self.store.provision(identity, Profile::Admin(admin.clone())).await?;
    tracing::info!(admin_id = %admin.admin_id, id = %admin.id, "admin provisioned");
    Ok(admin)
  }

  pub async fn update_admin(&self, id: Uuid, patch: AdminPatch) -> Result<Admin> {
    let mut admin = self
      .require_profile(ProfileKind::Admin, id)
      .await?
      .into_admin()
      .ok_or_else(|| Error::not_found(format!("admin {id} not found")))?;
    let mut identity = self.require_identity(admin.identity_id).await?;

    if let Some(key) = patch.natural_key().filter(|k| *k != admin.admin_id) {
      self.ensure_key_free(ProfileKind::Admin, &key, Some(admin.id)).await?;
    }
    if let Some(login_key) = patch.login_key().filter(|l| *l != identity.login_key) {
      self.ensure_login_free(&login_key, Some(identity.identity_id)).await?;
      identity.login_key = login_key;
    }

    let account = patch.apply(&mut admin)?;
    self.apply_account(&mut identity, account)?;

    self.store.revise(identity, Profile::Admin(admin.clone())).await?;
    tracing::info!(admin_id = %admin.admin_id, id = %admin.id, "admin updated");
    Ok(admin)
  }

  // ── Deletion ──────────────────────────────────────────────────────────

  /// Remove a profile together with its dependent records and identity.
  ///
  /// An actor may never delete the profile they are logged in as.
  pub async fn delete_profile(
    &self,
    kind: ProfileKind,
    id: Uuid,
    actor: &Actor,
  ) -> Result<CascadeReport> {
    let profile = self.require_profile(kind, id).await?;

    if profile.identity_id() == actor.identity_id {
      tracing::warn!(%kind, %id, "self-delete rejected");
      return Err(Error::validation("you cannot delete your own account"));
    }

    let natural_key = profile.natural_key().to_owned();
    let identity_id = profile.identity_id();
    let report = self.store.deprovision(profile).await?;
    tracing::info!(
      %kind,
      natural_key = %natural_key,
      %identity_id,
      attendance = report.attendance,
      remarks = report.remarks,
      performance = report.performance,
      "profile deprovisioned"
    );
    Ok(report)
  }

  // ── Authentication ────────────────────────────────────────────────────

  /// Resolve the identity behind a login key and password.
  pub async fn authenticate(&self, login_key: &str, secret: &str) -> Result<Identity> {
    let identity = self
      .store
      .find_identity_by_login(login_key.trim().to_owned())
      .await?
      .ok_or(Error::InvalidCredentials)?;

    if !self.hasher.verify(secret, &identity.password_hash) {
      tracing::warn!(login_key, "rejected login");
      return Err(Error::InvalidCredentials);
    }
    if !identity.is_active() {
      return Err(Error::AccountInactive);
    }
    Ok(identity)
  }

  // ── Reconciliation ────────────────────────────────────────────────────

  /// Delete every identity that no profile references.
  pub async fn sweep_orphans(&self) -> Result<Vec<Identity>> {
    let orphans = self.store.orphaned_identities().await?;
    let mut removed = Vec::with_capacity(orphans.len());
    for identity in orphans {
      if self.store.delete_identity(identity.identity_id).await? {
        tracing::info!(
          identity_id = %identity.identity_id,
          login_key = %identity.login_key,
          "orphaned identity removed"
        );
        removed.push(identity);
      }
    }
    Ok(removed)
  }

  /// List students and faculty whose catalog labels no longer resolve.
  pub async fn catalog_drift(&self) -> Result<Vec<DriftEntry>> {
    let courses = self.store.list_courses().await?;
    let mut drift = Vec::new();

    let mut check = |kind, profile_id, key: &str, course: &str, branch: &str, subject: Option<&str>| {
      let reason = match courses.iter().find(|c| c.name.eq_ignore_ascii_case(course.trim())) {
        None => Some(format!("course {course:?} no longer exists")),
        Some(c) => match c.branch(branch) {
          None => Some(format!("branch {branch:?} no longer exists in course {:?}", c.name)),
          Some(b) => subject
            .filter(|s| b.subject(s).is_none())
            .map(|s| format!("subject {s:?} no longer exists in branch {:?}", b.name)),
        },
      };
      if let Some(reason) = reason {
        drift.push(DriftEntry { kind, profile_id, natural_key: key.to_owned(), reason });
      }
    };

    for profile in self.store.list_profiles(ProfileKind::Student).await? {
      if let Profile::Student(s) = profile {
        check(ProfileKind::Student, s.id, &s.student_id, &s.course, &s.branch, None);
      }
    }
    for profile in self.store.list_profiles(ProfileKind::Faculty).await? {
      if let Profile::Faculty(f) = profile {
        check(
          ProfileKind::Faculty,
          f.id,
          &f.faculty_id,
          &f.course,
          &f.branch,
          f.subject.as_deref(),
        );
      }
    }
    Ok(drift)
  }
}

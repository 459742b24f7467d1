//! Profiles: the domain records (Student, Faculty, Admin) that each own
//! exactly one [`Identity`](crate::identity::Identity).
//!
//! Inputs arrive with every field optional so that bulk imports can report
//! missing fields per row instead of rejecting the whole request.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  credentials::{normalize_natural_key, parse_birth_date},
  identity::{AccountStatus, Role},
};

// ─── Documents ───────────────────────────────────────────────────────────────

/// An uploaded document reference produced by file storage. Stored opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  pub name: String,
  pub url:  String,
  #[serde(rename = "type")]
  pub kind: String,
}

// ─── Profile records ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
  pub id:             Uuid,
  pub identity_id:    Uuid,
  /// Natural key, upper-case.
  pub student_id:     String,
  pub name:           String,
  /// Contact email; distinct from the login key.
  pub personal_email: String,
  pub phone:          Option<String>,
  pub gender:         Option<String>,
  pub dob:            NaiveDate,
  pub address:        Option<String>,
  pub guardian_name:  Option<String>,
  pub course:         String,
  pub branch:         String,
  pub semester:       u8,
  /// Soft lifecycle flag, independent of the identity's status.
  pub is_active:      bool,
  pub documents:      Vec<Document>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl Student {
  /// Age in whole years on `today`. Never stored.
  pub fn age_on(&self, today: NaiveDate) -> u32 { today.years_since(self.dob).unwrap_or(0) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
  pub id:             Uuid,
  pub identity_id:    Uuid,
  pub faculty_id:     String,
  pub name:           String,
  pub personal_email: String,
  pub phone:          Option<String>,
  pub gender:         Option<String>,
  pub dob:            NaiveDate,
  pub designation:    String,
  pub course:         String,
  pub branch:         String,
  pub subject:        Option<String>,
  pub documents:      Vec<Document>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
  pub id:             Uuid,
  pub identity_id:    Uuid,
  pub admin_id:       String,
  pub name:           String,
  pub personal_email: String,
  pub phone:          Option<String>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

/// Which profile collection a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProfileKind {
  Student,
  Faculty,
  Admin,
}

impl ProfileKind {
  /// The identity role provisioned alongside this kind of profile.
  pub fn role(self) -> Role {
    match self {
      Self::Student => Role::Student,
      Self::Faculty => Role::Faculty,
      Self::Admin => Role::Admin,
    }
  }

  /// Human-readable name of the natural key, for messages.
  pub fn key_label(self) -> &'static str {
    match self {
      Self::Student => "student id",
      Self::Faculty => "faculty id",
      Self::Admin => "admin id",
    }
  }
}

/// Any profile record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Profile {
  Student(Student),
  Faculty(Faculty),
  Admin(Admin),
}

impl Profile {
  pub fn kind(&self) -> ProfileKind {
    match self {
      Self::Student(_) => ProfileKind::Student,
      Self::Faculty(_) => ProfileKind::Faculty,
      Self::Admin(_) => ProfileKind::Admin,
    }
  }

  pub fn id(&self) -> Uuid {
    match self {
      Self::Student(s) => s.id,
      Self::Faculty(f) => f.id,
      Self::Admin(a) => a.id,
    }
  }

  pub fn identity_id(&self) -> Uuid {
    match self {
      Self::Student(s) => s.identity_id,
      Self::Faculty(f) => f.identity_id,
      Self::Admin(a) => a.identity_id,
    }
  }

  pub fn natural_key(&self) -> &str {
    match self {
      Self::Student(s) => &s.student_id,
      Self::Faculty(f) => &f.faculty_id,
      Self::Admin(a) => &a.admin_id,
    }
  }

  pub fn name(&self) -> &str {
    match self {
      Self::Student(s) => &s.name,
      Self::Faculty(f) => &f.name,
      Self::Admin(a) => &a.name,
    }
  }

  pub fn into_student(self) -> Option<Student> {
    match self {
      Self::Student(s) => Some(s),
      _ => None,
    }
  }

  pub fn into_faculty(self) -> Option<Faculty> {
    match self {
      Self::Faculty(f) => Some(f),
      _ => None,
    }
  }

  pub fn into_admin(self) -> Option<Admin> {
    match self {
      Self::Admin(a) => Some(a),
      _ => None,
    }
  }
}

// ─── Required-field collection ───────────────────────────────────────────────

/// Collects missing mandatory fields so they can be reported together.
#[derive(Default)]
pub(crate) struct Required {
  pub(crate) missing: Vec<&'static str>,
}

impl Required {
  pub(crate) fn text(&mut self, field: &'static str, value: Option<String>) -> String {
    match value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty()) {
      Some(v) => v,
      None => {
        self.missing.push(field);
        String::new()
      }
    }
  }

  pub(crate) fn value<T: Default>(&mut self, field: &'static str, value: Option<T>) -> T {
    value.unwrap_or_else(|| {
      self.missing.push(field);
      T::default()
    })
  }

  pub(crate) fn finish(self) -> Result<()> {
    if self.missing.is_empty() {
      Ok(())
    } else {
      Err(Error::validation(format!("missing required fields: {}", self.missing.join(", "))))
    }
  }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

/// Reject an explicitly supplied but blank value for a mandatory field.
fn replace_required(field: &str, target: &mut String, value: Option<String>) -> Result<bool> {
  let Some(value) = value else { return Ok(false) };
  let value = value.trim();
  if value.is_empty() {
    return Err(Error::validation(format!("{field} cannot be empty")));
  }
  let changed = *target != value;
  *target = value.to_owned();
  Ok(changed)
}

// ─── Creation inputs ─────────────────────────────────────────────────────────

/// A Student creation request (single or one bulk row).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
  pub student_id:     Option<String>,
  pub name:           Option<String>,
  pub personal_email: Option<String>,
  /// `YYYY-MM-DD`.
  pub dob:            Option<String>,
  pub phone:          Option<String>,
  pub gender:         Option<String>,
  pub address:        Option<String>,
  pub guardian_name:  Option<String>,
  pub course:         Option<String>,
  pub branch:         Option<String>,
  pub semester:       Option<u8>,
  #[serde(default)]
  pub documents:      Vec<Document>,
}

/// A Student creation request with all mandatory fields present.
#[derive(Debug, Clone)]
pub struct StudentDraft {
  pub student_id:     String,
  pub name:           String,
  pub personal_email: String,
  /// The birth date as submitted; credential derivation works on this form.
  pub dob_raw:        String,
  pub phone:          Option<String>,
  pub gender:         Option<String>,
  pub address:        Option<String>,
  pub guardian_name:  Option<String>,
  pub course:         String,
  pub branch:         String,
  pub semester:       u8,
  pub documents:      Vec<Document>,
}

impl StudentInput {
  /// The row's natural key, if any, for error reporting.
  pub fn key_hint(&self) -> Option<String> {
    non_blank(self.student_id.clone()).map(|k| normalize_natural_key(&k))
  }

  pub fn validate(self) -> Result<StudentDraft> {
    let mut req = Required::default();
    let name = req.text("name", self.name);
    let student_id = req.text("studentId", self.student_id);
    let personal_email = req.text("personalEmail", self.personal_email);
    let dob_raw = req.text("dob", self.dob);
    let course = req.text("course", self.course);
    let branch = req.text("branch", self.branch);
    let semester = req.value("semester", self.semester);
    req.finish()?;

    Ok(StudentDraft {
      student_id: normalize_natural_key(&student_id),
      name,
      personal_email,
      dob_raw,
      phone: non_blank(self.phone),
      gender: non_blank(self.gender),
      address: non_blank(self.address),
      guardian_name: non_blank(self.guardian_name),
      course,
      branch,
      semester,
      documents: self.documents,
    })
  }
}

impl StudentDraft {
  /// Only checked once the natural key is known to be free.
  pub fn birth_date(&self) -> Result<NaiveDate> { parse_birth_date(&self.dob_raw) }

  pub fn into_student(self, identity_id: Uuid, dob: NaiveDate) -> Student {
    let now = Utc::now();
    Student {
      id: Uuid::new_v4(),
      identity_id,
      student_id: self.student_id,
      name: self.name,
      personal_email: self.personal_email,
      phone: self.phone,
      gender: self.gender,
      dob,
      address: self.address,
      guardian_name: self.guardian_name,
      course: self.course,
      branch: self.branch,
      semester: self.semester,
      is_active: true,
      documents: self.documents,
      created_at: now,
      updated_at: now,
    }
  }
}

/// A Faculty creation request (single or one bulk row).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyInput {
  pub faculty_id:     Option<String>,
  pub name:           Option<String>,
  pub personal_email: Option<String>,
  pub dob:            Option<String>,
  pub phone:          Option<String>,
  pub gender:         Option<String>,
  pub designation:    Option<String>,
  pub course:         Option<String>,
  pub branch:         Option<String>,
  pub subject:        Option<String>,
  #[serde(default)]
  pub documents:      Vec<Document>,
}

#[derive(Debug, Clone)]
pub struct FacultyDraft {
  pub faculty_id:     String,
  pub name:           String,
  pub personal_email: String,
  pub dob_raw:        String,
  pub phone:          Option<String>,
  pub gender:         Option<String>,
  pub designation:    String,
  pub course:         String,
  pub branch:         String,
  pub subject:        Option<String>,
  pub documents:      Vec<Document>,
}

impl FacultyInput {
  pub fn key_hint(&self) -> Option<String> {
    non_blank(self.faculty_id.clone()).map(|k| normalize_natural_key(&k))
  }

  pub fn validate(self) -> Result<FacultyDraft> {
    let mut req = Required::default();
    let name = req.text("name", self.name);
    let faculty_id = req.text("facultyId", self.faculty_id);
    let personal_email = req.text("personalEmail", self.personal_email);
    let dob_raw = req.text("dob", self.dob);
    let designation = req.text("designation", self.designation);
    let course = req.text("course", self.course);
    let branch = req.text("branch", self.branch);
    req.finish()?;

    Ok(FacultyDraft {
      faculty_id: normalize_natural_key(&faculty_id),
      name,
      personal_email,
      dob_raw,
      phone: non_blank(self.phone),
      gender: non_blank(self.gender),
      designation,
      course,
      branch,
      subject: non_blank(self.subject),
      documents: self.documents,
    })
  }
}

impl FacultyDraft {
  pub fn birth_date(&self) -> Result<NaiveDate> { parse_birth_date(&self.dob_raw) }

  pub fn into_faculty(self, identity_id: Uuid, dob: NaiveDate) -> Faculty {
    let now = Utc::now();
    Faculty {
      id: Uuid::new_v4(),
      identity_id,
      faculty_id: self.faculty_id,
      name: self.name,
      personal_email: self.personal_email,
      phone: self.phone,
      gender: self.gender,
      dob,
      designation: self.designation,
      course: self.course,
      branch: self.branch,
      subject: self.subject,
      documents: self.documents,
      created_at: now,
      updated_at: now,
    }
  }
}

/// An Admin creation request. Admins choose their login key and password.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminInput {
  pub admin_id:       Option<String>,
  pub name:           Option<String>,
  /// Login key.
  pub email:          Option<String>,
  pub password:       Option<String>,
  pub personal_email: Option<String>,
  pub phone:          Option<String>,
}

#[derive(Debug, Clone)]
pub struct AdminDraft {
  pub admin_id:       String,
  pub name:           String,
  pub login_key:      String,
  pub password:       String,
  pub personal_email: String,
  pub phone:          Option<String>,
}

impl AdminInput {
  pub fn validate(self) -> Result<AdminDraft> {
    let mut req = Required::default();
    let name = req.text("name", self.name);
    let admin_id = req.text("adminId", self.admin_id);
    let login_key = req.text("email", self.email);
    let personal_email = req.text("personalEmail", self.personal_email);
    // Passwords are taken verbatim; only emptiness is checked.
    let password = match self.password.filter(|p| !p.is_empty()) {
      Some(p) => p,
      None => {
        req.missing.push("password");
        String::new()
      }
    };
    req.finish()?;

    Ok(AdminDraft {
      admin_id: normalize_natural_key(&admin_id),
      name,
      login_key,
      password,
      personal_email,
      phone: non_blank(self.phone),
    })
  }
}

impl AdminDraft {
  pub fn into_admin(self, identity_id: Uuid) -> Admin {
    let now = Utc::now();
    Admin {
      id: Uuid::new_v4(),
      identity_id,
      admin_id: self.admin_id,
      name: self.name,
      personal_email: self.personal_email,
      phone: self.phone,
      created_at: now,
      updated_at: now,
    }
  }
}

// ─── Patches ─────────────────────────────────────────────────────────────────

/// The part of a profile patch that lands on the linked identity.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
  pub name:     Option<String>,
  pub password: Option<String>,
  pub status:   Option<AccountStatus>,
}

/// A partial Student update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
  pub student_id:     Option<String>,
  pub name:           Option<String>,
  pub personal_email: Option<String>,
  pub dob:            Option<String>,
  pub phone:          Option<String>,
  pub gender:         Option<String>,
  pub address:        Option<String>,
  pub guardian_name:  Option<String>,
  pub course:         Option<String>,
  pub branch:         Option<String>,
  pub semester:       Option<u8>,
  pub is_active:      Option<bool>,
  /// Appended to the existing documents.
  pub documents:      Option<Vec<Document>>,
  pub password:       Option<String>,
  pub account_status: Option<AccountStatus>,
}

impl StudentPatch {
  /// The normalised natural key this patch sets, if any.
  pub fn natural_key(&self) -> Option<String> {
    non_blank(self.student_id.clone()).map(|k| normalize_natural_key(&k))
  }

  /// Overwrite the profile fields this patch carries and return the part
  /// destined for the identity.
  pub fn apply(self, student: &mut Student) -> Result<AccountPatch> {
    if let Some(key) = self.natural_key() {
      student.student_id = key;
    } else if self.student_id.is_some() {
      return Err(Error::validation("studentId cannot be empty"));
    }
    let renamed = replace_required("name", &mut student.name, self.name)?;
    replace_required("personalEmail", &mut student.personal_email, self.personal_email)?;
    replace_required("course", &mut student.course, self.course)?;
    replace_required("branch", &mut student.branch, self.branch)?;
    if let Some(dob) = self.dob {
      student.dob = parse_birth_date(&dob)?;
    }
    if let Some(phone) = self.phone {
      student.phone = non_blank(Some(phone));
    }
    if let Some(gender) = self.gender {
      student.gender = non_blank(Some(gender));
    }
    if let Some(address) = self.address {
      student.address = non_blank(Some(address));
    }
    if let Some(guardian) = self.guardian_name {
      student.guardian_name = non_blank(Some(guardian));
    }
    if let Some(semester) = self.semester {
      student.semester = semester;
    }
    if let Some(active) = self.is_active {
      student.is_active = active;
    }
    if let Some(documents) = self.documents {
      student.documents.extend(documents);
    }
    student.updated_at = Utc::now();

    Ok(AccountPatch {
      name:     renamed.then(|| student.name.clone()),
      password: self.password.filter(|p| !p.is_empty()),
      status:   self.account_status,
    })
  }
}

/// A partial Faculty update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyPatch {
  pub faculty_id:     Option<String>,
  pub name:           Option<String>,
  pub personal_email: Option<String>,
  pub dob:            Option<String>,
  pub phone:          Option<String>,
  pub gender:         Option<String>,
  pub designation:    Option<String>,
  pub course:         Option<String>,
  pub branch:         Option<String>,
  pub subject:        Option<String>,
  pub documents:      Option<Vec<Document>>,
  pub password:       Option<String>,
  pub account_status: Option<AccountStatus>,
}

impl FacultyPatch {
  pub fn natural_key(&self) -> Option<String> {
    non_blank(self.faculty_id.clone()).map(|k| normalize_natural_key(&k))
  }

  pub fn apply(self, faculty: &mut Faculty) -> Result<AccountPatch> {
    if let Some(key) = self.natural_key() {
      faculty.faculty_id = key;
    } else if self.faculty_id.is_some() {
      return Err(Error::validation("facultyId cannot be empty"));
    }
    let renamed = replace_required("name", &mut faculty.name, self.name)?;
    replace_required("personalEmail", &mut faculty.personal_email, self.personal_email)?;
    replace_required("designation", &mut faculty.designation, self.designation)?;
    replace_required("course", &mut faculty.course, self.course)?;
    replace_required("branch", &mut faculty.branch, self.branch)?;
    if let Some(dob) = self.dob {
      faculty.dob = parse_birth_date(&dob)?;
    }
    if let Some(phone) = self.phone {
      faculty.phone = non_blank(Some(phone));
    }
    if let Some(gender) = self.gender {
      faculty.gender = non_blank(Some(gender));
    }
    if let Some(subject) = self.subject {
      faculty.subject = non_blank(Some(subject));
    }
    if let Some(documents) = self.documents {
      faculty.documents.extend(documents);
    }
    faculty.updated_at = Utc::now();

    Ok(AccountPatch {
      name:     renamed.then(|| faculty.name.clone()),
      password: self.password.filter(|p| !p.is_empty()),
      status:   self.account_status,
    })
  }
}

/// A partial Admin update. `email` changes the login key directly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPatch {
  pub admin_id:       Option<String>,
  pub name:           Option<String>,
  pub email:          Option<String>,
  pub personal_email: Option<String>,
  pub phone:          Option<String>,
  pub password:       Option<String>,
  pub account_status: Option<AccountStatus>,
}

impl AdminPatch {
  pub fn natural_key(&self) -> Option<String> {
    non_blank(self.admin_id.clone()).map(|k| normalize_natural_key(&k))
  }

  pub fn login_key(&self) -> Option<String> { non_blank(self.email.clone()) }

  pub fn apply(self, admin: &mut Admin) -> Result<AccountPatch> {
    if let Some(key) = self.natural_key() {
      admin.admin_id = key;
    } else if self.admin_id.is_some() {
      return Err(Error::validation("adminId cannot be empty"));
    }
    if self.email.is_some() && self.login_key().is_none() {
      return Err(Error::validation("email cannot be empty"));
    }
    let renamed = replace_required("name", &mut admin.name, self.name)?;
    replace_required("personalEmail", &mut admin.personal_email, self.personal_email)?;
    if let Some(phone) = self.phone {
      admin.phone = non_blank(Some(phone));
    }
    admin.updated_at = Utc::now();

    Ok(AccountPatch {
      name:     renamed.then(|| admin.name.clone()),
      password: self.password.filter(|p| !p.is_empty()),
      status:   self.account_status,
    })
  }
}

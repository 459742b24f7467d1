//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings and calendar days as
//! `YYYY-MM-DD`. Documents and course branches are stored as compact JSON.
//! UUIDs are stored as hyphenated lowercase strings.

use campus_core::{
  catalog::Course,
  identity::{AccountStatus, Identity, Role},
  profile::{Admin, Faculty, Profile, Student},
  record::{Attendance, AttendanceStatus, Performance, Remark},
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::ToSql;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::Decode(e.to_string()))
}

// ─── Role / AccountStatus ────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Admin => "ADMIN",
    Role::Faculty => "FACULTY",
    Role::Student => "STUDENT",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "ADMIN" => Ok(Role::Admin),
    "FACULTY" | "TEACHER" => Ok(Role::Faculty),
    "STUDENT" => Ok(Role::Student),
    other => Err(Error::Decode(format!("unknown role: {other:?}"))),
  }
}

pub fn encode_account_status(s: AccountStatus) -> &'static str {
  match s {
    AccountStatus::Active => "Active",
    AccountStatus::Inactive => "Inactive",
  }
}

pub fn decode_account_status(s: &str) -> Result<AccountStatus> {
  match s {
    "Active" => Ok(AccountStatus::Active),
    "Inactive" => Ok(AccountStatus::Inactive),
    other => Err(Error::Decode(format!("unknown account status: {other:?}"))),
  }
}

// ─── AttendanceStatus ────────────────────────────────────────────────────────

pub fn encode_attendance_status(s: AttendanceStatus) -> &'static str {
  match s {
    AttendanceStatus::Present => "Present",
    AttendanceStatus::Absent => "Absent",
    AttendanceStatus::Late => "Late",
    AttendanceStatus::Leave => "Leave",
  }
}

pub fn decode_attendance_status(s: &str) -> Result<AttendanceStatus> {
  match s {
    "Present" => Ok(AttendanceStatus::Present),
    "Absent" => Ok(AttendanceStatus::Absent),
    "Late" => Ok(AttendanceStatus::Late),
    "Leave" => Ok(AttendanceStatus::Leave),
    other => Err(Error::Decode(format!("unknown attendance status: {other:?}"))),
  }
}

fn decode_semester(v: i64) -> Result<u8> {
  u8::try_from(v).map_err(|_| Error::Decode(format!("semester out of range: {v}")))
}

// ─── Identity ────────────────────────────────────────────────────────────────

pub const IDENTITY_COLUMNS: &str =
  "identity_id, login_key, name, password_hash, role, status, created_at";

/// Raw strings read from (or bound to) an `identities` row.
pub struct RawIdentity {
  pub identity_id:   String,
  pub login_key:     String,
  pub name:          String,
  pub password_hash: String,
  pub role:          String,
  pub status:        String,
  pub created_at:    String,
}

impl RawIdentity {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id:   row.get(0)?,
      login_key:     row.get(1)?,
      name:          row.get(2)?,
      password_hash: row.get(3)?,
      role:          row.get(4)?,
      status:        row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn encode(i: &Identity) -> Self {
    Self {
      identity_id:   encode_uuid(i.identity_id),
      login_key:     i.login_key.clone(),
      name:          i.name.clone(),
      password_hash: i.password_hash.clone(),
      role:          encode_role(i.role).to_owned(),
      status:        encode_account_status(i.status).to_owned(),
      created_at:    encode_dt(i.created_at),
    }
  }

  /// Values in `IDENTITY_COLUMNS` order.
  pub fn bind(&self) -> [&dyn ToSql; 7] {
    [
      &self.identity_id,
      &self.login_key,
      &self.name,
      &self.password_hash,
      &self.role,
      &self.status,
      &self.created_at,
    ]
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      identity_id:   decode_uuid(&self.identity_id)?,
      login_key:     self.login_key,
      name:          self.name,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
      status:        decode_account_status(&self.status)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

pub const STUDENT_COLUMNS: &str = "id, identity_id, student_id, name, personal_email, phone, \
                                   gender, dob, address, guardian_name, course, branch, \
                                   semester, is_active, documents, created_at, updated_at";

pub struct RawStudent {
  pub id:             String,
  pub identity_id:    String,
  pub student_id:     String,
  pub name:           String,
  pub personal_email: String,
  pub phone:          Option<String>,
  pub gender:         Option<String>,
  pub dob:            String,
  pub address:        Option<String>,
  pub guardian_name:  Option<String>,
  pub course:         String,
  pub branch:         String,
  pub semester:       i64,
  pub is_active:      bool,
  pub documents:      String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawStudent {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      identity_id:    row.get(1)?,
      student_id:     row.get(2)?,
      name:           row.get(3)?,
      personal_email: row.get(4)?,
      phone:          row.get(5)?,
      gender:         row.get(6)?,
      dob:            row.get(7)?,
      address:        row.get(8)?,
      guardian_name:  row.get(9)?,
      course:         row.get(10)?,
      branch:         row.get(11)?,
      semester:       row.get(12)?,
      is_active:      row.get(13)?,
      documents:      row.get(14)?,
      created_at:     row.get(15)?,
      updated_at:     row.get(16)?,
    })
  }

  pub fn encode(s: &Student) -> Result<Self> {
    Ok(Self {
      id:             encode_uuid(s.id),
      identity_id:    encode_uuid(s.identity_id),
      student_id:     s.student_id.clone(),
      name:           s.name.clone(),
      personal_email: s.personal_email.clone(),
      phone:          s.phone.clone(),
      gender:         s.gender.clone(),
      dob:            encode_date(s.dob),
      address:        s.address.clone(),
      guardian_name:  s.guardian_name.clone(),
      course:         s.course.clone(),
      branch:         s.branch.clone(),
      semester:       i64::from(s.semester),
      is_active:      s.is_active,
      documents:      serde_json::to_string(&s.documents)?,
      created_at:     encode_dt(s.created_at),
      updated_at:     encode_dt(s.updated_at),
    })
  }

  pub fn bind(&self) -> [&dyn ToSql; 17] {
    [
      &self.id,
      &self.identity_id,
      &self.student_id,
      &self.name,
      &self.personal_email,
      &self.phone,
      &self.gender,
      &self.dob,
      &self.address,
      &self.guardian_name,
      &self.course,
      &self.branch,
      &self.semester,
      &self.is_active,
      &self.documents,
      &self.created_at,
      &self.updated_at,
    ]
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      id:             decode_uuid(&self.id)?,
      identity_id:    decode_uuid(&self.identity_id)?,
      student_id:     self.student_id,
      name:           self.name,
      personal_email: self.personal_email,
      phone:          self.phone,
      gender:         self.gender,
      dob:            decode_date(&self.dob)?,
      address:        self.address,
      guardian_name:  self.guardian_name,
      course:         self.course,
      branch:         self.branch,
      semester:       decode_semester(self.semester)?,
      is_active:      self.is_active,
      documents:      serde_json::from_str(&self.documents)?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

pub const FACULTY_COLUMNS: &str = "id, identity_id, faculty_id, name, personal_email, phone, \
                                   gender, dob, designation, course, branch, subject, \
                                   documents, created_at, updated_at";

pub struct RawFaculty {
  pub id:             String,
  pub identity_id:    String,
  pub faculty_id:     String,
  pub name:           String,
  pub personal_email: String,
  pub phone:          Option<String>,
  pub gender:         Option<String>,
  pub dob:            String,
  pub designation:    String,
  pub course:         String,
  pub branch:         String,
  pub subject:        Option<String>,
  pub documents:      String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawFaculty {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      identity_id:    row.get(1)?,
      faculty_id:     row.get(2)?,
      name:           row.get(3)?,
      personal_email: row.get(4)?,
      phone:          row.get(5)?,
      gender:         row.get(6)?,
      dob:            row.get(7)?,
      designation:    row.get(8)?,
      course:         row.get(9)?,
      branch:         row.get(10)?,
      subject:        row.get(11)?,
      documents:      row.get(12)?,
      created_at:     row.get(13)?,
      updated_at:     row.get(14)?,
    })
  }

  pub fn encode(f: &Faculty) -> Result<Self> {
    Ok(Self {
      id:             encode_uuid(f.id),
      identity_id:    encode_uuid(f.identity_id),
      faculty_id:     f.faculty_id.clone(),
      name:           f.name.clone(),
      personal_email: f.personal_email.clone(),
      phone:          f.phone.clone(),
      gender:         f.gender.clone(),
      dob:            encode_date(f.dob),
      designation:    f.designation.clone(),
      course:         f.course.clone(),
      branch:         f.branch.clone(),
      subject:        f.subject.clone(),
      documents:      serde_json::to_string(&f.documents)?,
      created_at:     encode_dt(f.created_at),
      updated_at:     encode_dt(f.updated_at),
    })
  }

  pub fn bind(&self) -> [&dyn ToSql; 15] {
    [
      &self.id,
      &self.identity_id,
      &self.faculty_id,
      &self.name,
      &self.personal_email,
      &self.phone,
      &self.gender,
      &self.dob,
      &self.designation,
      &self.course,
      &self.branch,
      &self.subject,
      &self.documents,
      &self.created_at,
      &self.updated_at,
    ]
  }

  pub fn into_faculty(self) -> Result<Faculty> {
    Ok(Faculty {
      id:             decode_uuid(&self.id)?,
      identity_id:    decode_uuid(&self.identity_id)?,
      faculty_id:     self.faculty_id,
      name:           self.name,
      personal_email: self.personal_email,
      phone:          self.phone,
      gender:         self.gender,
      dob:            decode_date(&self.dob)?,
      designation:    self.designation,
      course:         self.course,
      branch:         self.branch,
      subject:        self.subject,
      documents:      serde_json::from_str(&self.documents)?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

pub const ADMIN_COLUMNS: &str =
  "id, identity_id, admin_id, name, personal_email, phone, created_at, updated_at";

pub struct RawAdmin {
  pub id:             String,
  pub identity_id:    String,
  pub admin_id:       String,
  pub name:           String,
  pub personal_email: String,
  pub phone:          Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawAdmin {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      identity_id:    row.get(1)?,
      admin_id:       row.get(2)?,
      name:           row.get(3)?,
      personal_email: row.get(4)?,
      phone:          row.get(5)?,
      created_at:     row.get(6)?,
      updated_at:     row.get(7)?,
    })
  }

  pub fn encode(a: &Admin) -> Self {
    Self {
      id:             encode_uuid(a.id),
      identity_id:    encode_uuid(a.identity_id),
      admin_id:       a.admin_id.clone(),
      name:           a.name.clone(),
      personal_email: a.personal_email.clone(),
      phone:          a.phone.clone(),
      created_at:     encode_dt(a.created_at),
      updated_at:     encode_dt(a.updated_at),
    }
  }

  pub fn bind(&self) -> [&dyn ToSql; 8] {
    [
      &self.id,
      &self.identity_id,
      &self.admin_id,
      &self.name,
      &self.personal_email,
      &self.phone,
      &self.created_at,
      &self.updated_at,
    ]
  }

  pub fn into_admin(self) -> Result<Admin> {
    Ok(Admin {
      id:             decode_uuid(&self.id)?,
      identity_id:    decode_uuid(&self.identity_id)?,
      admin_id:       self.admin_id,
      name:           self.name,
      personal_email: self.personal_email,
      phone:          self.phone,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// A profile row of any kind.
pub enum RawProfile {
  Student(RawStudent),
  Faculty(RawFaculty),
  Admin(RawAdmin),
}

impl RawProfile {
  pub fn encode(p: &Profile) -> Result<Self> {
    Ok(match p {
      Profile::Student(s) => Self::Student(RawStudent::encode(s)?),
      Profile::Faculty(f) => Self::Faculty(RawFaculty::encode(f)?),
      Profile::Admin(a) => Self::Admin(RawAdmin::encode(a)),
    })
  }

  pub fn bind(&self) -> Vec<&dyn ToSql> {
    match self {
      Self::Student(s) => s.bind().to_vec(),
      Self::Faculty(f) => f.bind().to_vec(),
      Self::Admin(a) => a.bind().to_vec(),
    }
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(match self {
      Self::Student(s) => Profile::Student(s.into_student()?),
      Self::Faculty(f) => Profile::Faculty(f.into_faculty()?),
      Self::Admin(a) => Profile::Admin(a.into_admin()?),
    })
  }
}

// ─── Dependent records ───────────────────────────────────────────────────────

pub const ATTENDANCE_COLUMNS: &str =
  "id, student_id, date, status, marked_by, created_at, updated_at";

pub struct RawAttendance {
  pub id:         String,
  pub student_id: String,
  pub date:       String,
  pub status:     String,
  pub marked_by:  String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawAttendance {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      student_id: row.get(1)?,
      date:       row.get(2)?,
      status:     row.get(3)?,
      marked_by:  row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn encode(a: &Attendance) -> Self {
    Self {
      id:         encode_uuid(a.id),
      student_id: encode_uuid(a.student),
      date:       encode_date(a.date),
      status:     encode_attendance_status(a.status).to_owned(),
      marked_by:  encode_uuid(a.marked_by),
      created_at: encode_dt(a.created_at),
      updated_at: encode_dt(a.updated_at),
    }
  }

  pub fn bind(&self) -> [&dyn ToSql; 7] {
    [
      &self.id,
      &self.student_id,
      &self.date,
      &self.status,
      &self.marked_by,
      &self.created_at,
      &self.updated_at,
    ]
  }

  pub fn into_attendance(self) -> Result<Attendance> {
    Ok(Attendance {
      id:         decode_uuid(&self.id)?,
      student:    decode_uuid(&self.student_id)?,
      date:       decode_date(&self.date)?,
      status:     decode_attendance_status(&self.status)?,
      marked_by:  decode_uuid(&self.marked_by)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const REMARK_COLUMNS: &str = "id, student_id, author, body, created_at";

pub struct RawRemark {
  pub id:         String,
  pub student_id: String,
  pub author:     String,
  pub body:       String,
  pub created_at: String,
}

impl RawRemark {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      student_id: row.get(1)?,
      author:     row.get(2)?,
      body:       row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn encode(r: &Remark) -> Self {
    Self {
      id:         encode_uuid(r.id),
      student_id: encode_uuid(r.student),
      author:     encode_uuid(r.author),
      body:       r.body.clone(),
      created_at: encode_dt(r.created_at),
    }
  }

  pub fn into_remark(self) -> Result<Remark> {
    Ok(Remark {
      id:         decode_uuid(&self.id)?,
      student:    decode_uuid(&self.student_id)?,
      author:     decode_uuid(&self.author)?,
      body:       self.body,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const PERFORMANCE_COLUMNS: &str = "id, student_id, recorded_by, subject, exam, \
                                       marks_obtained, max_marks, semester, created_at";

pub struct RawPerformance {
  pub id:             String,
  pub student_id:     String,
  pub recorded_by:    String,
  pub subject:        String,
  pub exam:           String,
  pub marks_obtained: f64,
  pub max_marks:      f64,
  pub semester:       i64,
  pub created_at:     String,
}

impl RawPerformance {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      student_id:     row.get(1)?,
      recorded_by:    row.get(2)?,
      subject:        row.get(3)?,
      exam:           row.get(4)?,
      marks_obtained: row.get(5)?,
      max_marks:      row.get(6)?,
      semester:       row.get(7)?,
      created_at:     row.get(8)?,
    })
  }

  pub fn encode(p: &Performance) -> Self {
    Self {
      id:             encode_uuid(p.id),
      student_id:     encode_uuid(p.student),
      recorded_by:    encode_uuid(p.recorded_by),
      subject:        p.subject.clone(),
      exam:           p.exam.clone(),
      marks_obtained: p.marks_obtained,
      max_marks:      p.max_marks,
      semester:       i64::from(p.semester),
      created_at:     encode_dt(p.created_at),
    }
  }

  pub fn into_performance(self) -> Result<Performance> {
    Ok(Performance {
      id:             decode_uuid(&self.id)?,
      student:        decode_uuid(&self.student_id)?,
      recorded_by:    decode_uuid(&self.recorded_by)?,
      subject:        self.subject,
      exam:           self.exam,
      marks_obtained: self.marks_obtained,
      max_marks:      self.max_marks,
      semester:       decode_semester(self.semester)?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

pub const COURSE_COLUMNS: &str = "id, name, code, branches, created_at";

pub struct RawCourse {
  pub id:         String,
  pub name:       String,
  pub code:       Option<String>,
  pub branches:   String,
  pub created_at: String,
}

impl RawCourse {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      code:       row.get(2)?,
      branches:   row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn encode(c: &Course) -> Result<Self> {
    Ok(Self {
      id:         encode_uuid(c.id),
      name:       c.name.clone(),
      code:       c.code.clone(),
      branches:   serde_json::to_string(&c.branches)?,
      created_at: encode_dt(c.created_at),
    })
  }

  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      id:         decode_uuid(&self.id)?,
      name:       self.name,
      code:       self.code,
      branches:   serde_json::from_str(&self.branches)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

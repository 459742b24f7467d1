//! Dependent records: attendance, remarks and performance.
//!
//! Each record references one Student profile and the identity that wrote
//! it. They are removed together with the student they belong to.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  bulk::{BulkOutcome, BulkRow},
  catalog::MAX_SEMESTER,
  profile::{ProfileKind, Required, non_blank},
  store::CampusStore,
};

// ─── Attendance ──────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumIter,
)]
pub enum AttendanceStatus {
  Present,
  Absent,
  Late,
  Leave,
}

/// One student's attendance on one calendar day. At most one exists per
/// `(student, date)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
  pub id:         Uuid,
  pub student:    Uuid,
  pub date:       NaiveDate,
  pub status:     AttendanceStatus,
  /// Identity of the faculty member or admin who marked it.
  pub marked_by:  Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Upper-case the first character and lower-case the rest.
pub fn title_case(raw: &str) -> String {
  let mut chars = raw.trim().chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    None => String::new(),
  }
}

/// Parse an attendance status in any letter case.
pub fn normalize_status(raw: &str) -> Result<AttendanceStatus> {
  let wanted = title_case(raw);
  AttendanceStatus::iter()
    .find(|status| status.to_string() == wanted)
    .ok_or_else(|| {
      Error::validation(format!(
        "unknown attendance status {raw:?}; expected Present, Absent, Late or Leave"
      ))
    })
}

/// Reduce a date or timestamp to its calendar day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (the day in the timestamp's own
/// offset) and naive `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS`.
pub fn normalize_date(raw: &str) -> Result<NaiveDate> {
  let raw = raw.trim();
  if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    return Ok(date);
  }
  if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
    return Ok(ts.date_naive());
  }
  ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|ts| ts.date())
    .ok_or_else(|| Error::validation(format!("unrecognised date {raw:?}")))
}

/// A request to mark one student's attendance. `student` is a Student
/// profile id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendance {
  pub student: Option<String>,
  pub date:    Option<String>,
  pub status:  Option<String>,
}

/// The stored attendance row and whether this call created it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marked {
  pub attendance: Attendance,
  pub created:    bool,
}

impl MarkAttendance {
  /// Validate and normalise into an attendance candidate.
  pub fn into_candidate(self, marker: Uuid) -> Result<Attendance> {
    let mut req = Required::default();
    let student = req.text("student", self.student);
    let date = req.text("date", self.date);
    let status = req.text("status", self.status);
    req.finish()?;

    let student = Uuid::parse_str(&student)
      .map_err(|_| Error::validation(format!("student {student:?} is not a valid id")))?;
    let now = Utc::now();
    Ok(Attendance {
      id: Uuid::new_v4(),
      student,
      date: normalize_date(&date)?,
      status: normalize_status(&status)?,
      marked_by: marker,
      created_at: now,
      updated_at: now,
    })
  }
}

async fn require_student<S>(store: &S, student: Uuid) -> Result<()>
where
  S: CampusStore,
  Error: From<S::Error>,
{
  store
    .get_profile(ProfileKind::Student, student)
    .await?
    .map(|_| ())
    .ok_or_else(|| Error::not_found(format!("student {student} not found")))
}

/// Mark (insert or overwrite) one student's attendance for a day.
pub async fn mark_attendance<S>(store: &S, input: MarkAttendance, marker: Uuid) -> Result<Marked>
where
  S: CampusStore,
  Error: From<S::Error>,
{
  let candidate = input.into_candidate(marker)?;
  require_student(store, candidate.student).await?;

  let (attendance, created) = store.upsert_attendance(candidate).await?;
  tracing::debug!(
    student = %attendance.student,
    date = %attendance.date,
    status = %attendance.status,
    created,
    "attendance marked"
  );
  Ok(Marked { attendance, created })
}

/// Mark attendance for many rows. Rows are applied independently and in
/// order; a bad row is reported and skipped.
pub async fn mark_attendance_bulk<S, R>(store: &S, rows: Vec<R>, marker: Uuid) -> BulkOutcome
where
  S: CampusStore,
  Error: From<S::Error>,
  R: Into<BulkRow<MarkAttendance>>,
{
  let mut outcome = BulkOutcome::default();
  for (idx, row) in rows.into_iter().enumerate() {
    let row_no = idx + 1;
    let row: BulkRow<MarkAttendance> = row.into();
    let row = match row {
      BulkRow::Input(row) => row,
      BulkRow::Malformed { key, reason } => {
        outcome.skipped(row_no, key, reason);
        continue;
      }
    };
    let key = non_blank(row.student.clone());
    match mark_attendance(store, row, marker).await {
      Ok(_) => outcome.added(),
      Err(e) => outcome.skipped(row_no, key, e.to_string()),
    }
  }
  outcome
}

// ─── Remarks ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remark {
  pub id:         Uuid,
  pub student:    Uuid,
  /// Identity of the faculty member or admin who wrote it.
  pub author:     Uuid,
  pub body:       String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemarkInput {
  pub student: Option<Uuid>,
  pub remark:  Option<String>,
}

pub async fn add_remark<S>(store: &S, input: RemarkInput, author: Uuid) -> Result<Remark>
where
  S: CampusStore,
  Error: From<S::Error>,
{
  let mut req = Required::default();
  let student = req.value("student", input.student);
  let body = req.text("remark", input.remark);
  req.finish()?;

  require_student(store, student).await?;
  let remark = Remark { id: Uuid::new_v4(), student, author, body, created_at: Utc::now() };
  store.add_remark(remark.clone()).await?;
  Ok(remark)
}

// ─── Performance ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
  pub id:             Uuid,
  pub student:        Uuid,
  pub recorded_by:    Uuid,
  pub subject:        String,
  /// Assessment name, e.g. "Midterm".
  pub exam:           String,
  pub marks_obtained: f64,
  pub max_marks:      f64,
  pub semester:       u8,
  pub created_at:     DateTime<Utc>,
}

impl Performance {
  pub fn percentage(&self) -> f64 { self.marks_obtained / self.max_marks * 100.0 }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInput {
  pub student:        Option<Uuid>,
  pub subject:        Option<String>,
  pub exam:           Option<String>,
  pub marks_obtained: Option<f64>,
  pub max_marks:      Option<f64>,
  pub semester:       Option<u8>,
}

impl PerformanceInput {
  pub fn into_performance(self, recorded_by: Uuid) -> Result<Performance> {
    let mut req = Required::default();
    let student = req.value("student", self.student);
    let subject = req.text("subject", self.subject);
    let exam = req.text("exam", self.exam);
    let marks_obtained = req.value("marksObtained", self.marks_obtained);
    let max_marks = req.value("maxMarks", self.max_marks);
    let semester = req.value("semester", self.semester);
    req.finish()?;

    if !(max_marks > 0.0) {
      return Err(Error::validation("maxMarks must be greater than zero"));
    }
    if !(0.0..=max_marks).contains(&marks_obtained) {
      return Err(Error::validation(format!(
        "marksObtained {marks_obtained} must be between 0 and {max_marks}"
      )));
    }
    if !(1..=MAX_SEMESTER).contains(&semester) {
      return Err(Error::validation(format!("semester must be between 1 and {MAX_SEMESTER}")));
    }

    Ok(Performance {
      id: Uuid::new_v4(),
      student,
      recorded_by,
      subject,
      exam,
      marks_obtained,
      max_marks,
      semester,
      created_at: Utc::now(),
    })
  }
}

pub async fn record_performance<S>(
  store: &S,
  input: PerformanceInput,
  recorded_by: Uuid,
) -> Result<Performance>
where
  S: CampusStore,
  Error: From<S::Error>,
{
  let performance = input.into_performance(recorded_by)?;
  require_student(store, performance.student).await?;
  store.add_performance(performance.clone()).await?;
  Ok(performance)
}

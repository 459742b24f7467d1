//! [`SqliteStore`], the SQLite implementation of [`CampusStore`].

use std::path::Path;

use campus_core::{
  catalog::Course,
  identity::Identity,
  profile::{Profile, ProfileKind},
  record::{Attendance, Performance, Remark},
  store::{CampusStore, CascadeReport},
};
use rusqlite::{OptionalExtension as _, ToSql};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ADMIN_COLUMNS, ATTENDANCE_COLUMNS, COURSE_COLUMNS, FACULTY_COLUMNS, IDENTITY_COLUMNS,
    PERFORMANCE_COLUMNS, REMARK_COLUMNS, RawAdmin, RawAttendance, RawCourse, RawFaculty,
    RawIdentity, RawPerformance, RawProfile, RawRemark, RawStudent, STUDENT_COLUMNS, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Table helpers ───────────────────────────────────────────────────────────

fn table(kind: ProfileKind) -> &'static str {
  match kind {
    ProfileKind::Student => "students",
    ProfileKind::Faculty => "faculty",
    ProfileKind::Admin => "admins",
  }
}

fn key_column(kind: ProfileKind) -> &'static str {
  match kind {
    ProfileKind::Student => "student_id",
    ProfileKind::Faculty => "faculty_id",
    ProfileKind::Admin => "admin_id",
  }
}

fn columns(kind: ProfileKind) -> &'static str {
  match kind {
    ProfileKind::Student => STUDENT_COLUMNS,
    ProfileKind::Faculty => FACULTY_COLUMNS,
    ProfileKind::Admin => ADMIN_COLUMNS,
  }
}

fn raw_kind(raw: &RawProfile) -> ProfileKind {
  match raw {
    RawProfile::Student(_) => ProfileKind::Student,
    RawProfile::Faculty(_) => ProfileKind::Faculty,
    RawProfile::Admin(_) => ProfileKind::Admin,
  }
}

/// `?1, ?2, …, ?n`
fn placeholders(n: usize) -> String {
  (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

/// `col2 = ?2, col3 = ?3, …`; the first column is the key and is bound as `?1`.
fn assignments(columns: &str) -> String {
  columns
    .split(',')
    .map(str::trim)
    .enumerate()
    .skip(1)
    .map(|(i, col)| format!("{col} = ?{}", i + 1))
    .collect::<Vec<_>>()
    .join(", ")
}

fn insert_identity(conn: &rusqlite::Connection, raw: &RawIdentity) -> rusqlite::Result<()> {
  conn.execute(
    &format!("INSERT INTO identities ({IDENTITY_COLUMNS}) VALUES ({})", placeholders(7)),
    &raw.bind()[..],
  )?;
  Ok(())
}

fn insert_profile(conn: &rusqlite::Connection, raw: &RawProfile) -> rusqlite::Result<()> {
  let kind = raw_kind(raw);
  let values = raw.bind();
  conn.execute(
    &format!(
      "INSERT INTO {} ({}) VALUES ({})",
      table(kind),
      columns(kind),
      placeholders(values.len())
    ),
    &values[..],
  )?;
  Ok(())
}

fn query_profiles(
  conn: &rusqlite::Connection,
  kind: ProfileKind,
  filter: &str,
  params: &[&dyn ToSql],
) -> rusqlite::Result<Vec<RawProfile>> {
  let sql = format!("SELECT {} FROM {} {filter}", columns(kind), table(kind));
  let mut stmt = conn.prepare(&sql)?;
  let rows = match kind {
    ProfileKind::Student => stmt
      .query_map(params, |r| RawStudent::read(r).map(RawProfile::Student))?
      .collect::<rusqlite::Result<Vec<_>>>()?,
    ProfileKind::Faculty => stmt
      .query_map(params, |r| RawFaculty::read(r).map(RawProfile::Faculty))?
      .collect::<rusqlite::Result<Vec<_>>>()?,
    ProfileKind::Admin => stmt
      .query_map(params, |r| RawAdmin::read(r).map(RawProfile::Admin))?
      .collect::<rusqlite::Result<Vec<_>>>()?,
  };
  Ok(rows)
}

fn query_identities(
  conn: &rusqlite::Connection,
  filter: &str,
  params: &[&dyn ToSql],
) -> rusqlite::Result<Vec<RawIdentity>> {
  let mut stmt = conn.prepare(&format!("SELECT {IDENTITY_COLUMNS} FROM identities {filter}"))?;
  let rows = stmt.query_map(params, RawIdentity::read)?.collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A campus store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn one_identity(&self, filter: &'static str, param: String) -> Result<Option<Identity>> {
    let raw = self
      .conn
      .call(move |conn| Ok(query_identities(conn, filter, &[&param])?.into_iter().next()))
      .await?;
    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn one_profile(
    &self,
    kind: ProfileKind,
    filter: &'static str,
    param: String,
  ) -> Result<Option<Profile>> {
    let raw = self
      .conn
      .call(move |conn| Ok(query_profiles(conn, kind, filter, &[&param])?.into_iter().next()))
      .await?;
    raw.map(RawProfile::into_profile).transpose()
  }

  async fn one_course(&self, filter: &'static str, param: String) -> Result<Option<Course>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COURSE_COLUMNS} FROM courses {filter}"),
            rusqlite::params![param],
            RawCourse::read,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawCourse::into_course).transpose()
  }
}

// ─── CampusStore impl ────────────────────────────────────────────────────────

impl CampusStore for SqliteStore {
  type Error = Error;

  // ── Identities ────────────────────────────────────────────────────────────

  async fn get_identity(&self, id: Uuid) -> Result<Option<Identity>> {
    self.one_identity("WHERE identity_id = ?1", encode_uuid(id)).await
  }

  async fn find_identity_by_login(&self, login_key: String) -> Result<Option<Identity>> {
    // login_key is declared COLLATE NOCASE
    self.one_identity("WHERE login_key = ?1", login_key.trim().to_owned()).await
  }

  async fn count_identities(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM identities", [], |r| r.get(0))?))
      .await?;
    Ok(n.max(0) as u64)
  }

  async fn orphaned_identities(&self) -> Result<Vec<Identity>> {
    let raws = self
      .conn
      .call(|conn| {
        Ok(query_identities(
          conn,
          "WHERE identity_id NOT IN (SELECT identity_id FROM students)
             AND identity_id NOT IN (SELECT identity_id FROM faculty)
             AND identity_id NOT IN (SELECT identity_id FROM admins)
           ORDER BY created_at",
          &[],
        )?)
      })
      .await?;
    raws.into_iter().map(RawIdentity::into_identity).collect()
  }

  async fn delete_identity(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM identities WHERE identity_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn provision(&self, identity: Identity, profile: Profile) -> Result<()> {
    let raw_identity = RawIdentity::encode(&identity);
    let raw_profile = RawProfile::encode(&profile)?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_identity(&tx, &raw_identity)?;
        insert_profile(&tx, &raw_profile)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_profile(&self, kind: ProfileKind, id: Uuid) -> Result<Option<Profile>> {
    self.one_profile(kind, "WHERE id = ?1", encode_uuid(id)).await
  }

  async fn find_profile_by_key(
    &self,
    kind: ProfileKind,
    natural_key: String,
  ) -> Result<Option<Profile>> {
    let filter = match kind {
      ProfileKind::Student => "WHERE student_id = ?1",
      ProfileKind::Faculty => "WHERE faculty_id = ?1",
      ProfileKind::Admin => "WHERE admin_id = ?1",
    };
    self.one_profile(kind, filter, natural_key).await
  }

  async fn find_profile_by_identity(&self, identity_id: Uuid) -> Result<Option<Profile>> {
    for kind in [ProfileKind::Student, ProfileKind::Faculty, ProfileKind::Admin] {
      let found = self.one_profile(kind, "WHERE identity_id = ?1", encode_uuid(identity_id)).await?;
      if found.is_some() {
        return Ok(found);
      }
    }
    Ok(None)
  }

  async fn list_profiles(&self, kind: ProfileKind) -> Result<Vec<Profile>> {
    let order = format!("ORDER BY {}", key_column(kind));
    let raws = self.conn.call(move |conn| Ok(query_profiles(conn, kind, &order, &[])?)).await?;
    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn revise(&self, identity: Identity, profile: Profile) -> Result<()> {
    let raw_identity = RawIdentity::encode(&identity);
    let raw_profile = RawProfile::encode(&profile)?;
    let kind = profile.kind();

    let revised = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n_identity = tx.execute(
          &format!(
            "UPDATE identities SET {} WHERE identity_id = ?1",
            assignments(IDENTITY_COLUMNS)
          ),
          &raw_identity.bind()[..],
        )?;
        let n_profile = tx.execute(
          &format!("UPDATE {} SET {} WHERE id = ?1", table(kind), assignments(columns(kind))),
          &raw_profile.bind()[..],
        )?;
        if n_identity == 0 || n_profile == 0 {
          // dropping `tx` rolls back
          return Ok(false);
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !revised {
      return Err(
        campus_core::Error::not_found(format!("{kind} {} not found", profile.id())).into(),
      );
    }
    Ok(())
  }

  async fn deprovision(&self, profile: Profile) -> Result<CascadeReport> {
    let kind = profile.kind();
    let id_str = encode_uuid(profile.id());
    let identity_str = encode_uuid(profile.identity_id());

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut report = CascadeReport::default();
        match kind {
          ProfileKind::Student => {
            report.attendance = tx.execute(
              "DELETE FROM attendance WHERE student_id = ?1",
              rusqlite::params![id_str],
            )?;
            report.remarks =
              tx.execute("DELETE FROM remarks WHERE student_id = ?1", rusqlite::params![id_str])?;
            report.performance = tx.execute(
              "DELETE FROM performance WHERE student_id = ?1",
              rusqlite::params![id_str],
            )?;
          }
          ProfileKind::Faculty => {
            report.remarks = tx.execute(
              "DELETE FROM remarks WHERE author = ?1",
              rusqlite::params![identity_str],
            )?;
          }
          ProfileKind::Admin => {}
        }

        let removed = tx.execute(
          &format!("DELETE FROM {} WHERE id = ?1", table(kind)),
          rusqlite::params![id_str],
        )?;
        if removed == 0 {
          return Ok(None);
        }
        tx.execute(
          "DELETE FROM identities WHERE identity_id = ?1",
          rusqlite::params![identity_str],
        )?;
        tx.commit()?;
        Ok(Some(report))
      })
      .await?;

    report.ok_or_else(|| {
      campus_core::Error::not_found(format!("{kind} {} not found", profile.id())).into()
    })
  }

  // ── Dependent records ─────────────────────────────────────────────────────

  async fn upsert_attendance(&self, candidate: Attendance) -> Result<(Attendance, bool)> {
    let raw = RawAttendance::encode(&candidate);

    let stored = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO attendance ({ATTENDANCE_COLUMNS}) VALUES ({})
             ON CONFLICT (student_id, date) DO UPDATE SET
               status     = excluded.status,
               marked_by  = excluded.marked_by,
               updated_at = excluded.updated_at
             RETURNING {ATTENDANCE_COLUMNS}",
            placeholders(7)
          ),
          &raw.bind()[..],
          RawAttendance::read,
        )?)
      })
      .await?
      .into_attendance()?;

    let created = stored.id == candidate.id;
    Ok((stored, created))
  }

  async fn list_attendance(&self, student: Uuid) -> Result<Vec<Attendance>> {
    let student_str = encode_uuid(student);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE student_id = ?1 ORDER BY date"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![student_str], RawAttendance::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAttendance::into_attendance).collect()
  }

  async fn add_remark(&self, remark: Remark) -> Result<()> {
    let raw = RawRemark::encode(&remark);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO remarks ({REMARK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
          rusqlite::params![raw.id, raw.student_id, raw.author, raw.body, raw.created_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_remarks(&self, student: Uuid) -> Result<Vec<Remark>> {
    self.remarks_where("student_id = ?1", encode_uuid(student)).await
  }

  async fn list_remarks_by_author(&self, author: Uuid) -> Result<Vec<Remark>> {
    self.remarks_where("author = ?1", encode_uuid(author)).await
  }

  async fn add_performance(&self, performance: Performance) -> Result<()> {
    let raw = RawPerformance::encode(&performance);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO performance ({PERFORMANCE_COLUMNS}) VALUES ({})",
            placeholders(9)
          ),
          rusqlite::params![
            raw.id,
            raw.student_id,
            raw.recorded_by,
            raw.subject,
            raw.exam,
            raw.marks_obtained,
            raw.max_marks,
            raw.semester,
            raw.created_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_performance(&self, student: Uuid) -> Result<Vec<Performance>> {
    let student_str = encode_uuid(student);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERFORMANCE_COLUMNS} FROM performance
           WHERE student_id = ?1 ORDER BY semester, created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![student_str], RawPerformance::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawPerformance::into_performance).collect()
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn add_course(&self, course: Course) -> Result<()> {
    let raw = RawCourse::encode(&course)?;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO courses ({COURSE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
          rusqlite::params![raw.id, raw.name, raw.code, raw.branches, raw.created_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
    self.one_course("WHERE id = ?1", encode_uuid(id)).await
  }

  async fn find_course_by_name(&self, name: String) -> Result<Option<Course>> {
    // name is declared COLLATE NOCASE
    self.one_course("WHERE name = ?1", name.trim().to_owned()).await
  }

  async fn list_courses(&self) -> Result<Vec<Course>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY name"))?;
        let rows = stmt.query_map([], RawCourse::read)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawCourse::into_course).collect()
  }

  async fn replace_course(&self, course: Course) -> Result<bool> {
    let raw = RawCourse::encode(&course)?;
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE courses SET name = ?2, code = ?3, branches = ?4 WHERE id = ?1",
          rusqlite::params![raw.id, raw.name, raw.code, raw.branches],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn delete_course(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM courses WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(n > 0)
  }
}

impl SqliteStore {
  async fn remarks_where(&self, filter: &'static str, param: String) -> Result<Vec<Remark>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REMARK_COLUMNS} FROM remarks WHERE {filter} ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![param], RawRemark::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawRemark::into_remark).collect()
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Run a raw statement, bypassing the store's invariants.
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    Ok(self.conn.call(move |conn| Ok(conn.execute(sql, [])?)).await?)
  }
}

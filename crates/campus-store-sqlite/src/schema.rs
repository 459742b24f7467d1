//! SQL schema for the campus SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Login records. login_key is unique regardless of role.
CREATE TABLE IF NOT EXISTS identities (
    identity_id   TEXT PRIMARY KEY,
    login_key     TEXT NOT NULL COLLATE NOCASE UNIQUE,
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL,   -- 'ADMIN' | 'FACULTY' | 'STUDENT'
    status        TEXT NOT NULL,   -- 'Active' | 'Inactive'
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS students (
    id             TEXT PRIMARY KEY,
    identity_id    TEXT NOT NULL UNIQUE REFERENCES identities(identity_id),
    student_id     TEXT NOT NULL UNIQUE,
    name           TEXT NOT NULL,
    personal_email TEXT NOT NULL,
    phone          TEXT,
    gender         TEXT,
    dob            TEXT NOT NULL,   -- YYYY-MM-DD
    address        TEXT,
    guardian_name  TEXT,
    course         TEXT NOT NULL,
    branch         TEXT NOT NULL,
    semester       INTEGER NOT NULL,
    is_active      INTEGER NOT NULL,
    documents      TEXT NOT NULL DEFAULT '[]',
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS faculty (
    id             TEXT PRIMARY KEY,
    identity_id    TEXT NOT NULL UNIQUE REFERENCES identities(identity_id),
    faculty_id     TEXT NOT NULL UNIQUE,
    name           TEXT NOT NULL,
    personal_email TEXT NOT NULL,
    phone          TEXT,
    gender         TEXT,
    dob            TEXT NOT NULL,
    designation    TEXT NOT NULL,
    course         TEXT NOT NULL,
    branch         TEXT NOT NULL,
    subject        TEXT,
    documents      TEXT NOT NULL DEFAULT '[]',
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS admins (
    id             TEXT PRIMARY KEY,
    identity_id    TEXT NOT NULL UNIQUE REFERENCES identities(identity_id),
    admin_id       TEXT NOT NULL UNIQUE,
    name           TEXT NOT NULL,
    personal_email TEXT NOT NULL,
    phone          TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- At most one row per student per calendar day.
CREATE TABLE IF NOT EXISTS attendance (
    id         TEXT PRIMARY KEY,
    student_id TEXT NOT NULL REFERENCES students(id),
    date       TEXT NOT NULL,       -- YYYY-MM-DD
    status     TEXT NOT NULL,       -- 'Present' | 'Absent' | 'Late' | 'Leave'
    marked_by  TEXT NOT NULL,       -- identity_id
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (student_id, date)
);

CREATE TABLE IF NOT EXISTS remarks (
    id         TEXT PRIMARY KEY,
    student_id TEXT NOT NULL REFERENCES students(id),
    author     TEXT NOT NULL,       -- identity_id
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS performance (
    id             TEXT PRIMARY KEY,
    student_id     TEXT NOT NULL REFERENCES students(id),
    recorded_by    TEXT NOT NULL,   -- identity_id
    subject        TEXT NOT NULL,
    exam           TEXT NOT NULL,
    marks_obtained REAL NOT NULL,
    max_marks      REAL NOT NULL,
    semester       INTEGER NOT NULL,
    created_at     TEXT NOT NULL
);

-- Branches and their subjects are stored as a JSON array.
CREATE TABLE IF NOT EXISTS courses (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL COLLATE NOCASE UNIQUE,
    code       TEXT,
    branches   TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS remarks_student_idx     ON remarks(student_id);
CREATE INDEX IF NOT EXISTS remarks_author_idx      ON remarks(author);
CREATE INDEX IF NOT EXISTS performance_student_idx ON performance(student_id);

PRAGMA user_version = 1;
";

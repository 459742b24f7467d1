//! Identity: the authenticatable login record.
//!
//! Exactly one identity exists per login-capable actor. Student and Faculty
//! identities are only ever created as a side effect of provisioning their
//! profile; Admin identities are created together with the Admin profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role tag carried by an identity.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
  Admin,
  #[serde(alias = "TEACHER")]
  Faculty,
  Student,
}

/// Whether an identity may log in. Independent of a student's `is_active`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display,
)]
pub enum AccountStatus {
  #[default]
  Active,
  Inactive,
}

/// A login record: unique login key, credential hash, role and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
  pub identity_id:   Uuid,
  /// Email-shaped login key; globally unique regardless of role.
  pub login_key:     String,
  pub name:          String,
  /// PHC string; opaque to everything except the [`crate::secret::SecretHasher`].
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub role:          Role,
  pub status:        AccountStatus,
  pub created_at:    DateTime<Utc>,
}

impl Identity {
  /// Build a fresh, active identity.
  pub fn new(
    login_key: impl Into<String>,
    name: impl Into<String>,
    password_hash: String,
    role: Role,
  ) -> Self {
    Self {
      identity_id: Uuid::new_v4(),
      login_key: login_key.into(),
      name: name.into(),
      password_hash,
      role,
      status: AccountStatus::Active,
      created_at: Utc::now(),
    }
  }

  pub fn is_active(&self) -> bool { self.status == AccountStatus::Active }
}

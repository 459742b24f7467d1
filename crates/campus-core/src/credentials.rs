//! Credential derivation for provisioned Student and Faculty identities.
//!
//! The initial secret is the birth date rewritten as `DD/MM/YYYY`. It is
//! disclosed once in the creation response and only its hash is persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Domain appended to a natural key to form the login key.
pub const LOGIN_DOMAIN: &str = "school.com";

/// Plaintext credentials returned once when a profile is provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
  #[serde(rename = "email")]
  pub login_key:      String,
  #[serde(rename = "password")]
  pub initial_secret: String,
}

/// Trim and upper-case a natural key (`studentId`, `facultyId`, `adminId`).
pub fn normalize_natural_key(raw: &str) -> String { raw.trim().to_uppercase() }

/// The login key for a natural key.
pub fn login_key_for(natural_key: &str) -> String {
  format!("{natural_key}@{LOGIN_DOMAIN}")
}

/// Map a (pre-normalised) natural key and a `YYYY-MM-DD` birth date to a
/// login key and an initial secret.
///
/// Pure: fails only when the birth date does not split into exactly three
/// `-`-separated components.
pub fn derive_credentials(natural_key: &str, dob: &str) -> Result<Credentials> {
  let parts: Vec<&str> = dob.trim().split('-').collect();
  let [year, month, day] = parts.as_slice() else {
    return Err(Error::validation(format!(
      "birth date {dob:?} must be in YYYY-MM-DD form"
    )));
  };

  Ok(Credentials {
    login_key:      login_key_for(natural_key),
    initial_secret: format!("{day}/{month}/{year}"),
  })
}

/// Parse a `YYYY-MM-DD` birth date into a calendar date.
pub fn parse_birth_date(dob: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(dob.trim(), "%Y-%m-%d").map_err(|_| {
    Error::validation(format!("birth date {dob:?} is not a valid calendar date"))
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn derives_login_key_and_secret() {
    let creds = derive_credentials("S101", "2006-05-15").unwrap();
    assert_eq!(creds.login_key, "S101@school.com");
    assert_eq!(creds.initial_secret, "15/05/2006");
  }

  #[test]
  fn derivation_is_deterministic_for_any_key() {
    for key in ["F7", "ABC-001", "X"] {
      let a = derive_credentials(key, "1990-01-02").unwrap();
      let b = derive_credentials(key, "1990-01-02").unwrap();
      assert_eq!(a, b);
      assert_eq!(a.login_key, format!("{key}@school.com"));
      assert_eq!(a.initial_secret, "02/01/1990");
    }
  }

  #[test]
  fn wrong_separator_is_rejected() {
    let err = derive_credentials("S101", "2006/05/15").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn too_many_components_are_rejected() {
    assert!(matches!(
      derive_credentials("S101", "2006-05-15-01"),
      Err(Error::Validation(_))
    ));
    assert!(matches!(derive_credentials("S101", ""), Err(Error::Validation(_))));
  }

  #[test]
  fn natural_keys_are_upper_cased() {
    assert_eq!(normalize_natural_key("  s101 "), "S101");
  }

  #[test]
  fn birth_date_must_be_a_real_date() {
    assert_eq!(
      parse_birth_date("2006-05-15").unwrap(),
      NaiveDate::from_ymd_opt(2006, 5, 15).unwrap()
    );
    assert!(matches!(parse_birth_date("2006-13-40"), Err(Error::Validation(_))));
  }
}

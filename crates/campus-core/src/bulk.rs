//! Per-row outcome reporting for bulk imports.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Why a single row of a bulk request was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
  /// 1-based position of the row in the request.
  pub row:    usize,
  /// The row's natural key (or student reference), when it had one.
  pub key:    Option<String>,
  pub reason: String,
}

/// Result of a bulk operation. Bulk operations never abort: every row is
/// either counted in `added_count` or reported once in `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
  pub added_count:   usize,
  pub skipped_count: usize,
  pub errors:        Vec<RowError>,
}

impl BulkOutcome {
  pub fn added(&mut self) { self.added_count += 1; }

  pub fn skipped(&mut self, row: usize, key: Option<String>, reason: impl Into<String>) {
    let reason = reason.into();
    tracing::warn!(row, key = key.as_deref().unwrap_or("-"), %reason, "bulk row skipped");
    self.skipped_count += 1;
    self.errors.push(RowError { row, key, reason });
  }
}

/// One row of a bulk request: either decoded input or the reason it could
/// not be decoded.
#[derive(Debug, Clone)]
pub enum BulkRow<T> {
  Input(T),
  Malformed { key: Option<String>, reason: String },
}

impl<T> From<T> for BulkRow<T> {
  fn from(input: T) -> Self { Self::Input(input) }
}

impl<T: DeserializeOwned> BulkRow<T> {
  /// Decode one untyped row. `key_field` names the member reported as the
  /// row's key when decoding fails.
  pub fn decode(value: Value, key_field: &str) -> Self {
    let key = match value.get(key_field) {
      Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_owned()),
      Some(Value::Number(n)) => Some(n.to_string()),
      _ => None,
    };
    match serde_json::from_value(value) {
      Ok(input) => Self::Input(input),
      Err(e) => Self::Malformed { key, reason: format!("malformed row: {e}") },
    }
  }
}

/// Decode every row of a bulk request body independently.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>, key_field: &str) -> Vec<BulkRow<T>> {
  rows.into_iter().map(|row| BulkRow::decode(row, key_field)).collect()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::profile::StudentInput;

  #[test]
  fn a_badly_typed_row_is_malformed_not_fatal() {
    let rows = decode_rows::<StudentInput>(
      vec![
        json!({ "studentId": "S101", "semester": 1 }),
        json!({ "studentId": "S102", "semester": "2" }),
        json!({ "studentId": 104 }),
        json!("not an object"),
      ],
      "studentId",
    );

    assert!(matches!(rows[0], BulkRow::Input(_)));
    let BulkRow::Malformed { key, reason } = &rows[1] else { panic!("row 2 should be malformed") };
    assert_eq!(key.as_deref(), Some("S102"));
    assert!(reason.contains("malformed"), "{reason}");
    let BulkRow::Malformed { key, .. } = &rows[2] else { panic!("row 3 should be malformed") };
    assert_eq!(key.as_deref(), Some("104"));
    assert!(matches!(rows[3], BulkRow::Malformed { key: None, .. }));
  }
}

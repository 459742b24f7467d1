//! The course catalog: Course → Branch → Subject.
//!
//! Profiles store their course/branch/subject as label snapshots. Labels are
//! resolved against the catalog when written; drift introduced by later
//! catalog edits is reported by
//! [`Provisioner::catalog_drift`](crate::provision::Provisioner::catalog_drift).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Highest semester a student or subject may be placed in.
pub const MAX_SEMESTER: u8 = 8;

/// The form catalog names are compared in: trimmed and lower-cased.
pub fn fold_name(name: &str) -> String { name.trim().to_lowercase() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSubject {
  pub name:     String,
  #[serde(default)]
  pub code:     Option<String>,
  pub semester: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
  pub name:     String,
  /// Ordered as entered.
  #[serde(default)]
  pub subjects: Vec<CourseSubject>,
}

impl Branch {
  pub fn subject(&self, name: &str) -> Option<&CourseSubject> {
    let wanted = fold_name(name);
    self.subjects.iter().find(|s| fold_name(&s.name) == wanted)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id:         Uuid,
  pub name:       String,
  pub code:       Option<String>,
  /// Ordered as entered.
  pub branches:   Vec<Branch>,
  pub created_at: DateTime<Utc>,
}

impl Course {
  pub fn branch(&self, name: &str) -> Option<&Branch> {
    let wanted = fold_name(name);
    self.branches.iter().find(|b| fold_name(&b.name) == wanted)
  }
}

/// Body accepted when creating or replacing a course.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
  pub name:     Option<String>,
  pub code:     Option<String>,
  #[serde(default)]
  pub branches: Vec<Branch>,
}

impl CourseInput {
  /// Validate and build a course with the given identity.
  pub fn into_course(self, id: Uuid, created_at: DateTime<Utc>) -> Result<Course> {
    let name = self
      .name
      .map(|n| n.trim().to_owned())
      .filter(|n| !n.is_empty())
      .ok_or_else(|| Error::validation("missing required fields: name"))?;

    let branches: Vec<Branch> = self
      .branches
      .into_iter()
      .map(|branch| Branch {
        name:     branch.name.trim().to_owned(),
        subjects: branch
          .subjects
          .into_iter()
          .map(|subject| CourseSubject { name: subject.name.trim().to_owned(), ..subject })
          .collect(),
      })
      .collect();

    let mut seen = HashSet::new();
    for branch in &branches {
      let key = fold_name(&branch.name);
      if key.is_empty() {
        return Err(Error::validation(format!("course {name:?} has a branch without a name")));
      }
      if !seen.insert(key) {
        return Err(Error::validation(format!(
          "course {name:?} lists branch {:?} more than once",
          branch.name
        )));
      }
      for subject in &branch.subjects {
        if subject.name.trim().is_empty() {
          return Err(Error::validation(format!(
            "branch {:?} has a subject without a name",
            branch.name
          )));
        }
        if !(1..=MAX_SEMESTER).contains(&subject.semester) {
          return Err(Error::validation(format!(
            "subject {:?} has semester {} outside 1..={MAX_SEMESTER}",
            subject.name, subject.semester
          )));
        }
      }
    }

    Ok(Course { id, name, code: self.code, branches, created_at })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn subject(name: &str, semester: u8) -> CourseSubject {
    CourseSubject { name: name.into(), code: None, semester }
  }

  #[test]
  fn builds_course_and_resolves_case_insensitively() {
    let course = CourseInput {
      name:     Some(" B.Tech ".into()),
      code:     Some("BT".into()),
      branches: vec![Branch {
        name:     "Computer Science".into(),
        subjects: vec![subject("Algorithms", 3)],
      }],
    }
    .into_course(Uuid::new_v4(), Utc::now())
    .unwrap();

    assert_eq!(course.name, "B.Tech");
    let branch = course.branch("computer science").unwrap();
    assert!(branch.subject("ALGORITHMS").is_some());
    assert!(course.branch("Mechanical").is_none());
  }

  #[test]
  fn duplicate_branch_names_are_rejected() {
    let input = CourseInput {
      name:     Some("B.Tech".into()),
      code:     None,
      branches: vec![
        Branch { name: "CSE".into(), subjects: vec![] },
        Branch { name: "cse".into(), subjects: vec![] },
      ],
    };
    assert!(matches!(
      input.into_course(Uuid::new_v4(), Utc::now()),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn subject_semester_must_be_in_range() {
    let input = CourseInput {
      name:     Some("B.Sc".into()),
      code:     None,
      branches: vec![Branch { name: "Physics".into(), subjects: vec![subject("Optics", 0)] }],
    };
    assert!(matches!(
      input.into_course(Uuid::new_v4(), Utc::now()),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn names_are_stored_trimmed() {
    let course = CourseInput {
      name:     Some("M.Tech".into()),
      code:     None,
      branches: vec![Branch { name: " ECE ".into(), subjects: vec![subject("  VLSI ", 1)] }],
    }
    .into_course(Uuid::new_v4(), Utc::now())
    .unwrap();

    assert_eq!(course.branches[0].name, "ECE");
    assert_eq!(course.branches[0].subjects[0].name, "VLSI");
    let branch = course.branch("ece").unwrap();
    assert!(branch.subject("vlsi").is_some());
  }

  #[test]
  fn lookup_folds_non_ascii_case() {
    let course = CourseInput {
      name:     Some("B.A.".into()),
      code:     None,
      branches: vec![Branch { name: "Études".into(), subjects: vec![] }],
    }
    .into_course(Uuid::new_v4(), Utc::now())
    .unwrap();
    assert!(course.branch("ÉTUDES").is_some());
  }

  #[test]
  fn name_is_required() {
    assert!(matches!(
      CourseInput::default().into_course(Uuid::new_v4(), Utc::now()),
      Err(Error::Validation(_))
    ));
  }
}

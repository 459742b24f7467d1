//! Role-based authorization, evaluated once per request against a single
//! table.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, identity::Role};

/// The authenticated caller, as supplied by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
  pub identity_id: Uuid,
  pub role:        Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Resource {
  Student,
  Faculty,
  Admin,
  Attendance,
  Remark,
  Performance,
  Course,
  Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
  Create,
  Read,
  Update,
  Delete,
}

/// How much of a resource a role may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  Denied,
  /// Only records belonging to the actor's own profile.
  Own,
  Any,
}

/// One row of the policy table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
  pub resource: Resource,
  pub action:   Action,
  pub admin:    Access,
  pub faculty:  Access,
  pub student:  Access,
}

const fn rule(
  resource: Resource,
  action: Action,
  admin: Access,
  faculty: Access,
  student: Access,
) -> Rule {
  Rule { resource, action, admin, faculty, student }
}

use Access::{Any, Denied, Own};
use Action::{Create, Delete, Read, Update};

/// Every permitted (resource, action) pair. Anything absent is denied.
pub const POLICY: &[Rule] = &[
  rule(Resource::Student, Create, Any, Denied, Denied),
  rule(Resource::Student, Read, Any, Any, Own),
  rule(Resource::Student, Update, Any, Denied, Denied),
  rule(Resource::Student, Delete, Any, Denied, Denied),
  rule(Resource::Faculty, Create, Any, Denied, Denied),
  rule(Resource::Faculty, Read, Any, Any, Denied),
  rule(Resource::Faculty, Update, Any, Denied, Denied),
  rule(Resource::Faculty, Delete, Any, Denied, Denied),
  rule(Resource::Admin, Create, Any, Denied, Denied),
  rule(Resource::Admin, Read, Any, Denied, Denied),
  rule(Resource::Admin, Update, Any, Denied, Denied),
  rule(Resource::Admin, Delete, Any, Denied, Denied),
  rule(Resource::Attendance, Create, Any, Any, Denied),
  rule(Resource::Attendance, Read, Any, Any, Own),
  rule(Resource::Remark, Create, Any, Any, Denied),
  rule(Resource::Remark, Read, Any, Any, Own),
  rule(Resource::Performance, Create, Any, Any, Denied),
  rule(Resource::Performance, Read, Any, Any, Own),
  rule(Resource::Course, Create, Any, Denied, Denied),
  rule(Resource::Course, Read, Any, Any, Any),
  rule(Resource::Course, Update, Any, Denied, Denied),
  rule(Resource::Course, Delete, Any, Denied, Denied),
  rule(Resource::Maintenance, Read, Any, Denied, Denied),
  rule(Resource::Maintenance, Delete, Any, Denied, Denied),
];

/// Look up the access `role` has for `action` on `resource`.
pub fn access(role: Role, action: Action, resource: Resource) -> Access {
  POLICY
    .iter()
    .find(|r| r.resource == resource && r.action == action)
    .map(|r| match role {
      Role::Admin => r.admin,
      Role::Faculty => r.faculty,
      Role::Student => r.student,
    })
    .unwrap_or(Denied)
}

/// Fail with [`Error::Forbidden`] unless the actor has some access.
pub fn authorize(actor: &Actor, action: Action, resource: Resource) -> Result<Access> {
  match access(actor.role, action, resource) {
    Denied => Err(Error::Forbidden(format!("{} may not {action} {resource}", actor.role))),
    granted => Ok(granted),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn actor(role: Role) -> Actor { Actor { identity_id: Uuid::new_v4(), role } }

  #[test]
  fn admin_may_do_everything_listed() {
    for r in POLICY {
      assert_eq!(access(Role::Admin, r.action, r.resource), Any, "{:?}", r);
    }
  }

  #[test]
  fn faculty_marks_attendance_but_cannot_delete_students() {
    assert_eq!(access(Role::Faculty, Create, Resource::Attendance), Any);
    assert!(matches!(
      authorize(&actor(Role::Faculty), Delete, Resource::Student),
      Err(Error::Forbidden(_))
    ));
  }

  #[test]
  fn students_only_see_their_own_records() {
    assert_eq!(access(Role::Student, Read, Resource::Attendance), Own);
    assert_eq!(access(Role::Student, Read, Resource::Student), Own);
    assert_eq!(access(Role::Student, Read, Resource::Faculty), Denied);
    assert_eq!(access(Role::Student, Create, Resource::Remark), Denied);
  }

  #[test]
  fn missing_rules_are_denied() {
    assert_eq!(access(Role::Admin, Update, Resource::Attendance), Denied);
  }

  #[test]
  fn each_pair_appears_once() {
    for (i, a) in POLICY.iter().enumerate() {
      for b in &POLICY[i + 1..] {
        assert!(
          !(a.resource == b.resource && a.action == b.action),
          "duplicate rule for {} {}",
          a.action,
          a.resource
        );
      }
    }
  }
}

// leash/src/actor.rs

//! Caller identity. The identity context itself (token issuance, sessions)
//! is external; leash only consumes an explicit `Actor` on every call.
//! Nothing in this crate reads identity from ambient state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of the calling actor, as supplied by the external identity context.
///
/// `System` is reserved for internal callers (the reconciliation worker and
/// the compound approval move); it must never be accepted from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  User,
  Shelter,
  Admin,
  Sponsor,
  Staff,
  System,
}

impl Role {
  /// Every role, for exhaustive policy sweeps in tests.
  pub const ALL: [Role; 6] = [
    Role::User,
    Role::Shelter,
    Role::Admin,
    Role::Sponsor,
    Role::Staff,
    Role::System,
  ];
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Role::User => "USER",
      Role::Shelter => "SHELTER",
      Role::Admin => "ADMIN",
      Role::Sponsor => "SPONSOR",
      Role::Staff => "STAFF",
      Role::System => "SYSTEM",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id: Uuid,
  pub role: Role,
}

impl Actor {
  pub fn new(id: Uuid, role: Role) -> Self {
    Self { id, role }
  }

  /// The internal system actor. Its id is fixed at nil; ownership checks
  /// never apply to it.
  pub fn system() -> Self {
    Self {
      id: Uuid::nil(),
      role: Role::System,
    }
  }
}

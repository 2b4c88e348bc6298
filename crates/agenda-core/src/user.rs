//! Users and the persisted session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user. Never mutated and never deleted once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:            Uuid,
  /// Login handle, always trimmed and upper-cased. Unique across users.
  pub identifier:    String,
  /// argon2 PHC string, e.g. `$argon2id$v=19$…`
  pub secret_hash:   String,
  pub registered_at: DateTime<Utc>,
}

/// The currently authenticated user, persisted so it survives a reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub user_id:    Uuid,
  pub identifier: String,
  pub started_at: DateTime<Utc>,
}

impl Session {
  pub fn for_user(user: &User) -> Self {
    Self {
      user_id:    user.id,
      identifier: user.identifier.clone(),
      started_at: Utc::now(),
    }
  }
}

/// Case-normalise a login identifier: surrounding whitespace is dropped and
/// letters are upper-cased.
pub fn normalize_identifier(raw: &str) -> String { raw.trim().to_uppercase() }

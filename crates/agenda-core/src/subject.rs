//! Subject — an academic course tracked by one user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A course owned by exactly one user. Subjects are never edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub id:         Uuid,
  pub owner_id:   Uuid,
  pub name:       String,
  /// Course code, always upper-cased.
  pub code:       String,
  pub term:       String,
  pub created_at: DateTime<Utc>,
}

impl Subject {
  /// Label used by the subject picker, e.g. `"MAT101 - Calculus"`.
  pub fn label(&self) -> String { format!("{} - {}", self.code, self.name) }
}

/// Input to [`crate::planner::PlannerStore::add_subject`].
#[derive(Debug, Clone)]
pub struct NewSubject {
  pub name: String,
  pub code: String,
  pub term: String,
}

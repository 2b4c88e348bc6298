//! Assignment — a due work item attached to a subject.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How urgent the author considers an assignment.
///
/// The three named levels are the ones the forms offer; anything else is
/// kept verbatim in [`Priority::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
  Other(String),
}

impl Priority {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Low => "low",
      Self::Medium => "medium",
      Self::High => "high",
      Self::Other(s) => s,
    }
  }
}

impl From<String> for Priority {
  fn from(s: String) -> Self {
    match s.trim().to_lowercase().as_str() {
      "low" => Self::Low,
      "medium" => Self::Medium,
      "high" => Self::High,
      _ => Self::Other(s),
    }
  }
}

impl From<&str> for Priority {
  fn from(s: &str) -> Self { Self::from(s.to_owned()) }
}

impl From<Priority> for String {
  fn from(p: Priority) -> Self {
    match p {
      Priority::Other(s) => s,
      named => named.as_str().to_owned(),
    }
  }
}

impl fmt::Display for Priority {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A work item owned by one user and attached to one of their subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
  pub id:          Uuid,
  pub owner_id:    Uuid,
  pub subject_id:  Uuid,
  pub title:       String,
  /// Empty when the author gave no description.
  #[serde(default)]
  pub description: String,
  pub due_date:    NaiveDate,
  pub priority:    Priority,
  pub done:        bool,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::planner::PlannerStore::add_assignment`].
#[derive(Debug, Clone)]
pub struct NewAssignment {
  pub subject_id:  Uuid,
  pub title:       String,
  pub description: String,
  pub due_date:    NaiveDate,
  pub priority:    Priority,
}

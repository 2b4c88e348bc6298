//! The form surfaces, as submitted (raw strings), and their validation.
//!
//! Validation only rejects empty required fields and values that cannot be
//! parsed. Domain rules (duplicates, credentials, ownership) belong to the
//! components that own the data.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  Error, Result,
  assignment::{NewAssignment, Priority},
  subject::NewSubject,
};

/// Date format produced by date pickers and accepted for due dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
  pub identifier: String,
  pub secret:     String,
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
  pub identifier:     String,
  pub secret:         String,
  pub confirm_secret: String,
}

#[derive(Debug, Clone, Default)]
pub struct SubjectForm {
  pub name: String,
  pub code: String,
  pub term: String,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentForm {
  pub subject_id:  String,
  pub title:       String,
  /// Optional.
  pub description: String,
  /// `YYYY-MM-DD`.
  pub due_date:    String,
  pub priority:    String,
}

#[derive(Debug, Clone, Default)]
pub struct RecoveryForm {
  pub identifier: String,
}

/// Any one form submission.
#[derive(Debug, Clone)]
pub enum Form {
  Login(LoginForm),
  Register(RegisterForm),
  AddSubject(SubjectForm),
  AddAssignment(AssignmentForm),
  Recover(RecoveryForm),
}

fn required<'a>(label: &str, value: &'a str) -> Result<&'a str> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation(format!("Please enter {label}.")));
  }
  Ok(trimmed)
}

impl LoginForm {
  pub fn validate(&self) -> Result<()> {
    required("your identifier", &self.identifier)?;
    // Secrets are compared verbatim; only emptiness is checked.
    if self.secret.is_empty() {
      return Err(Error::Validation("Please enter your password.".into()));
    }
    Ok(())
  }
}

impl RegisterForm {
  pub fn validate(&self) -> Result<()> {
    required("an identifier", &self.identifier)?;
    if self.secret.is_empty() {
      return Err(Error::Validation("Please enter a password.".into()));
    }
    Ok(())
  }
}

impl SubjectForm {
  pub fn validate(&self) -> Result<NewSubject> {
    Ok(NewSubject {
      name: required("the subject name", &self.name)?.to_owned(),
      code: required("the subject code", &self.code)?.to_owned(),
      term: required("the term", &self.term)?.to_owned(),
    })
  }
}

impl AssignmentForm {
  pub fn validate(&self) -> Result<NewAssignment> {
    let subject_id = required("a subject", &self.subject_id)?;
    let subject_id = Uuid::parse_str(subject_id)
      .map_err(|_| Error::Validation(format!("Unknown subject: {subject_id}")))?;
    let title = required("a title", &self.title)?.to_owned();
    let due = required("a due date", &self.due_date)?;
    let due_date = NaiveDate::parse_from_str(due, DATE_FORMAT).map_err(|_| {
      Error::Validation(format!("Due date must look like 2024-12-31, got {due}"))
    })?;
    let priority = Priority::from(required("a priority", &self.priority)?);

    Ok(NewAssignment {
      subject_id,
      title,
      description: self.description.trim().to_owned(),
      due_date,
      priority,
    })
  }
}

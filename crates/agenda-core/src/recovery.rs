//! Password-recovery check: a standalone, demo-grade lookup against a single
//! fixed identifier. No email is actually sent.

use crate::{Error, Result};

/// The only identifier this check recognises. Compared case-sensitively.
pub const RECOVERABLE_IDENTIFIER: &str = "MH230747";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
  Found,
  NotFound,
}

impl RecoveryOutcome {
  pub fn message(self) -> &'static str {
    match self {
      Self::Found => "An email with your password was sent, check your inbox.",
      Self::NotFound => {
        "Error: user not found. Check the identifier you entered."
      }
    }
  }
}

pub fn check(identifier: &str) -> Result<RecoveryOutcome> {
  let input = identifier.trim();
  if input.is_empty() {
    return Err(Error::Validation("Please enter your identifier.".into()));
  }
  Ok(if input == RECOVERABLE_IDENTIFIER {
    RecoveryOutcome::Found
  } else {
    RecoveryOutcome::NotFound
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_identifier_is_found() {
    assert_eq!(check("MH230747").unwrap(), RecoveryOutcome::Found);
    assert_eq!(check("  MH230747 ").unwrap(), RecoveryOutcome::Found);
  }

  #[test]
  fn comparison_is_case_sensitive() {
    assert_eq!(check("mh230747").unwrap(), RecoveryOutcome::NotFound);
    assert_eq!(check("ABC123").unwrap(), RecoveryOutcome::NotFound);
  }

  #[test]
  fn blank_input_is_a_validation_error() {
    assert!(matches!(check("  "), Err(Error::Validation(_))));
    assert!(matches!(check(""), Err(Error::Validation(_))));
  }
}

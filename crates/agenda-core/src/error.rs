//! Error types for `agenda-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// A required form field was empty.
  #[error("{0}")]
  Validation(String),

  #[error("passwords do not match")]
  PasswordMismatch,

  #[error("identifier {0} is already registered")]
  DuplicateUser(String),

  /// Deliberately generic: never reveals whether the identifier or the
  /// secret was wrong.
  #[error("identifier or password incorrect")]
  AuthenticationFailed,

  #[error("no user is logged in")]
  NotAuthenticated,

  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("password hashing error: {0}")]
  Hash(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error from any [`crate::kv::KeyValueStore`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Whether this error is a user-facing outcome (reported through the
  /// prompt) rather than an infrastructure failure.
  pub fn is_user_facing(&self) -> bool {
    matches!(
      self,
      Self::Validation(_)
        | Self::PasswordMismatch
        | Self::DuplicateUser(_)
        | Self::AuthenticationFailed
        | Self::NotAuthenticated
        | Self::SubjectNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

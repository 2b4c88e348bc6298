//! The user-notification capability: a blocking alert and a blocking
//! yes/no confirmation.

/// Implemented by whatever surface talks to the user (a terminal, a test
/// script, …).
pub trait Prompt {
  /// Show `message` and wait until the user has seen it.
  fn notify(&self, message: &str);

  /// Ask a yes/no question; `true` means the user agreed.
  fn confirm(&self, message: &str) -> bool;
}

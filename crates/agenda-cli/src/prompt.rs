//! Terminal implementation of the alert/confirm capability.

use std::io::{self, BufRead, Write};

use agenda_core::prompt::Prompt;

pub struct TerminalPrompt {
  /// Answer every confirmation with "yes" without asking.
  pub assume_yes: bool,
}

impl Prompt for TerminalPrompt {
  fn notify(&self, message: &str) { println!("{message}"); }

  fn confirm(&self, message: &str) -> bool {
    if self.assume_yes {
      return true;
    }
    print!("{message} [y/N] ");
    io::stdout().flush().ok();

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
      return false;
    }
    is_yes(&line)
  }
}

fn is_yes(answer: &str) -> bool {
  matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_explicit_yes_confirms() {
    assert!(is_yes("y\n"));
    assert!(is_yes(" YES "));
    assert!(!is_yes("\n"));
    assert!(!is_yes("nope"));
  }

  #[test]
  fn assume_yes_skips_the_question() {
    assert!(TerminalPrompt { assume_yes: true }.confirm("delete?"));
  }
}

//! Layered settings: built-in defaults, then `agenda.toml`, then `AGENDA_*`
//! environment variables.

use std::path::{Path, PathBuf};

use agenda_core::{directory::ReconcilePolicy, secret::SecretHasher};
use anyhow::Context as _;
use serde::Deserialize;

/// Runtime configuration, deserialised from `agenda.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub store_path:       PathBuf,
  /// URL or file path of the user directory; empty disables loading it.
  pub directory_source: String,
  pub directory_policy: ReconcilePolicy,
  pub log_level:        String,
  /// argon2 memory cost in KiB; both cost keys must be set to take effect.
  pub hash_memory_kib:  Option<u32>,
  pub hash_iterations:  Option<u32>,
}

impl Settings {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("store_path", "agenda.db")?
      .set_default("directory_source", "udb_usuarios.json")?
      .set_default("directory_policy", "replace")?
      .set_default("log_level", "warn")?
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("AGENDA"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise Settings")
  }

  pub fn directory(&self) -> Option<&str> {
    let source = self.directory_source.trim();
    (!source.is_empty()).then_some(source)
  }

  pub fn hasher(&self) -> anyhow::Result<SecretHasher> {
    match (self.hash_memory_kib, self.hash_iterations) {
      (Some(memory), Some(iterations)) => SecretHasher::with_cost(memory, iterations)
        .context("invalid argon2 cost parameters"),
      _ => Ok(SecretHasher::default()),
    }
  }

  /// `store_path` with a leading `~` expanded.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let s = Settings::load(&dir.path().join("missing.toml")).unwrap();
    assert_eq!(s.directory(), Some("udb_usuarios.json"));
    assert_eq!(s.directory_policy, ReconcilePolicy::Replace);
    assert!(s.hash_memory_kib.is_none());
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agenda.toml");
    std::fs::write(
      &path,
      "store_path = \"/tmp/x.db\"\ndirectory_source = \"\"\ndirectory_policy = \"merge\"\nhash_memory_kib = 64\nhash_iterations = 1\n",
    )
    .unwrap();

    let s = Settings::load(&path).unwrap();
    assert_eq!(s.store_path(), PathBuf::from("/tmp/x.db"));
    assert_eq!(s.directory(), None);
    assert_eq!(s.directory_policy, ReconcilePolicy::Merge);
    assert!(s.hasher().is_ok());
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/agenda.db")),
      PathBuf::from(home).join("agenda.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs")), PathBuf::from("/abs"));
  }
}

//! The user directory: an optional, read-only document of users fetched at
//! startup and written over the persisted user list.
//!
//! Three document shapes are recognised:
//!
//! ```json
//! [ { "carnet": "MH230747", "password": "x" } ]
//! { "usuarios": [ ... ] }
//! { "users": [ ... ] }
//! ```
//!
//! Any failure (fetch, status, parse, shape) is logged and the loader falls
//! back to whatever is already persisted. It never reaches the user.

use std::{collections::HashSet, future::Future};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  Result,
  kv::{KeyValueStore, Persistence, keys},
  secret::{SecretHasher, is_phc_hash},
  user::{User, normalize_identifier},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Why a directory document could not be used. Always recovered locally.
#[derive(Debug, Error)]
pub enum DirectoryError {
  #[error("could not fetch directory: {0}")]
  Fetch(String),

  #[error("directory request returned status {0}")]
  Status(u16),

  #[error("directory is not valid JSON: {0}")]
  Parse(String),

  #[error("directory has no user list (expected a list, `usuarios` or `users`)")]
  UnrecognizedShape,
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// Where the directory document comes from (an HTTP URL, a local file, …).
///
/// Implementations must not serve a cached copy.
pub trait DirectorySource: Send + Sync {
  /// Human-readable location, used in diagnostics.
  fn location(&self) -> String;

  /// Fetch and parse the document.
  fn fetch(
    &self,
  ) -> impl Future<Output = Result<Value, DirectoryError>> + Send + '_;
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// How a successfully loaded directory is combined with persisted users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilePolicy {
  /// The directory replaces the persisted list outright. Users registered
  /// locally but missing from the directory are dropped.
  #[default]
  Replace,
  /// Last write wins by identifier, the directory being the last write.
  /// Persisted users missing from the directory are kept after it.
  Merge,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// One user entry as it may appear in a directory document.
#[derive(Debug, Deserialize)]
struct DirectoryRecord {
  #[serde(default)]
  id:            Option<Value>,
  #[serde(alias = "carnet")]
  identifier:    String,
  #[serde(alias = "password", alias = "secret_hash")]
  secret:        String,
  #[serde(default, alias = "fechaRegistro")]
  registered_at: Option<DateTime<Utc>>,
}

/// Pull the list of user records out of any recognised document shape.
pub fn extract_records(doc: Value) -> Result<Vec<Value>, DirectoryError> {
  match doc {
    Value::Array(records) => Ok(records),
    Value::Object(mut fields) => {
      for field in ["usuarios", "users"] {
        if let Some(Value::Array(records)) = fields.remove(field) {
          return Ok(records);
        }
      }
      Err(DirectoryError::UnrecognizedShape)
    }
    _ => Err(DirectoryError::UnrecognizedShape),
  }
}

/// Turn raw records into [`User`]s.
///
/// Identifiers are normalised, plain-text secrets hashed, and a record
/// without a UUID id inherits the id of the persisted user with the same
/// identifier so sessions and owned data survive a reload. Malformed records
/// and duplicate identifiers (after the first) are skipped. An id already
/// taken by an earlier record is replaced with a fresh one.
fn normalize_records(
  records: Vec<Value>,
  stored: &[User],
  hasher: &SecretHasher,
) -> Result<Vec<User>> {
  let now = Utc::now();
  let mut seen = HashSet::new();
  let mut ids = HashSet::new();
  let mut users = Vec::with_capacity(records.len());

  for raw in records {
    let record: DirectoryRecord = match serde_json::from_value(raw) {
      Ok(r) => r,
      Err(e) => {
        tracing::warn!(error = %e, "skipping malformed directory record");
        continue;
      }
    };

    let identifier = normalize_identifier(&record.identifier);
    if identifier.is_empty() || !seen.insert(identifier.clone()) {
      tracing::warn!(%identifier, "skipping empty or duplicate directory identifier");
      continue;
    }

    let previous = stored.iter().find(|u| u.identifier == identifier);
    let mut id = record
      .id
      .as_ref()
      .and_then(Value::as_str)
      .and_then(|s| Uuid::parse_str(s).ok())
      .or(previous.map(|u| u.id))
      .unwrap_or_else(Uuid::new_v4);
    if !ids.insert(id) {
      tracing::warn!(%identifier, %id, "directory id already in use, assigning a new one");
      id = Uuid::new_v4();
      ids.insert(id);
    }

    let secret_hash = if is_phc_hash(&record.secret) {
      record.secret
    } else {
      hasher.hash(&record.secret)?
    };

    users.push(User {
      id,
      identifier,
      secret_hash,
      registered_at: record
        .registered_at
        .or(previous.map(|u| u.registered_at))
        .unwrap_or(now),
    });
  }

  Ok(users)
}

fn reconcile(
  loaded: Vec<User>,
  stored: Vec<User>,
  policy: ReconcilePolicy,
) -> Vec<User> {
  match policy {
    ReconcilePolicy::Replace => loaded,
    ReconcilePolicy::Merge => {
      let identifiers: HashSet<&str> =
        loaded.iter().map(|u| u.identifier.as_str()).collect();
      let ids: HashSet<Uuid> = loaded.iter().map(|u| u.id).collect();
      let kept: Vec<User> = stored
        .into_iter()
        .filter(|u| !identifiers.contains(u.identifier.as_str()))
        .filter(|u| {
          let free = !ids.contains(&u.id);
          if !free {
            tracing::warn!(
              identifier = %u.identifier,
              id = %u.id,
              "dropping persisted user whose id the directory reassigned"
            );
          }
          free
        })
        .collect();
      let mut merged = loaded;
      merged.extend(kept);
      merged
    }
  }
}

// ─── Loader ──────────────────────────────────────────────────────────────────

/// Read the persisted user list, treating absence as empty.
pub async fn stored_users<S: KeyValueStore>(db: &Persistence<S>) -> Result<Vec<User>> {
  db.get_or_default(keys::USERS).await
}

/// Load the directory from `source` and return the resulting user list.
///
/// On success the persisted user list is overwritten (subject to `policy`).
/// On any [`DirectoryError`] the persisted list is returned unchanged. Only
/// storage and hashing failures are reported as errors.
pub async fn load<S, D>(
  source: &D,
  db: &Persistence<S>,
  hasher: &SecretHasher,
  policy: ReconcilePolicy,
) -> Result<Vec<User>>
where
  S: KeyValueStore,
  D: DirectorySource,
{
  let stored = stored_users(db).await?;
  let location = source.location();

  let records = match source.fetch().await.and_then(extract_records) {
    Ok(records) => records,
    Err(e) => {
      tracing::warn!(%location, error = %e, "directory unavailable, using persisted users");
      return Ok(stored);
    }
  };

  let loaded = normalize_records(records, &stored, hasher)?;
  let users = reconcile(loaded, stored, policy);
  db.set(keys::USERS, &users).await?;

  tracing::info!(%location, total = users.len(), "loaded user directory");
  Ok(users)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::kv::MemoryStore;

  struct StaticSource(Result<Value, u16>);

  impl DirectorySource for StaticSource {
    fn location(&self) -> String { "static".into() }

    async fn fetch(&self) -> Result<Value, DirectoryError> {
      match &self.0 {
        Ok(v) => Ok(v.clone()),
        Err(status) => Err(DirectoryError::Status(*status)),
      }
    }
  }

  fn hasher() -> SecretHasher { SecretHasher::with_cost(64, 1).unwrap() }

  fn local_user(identifier: &str) -> User {
    User {
      id:            Uuid::new_v4(),
      identifier:    identifier.into(),
      secret_hash:   hasher().hash("local").unwrap(),
      registered_at: Utc::now(),
    }
  }

  #[test]
  fn all_three_shapes_are_recognised() {
    let rec = json!({ "carnet": "a", "password": "b" });
    assert_eq!(extract_records(json!([rec.clone()])).unwrap().len(), 1);
    assert_eq!(extract_records(json!({ "usuarios": [rec.clone()] })).unwrap().len(), 1);
    assert_eq!(extract_records(json!({ "users": [rec.clone(), rec] })).unwrap().len(), 2);
  }

  #[test]
  fn other_shapes_are_rejected() {
    for doc in [json!({ "people": [] }), json!({ "usuarios": "x" }), json!(42)] {
      assert!(matches!(
        extract_records(doc),
        Err(DirectoryError::UnrecognizedShape)
      ));
    }
  }

  #[test]
  fn usuarios_falls_through_to_users_when_not_a_list() {
    let doc = json!({ "usuarios": {}, "users": [{ "carnet": "a", "password": "b" }] });
    assert_eq!(extract_records(doc).unwrap().len(), 1);
  }

  #[tokio::test]
  async fn successful_load_overwrites_persisted_users() {
    let db = Persistence::new(MemoryStore::new());
    db.set(keys::USERS, &vec![local_user("LOCAL1")]).await.unwrap();

    let source = StaticSource(Ok(json!({ "usuarios": [{ "carnet": "mh230747", "password": "x" }] })));
    let users = load(&source, &db, &hasher(), ReconcilePolicy::Replace)
      .await
      .unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].identifier, "MH230747");
    assert!(is_phc_hash(&users[0].secret_hash));
    assert!(hasher().verify("x", &users[0].secret_hash));

    let persisted = stored_users(&db).await.unwrap();
    assert_eq!(persisted, users);
  }

  #[tokio::test]
  async fn merge_policy_keeps_local_only_users() {
    let db = Persistence::new(MemoryStore::new());
    let local = local_user("LOCAL1");
    let shadowed = local_user("MH230747");
    db.set(keys::USERS, &vec![local.clone(), shadowed.clone()]).await.unwrap();

    let source = StaticSource(Ok(json!([{ "carnet": "MH230747", "password": "x" }])));
    let users = load(&source, &db, &hasher(), ReconcilePolicy::Merge)
      .await
      .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].identifier, "MH230747");
    assert_eq!(users[0].id, shadowed.id, "identifier match keeps the stored id");
    assert!(hasher().verify("x", &users[0].secret_hash));
    assert_eq!(users[1], local);
  }

  #[tokio::test]
  async fn failures_fall_back_to_persisted_users() {
    let db = Persistence::new(MemoryStore::new());
    let local = local_user("LOCAL1");
    db.set(keys::USERS, &vec![local.clone()]).await.unwrap();

    for source in [StaticSource(Err(404)), StaticSource(Ok(json!({ "nope": [] })))] {
      let users = load(&source, &db, &hasher(), ReconcilePolicy::Replace)
        .await
        .unwrap();
      assert_eq!(users, vec![local.clone()]);
    }
  }

  #[tokio::test]
  async fn failure_with_nothing_persisted_yields_empty_list() {
    let db = Persistence::new(MemoryStore::new());
    let users = load(&StaticSource(Err(500)), &db, &hasher(), ReconcilePolicy::Replace)
      .await
      .unwrap();
    assert!(users.is_empty());
  }

  #[tokio::test]
  async fn malformed_and_duplicate_records_are_skipped() {
    let db = Persistence::new(MemoryStore::new());
    let source = StaticSource(Ok(json!([
      { "carnet": "ab1", "password": "first" },
      { "carnet": "AB1 ", "password": "second" },
      { "nombre": "no identifier" },
      { "carnet": "cd2", "password": "y" }
    ])));
    let users = load(&source, &db, &hasher(), ReconcilePolicy::Replace)
      .await
      .unwrap();

    let ids: Vec<_> = users.iter().map(|u| u.identifier.as_str()).collect();
    assert_eq!(ids, ["AB1", "CD2"]);
    assert!(hasher().verify("first", &users[0].secret_hash));
  }

  #[tokio::test]
  async fn pre_hashed_secrets_are_kept_verbatim() {
    let db = Persistence::new(MemoryStore::new());
    let phc = hasher().hash("x").unwrap();
    let source = StaticSource(Ok(json!([{ "identifier": "Z9", "secret_hash": phc }])));
    let users = load(&source, &db, &hasher(), ReconcilePolicy::Replace)
      .await
      .unwrap();
    assert_eq!(users[0].secret_hash, phc);
  }

  #[tokio::test]
  async fn merge_never_leaves_two_users_on_one_id() {
    let db = Persistence::new(MemoryStore::new());
    let local = local_user("LOCAL1");
    let other = local_user("LOCAL2");
    db.set(keys::USERS, &vec![local.clone(), other.clone()]).await.unwrap();

    let source = StaticSource(Ok(json!([
      { "id": local.id.to_string(), "carnet": "MH230747", "password": "x" }
    ])));
    let users = load(&source, &db, &hasher(), ReconcilePolicy::Merge)
      .await
      .unwrap();

    let identifiers: Vec<_> = users.iter().map(|u| u.identifier.as_str()).collect();
    assert_eq!(identifiers, ["MH230747", "LOCAL2"]);
    assert_eq!(users[0].id, local.id);
    assert_eq!(stored_users(&db).await.unwrap(), users);
  }

  #[tokio::test]
  async fn repeated_directory_ids_are_reassigned() {
    let db = Persistence::new(MemoryStore::new());
    let id = Uuid::new_v4().to_string();
    let source = StaticSource(Ok(json!([
      { "id": id, "carnet": "a1", "password": "x" },
      { "id": id, "carnet": "b2", "password": "y" }
    ])));
    let users = load(&source, &db, &hasher(), ReconcilePolicy::Replace)
      .await
      .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id.to_string(), id);
    assert_ne!(users[0].id, users[1].id);
  }
}

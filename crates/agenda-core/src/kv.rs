//! The `KeyValueStore` trait and the JSON persistence adapter built on it.
//!
//! A backend only needs to store opaque strings under string keys. All
//! (de)serialisation happens in [`Persistence`], so every backend behaves the
//! same way for absent or unparsable values.

use std::{
  collections::HashMap,
  convert::Infallible,
  future::Future,
  sync::{Arc, Mutex},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

// ─── Keys ────────────────────────────────────────────────────────────────────

/// Fixed, mutually distinct keys under which state is persisted. These must
/// stay stable across releases or existing data becomes unreachable.
pub mod keys {
  pub const SESSION: &str = "agenda.session";
  pub const USERS: &str = "agenda.users";
  pub const SUBJECTS: &str = "agenda.subjects";
  pub const ASSIGNMENTS: &str = "agenda.assignments";
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a durable string-keyed store.
///
/// Absence is a normal state, never an error.
pub trait KeyValueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the raw value stored under `key`, or `None` if absent.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Store `value` under `key`, replacing any prior value.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Store several values at once. Backends that support transactions apply
  /// the whole batch or none of it.
  fn set_many(
    &self,
    entries: Vec<(&'static str, String)>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete `key`. Removing an absent key is not an error.
  fn remove<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── In-memory backend ───────────────────────────────────────────────────────

/// A volatile [`KeyValueStore`]. Clones share the same map, so a clone can
/// stand in for "the same origin after a reload" in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl KeyValueStore for MemoryStore {
  type Error = Infallible;

  async fn get(&self, key: &str) -> Result<Option<String>, Infallible> {
    Ok(self.map().get(key).cloned())
  }

  async fn set(&self, key: &str, value: String) -> Result<(), Infallible> {
    self.map().insert(key.to_owned(), value);
    Ok(())
  }

  async fn set_many(
    &self,
    entries: Vec<(&'static str, String)>,
  ) -> Result<(), Infallible> {
    let mut map = self.map();
    for (key, value) in entries {
      map.insert(key.to_owned(), value);
    }
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), Infallible> {
    self.map().remove(key);
    Ok(())
  }
}

// ─── Persistence adapter ─────────────────────────────────────────────────────

/// Typed JSON access to a [`KeyValueStore`].
///
/// Cloning is cheap — the backend is reference-counted.
pub struct Persistence<S> {
  store: Arc<S>,
}

impl<S> Clone for Persistence<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: KeyValueStore> Persistence<S> {
  pub fn new(store: S) -> Self { Self { store: Arc::new(store) } }

  /// Read and parse the value under `key`. Returns `None` if the key is
  /// absent or its value does not parse as `T`.
  pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    let Some(raw) = self.store.get(key).await.map_err(Error::store)? else {
      return Ok(None);
    };
    match serde_json::from_str(&raw) {
      Ok(value) => Ok(Some(value)),
      Err(e) => {
        tracing::warn!(key, error = %e, "ignoring unparsable persisted value");
        Ok(None)
      }
    }
  }

  /// Like [`Persistence::get`] but maps absence to `T::default()`.
  pub async fn get_or_default<T>(&self, key: &str) -> Result<T>
  where
    T: DeserializeOwned + Default,
  {
    Ok(self.get(key).await?.unwrap_or_default())
  }

  /// Serialise `value` and store it under `key`, replacing any prior value.
  pub async fn set<T: Serialize + ?Sized>(
    &self,
    key: &str,
    value: &T,
  ) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    self.store.set(key, raw).await.map_err(Error::store)
  }

  /// Store a batch of already-serialised values in one backend call.
  pub async fn set_batch(
    &self,
    entries: Vec<(&'static str, serde_json::Value)>,
  ) -> Result<()> {
    let raw = entries
      .into_iter()
      .map(|(key, value)| (key, value.to_string()))
      .collect();
    self.store.set_many(raw).await.map_err(Error::store)
  }

  pub async fn remove(&self, key: &str) -> Result<()> {
    self.store.remove(key).await.map_err(Error::store)
  }
}

#[cfg(test)]
pub(crate) mod testing {
  use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
  };

  use super::*;

  /// A [`MemoryStore`] whose writes can be switched to fail, so seed data
  /// goes in before the backend "fills up".
  #[derive(Debug, Clone, Default)]
  pub(crate) struct FailingStore {
    pub(crate) inner: MemoryStore,
    failing:          Arc<AtomicBool>,
  }

  impl FailingStore {
    pub(crate) fn new() -> Self { Self::default() }

    pub(crate) fn fail_writes(&self) { self.failing.store(true, Ordering::SeqCst); }

    fn check(&self) -> Result<(), io::Error> {
      if self.failing.load(Ordering::SeqCst) {
        return Err(io::Error::other("disk full"));
      }
      Ok(())
    }
  }

  impl KeyValueStore for FailingStore {
    type Error = io::Error;

    async fn get(&self, key: &str) -> Result<Option<String>, io::Error> {
      Ok(self.inner.get(key).await.unwrap_or_else(|e| match e {}))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), io::Error> {
      self.check()?;
      self.inner.set(key, value).await.unwrap_or_else(|e| match e {});
      Ok(())
    }

    async fn set_many(
      &self,
      entries: Vec<(&'static str, String)>,
    ) -> Result<(), io::Error> {
      self.check()?;
      self.inner.set_many(entries).await.unwrap_or_else(|e| match e {});
      Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), io::Error> {
      self.check()?;
      self.inner.remove(key).await.unwrap_or_else(|e| match e {});
      Ok(())
    }
  }
}

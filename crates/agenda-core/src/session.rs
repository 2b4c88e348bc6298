//! Session manager: registration, login, logout and the persisted session.

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  kv::{KeyValueStore, Persistence, keys},
  secret::SecretHasher,
  user::{Session, User, normalize_identifier},
};

/// Holds the user list and the current session.
pub struct SessionManager<S> {
  db:      Persistence<S>,
  hasher:  SecretHasher,
  users:   Vec<User>,
  current: Option<Session>,
}

impl<S: KeyValueStore> SessionManager<S> {
  /// Build a manager over `users` and restore any session persisted by a
  /// previous run.
  pub async fn restore(
    db: Persistence<S>,
    hasher: SecretHasher,
    users: Vec<User>,
  ) -> Result<Self> {
    let current: Option<Session> = db.get(keys::SESSION).await?;
    if let Some(session) = &current {
      tracing::debug!(identifier = %session.identifier, "restored session");
    }
    Ok(Self { db, hasher, users, current })
  }

  pub fn users(&self) -> &[User] { &self.users }

  pub fn current(&self) -> Option<&Session> { self.current.as_ref() }

  /// The id of the logged-in user, or [`Error::NotAuthenticated`].
  pub fn require_user(&self) -> Result<Uuid> {
    self
      .current
      .as_ref()
      .map(|s| s.user_id)
      .ok_or(Error::NotAuthenticated)
  }

  pub fn is_authenticated(&self) -> bool { self.current.is_some() }

  /// Log in with a case-insensitive identifier and an exact secret.
  ///
  /// Failure is always the generic [`Error::AuthenticationFailed`].
  pub async fn login(&mut self, identifier: &str, secret: &str) -> Result<&Session> {
    let identifier = normalize_identifier(identifier);
    let user = self
      .users
      .iter()
      .filter(|u| u.identifier == identifier)
      .find(|u| self.hasher.verify(secret, &u.secret_hash))
      .ok_or(Error::AuthenticationFailed)?;

    let session = Session::for_user(user);
    self.db.set(keys::SESSION, &session).await?;
    tracing::debug!(%identifier, "logged in");
    Ok(&*self.current.insert(session))
  }

  /// Register a new user. Does not log them in.
  pub async fn register(
    &mut self,
    identifier: &str,
    secret: &str,
    confirm_secret: &str,
  ) -> Result<User> {
    if secret != confirm_secret {
      return Err(Error::PasswordMismatch);
    }

    let identifier = normalize_identifier(identifier);
    if identifier.is_empty() {
      return Err(Error::Validation("Please enter an identifier.".into()));
    }
    if self.users.iter().any(|u| u.identifier == identifier) {
      return Err(Error::DuplicateUser(identifier));
    }

    let user = User {
      id: Uuid::new_v4(),
      identifier,
      secret_hash: self.hasher.hash(secret)?,
      registered_at: Utc::now(),
    };

    let mut users = self.users.clone();
    users.push(user.clone());
    self.db.set(keys::USERS, &users).await?;
    self.users = users;
    tracing::debug!(identifier = %user.identifier, "registered user");
    Ok(user)
  }

  /// End the session. If the persisted session cannot be removed the user
  /// stays logged in, matching what the next start would restore.
  pub async fn logout(&mut self) -> Result<()> {
    self.db.remove(keys::SESSION).await?;
    self.current = None;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::kv::{MemoryStore, testing::FailingStore};

  fn hasher() -> SecretHasher { SecretHasher::with_cost(64, 1).unwrap() }

  async fn manager(backend: &MemoryStore) -> SessionManager<MemoryStore> {
    let db = Persistence::new(backend.clone());
    let users = crate::directory::stored_users(&db).await.unwrap();
    SessionManager::restore(db, hasher(), users).await.unwrap()
  }

  #[tokio::test]
  async fn register_then_login() {
    let backend = MemoryStore::new();
    let mut m = manager(&backend).await;

    let user = m.register(" ab123 ", "pw", "pw").await.unwrap();
    assert_eq!(user.identifier, "AB123");
    assert_ne!(user.secret_hash, "pw");
    assert!(!m.is_authenticated(), "registration must not log in");

    let session = m.login("Ab123", "pw").await.unwrap();
    assert_eq!(session.user_id, user.id);
    assert!(m.is_authenticated());
  }

  #[tokio::test]
  async fn mismatched_confirmation_is_rejected() {
    let backend = MemoryStore::new();
    let mut m = manager(&backend).await;
    assert!(matches!(
      m.register("a", "pw", "other").await,
      Err(Error::PasswordMismatch)
    ));
    assert!(m.users().is_empty());
  }

  #[tokio::test]
  async fn duplicate_identifier_is_rejected_case_insensitively() {
    let backend = MemoryStore::new();
    let mut m = manager(&backend).await;
    m.register("AB123", "pw", "pw").await.unwrap();

    let before = m.users().to_vec();
    assert!(matches!(
      m.register("ab123", "other", "other").await,
      Err(Error::DuplicateUser(id)) if id == "AB123"
    ));
    assert_eq!(m.users(), before.as_slice());
  }

  #[tokio::test]
  async fn wrong_credentials_fail_generically() {
    let backend = MemoryStore::new();
    let mut m = manager(&backend).await;
    m.register("AB123", "pw", "pw").await.unwrap();

    for (id, pw) in [("AB123", "PW"), ("ZZ999", "pw"), ("AB123", "pw ")] {
      assert!(matches!(m.login(id, pw).await, Err(Error::AuthenticationFailed)));
    }
    assert!(!m.is_authenticated());
    let persisted: Option<Session> = Persistence::new(backend).get(keys::SESSION).await.unwrap();
    assert!(persisted.is_none());
  }

  #[tokio::test]
  async fn session_survives_reload_until_logout() {
    let backend = MemoryStore::new();
    let mut m = manager(&backend).await;
    m.register("AB123", "pw", "pw").await.unwrap();
    m.login("ab123", "pw").await.unwrap();

    let mut reloaded = manager(&backend).await;
    assert!(reloaded.is_authenticated());
    assert_eq!(reloaded.current().unwrap().identifier, "AB123");
    assert_eq!(reloaded.users().len(), 1);

    reloaded.logout().await.unwrap();
    assert!(!reloaded.is_authenticated());
    assert!(matches!(reloaded.require_user(), Err(Error::NotAuthenticated)));

    let after_logout = manager(&backend).await;
    assert!(!after_logout.is_authenticated());
  }

  #[tokio::test]
  async fn failed_logout_keeps_the_session() {
    let backend = FailingStore::new();
    let db = Persistence::new(backend.clone());
    let mut m = SessionManager::restore(db, hasher(), Vec::new()).await.unwrap();
    m.register("AB123", "pw", "pw").await.unwrap();
    m.login("AB123", "pw").await.unwrap();

    backend.fail_writes();
    assert!(matches!(m.logout().await, Err(Error::Store(_))));
    assert!(m.is_authenticated());

    let persisted: Option<Session> =
      Persistence::new(backend.inner.clone()).get(keys::SESSION).await.unwrap();
    assert_eq!(persisted.as_ref(), m.current());
  }

  #[tokio::test]
  async fn failed_registration_leaves_users_untouched() {
    let backend = FailingStore::new();
    let db = Persistence::new(backend.clone());
    let mut m = SessionManager::restore(db, hasher(), Vec::new()).await.unwrap();
    m.register("AB123", "pw", "pw").await.unwrap();

    backend.fail_writes();
    assert!(m.register("CD456", "pw", "pw").await.is_err());
    assert_eq!(m.users().len(), 1);
    assert!(m.login("CD456", "pw").await.is_err());
  }
}

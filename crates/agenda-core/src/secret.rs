//! Salted one-way hashing of login secrets.

use argon2::{
  Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier,
  Version, password_hash::SaltString,
};
use rand_core::OsRng;

use crate::{Error, Result};

/// Hashes and verifies secrets as argon2id PHC strings.
#[derive(Clone)]
pub struct SecretHasher {
  argon2: Argon2<'static>,
}

impl Default for SecretHasher {
  fn default() -> Self { Self { argon2: Argon2::default() } }
}

impl SecretHasher {
  /// A hasher with explicit argon2id cost parameters.
  pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self> {
    let params = Params::new(memory_kib, iterations, 1, None)
      .map_err(|e| Error::Hash(e.to_string()))?;
    Ok(Self { argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) })
  }

  /// Hash `secret` under a fresh random salt.
  pub fn hash(&self, secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    self
      .argon2
      .hash_password(secret.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| Error::Hash(e.to_string()))
  }

  /// Check `secret` against a stored PHC string. A malformed hash simply
  /// fails verification.
  pub fn verify(&self, secret: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
      return false;
    };
    self.argon2.verify_password(secret.as_bytes(), &parsed).is_ok()
  }
}

/// Whether `value` already looks like an argon2 PHC string.
pub fn is_phc_hash(value: &str) -> bool { value.starts_with("$argon2") }

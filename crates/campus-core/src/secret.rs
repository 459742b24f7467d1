//! The password-hashing capability.

use argon2::{
  Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
  password_hash::SaltString,
};
use rand_core::OsRng;

use crate::{Error, Result};

/// Hashes and verifies secrets. The rest of the crate never inspects the
/// hash format.
pub trait SecretHasher: Send + Sync {
  fn hash(&self, secret: &str) -> Result<String>;

  fn verify(&self, secret: &str, hash: &str) -> bool;
}

/// argon2id with a random per-hash salt; produces PHC strings.
#[derive(Clone)]
pub struct Argon2Hasher {
  argon: Argon2<'static>,
}

impl Argon2Hasher {
  /// Build a hasher with an explicit cost (memory in KiB, iterations, lanes).
  pub fn with_cost(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
    let params = Params::new(memory_kib, iterations, parallelism, None)
      .map_err(|e| Error::Hashing(e.to_string()))?;
    Ok(Self { argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) })
  }
}

impl Default for Argon2Hasher {
  fn default() -> Self { Self { argon: Argon2::default() } }
}

impl SecretHasher for Argon2Hasher {
  fn hash(&self, secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    self
      .argon
      .hash_password(secret.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| Error::Hashing(e.to_string()))
  }

  fn verify(&self, secret: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
      return false;
    };
    self.argon.verify_password(secret.as_bytes(), &parsed).is_ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cheap() -> Argon2Hasher { Argon2Hasher::with_cost(1024, 1, 1).unwrap() }

  #[test]
  fn hash_then_verify() {
    let hasher = cheap();
    let hash = hasher.hash("15/05/2006").unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(hasher.verify("15/05/2006", &hash));
    assert!(!hasher.verify("16/05/2006", &hash));
  }

  #[test]
  fn garbage_hash_never_verifies() {
    assert!(!cheap().verify("anything", "not-a-phc-string"));
  }

  #[test]
  fn invalid_cost_is_rejected() {
    assert!(matches!(Argon2Hasher::with_cost(1, 0, 0), Err(Error::Hashing(_))));
  }
}

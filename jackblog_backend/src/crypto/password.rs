//! One-way hashing of comment passwords using Argon2id.

use crate::config::PasswordConfig;
use anyhow::{anyhow, Result};
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

/// Salt size for Argon2 (128 bits)
const SALT_SIZE: usize = 16;

/// Hashing collaborator used when storing and checking comment passwords.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String>;
    /// `Ok(false)` for a wrong password; `Err` only for a malformed digest.
    fn matches(&self, plaintext: &str, digest: &str) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct Argon2Passwords {
    params: Params,
}

impl Argon2Passwords {
    pub fn new(config: PasswordConfig) -> Result<Self> {
        let params = Params::new(config.memory_kib, config.iterations, 1, None)
            .map_err(|e| anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Passwords {
    fn hash(&self, plaintext: &str) -> Result<String> {
        let salt: [u8; SALT_SIZE] = rand::random();
        let salt = SaltString::encode_b64(&salt).map_err(|e| anyhow!("invalid salt: {e}"))?;
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    fn matches(&self, plaintext: &str, digest: &str) -> Result<bool> {
        let parsed =
            PasswordHash::new(digest).map_err(|e| anyhow!("invalid password hash: {e}"))?;
        // Cost parameters are read back from the PHC string, so digests made
        // under older settings still verify.
        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow!("password verification failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2Passwords {
        Argon2Passwords::new(PasswordConfig::minimal()).expect("params")
    }

    #[test]
    fn hash_then_match() {
        let hasher = hasher();
        let digest = hasher.hash("p@ss1").unwrap();
        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.matches("p@ss1", &digest).unwrap());
        assert!(!hasher.matches("p@ss2", &digest).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = hasher();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn digest_from_other_cost_still_verifies() {
        let cheap = hasher();
        let digest = cheap.hash("secret").unwrap();
        let other = Argon2Passwords::new(PasswordConfig {
            memory_kib: 16,
            iterations: 2,
        })
        .unwrap();
        assert!(other.matches("secret", &digest).unwrap());
    }

    #[test]
    fn malformed_digest_is_an_error() {
        assert!(hasher().matches("secret", "not-a-phc-string").is_err());
    }

    #[test]
    fn rejects_invalid_params() {
        assert!(Argon2Passwords::new(PasswordConfig {
            memory_kib: 1,
            iterations: 0,
        })
        .is_err());
    }
}

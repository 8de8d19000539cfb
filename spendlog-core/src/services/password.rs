//! Password hashing - Argon2id PHC digests

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::Rng;

use crate::domain::result::{Error, Result};
use crate::domain::Argon2Params;

/// One-way, salted credential hasher
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Argon2Params,
}

impl PasswordHasher {
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.params.memory_cost,
            self.params.time_cost,
            self.params.parallelism,
            None,
        )
        .map_err(|e| Error::Hashing(format!("invalid argon2 params: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash `password` into a PHC string with a fresh 16-byte salt
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt_bytes: [u8; 16] = rand::thread_rng().gen();
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| Error::Hashing(format!("failed to encode salt: {}", e)))?;

        let digest = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Hashing(format!("failed to hash password: {}", e)))?;
        Ok(digest.to_string())
    }

    /// Check `password` against a stored digest.
    ///
    /// The cost parameters come from the digest itself, so hashes made with
    /// older settings keep verifying. A digest that does not parse is a
    /// mismatch.
    pub fn verify(&self, digest: &str, password: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

//! Secret hashing with Argon2id PHC strings

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::domain::result::{Error, Result};
use crate::domain::Argon2Params;

const DUMMY_SECRET: &str = "oralvis-dummy-secret";

/// Hashes and verifies account secrets
pub struct SecretHasher {
    argon2: Argon2<'static>,
    /// Hash verified against for unknown identities, built up front
    dummy_hash: String,
}

impl SecretHasher {
    pub fn new(params: &Argon2Params) -> Result<Self> {
        let params = Params::new(params.memory_cost, params.time_cost, params.parallelism, None)
            .map_err(|e| Error::config(format!("invalid argon2 parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, DUMMY_SECRET)?;
        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a secret with a fresh random salt
    pub fn hash(&self, secret: &str) -> Result<String> {
        hash_with(&self.argon2, secret)
    }

    /// Check a secret against a stored PHC string.
    ///
    /// Parameters come from the PHC string itself. Unparseable hashes never verify.
    pub fn verify(&self, secret: &str, phc: &str) -> bool {
        match PasswordHash::new(phc) {
            Ok(parsed) => self
                .argon2
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Burn the same work as a real verification, for identities that do not exist
    pub fn verify_dummy(&self, secret: &str) -> bool {
        self.verify(secret, &self.dummy_hash);
        false
    }
}

fn hash_with(argon2: &Argon2<'_>, secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(secret.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| Error::config(format!("failed to hash secret: {}", e)))
}

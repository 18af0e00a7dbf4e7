//! Salted one-way password credentials.
//!
//! Every call to [`CredentialHasher::create`] draws a fresh salt from the OS
//! RNG and keys Argon2id with it. The hash (PHC string) and the salt are stored
//! side by side on the account row.

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::config::SecurityConfig;

/// Stored credential material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub hash: String,
    pub salt: String,
}

#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Builds a hasher from the configured Argon2 cost parameters.
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes `secret` under a newly generated salt.
    pub fn create(&self, secret: &str) -> Result<Credential> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

        Ok(Credential {
            hash: hash.to_string(),
            salt: salt.as_str().to_string(),
        })
    }

    /// Recomputes the hash of `secret` with the stored salt and compares.
    ///
    /// Malformed stored material never verifies.
    #[must_use]
    pub fn verify(&self, secret: &str, hash: &str, salt: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };

        if parsed.salt.map(|s| s.as_str()) != Some(salt) {
            return false;
        }

        // Cost parameters come from the PHC string, so hashes made under older
        // settings still verify.
        self.argon2()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}

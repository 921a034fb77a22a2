//! Password hashing for stored credentials.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::{EngineError, ResultEngine};

/// Hashes and verifies user passwords with argon2id.
///
/// Only the PHC-format hash string is ever persisted.
#[derive(Clone, Copy, Debug, Default)]
pub struct PasswordEncoder;

impl PasswordEncoder {
    /// Hashes a raw password with a fresh random salt.
    pub fn encode(&self, raw: &str) -> ResultEngine<String> {
        if raw.is_empty() {
            return Err(EngineError::Credential(
                "password must not be empty".to_string(),
            ));
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|err| EngineError::Credential(format!("failed to hash password: {err}")))?;
        Ok(hash.to_string())
    }

    /// Verifies a raw password against a stored hash.
    pub fn matches(&self, raw: &str, encoded: &str) -> ResultEngine<bool> {
        let parsed = PasswordHash::new(encoded)
            .map_err(|err| EngineError::Credential(format!("malformed password hash: {err}")))?;
        Ok(Argon2::default()
            .verify_password(raw.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_password() {
        let encoder = PasswordEncoder;
        let hash = encoder.encode("s3cret").unwrap();

        assert!(encoder.matches("s3cret", &hash).unwrap());
        assert!(!encoder.matches("other", &hash).unwrap());
    }

    #[test]
    fn rejects_empty_password() {
        let encoder = PasswordEncoder;
        assert!(encoder.encode("").is_err());
    }

    #[test]
    fn rejects_malformed_hash() {
        let encoder = PasswordEncoder;
        assert!(encoder.matches("s3cret", "not-a-hash").is_err());
    }
}

//! Argon2id hashing of guest passwords.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use shared::error::{ApiError, ErrorCode};

#[derive(Clone, Default)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a PHC string embedding the algorithm, parameters and salt.
    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        if password.is_empty() {
            return Err(ApiError::validation("no password provided"));
        }
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| {
                tracing::error!(%error, "password hashing failed");
                ApiError::new(ErrorCode::Internal, "password hashing failed")
            })
    }

    /// A malformed stored hash counts as a mismatch.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            tracing::warn!("stored password hash is malformed");
            return false;
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Verifies against a throwaway hash and always fails, so a lookup miss
    /// costs the same as a wrong password.
    pub fn verify_dummy_password(&self, password: &str) -> bool {
        static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
        let dummy = DUMMY_HASH.get_or_init(|| self.hash_password("easywed-unknown-guest").ok());
        if let Some(hash) = dummy {
            let _ = self.verify_password(password, hash);
        }
        false
    }
}

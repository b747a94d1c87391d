//! Credential verification with per-class storage policy.
//!
//! Account passwords and family security PINs are hashed at rest
//! (Argon2id, random salt). Per-caretaker PINs are stored plain: they are
//! short, shareable household codes, never the credential protecting the
//! account owner's identity, and the product needs to redisplay and rotate
//! them. The asymmetry is a product decision, recorded in the type system
//! rather than scattered as convention.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use subtle::ConstantTimeEq;

use super::AuthError;

/// How a secret class is stored and therefore compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretPolicy {
    /// Argon2id PHC string at rest; verified through the hash.
    Hashed,
    /// Plain value at rest; compared in constant time.
    Plaintext,
}

/// Verify a submitted secret against its stored form under the given policy.
pub fn verify_secret(
    candidate: &str,
    stored: &str,
    policy: SecretPolicy,
) -> Result<bool, AuthError> {
    match policy {
        SecretPolicy::Hashed => {
            let parsed = argon2::PasswordHash::new(stored)
                .map_err(|e| AuthError::Internal(format!("invalid stored hash: {}", e)))?;
            match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(AuthError::Internal(format!("hash verify: {}", e))),
            }
        }
        SecretPolicy::Plaintext => {
            Ok(candidate.as_bytes().ct_eq(stored.as_bytes()).into())
        }
    }
}

/// Hash a secret for at-rest storage of the Hashed classes.
pub fn hash_secret(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("hash: {}", e)))
}

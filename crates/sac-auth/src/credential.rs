//! Credential hashing and the registration bootstrap scheme
//!
//! Credentials are stored as Argon2id PHC strings. Registration derives a
//! one-time bootstrap credential (`username + last 4 phone digits`); accounts
//! created that way carry a must-change flag until the credential is rotated.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Error types for credential operations
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to hash credential: {0}")]
    HashingFailed(String),

    #[error("Failed to verify credential: {0}")]
    VerificationFailed(String),

    #[error("Invalid credential hash format: {0}")]
    InvalidHashFormat(String),

    #[error("Phone number must contain at least 4 digits")]
    PhoneTooShort,
}

/// Hash a credential with Argon2id and a random salt
pub fn hash_credential(credential: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(credential.as_bytes(), &salt)
        .map_err(|e| CredentialError::HashingFailed(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a credential against a stored PHC hash
pub fn verify_credential(credential: &str, hash: &str) -> Result<bool, CredentialError> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| CredentialError::InvalidHashFormat(e.to_string()))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(credential.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CredentialError::VerificationFailed(e.to_string())),
    }
}

/// Derive the bootstrap credential issued at registration.
///
/// This is a predictable one-time value, not a secret; the account is flagged
/// for mandatory rotation on first login.
pub fn bootstrap_credential(username: &str, phone: &str) -> Result<String, CredentialError> {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return Err(CredentialError::PhoneTooShort);
    }

    let last_four: String = digits[digits.len() - 4..].iter().collect();
    Ok(format!("{}{}", username, last_four))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_produces_argon2id_phc_string() {
        let hash = hash_credential("22110034563210").expect("Failed to hash");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
    }

    #[test]
    fn test_verify_roundtrip() {
        let hash = hash_credential("22110034563210").expect("Failed to hash");

        assert!(verify_credential("22110034563210", &hash).unwrap());
        assert!(!verify_credential("22110034560000", &hash).unwrap());
    }

    #[test]
    fn test_same_credential_different_salts() {
        let hash1 = hash_credential("secret").unwrap();
        let hash2 = hash_credential("secret").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_credential("secret", &hash1).unwrap());
        assert!(verify_credential("secret", &hash2).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash_format() {
        let result = verify_credential("anything", "not-a-phc-string");
        assert!(matches!(result, Err(CredentialError::InvalidHashFormat(_))));
    }

    #[test]
    fn test_bootstrap_credential_derivation() {
        let credential = bootstrap_credential("2211003456", "9876543210").unwrap();
        assert_eq!(credential, "22110034563210");
    }

    #[test]
    fn test_bootstrap_credential_ignores_separators() {
        let credential = bootstrap_credential("2211003456", "98765-43210").unwrap();
        assert_eq!(credential, "22110034563210");
    }

    #[test]
    fn test_bootstrap_credential_short_phone() {
        let result = bootstrap_credential("2211003456", "321");
        assert!(matches!(result, Err(CredentialError::PhoneTooShort)));
    }

    #[test]
    fn test_bootstrap_credential_verifies_after_hashing() {
        let credential = bootstrap_credential("2211003456", "9876543210").unwrap();
        let hash = hash_credential(&credential).unwrap();

        assert!(verify_credential("22110034563210", &hash).unwrap());
    }
}

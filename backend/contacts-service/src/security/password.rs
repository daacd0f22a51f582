/// Password hashing and verification using Argon2id
use crate::error::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id with a random per-password salt.
///
/// Returns a PHC-formatted hash string safe for database storage.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its PHC-formatted hash.
///
/// Returns `false` both on mismatch and when the stored digest does not
/// parse as a valid PHC string.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_valid_password() {
        let password = "s3cretpass";
        let hash = hash_password(password).expect("should hash password successfully");
        assert!(verify_password(password, &hash));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("s3cretpass").expect("should hash password successfully");
        assert!(!verify_password("wrongpass1", &hash));
    }

    #[test]
    fn test_verify_malformed_hash_is_non_match() {
        assert!(!verify_password("s3cretpass", "not-a-phc-string"));
        assert!(!verify_password("s3cretpass", ""));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = "s3cretpass";
        let hash1 = hash_password(password).expect("should hash successfully");
        let hash2 = hash_password(password).expect("should hash successfully");
        // Different salts should produce different hashes
        assert_ne!(hash1, hash2);
    }
}

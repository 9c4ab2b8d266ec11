//! Password hashing and JWT issuance.
//!
//! Passwords are stored as argon2id PHC strings, never in cleartext. Tokens
//! are HS256 JWTs carrying the account id and username; expiry defaults to
//! seven days and is configurable.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Payload carried in a signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account row id
    pub id: i64,
    pub username: String,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
}

/// Hash a password into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::Hash(format!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, StoreError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| StoreError::Hash(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Signs and validates the server's bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
    expiry_days: i64,
}

impl TokenSigner {
    pub fn new(secret: impl Into<String>, expiry_days: i64) -> Self {
        Self {
            secret: secret.into(),
            expiry_days,
        }
    }

    /// Generate a token for an authenticated account.
    pub fn issue(&self, id: i64, username: &str) -> Result<String, StoreError> {
        let exp = (chrono::Utc::now() + chrono::Duration::days(self.expiry_days)).timestamp();
        let claims = Claims {
            id,
            username: username.to_string(),
            exp,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Verify and decode a token. Fails on bad signatures and past expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, StoreError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signer() -> TokenSigner {
        TokenSigner::new("test-secret-that-is-at-least-32-characters-long", 7)
    }

    #[test]
    fn hash_and_verify_password() {
        let hash = hash_password("secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("secret123").unwrap();
        let second = hash_password("secret123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn issue_and_verify_token() {
        let signer = test_signer();
        let token = signer.issue(42, "bob").unwrap();
        assert!(!token.is_empty());

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.username, "bob");
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let token = test_signer().issue(1, "bob").unwrap();
        let other = TokenSigner::new("different-secret-that-is-also-32-chars!!", 7);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn garbage_tokens_fail_verification() {
        assert!(test_signer().verify("not-a-token").is_err());
    }

    #[test]
    fn expired_tokens_fail_verification() {
        let signer = TokenSigner::new("test-secret-that-is-at-least-32-characters-long", -1);
        let token = signer.issue(1, "bob").unwrap();
        assert!(signer.verify(&token).is_err());
    }
}

//! Admin credential verification.
//!
//! The session layer never compares passwords itself: it hands the stored
//! credential row to a [`CredentialVerifier`] and only consumes the boolean
//! answer. [`Argon2Verifier`] checks an Argon2id PHC hash kept on the row.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::models::{AdminCredential, AdminUser};

/// Message shown for every rejected login.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Errors from password hashing.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Hashing failed.
    #[error("password hashing failed")]
    PasswordHash,
}

/// Decides whether a password matches a stored credential.
pub trait CredentialVerifier: Send + Sync {
    /// Whether `password` is valid for `credential`.
    fn verify(&self, credential: &AdminCredential, password: &SecretString) -> bool;
}

/// Verifies the Argon2 hash stored in `password_hash`.
///
/// Rows without a hash, or with a hash that does not parse, never match.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Verifier;

impl CredentialVerifier for Argon2Verifier {
    fn verify(&self, credential: &AdminCredential, password: &SecretString) -> bool {
        credential
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(password.expose_secret(), hash))
    }
}

/// Why a login was refused.
///
/// Kept for logs and tests; users only ever see [`INVALID_CREDENTIALS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginRejection {
    /// No admin user has this email.
    UnknownEmail,
    /// The password did not verify.
    WrongPassword,
    /// The form was rejected before any lookup.
    MalformedInput,
}

impl LoginRejection {
    /// The generic message shown to users.
    #[must_use]
    pub const fn message(self) -> &'static str {
        INVALID_CREDENTIALS
    }
}

/// Result of a login attempt that reached a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(AdminUser),
    Rejected(LoginRejection),
}

impl LoginOutcome {
    /// Whether the login succeeded.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a PHC hash string.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use toppers_core::{AdminUserId, Email};

    fn credential(password_hash: Option<String>) -> AdminCredential {
        AdminCredential {
            user: AdminUser {
                id: AdminUserId::new("u1"),
                email: Email::parse("admin@toppers.example").unwrap(),
                role: "admin".to_owned(),
                created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            },
            password_hash,
        }
    }

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_verifier() {
        let hash = hash_password("correct horse battery").unwrap();
        let row = credential(Some(hash));
        let verifier = Argon2Verifier;

        assert!(verifier.verify(&row, &SecretString::from("correct horse battery".to_owned())));
        assert!(!verifier.verify(&row, &SecretString::from("nope".to_owned())));
    }

    #[test]
    fn test_rows_without_usable_hash_never_match() {
        let password = SecretString::from("anything".to_owned());
        assert!(!Argon2Verifier.verify(&credential(None), &password));
        assert!(!Argon2Verifier.verify(&credential(Some("plaintext".to_owned())), &password));
    }

    #[test]
    fn test_rejections_share_one_message() {
        for rejection in [
            LoginRejection::UnknownEmail,
            LoginRejection::WrongPassword,
            LoginRejection::MalformedInput,
        ] {
            assert_eq!(rejection.message(), "Invalid credentials");
        }
    }
}

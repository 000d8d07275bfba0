//! Admin session, persisted to local storage.
//!
//! At most one admin is signed in per storage location. The session has no
//! expiry: it lasts until [`SessionStore::logout`] or until the stored key is
//! removed by hand.

use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::auth::{CredentialVerifier, LoginOutcome, LoginRejection};
use crate::error::CatalogError;
use crate::models::AdminUser;
use crate::query::CatalogClient;
use crate::storage::{LocalStorage, StorageError};
use crate::validation::validate_login;

/// Storage key holding the signed-in admin user as a JSON object.
pub const SESSION_KEY: &str = "admin-user";

/// The current admin session.
#[derive(Debug)]
pub struct SessionStore<S> {
    storage: S,
    user: Option<AdminUser>,
}

impl<S: LocalStorage> SessionStore<S> {
    /// Read the persisted session.
    ///
    /// Unreadable data counts as signed out and is removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the storage backend itself fails.
    pub fn load(storage: S) -> Result<Self, StorageError> {
        let user = match storage.get(SESSION_KEY)? {
            None => None,
            Some(raw) => match serde_json::from_str::<AdminUser>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable admin session");
                    storage.remove(SESSION_KEY)?;
                    None
                }
            },
        };

        debug!(authenticated = user.is_some(), "Session loaded");
        Ok(Self { storage, user })
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The signed-in admin, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&AdminUser> {
        self.user.as_ref()
    }

    /// The signed-in admin.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Unauthorized` when nobody is signed in.
    pub fn require_admin(&self) -> Result<&AdminUser, CatalogError> {
        self.user.as_ref().ok_or(CatalogError::Unauthorized)
    }

    /// Persist `user` as the active session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be written; nothing
    /// changes in memory in that case.
    pub fn start(&mut self, user: AdminUser) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&user)?;
        self.storage.set(SESSION_KEY, &raw)?;
        self.user = Some(user);
        Ok(())
    }

    /// End the session.
    ///
    /// Memory is cleared first, whatever happens to the stored copy.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the stored session cannot be removed.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        if let Some(user) = self.user.take() {
            info!(user_id = %user.id, "Admin signed out");
        }
        self.storage.remove(SESSION_KEY)
    }

    /// Sign in with email and password.
    ///
    /// Rejections are returned as [`LoginOutcome::Rejected`] and leave the
    /// current session untouched; all of them share one user-facing message.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Read` if the admin lookup fails and
    /// `CatalogError::Storage` if the session cannot be saved.
    pub async fn login(
        &mut self,
        client: &CatalogClient,
        verifier: &dyn CredentialVerifier,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, CatalogError> {
        let Ok(email) = validate_login(email, password) else {
            debug!("Login form rejected");
            return Ok(LoginOutcome::Rejected(LoginRejection::MalformedInput));
        };

        let Some(credential) = client.find_admin_user(&email).await? else {
            info!(rejection = ?LoginRejection::UnknownEmail, "Login rejected");
            return Ok(LoginOutcome::Rejected(LoginRejection::UnknownEmail));
        };

        if !verifier.verify(&credential, password) {
            info!(rejection = ?LoginRejection::WrongPassword, "Login rejected");
            return Ok(LoginOutcome::Rejected(LoginRejection::WrongPassword));
        }

        let user = credential.user;
        self.start(user.clone())?;
        info!(user_id = %user.id, "Admin signed in");
        Ok(LoginOutcome::Authenticated(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::{Argon2Verifier, hash_password};
    use crate::backend::MemoryStore;
    use crate::config::QueryOptions;
    use crate::models::AdminCredential;
    use crate::storage::MemoryStorage;
    use toppers_core::{AdminUserId, Email};

    const PASSWORD: &str = "correct horse battery";

    fn admin() -> AdminUser {
        AdminUser {
            id: AdminUserId::new("u1"),
            email: Email::parse("admin@toppers.example").unwrap(),
            role: "admin".to_owned(),
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    fn client() -> CatalogClient {
        let store = MemoryStore::new();
        store
            .seed_admin(AdminCredential {
                user: admin(),
                password_hash: Some(hash_password(PASSWORD).unwrap()),
            })
            .unwrap();
        CatalogClient::new(store, QueryOptions::default(), "/placeholder.svg")
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[tokio::test]
    async fn test_login_persists_user() {
        let storage = MemoryStorage::new();
        let mut session = SessionStore::load(storage.clone()).unwrap();

        let outcome = session
            .login(&client(), &Argon2Verifier, "Admin@Toppers.example", &secret(PASSWORD))
            .await
            .unwrap();
        assert_eq!(outcome, LoginOutcome::Authenticated(admin()));
        assert!(session.is_authenticated());

        let restored = SessionStore::load(storage).unwrap();
        assert_eq!(restored.user(), Some(&admin()));
    }

    #[tokio::test]
    async fn test_wrong_password_stays_signed_out() {
        let storage = MemoryStorage::new();
        let mut session = SessionStore::load(&storage).unwrap();

        let outcome = session
            .login(&client(), &Argon2Verifier, "admin@toppers.example", &secret("guess"))
            .await
            .unwrap();
        assert_eq!(outcome, LoginOutcome::Rejected(LoginRejection::WrongPassword));
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_email_and_malformed_input() {
        let mut session = SessionStore::load(MemoryStorage::new()).unwrap();
        let client = client();

        let outcome = session
            .login(&client, &Argon2Verifier, "nobody@toppers.example", &secret(PASSWORD))
            .await
            .unwrap();
        assert_eq!(outcome, LoginOutcome::Rejected(LoginRejection::UnknownEmail));

        let outcome = session
            .login(&client, &Argon2Verifier, "admin", &secret(""))
            .await
            .unwrap();
        assert_eq!(outcome, LoginOutcome::Rejected(LoginRejection::MalformedInput));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_corrupt_session_is_removed() {
        let storage = MemoryStorage::new();
        storage.set(SESSION_KEY, "{\"id\":").unwrap();

        let session = SessionStore::load(&storage).unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn test_logout_clears_memory_and_storage() {
        let storage = MemoryStorage::new();
        let mut session = SessionStore::load(&storage).unwrap();
        session.start(admin()).unwrap();
        assert!(session.require_admin().is_ok());

        session.logout().unwrap();
        assert!(!session.is_authenticated());
        assert!(matches!(session.require_admin(), Err(CatalogError::Unauthorized)));
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }
}

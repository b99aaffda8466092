#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory credential store for SafeTravels.
//!
//! Accounts live for the lifetime of the server process. Passwords are
//! never stored in the clear: each account keeps a random salt and the
//! hex-encoded SHA-256 digest of `salt || password`.
//!
//! The store is seeded with the `test1`/`test1` account used by the
//! acceptance tests.

use std::collections::BTreeMap;
use std::sync::RwLock;

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Username of the account every fresh store starts with.
pub const SEED_USERNAME: &str = "test1";

const SEED_PASSWORD: &str = "test1";

/// Reasons a login or registration is refused.
///
/// The `Display` strings are returned to the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Username or password was empty.
    #[error("Username and password are required")]
    MissingCredentials,

    /// No account with that username exists.
    #[error("User not found")]
    UserNotFound,

    /// The password did not match.
    #[error("Invalid username or password")]
    InvalidPassword,

    /// Registration attempted for a username that is taken.
    #[error("Username already exists")]
    UsernameTaken,
}

struct StoredCredential {
    salt: String,
    digest: String,
}

impl StoredCredential {
    fn new(password: &str) -> Self {
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let digest = hash_password(&salt, password);
        Self { salt, digest }
    }

    fn matches(&self, password: &str) -> bool {
        hash_password(&self.salt, password) == self.digest
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Thread-safe username → credential map.
pub struct UserStore {
    users: RwLock<BTreeMap<String, StoredCredential>>,
}

impl UserStore {
    /// Creates a store holding only the seed account.
    #[must_use]
    pub fn new() -> Self {
        let store = Self::empty();
        if let Ok(mut users) = store.users.write() {
            users.insert(
                SEED_USERNAME.to_string(),
                StoredCredential::new(SEED_PASSWORD),
            );
        }
        store
    }

    /// Creates a store with no accounts.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] if either field is empty,
    /// or [`AuthError::UsernameTaken`] if the username already exists.
    pub fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        validate(username, password)?;

        let mut users = self
            .users
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if users.contains_key(username) {
            log::debug!("Registration refused: {username} already exists");
            return Err(AuthError::UsernameTaken);
        }

        users.insert(username.to_string(), StoredCredential::new(password));
        log::info!("Registered user {username} ({} accounts)", users.len());
        Ok(())
    }

    /// Checks a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] if either field is empty,
    /// [`AuthError::UserNotFound`] for an unknown username, or
    /// [`AuthError::InvalidPassword`] if the password does not match.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<(), AuthError> {
        validate(username, password)?;

        let users = self
            .users
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let credential = users.get(username).ok_or(AuthError::UserNotFound)?;
        if credential.matches(password) {
            Ok(())
        } else {
            log::debug!("Login refused for {username}: password mismatch");
            Err(AuthError::InvalidPassword)
        }
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the store has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

const fn validate(username: &str, password: &str) -> Result<(), AuthError> {
    if username.is_empty() || password.is_empty() {
        Err(AuthError::MissingCredentials)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_account_can_log_in() {
        let store = UserStore::new();
        assert_eq!(store.authenticate("test1", "test1"), Ok(()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn register_then_login() {
        let store = UserStore::new();
        store.register("newUsername42", "newPassword").unwrap();
        assert_eq!(store.authenticate("newUsername42", "newPassword"), Ok(()));
        assert_eq!(
            store.authenticate("newUsername42", "wrong"),
            Err(AuthError::InvalidPassword)
        );
    }

    #[test]
    fn duplicate_registration_is_refused() {
        let store = UserStore::new();
        store.register("newUsername", "newPassword").unwrap();
        assert_eq!(
            store.register("newUsername", "other"),
            Err(AuthError::UsernameTaken)
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn unknown_user_is_reported() {
        let store = UserStore::empty();
        assert!(store.is_empty());
        let err = store.authenticate("ghost", "pw").unwrap_err();
        assert_eq!(err, AuthError::UserNotFound);
        assert_eq!(err.to_string(), "User not found");
    }

    #[test]
    fn empty_fields_are_rejected() {
        let store = UserStore::new();
        assert_eq!(store.register("", "pw"), Err(AuthError::MissingCredentials));
        assert_eq!(
            store.authenticate("test1", ""),
            Err(AuthError::MissingCredentials)
        );
    }

    #[test]
    fn same_password_gets_distinct_digests() {
        let a = StoredCredential::new("hunter2");
        let b = StoredCredential::new("hunter2");
        assert_ne!(a.digest, b.digest);
        assert!(a.matches("hunter2"));
        assert!(!a.matches("hunter3"));
    }
}

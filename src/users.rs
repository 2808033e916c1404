//! Registered-user directory.
//!
//! Thin layer the engines consume for identity only: `user_id` is an
//! opaque key everywhere else. The password is an opaque credential
//! compared verbatim; strength checks and hashing are out of scope.

use crate::error::{Result, ValidationError};
use crate::store::{Store, User};
use std::sync::Arc;

/// Length of a fiscal code.
const TAX_CODE_LEN: usize = 16;

/// Directory of registered users over a storage backend.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn Store>,
}

impl UserDirectory {
    /// Create the directory over a storage backend.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register a new user. The handle must be non-empty and free of the
    /// record delimiter, the fiscal code exactly 16 characters, the
    /// e-mail plausible; handle, fiscal code and e-mail uniqueness is
    /// enforced by the storage layer.
    pub fn register(&self, user: User) -> Result<User> {
        if user.user_id.trim().is_empty() {
            return Err(field_error("user id", "must not be empty"));
        }
        if user.user_id.contains(';') {
            return Err(field_error("user id", "must not contain ';'"));
        }
        if user.tax_code.chars().count() != TAX_CODE_LEN {
            return Err(field_error("tax code", "must be exactly 16 characters"));
        }
        if !user.email.contains('@') || user.email.contains(';') {
            return Err(field_error("email", "not a plausible address"));
        }
        if user.password.is_empty() {
            return Err(field_error("password", "must not be empty"));
        }
        for (field, value) in [
            ("name", &user.name),
            ("surname", &user.surname),
            ("tax code", &user.tax_code),
            ("password", &user.password),
        ] {
            if value.contains(';') {
                return Err(field_error(field, "must not contain ';'"));
            }
        }

        self.store.insert_user(&user)?;
        tracing::info!(user = %user.user_id, "user registered");
        Ok(user)
    }

    /// Verify credentials by opaque comparison.
    pub fn authenticate(&self, handle: &str, password: &str) -> Result<bool> {
        Ok(self
            .store
            .find_user(handle)?
            .is_some_and(|u| u.password == password))
    }

    /// Look up a user by handle.
    pub fn find_by_handle(&self, handle: &str) -> Result<Option<User>> {
        self.store.find_user(handle)
    }

    /// Whether a handle is registered.
    pub fn exists(&self, handle: &str) -> Result<bool> {
        Ok(self.store.find_user(handle)?.is_some())
    }

    /// All registered users.
    pub fn list(&self) -> Result<Vec<User>> {
        self.store.list_users()
    }

    /// Delete a user and everything they own. Returns whether the user
    /// existed.
    pub fn remove(&self, handle: &str) -> Result<bool> {
        let removed = self.store.delete_user(handle)?;
        if removed {
            tracing::info!(user = %handle, "user deleted");
        }
        Ok(removed)
    }
}

fn field_error(field: &'static str, reason: &str) -> crate::error::DomainError {
    ValidationError::InvalidUserField {
        field,
        reason: reason.to_string(),
    }
    .into()
}

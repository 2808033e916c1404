//! Pass-through facades for the presentation and remote-call layers.
//!
//! These carry no invariants of their own: they delegate to the catalog
//! and the user directory, logging each call the way the upstream
//! service layer expects. Transport framing stays out of scope.

use crate::catalog::{Book, Catalog};
use crate::error::Result;
use crate::store::User;
use crate::users::UserDirectory;
use std::sync::Arc;

/// Search facade over the catalog.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<Catalog>,
}

impl CatalogService {
    /// Create the facade over the shared catalog.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Title substring search.
    pub fn search_by_title(&self, query: &str) -> Vec<Book> {
        let results = self.catalog.search_by_title(query);
        tracing::info!(query = %query, results = results.len(), "title search");
        results
    }

    /// Author substring search.
    pub fn search_by_author(&self, query: &str) -> Vec<Book> {
        let results = self.catalog.search_by_author(query);
        tracing::info!(query = %query, results = results.len(), "author search");
        results
    }

    /// Author substring search restricted by year containment.
    pub fn search_by_author_and_year(&self, query: &str, year: &str) -> Vec<Book> {
        let results = self.catalog.search_by_author_and_year(query, year);
        tracing::info!(query = %query, year = %year, results = results.len(), "author+year search");
        results
    }

    /// Book lookup by id.
    pub fn get_book_by_id(&self, id: i64) -> Option<Book> {
        self.catalog.find_by_id(id).cloned()
    }
}

/// User-directory facade.
#[derive(Clone)]
pub struct UserService {
    directory: UserDirectory,
}

impl UserService {
    /// Create the facade over the user directory.
    pub fn new(directory: UserDirectory) -> Self {
        Self { directory }
    }

    /// Credential check.
    pub fn authenticate(&self, handle: &str, password: &str) -> Result<bool> {
        let ok = self.directory.authenticate(handle, password)?;
        tracing::info!(user = %handle, ok = ok, "authentication attempt");
        Ok(ok)
    }

    /// Register a new user.
    pub fn register(&self, user: User) -> Result<User> {
        self.directory.register(user)
    }

    /// Whether a handle is registered.
    pub fn exists(&self, handle: &str) -> Result<bool> {
        self.directory.exists(handle)
    }

    /// Look up a user by handle.
    pub fn get_by_handle(&self, handle: &str) -> Result<Option<User>> {
        self.directory.find_by_handle(handle)
    }
}

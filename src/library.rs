//! Personal library management.
//!
//! A library is built as a draft (book by book, each id resolved against
//! the catalog), then committed in one validate-and-insert step. Once
//! committed it is immutable until deleted. Library ownership is the
//! gating predicate for ratings and recommendations: a user may only
//! rate or suggest from books that appear in at least one of their
//! libraries.

use crate::catalog::Catalog;
use crate::error::{Result, ValidationError};
use crate::store::{Library, Store, now_timestamp};
use std::sync::Arc;

/// Outcome of adding one book to a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddBook {
    /// The book was added.
    Added,
    /// The book was already in the draft; nothing changed.
    AlreadyPresent,
}

/// A library being assembled, before it is committed.
#[derive(Debug, Clone)]
pub struct LibraryDraft {
    owner_id: String,
    name: String,
    book_ids: Vec<i64>,
}

impl LibraryDraft {
    /// Start an empty draft for the given owner and name.
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            name: name.into(),
            book_ids: Vec::new(),
        }
    }

    /// Add a book by id, resolving it against the catalog. A book already
    /// in the draft is reported, not re-added and not an error.
    pub fn add_book(&mut self, catalog: &Catalog, book_id: i64) -> Result<AddBook> {
        if catalog.find_by_id(book_id).is_none() {
            return Err(crate::error::DomainError::NotFound {
                what: "book",
                id: book_id.to_string(),
            });
        }

        if self.book_ids.contains(&book_id) {
            tracing::warn!(book = book_id, library = %self.name, "book already in draft");
            return Ok(AddBook::AlreadyPresent);
        }

        self.book_ids.push(book_id);
        Ok(AddBook::Added)
    }

    /// Books collected so far, in insertion order.
    pub fn book_ids(&self) -> &[i64] {
        &self.book_ids
    }

    /// Draft name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Engine for creating, listing and deleting libraries.
#[derive(Clone)]
pub struct LibraryStore {
    store: Arc<dyn Store>,
}

impl LibraryStore {
    /// Create the engine over a storage backend.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Commit a draft. The name must be non-empty and free of the `;`
    /// and `:` delimiters, the draft must hold at least one book, and
    /// the (owner, name) pair must be unused; the storage layer's
    /// uniqueness check is authoritative for the last rule.
    pub fn create(&self, draft: LibraryDraft) -> Result<Library> {
        validate_name(&draft.name)?;

        if draft.book_ids.is_empty() {
            return Err(ValidationError::EmptyLibrary { name: draft.name }.into());
        }

        let library = Library {
            owner_id: draft.owner_id,
            name: draft.name,
            book_ids: draft.book_ids,
            created_at: now_timestamp(),
        };
        self.store.insert_library(&library)?;

        tracing::info!(
            owner = %library.owner_id,
            library = %library.name,
            books = library.book_ids.len(),
            "library created"
        );
        Ok(library)
    }

    /// All libraries owned by the user.
    pub fn list(&self, owner: &str) -> Result<Vec<Library>> {
        self.store.list_libraries(owner)
    }

    /// Look up one library by owner and name.
    pub fn find(&self, owner: &str, name: &str) -> Result<Option<Library>> {
        self.store.find_library(owner, name)
    }

    /// Delete a library; returns whether one existed. Ratings and
    /// recommendations that reference its books are left in place, since
    /// ownership checks span all of the owner's libraries.
    pub fn delete(&self, owner: &str, name: &str) -> Result<bool> {
        let deleted = self.store.delete_library(owner, name)?;
        if deleted {
            tracing::info!(owner = %owner, library = %name, "library deleted");
        }
        Ok(deleted)
    }

    /// Whether the book appears in any of the user's libraries.
    pub fn is_book_owned(&self, owner: &str, book_id: i64) -> Result<bool> {
        self.store.is_book_owned(owner, book_id)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyLibraryName.into());
    }
    if name.contains(':') || name.contains(';') {
        return Err(ValidationError::LibraryNameHasDelimiter {
            name: name.to_string(),
        }
        .into());
    }
    Ok(())
}

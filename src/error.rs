use crate::store::Criterion;
use thiserror::Error;

/// Main error type for the domain engine.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Unknown book, library or user id.
    #[error("{what} not found: {id}")]
    NotFound {
        /// What kind of entity was looked up.
        what: &'static str,
        /// The id that failed to resolve.
        id: String,
    },

    /// Input rejected before any write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The write collided with an existing record.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// The book is not in any of the user's libraries.
    #[error("book {book} is not in any library of user '{owner}'")]
    NotOwned {
        /// The acting user.
        owner: String,
        /// The book outside their libraries.
        book: i64,
    },

    /// I/O or constraint-engine failure in the storage layer.
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation failures, carrying the offending field and value.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A criterion score outside `1..=5`.
    #[error("score for {criterion} must be between 1 and 5, got {value}")]
    InvalidScore {
        /// The criterion the score was given for.
        criterion: Criterion,
        /// The rejected value.
        value: i64,
    },

    /// A note longer than 256 characters.
    #[error("note for {field} exceeds 256 characters ({len})")]
    NoteTooLong {
        /// The criterion (or "overall") the note was given for.
        field: &'static str,
        /// Actual length of the rejected note.
        len: usize,
    },

    /// A note containing the record delimiter.
    #[error("note for {field} must not contain ';'")]
    NoteHasDelimiter {
        /// The criterion (or "overall") the note was given for.
        field: &'static str,
    },

    /// An empty library name.
    #[error("library name must not be empty")]
    EmptyLibraryName,

    /// A library name containing a delimiter character.
    #[error("library name '{name}' must not contain ':' or ';'")]
    LibraryNameHasDelimiter {
        /// The rejected name.
        name: String,
    },

    /// A library committed without any book.
    #[error("cannot create an empty library '{name}'")]
    EmptyLibrary {
        /// The name of the rejected library.
        name: String,
    },

    /// A malformed user field.
    #[error("invalid {field}: {reason}")]
    InvalidUserField {
        /// Which registration field was rejected.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Write conflicts. Storage-level uniqueness is the authoritative signal
/// for these, so racing calls cannot both commit.
#[derive(Error, Debug)]
pub enum ConflictError {
    /// A rating already exists for this user and book.
    #[error("user '{owner}' already rated book {book}")]
    AlreadyRated {
        /// The rating user.
        owner: String,
        /// The already-rated book.
        book: i64,
    },

    /// The recommendation cap is already filled for this read book.
    #[error("user '{owner}' already suggested {limit} books for book {read_book}")]
    LimitReached {
        /// The recommending user.
        owner: String,
        /// The read book the cap applies to.
        read_book: i64,
        /// The cap that was hit.
        limit: usize,
    },

    /// The same target was already recommended for this read book.
    #[error("user '{owner}' already recommended book {target} for book {read_book}")]
    DuplicateTarget {
        /// The recommending user.
        owner: String,
        /// The read book the recommendation is anchored at.
        read_book: i64,
        /// The colliding target book.
        target: i64,
    },

    /// A library with this name already exists for the owner.
    #[error("user '{owner}' already has a library named '{name}'")]
    DuplicateName {
        /// The library owner.
        owner: String,
        /// The colliding name.
        name: String,
    },

    /// A user record collided on a unique field.
    #[error("a user with this {field} already exists: {value}")]
    DuplicateUser {
        /// The unique field that collided.
        field: &'static str,
        /// The colliding value.
        value: String,
    },
}

/// Result type alias for the domain engine.
pub type Result<T> = std::result::Result<T, DomainError>;

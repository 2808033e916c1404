//! Domain records and the persistence contract.
//!
//! Two interchangeable backends implement [`Store`]: a flat
//! delimited-file layout ([`flat::FlatStore`]) and a relational layout
//! ([`sqlite::SqliteStore`]). Both guarantee that every mutating call is
//! a single atomic validate-and-commit unit, so uniqueness and cap
//! checks cannot be raced past by concurrent callers.

pub mod flat;
pub mod sqlite;

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of recommendations per (owner, read book).
pub const RECOMMENDATION_CAP: usize = 3;

/// Placeholder stored for an all-whitespace note.
pub const EMPTY_NOTE: &str = "/";

/// The five rating criteria, in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criterion {
    /// Writing style.
    Stile,
    /// Content.
    Contenuto,
    /// Enjoyability.
    Gradevolezza,
    /// Originality.
    Originalita,
    /// Edition quality.
    Edizione,
}

impl Criterion {
    /// All criteria, in the order they appear in persisted records.
    pub const ALL: [Criterion; 5] = [
        Criterion::Stile,
        Criterion::Contenuto,
        Criterion::Gradevolezza,
        Criterion::Originalita,
        Criterion::Edizione,
    ];

    /// Lowercase label used in records and column names.
    pub fn label(&self) -> &'static str {
        match self {
            Criterion::Stile => "stile",
            Criterion::Contenuto => "contenuto",
            Criterion::Gradevolezza => "gradevolezza",
            Criterion::Originalita => "originalita",
            Criterion::Edizione => "edizione",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Registered user. The engine treats `user_id` as an opaque key and the
/// password as an opaque credential; no hashing or strength checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique login handle.
    pub user_id: String,
    /// First name.
    pub name: String,
    /// Surname.
    pub surname: String,
    /// Fiscal code, exactly 16 characters, unique.
    pub tax_code: String,
    /// E-mail address, unique.
    pub email: String,
    /// Opaque credential.
    #[serde(skip_serializing)]
    pub password: String,
}

/// A user's named collection of book ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    /// Owning user handle.
    pub owner_id: String,
    /// Library name, unique per owner.
    pub name: String,
    /// Member book ids; insertion order kept for display, set semantics.
    pub book_ids: Vec<i64>,
    /// Creation timestamp.
    pub created_at: i64,
}

impl Library {
    /// Whether the library contains the given book.
    pub fn contains(&self, book_id: i64) -> bool {
        self.book_ids.contains(&book_id)
    }
}

/// A committed multi-criterion rating. Append-only; exactly one per
/// (owner, book).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    /// Rating user handle.
    pub owner_id: String,
    /// Name of the library the rating was made through.
    pub library: String,
    /// Rated book id.
    pub book_id: i64,
    /// Criterion scores, indexed by [`Criterion::ALL`] order, each 1..=5.
    pub scores: [u8; 5],
    /// Criterion notes, same indexing.
    pub notes: [String; 5],
    /// Arithmetic mean of the five scores, unrounded.
    pub overall: f64,
    /// Free-text note on the overall score.
    pub overall_note: String,
    /// Creation timestamp.
    pub created_at: i64,
}

impl Rating {
    /// Score for one criterion.
    pub fn score(&self, c: Criterion) -> u8 {
        self.scores[c as usize]
    }

    /// Note for one criterion.
    pub fn note(&self, c: Criterion) -> &str {
        &self.notes[c as usize]
    }
}

/// A committed recommendation. Append-only; at most
/// [`RECOMMENDATION_CAP`] per (owner, read book).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Recommending user handle.
    pub owner_id: String,
    /// Name of the library the read book belongs to.
    pub library: String,
    /// The book the user read.
    pub read_book_id: i64,
    /// The book they suggest alongside it.
    pub recommended_book_id: i64,
    /// Optional free-text comment (persisted by the relational layout).
    pub comment: Option<String>,
    /// Creation timestamp.
    pub created_at: i64,
}

/// Persistence contract shared by both backends.
///
/// Inserts are authoritative for uniqueness: a duplicate rating key or an
/// over-cap recommendation batch fails with the matching `Conflict` kind
/// even if the caller's pre-checks passed, so racing calls cannot
/// double-write.
pub trait Store: Send + Sync {
    /// Insert a library; fails with `DuplicateName` on an (owner, name)
    /// collision.
    fn insert_library(&self, library: &Library) -> Result<()>;

    /// All libraries owned by the user, in storage order.
    fn list_libraries(&self, owner: &str) -> Result<Vec<Library>>;

    /// Look up one library by owner and name.
    fn find_library(&self, owner: &str, name: &str) -> Result<Option<Library>>;

    /// Delete a library; returns whether one existed. Ratings and
    /// recommendations referencing its books are left untouched.
    fn delete_library(&self, owner: &str, name: &str) -> Result<bool>;

    /// Whether the book appears in any library owned by the user.
    fn is_book_owned(&self, owner: &str, book_id: i64) -> Result<bool>;

    /// Append a rating; fails with `AlreadyRated` if one exists for the
    /// (owner, book) key.
    fn insert_rating(&self, rating: &Rating) -> Result<()>;

    /// Whether a rating exists for the (owner, book) key.
    fn has_rating(&self, owner: &str, book_id: i64) -> Result<bool>;

    /// All ratings of a book, across users, in storage order.
    fn ratings_for_book(&self, book_id: i64) -> Result<Vec<Rating>>;

    /// Append a batch of recommendations as one atomic write; fails with
    /// `LimitReached` if the batch would push any (owner, read book) key
    /// past the cap, or `DuplicateTarget` on a target collision. Nothing
    /// is written on failure.
    fn insert_recommendations(&self, batch: &[Recommendation]) -> Result<()>;

    /// Recommendations one user recorded for one read book.
    fn recommendations_by_reader(&self, owner: &str, read_book_id: i64)
    -> Result<Vec<Recommendation>>;

    /// All recommendations anchored at the given read book, across users.
    fn recommendations_for_book(&self, read_book_id: i64) -> Result<Vec<Recommendation>>;

    /// Insert a user; fails with `DuplicateUser` on a handle, tax code or
    /// e-mail collision.
    fn insert_user(&self, user: &User) -> Result<()>;

    /// Look up a user by handle.
    fn find_user(&self, handle: &str) -> Result<Option<User>>;

    /// All registered users, in storage order.
    fn list_users(&self) -> Result<Vec<User>>;

    /// Delete a user and cascade into their libraries, ratings and
    /// recommendations. Returns whether the user existed.
    fn delete_user(&self, handle: &str) -> Result<bool>;
}

/// Current Unix timestamp.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Convert a stored timestamp back to a `DateTime`.
pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}

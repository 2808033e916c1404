//! Read-only book index and searches.

pub mod book;
pub mod reader;

pub use book::Book;

use crate::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Immutable-for-the-session index over the cataloged books.
///
/// Built once at startup and shared by handle; every read is lock-free.
/// Searches iterate a title-keyed ordered map, so results come back in
/// lexicographic title order and books sharing the exact same title
/// collapse to the last one loaded.
pub struct Catalog {
    books: Vec<Book>,
    by_id: HashMap<i64, usize>,
    by_title: BTreeMap<String, usize>,
}

impl Catalog {
    /// Build the index from an already-loaded book list.
    pub fn new(books: Vec<Book>) -> Self {
        let mut by_id = HashMap::with_capacity(books.len());
        let mut by_title = BTreeMap::new();
        for (i, book) in books.iter().enumerate() {
            by_id.entry(book.id).or_insert(i);
            by_title.insert(book.title.clone(), i);
        }
        Self {
            books,
            by_id,
            by_title,
        }
    }

    /// Load the catalog from a delimited book file.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(reader::read_books(path)?))
    }

    /// Number of indexed books.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Look up a book by id.
    pub fn find_by_id(&self, id: i64) -> Option<&Book> {
        self.by_id.get(&id).map(|&i| &self.books[i])
    }

    /// Title of a book by id, for display glue.
    pub fn title_of(&self, id: i64) -> Option<&str> {
        self.find_by_id(id).map(|b| b.title.as_str())
    }

    /// Case-insensitive substring search over titles, ordered by title.
    pub fn search_by_title(&self, query: &str) -> Vec<Book> {
        let q = query.to_lowercase();
        self.ordered()
            .filter(|b| b.title.to_lowercase().contains(&q))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over authors, ordered by title.
    pub fn search_by_author(&self, query: &str) -> Vec<Book> {
        let q = query.to_lowercase();
        self.ordered()
            .filter(|b| b.authors.to_lowercase().contains(&q))
            .cloned()
            .collect()
    }

    /// Author substring match combined with year containment (substring
    /// match on the year field, not exact equality), ordered by title.
    pub fn search_by_author_and_year(&self, query: &str, year: &str) -> Vec<Book> {
        let q = query.to_lowercase();
        self.ordered()
            .filter(|b| b.authors.to_lowercase().contains(&q) && b.year.contains(year))
            .cloned()
            .collect()
    }

    fn ordered(&self) -> impl Iterator<Item = &Book> {
        self.by_title.values().map(|&i| &self.books[i])
    }
}

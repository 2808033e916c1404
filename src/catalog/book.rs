//! Book metadata model.

use serde::{Deserialize, Serialize};

/// A cataloged book. Records are externally assigned and immutable once
/// loaded; every other component refers to them by `id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier, assigned by the catalog source.
    pub id: i64,

    /// Book title.
    pub title: String,

    /// Authors, as a single display string (may list several names).
    pub authors: String,

    /// Book description or summary.
    pub description: String,

    /// Subject categories.
    pub categories: String,

    /// Publisher name.
    pub publisher: String,

    /// List price, free text.
    pub price: String,

    /// Publication month, free text.
    pub month: String,

    /// Publication year, free text (typically 4 digits).
    pub year: String,
}

impl Book {
    /// One-line display form used by listings.
    pub fn display_line(&self) -> String {
        format!("{} — {} ({})", self.title, self.authors, self.year)
    }
}

//! Book rating.
//!
//! One rating per (owner, book), five criterion scores in `1..=5` with a
//! free-text note each, plus a derived overall score. Ratings are
//! append-only; there is no update path.

use crate::error::{ConflictError, DomainError, Result, ValidationError};
use crate::store::{Criterion, EMPTY_NOTE, Rating, Store, now_timestamp};
use std::sync::Arc;

/// Longest accepted note, in characters.
pub const MAX_NOTE_LEN: usize = 256;

/// Engine committing validated ratings.
#[derive(Clone)]
pub struct RatingEngine {
    store: Arc<dyn Store>,
}

impl RatingEngine {
    /// Create the engine over a storage backend.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Validate and commit a rating in one atomic step.
    ///
    /// Checks run in order: the book must be owned, not yet rated by this
    /// user, every score in `1..=5`, every note within limits. An
    /// all-whitespace note is normalized to `"/"`, not rejected. The
    /// overall score is the unrounded arithmetic mean of the five. The
    /// storage layer's uniqueness check remains authoritative, so two
    /// racing calls cannot both commit.
    pub fn rate_book(
        &self,
        owner: &str,
        library: &str,
        book_id: i64,
        scores: [i64; 5],
        notes: [&str; 5],
        final_note: &str,
    ) -> Result<Rating> {
        if !self.store.is_book_owned(owner, book_id)? {
            return Err(DomainError::NotOwned {
                owner: owner.to_string(),
                book: book_id,
            });
        }

        if self.store.has_rating(owner, book_id)? {
            return Err(ConflictError::AlreadyRated {
                owner: owner.to_string(),
                book: book_id,
            }
            .into());
        }

        let mut checked = [0u8; 5];
        for (i, c) in Criterion::ALL.into_iter().enumerate() {
            checked[i] = validate_score(c, scores[i])?;
        }

        let mut clean_notes: [String; 5] = Default::default();
        for (i, c) in Criterion::ALL.into_iter().enumerate() {
            clean_notes[i] = validate_note(c.label(), notes[i])?;
        }
        let overall_note = validate_note("overall", final_note)?;

        let overall = scores.iter().sum::<i64>() as f64 / 5.0;

        let rating = Rating {
            owner_id: owner.to_string(),
            library: library.to_string(),
            book_id,
            scores: checked,
            notes: clean_notes,
            overall,
            overall_note,
            created_at: now_timestamp(),
        };
        self.store.insert_rating(&rating)?;

        tracing::info!(owner = %owner, book = book_id, overall = overall, "rating recorded");
        Ok(rating)
    }
}

fn validate_score(criterion: Criterion, value: i64) -> Result<u8> {
    if !(1..=5).contains(&value) {
        return Err(ValidationError::InvalidScore { criterion, value }.into());
    }
    Ok(value as u8)
}

/// Check one note against the limits; blank notes become the placeholder.
pub(crate) fn validate_note(field: &'static str, note: &str) -> Result<String> {
    if note.chars().count() > MAX_NOTE_LEN {
        return Err(ValidationError::NoteTooLong {
            field,
            len: note.chars().count(),
        }
        .into());
    }
    if note.contains(';') {
        return Err(ValidationError::NoteHasDelimiter { field }.into());
    }
    if note.trim().is_empty() {
        return Ok(EMPTY_NOTE.to_string());
    }
    Ok(note.to_string())
}

//! Book recommendations.
//!
//! For each book a user has read they may suggest up to three related
//! titles. Candidates are screened one by one — a bad candidate is
//! skipped, not a reason to abort the call — and the surviving set is
//! appended as one atomic batch.

use crate::catalog::Catalog;
use crate::error::{ConflictError, DomainError, Result, ValidationError};
use crate::store::{RECOMMENDATION_CAP, Recommendation, Store, now_timestamp};
use std::collections::HashSet;
use std::sync::Arc;

/// One candidate suggestion.
#[derive(Debug, Clone)]
pub struct RecommendationTarget {
    /// The suggested book id.
    pub book_id: i64,
    /// Optional free-text comment.
    pub comment: Option<String>,
}

impl RecommendationTarget {
    /// A bare target with no comment.
    pub fn bare(book_id: i64) -> Self {
        Self {
            book_id,
            comment: None,
        }
    }
}

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The candidate equals the read book.
    SelfRecommendation,
    /// The candidate duplicates an earlier target or a persisted one.
    Duplicate,
    /// The candidate does not resolve in the catalog.
    UnknownBook,
    /// All free slots were taken by earlier candidates in this call.
    NoFreeSlot,
}

/// Result of one `recommend` call: what was written, and what was
/// rejected with the reason, so callers can render specific messages.
#[derive(Debug, Clone)]
pub struct RecommendOutcome {
    /// Recommendations actually committed, in acceptance order.
    pub accepted: Vec<Recommendation>,
    /// Rejected candidates with their reasons.
    pub skipped: Vec<(i64, SkipReason)>,
}

/// Engine committing validated recommendation batches.
#[derive(Clone)]
pub struct RecommendationEngine {
    store: Arc<dyn Store>,
    catalog: Arc<Catalog>,
}

impl RecommendationEngine {
    /// Create the engine over a storage backend and the shared catalog.
    pub fn new(store: Arc<dyn Store>, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }

    /// Validate and commit a batch of suggestions for one read book.
    ///
    /// Fails whole with `NotOwned` if the read book is outside the user's
    /// libraries, or `LimitReached` if the cap is already filled. Each
    /// candidate is otherwise screened individually (self-recommendation,
    /// duplicate, unknown id, no free slot) and skipped rather than
    /// aborting the call. The accepted set is appended in one atomic
    /// write; nothing is written if the batch fails at the storage layer.
    pub fn recommend(
        &self,
        owner: &str,
        library: &str,
        read_book_id: i64,
        targets: &[RecommendationTarget],
    ) -> Result<RecommendOutcome> {
        if !self.store.is_book_owned(owner, read_book_id)? {
            return Err(DomainError::NotOwned {
                owner: owner.to_string(),
                book: read_book_id,
            });
        }

        let existing = self.store.recommendations_by_reader(owner, read_book_id)?;
        if existing.len() >= RECOMMENDATION_CAP {
            return Err(ConflictError::LimitReached {
                owner: owner.to_string(),
                read_book: read_book_id,
                limit: RECOMMENDATION_CAP,
            }
            .into());
        }
        let free_slots = RECOMMENDATION_CAP - existing.len();

        let mut taken: HashSet<i64> = existing
            .iter()
            .map(|r| r.recommended_book_id)
            .collect();
        let now = now_timestamp();
        let mut accepted = Vec::new();
        let mut skipped = Vec::new();

        for target in targets {
            if target.book_id == read_book_id {
                skipped.push((target.book_id, SkipReason::SelfRecommendation));
                continue;
            }
            if taken.contains(&target.book_id) {
                skipped.push((target.book_id, SkipReason::Duplicate));
                continue;
            }
            if self.catalog.find_by_id(target.book_id).is_none() {
                skipped.push((target.book_id, SkipReason::UnknownBook));
                continue;
            }
            if accepted.len() >= free_slots {
                skipped.push((target.book_id, SkipReason::NoFreeSlot));
                continue;
            }

            taken.insert(target.book_id);
            accepted.push(Recommendation {
                owner_id: owner.to_string(),
                library: library.to_string(),
                read_book_id,
                recommended_book_id: target.book_id,
                comment: validate_comment(target.comment.as_deref())?,
                created_at: now,
            });
        }

        self.store.insert_recommendations(&accepted)?;

        tracing::info!(
            owner = %owner,
            read_book = read_book_id,
            accepted = accepted.len(),
            skipped = skipped.len(),
            "recommendations recorded"
        );
        Ok(RecommendOutcome { accepted, skipped })
    }
}

/// Comments obey the note limits; a blank comment is dropped.
fn validate_comment(comment: Option<&str>) -> Result<Option<String>> {
    let Some(comment) = comment else {
        return Ok(None);
    };
    if comment.chars().count() > crate::rating::MAX_NOTE_LEN {
        return Err(ValidationError::NoteTooLong {
            field: "comment",
            len: comment.chars().count(),
        }
        .into());
    }
    if comment.contains(';') {
        return Err(ValidationError::NoteHasDelimiter { field: "comment" }.into());
    }
    if comment.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(comment.to_string()))
}

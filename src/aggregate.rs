//! Rating and recommendation aggregation.
//!
//! Read-only views over the stores: per-criterion mean scores with one
//! sampled note each, recommendation frequency tallies, and the full
//! rating listing. Note samples are drawn uniformly at random and
//! independently per criterion, so two runs over the same data may
//! surface different notes; the means are always deterministic. The rng
//! is injectable so tests can pin the choice.

use crate::error::Result;
use crate::store::{Criterion, Rating, Store};
use rand::Rng;
use rand::RngExt;
use std::collections::HashMap;
use std::sync::Arc;

/// Aggregated view of every rating a book received.
#[derive(Debug, Clone)]
pub struct RatingSummary {
    /// The aggregated book.
    pub book_id: i64,
    /// Number of ratings aggregated.
    pub count: usize,
    /// Mean score per criterion, in [`Criterion::ALL`] order.
    pub means: [f64; 5],
    /// Mean of the stored overall scores.
    pub overall_mean: f64,
    /// One note per criterion, sampled from the ratings.
    pub note_samples: [String; 5],
    /// One sampled overall note.
    pub overall_note_sample: String,
}

impl RatingSummary {
    /// Mean score for one criterion.
    pub fn mean(&self, c: Criterion) -> f64 {
        self.means[c as usize]
    }

    /// Sampled note for one criterion.
    pub fn note_sample(&self, c: Criterion) -> &str {
        &self.note_samples[c as usize]
    }
}

/// Engine computing aggregates; never mutates the stores.
#[derive(Clone)]
pub struct AggregationEngine {
    store: Arc<dyn Store>,
}

impl AggregationEngine {
    /// Create the engine over a storage backend.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Aggregate all ratings of a book, sampling notes with the thread
    /// rng. `None` if the book has no ratings.
    pub fn aggregate_ratings(&self, book_id: i64) -> Result<Option<RatingSummary>> {
        self.aggregate_ratings_with(book_id, &mut rand::rng())
    }

    /// Aggregate with a caller-supplied rng, for deterministic sampling.
    pub fn aggregate_ratings_with<R: Rng + ?Sized>(
        &self,
        book_id: i64,
        rng: &mut R,
    ) -> Result<Option<RatingSummary>> {
        let ratings = self.store.ratings_for_book(book_id)?;
        if ratings.is_empty() {
            return Ok(None);
        }
        let count = ratings.len();

        let mut means = [0.0f64; 5];
        for (i, c) in Criterion::ALL.into_iter().enumerate() {
            means[i] = ratings.iter().map(|r| r.score(c) as f64).sum::<f64>() / count as f64;
        }
        let overall_mean = ratings.iter().map(|r| r.overall).sum::<f64>() / count as f64;

        // Independent uniform pick per criterion; samples may come from
        // different rating records.
        let mut note_samples: [String; 5] = Default::default();
        for (i, c) in Criterion::ALL.into_iter().enumerate() {
            let pick = rng.random_range(0..count);
            note_samples[i] = ratings[pick].note(c).to_string();
        }
        let overall_note_sample = ratings[rng.random_range(0..count)].overall_note.clone();

        Ok(Some(RatingSummary {
            book_id,
            count,
            means,
            overall_mean,
            note_samples,
            overall_note_sample,
        }))
    }

    /// How often each book was recommended alongside the given read book,
    /// across all users. Empty map if nobody suggested anything.
    pub fn recommendation_frequency(&self, read_book_id: i64) -> Result<HashMap<i64, usize>> {
        let mut counts = HashMap::new();
        for rec in self.store.recommendations_for_book(read_book_id)? {
            *counts.entry(rec.recommended_book_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Every rating of a book in storage order, for the verbose listing.
    pub fn full_rating_detail(&self, book_id: i64) -> Result<Vec<Rating>> {
        self.store.ratings_for_book(book_id)
    }
}

//! bookrec-rs: a book catalog and recommendation engine.
//!
//! Users search a shared catalog, collect books they own into named
//! libraries, rate those books on five criteria and suggest related
//! titles. This crate is the domain core behind that application: the
//! membership, uniqueness and capping rules, and the aggregation views
//! computed over ratings and recommendations.
//!
//! # Features
//!
//! - Immutable in-memory catalog with title/author/author+year searches
//! - Per-user named libraries gating every rating and recommendation
//! - One multi-criterion rating per (user, book), overall score derived
//! - At most three suggestions per read book, committed atomically
//! - Per-criterion mean scores with randomly sampled notes
//! - Interchangeable flat-file and SQLite persistence backends

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Rating and recommendation aggregation.
pub mod aggregate;
/// Book index and searches.
pub mod catalog;
/// Configuration and CLI.
pub mod config;
/// Error types.
pub mod error;
/// Library management.
pub mod library;
/// Book rating.
pub mod rating;
/// Book recommendations.
pub mod recommend;
/// Pass-through service facades.
pub mod service;
/// Domain records and persistence backends.
pub mod store;
/// Registered-user directory.
pub mod users;

#[cfg(test)]
mod tests;

pub use aggregate::{AggregationEngine, RatingSummary};
pub use catalog::{Book, Catalog};
pub use config::{Cli, Command, Config, StorageBackend};
pub use error::{ConflictError, DomainError, Result, ValidationError};
pub use library::{AddBook, LibraryDraft, LibraryStore};
pub use rating::RatingEngine;
pub use recommend::{RecommendOutcome, RecommendationEngine, RecommendationTarget, SkipReason};
pub use store::{Criterion, Library, Rating, Recommendation, Store, User};
pub use users::UserDirectory;

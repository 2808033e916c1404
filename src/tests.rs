use crate::aggregate::AggregationEngine;
use crate::catalog::{Book, Catalog};
use crate::config::Config;
use crate::error::{ConflictError, DomainError, ValidationError};
use crate::library::{AddBook, LibraryDraft, LibraryStore};
use crate::rating::RatingEngine;
use crate::recommend::{RecommendationEngine, RecommendationTarget, SkipReason};
use crate::service::{CatalogService, UserService};
use crate::store::flat::FlatStore;
use crate::store::sqlite::SqliteStore;
use crate::store::{Criterion, Store, User};
use crate::users::UserDirectory;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

fn book(id: i64, title: &str, authors: &str, year: &str) -> Book {
    Book {
        id,
        title: title.to_string(),
        authors: authors.to_string(),
        description: String::new(),
        categories: String::new(),
        publisher: String::new(),
        price: String::new(),
        month: String::new(),
        year: year.to_string(),
    }
}

fn sample_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::new(vec![
        book(1, "Il nome della rosa", "Umberto Eco", "1980"),
        book(2, "Il pendolo di Foucault", "Umberto Eco", "1988"),
        book(3, "I promessi sposi", "Alessandro Manzoni", "1827"),
        book(4, "La coscienza di Zeno", "Italo Svevo", "1923"),
        book(5, "Il deserto dei Tartari", "Dino Buzzati", "1940"),
    ]))
}

fn memory_store() -> Arc<dyn Store> {
    Arc::new(SqliteStore::open_memory().unwrap())
}

/// Run a test body against both backends.
fn with_each_store(test: impl Fn(Arc<dyn Store>)) {
    test(memory_store());

    let dir = tempfile::tempdir().unwrap();
    test(Arc::new(FlatStore::open(dir.path()).unwrap()));
}

fn create_library(store: &Arc<dyn Store>, owner: &str, name: &str, books: &[i64]) {
    let catalog = sample_catalog();
    let mut draft = LibraryDraft::new(owner, name);
    for &id in books {
        draft.add_book(&catalog, id).unwrap();
    }
    LibraryStore::new(store.clone()).create(draft).unwrap();
}

// ---- catalog ----

#[test]
fn catalog_title_search_is_case_insensitive() {
    let catalog = sample_catalog();

    let lower = catalog.search_by_title("rosa");
    assert_eq!(lower.len(), 1);
    assert_eq!(lower[0].title, "Il nome della rosa");

    let upper = catalog.search_by_title("ROSA");
    assert_eq!(upper.len(), 1);
    assert_eq!(upper[0].id, lower[0].id);
}

#[test]
fn catalog_search_orders_by_title() {
    let catalog = sample_catalog();
    let results = catalog.search_by_title("il");
    let titles: Vec<&str> = results.iter().map(|b| b.title.as_str()).collect();

    let mut sorted = titles.clone();
    sorted.sort();
    assert_eq!(titles, sorted);
    assert!(titles.len() >= 3);
}

#[test]
fn catalog_duplicate_titles_collapse_to_last_loaded() {
    let catalog = Catalog::new(vec![
        book(1, "Gemini", "First Author", "1990"),
        book(2, "Gemini", "Second Author", "2000"),
    ]);

    let results = catalog.search_by_title("gemini");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, 2);

    // Direct lookup still resolves both ids.
    assert!(catalog.find_by_id(1).is_some());
    assert!(catalog.find_by_id(2).is_some());
}

#[test]
fn catalog_author_and_year_uses_containment() {
    let catalog = sample_catalog();

    let results = catalog.search_by_author_and_year("eco", "19");
    assert_eq!(results.len(), 2);

    let exact = catalog.search_by_author_and_year("eco", "1980");
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].id, 1);

    assert!(catalog.search_by_author_and_year("eco", "2021").is_empty());
}

#[test]
fn catalog_find_by_id() {
    let catalog = sample_catalog();
    assert_eq!(catalog.find_by_id(3).unwrap().title, "I promessi sposi");
    assert!(catalog.find_by_id(99).is_none());
    assert_eq!(catalog.title_of(4), Some("La coscienza di Zeno"));
}

// ---- libraries ----

#[test]
fn library_create_and_list() {
    with_each_store(|store| {
        create_library(&store, "u1", "classics", &[1, 2]);

        let libraries = LibraryStore::new(store).list("u1").unwrap();
        assert_eq!(libraries.len(), 1);
        assert_eq!(libraries[0].name, "classics");
        assert_eq!(libraries[0].book_ids, vec![1, 2]);
    });
}

#[test]
fn library_duplicate_name_fails_per_owner_only() {
    with_each_store(|store| {
        create_library(&store, "u1", "classics", &[1]);

        let engine = LibraryStore::new(store);
        let catalog = sample_catalog();

        let mut dup = LibraryDraft::new("u1", "classics");
        dup.add_book(&catalog, 2).unwrap();
        match engine.create(dup) {
            Err(DomainError::Conflict(ConflictError::DuplicateName { owner, name })) => {
                assert_eq!(owner, "u1");
                assert_eq!(name, "classics");
            }
            other => panic!("expected DuplicateName, got {other:?}"),
        }

        // Same name for a different owner is fine.
        let mut other_owner = LibraryDraft::new("u2", "classics");
        other_owner.add_book(&catalog, 2).unwrap();
        engine.create(other_owner).unwrap();
    });
}

#[test]
fn library_empty_is_rejected() {
    let engine = LibraryStore::new(memory_store());
    let result = engine.create(LibraryDraft::new("u1", "empty"));
    assert!(matches!(
        result,
        Err(DomainError::Validation(ValidationError::EmptyLibrary { .. }))
    ));
}

#[test]
fn library_name_rules() {
    let catalog = sample_catalog();
    let engine = LibraryStore::new(memory_store());

    for bad in ["", "   ", "a;b", "a:b"] {
        let mut draft = LibraryDraft::new("u1", bad);
        draft.add_book(&catalog, 1).unwrap();
        assert!(
            matches!(engine.create(draft), Err(DomainError::Validation(_))),
            "name {bad:?} should be rejected"
        );
    }
}

#[test]
fn draft_add_book_outcomes() {
    let catalog = sample_catalog();
    let mut draft = LibraryDraft::new("u1", "shelf");

    assert_eq!(draft.add_book(&catalog, 1).unwrap(), AddBook::Added);
    assert_eq!(draft.add_book(&catalog, 1).unwrap(), AddBook::AlreadyPresent);
    assert_eq!(draft.book_ids(), &[1]);

    assert!(matches!(
        draft.add_book(&catalog, 99),
        Err(DomainError::NotFound { .. })
    ));
}

#[test]
fn ownership_spans_all_libraries() {
    with_each_store(|store| {
        create_library(&store, "u1", "classics", &[1, 2]);
        create_library(&store, "u1", "modern", &[2, 4]);

        let engine = LibraryStore::new(store);
        assert!(engine.is_book_owned("u1", 1).unwrap());
        assert!(engine.is_book_owned("u1", 4).unwrap());
        assert!(!engine.is_book_owned("u1", 5).unwrap());
        assert!(!engine.is_book_owned("u2", 1).unwrap());

        // Book 2 stays owned through the second library after a delete.
        assert!(engine.delete("u1", "classics").unwrap());
        assert!(engine.is_book_owned("u1", 2).unwrap());
        assert!(!engine.is_book_owned("u1", 1).unwrap());
        assert!(!engine.delete("u1", "classics").unwrap());
    });
}

#[test]
fn deleting_a_library_keeps_ratings() {
    with_each_store(|store| {
        create_library(&store, "u1", "classics", &[1]);
        let rating = RatingEngine::new(store.clone());
        rating
            .rate_book("u1", "classics", 1, [5, 4, 5, 4, 5], [""; 5], "")
            .unwrap();

        LibraryStore::new(store.clone()).delete("u1", "classics").unwrap();
        assert_eq!(store.ratings_for_book(1).unwrap().len(), 1);
    });
}

// ---- ratings ----

#[test]
fn rate_book_scenario() {
    with_each_store(|store| {
        create_library(&store, "u1", "classics", &[1, 2]);
        let engine = RatingEngine::new(store.clone());

        let rating = engine
            .rate_book(
                "u1",
                "classics",
                1,
                [5, 4, 5, 4, 5],
                ["asciutto", "denso", "scorrevole", "sorprendente", "curata"],
                "da rileggere",
            )
            .unwrap();

        assert!((rating.overall - 4.6).abs() < f64::EPSILON);
        assert_eq!(rating.score(Criterion::Stile), 5);
        assert_eq!(rating.note(Criterion::Contenuto), "denso");

        // A second rating for the same key never overwrites.
        let again = engine.rate_book("u1", "classics", 1, [1, 1, 1, 1, 1], [""; 5], "");
        assert!(matches!(
            again,
            Err(DomainError::Conflict(ConflictError::AlreadyRated { .. }))
        ));
        assert_eq!(store.ratings_for_book(1).unwrap().len(), 1);
    });
}

#[test]
fn rate_book_requires_ownership() {
    with_each_store(|store| {
        let engine = RatingEngine::new(store);
        let result = engine.rate_book("u1", "classics", 1, [3, 3, 3, 3, 3], [""; 5], "");
        assert!(matches!(result, Err(DomainError::NotOwned { .. })));
    });
}

#[test]
fn rate_book_rejects_out_of_range_scores() {
    let store = memory_store();
    create_library(&store, "u1", "classics", &[1]);
    let engine = RatingEngine::new(store);

    for bad in [0, 6, -1] {
        let result = engine.rate_book("u1", "classics", 1, [bad, 3, 3, 3, 3], [""; 5], "");
        match result {
            Err(DomainError::Validation(ValidationError::InvalidScore { criterion, value })) => {
                assert_eq!(criterion, Criterion::Stile);
                assert_eq!(value, bad);
            }
            other => panic!("expected InvalidScore, got {other:?}"),
        }
    }
}

#[test]
fn rate_book_note_rules() {
    let store = memory_store();
    create_library(&store, "u1", "classics", &[1, 2]);
    let engine = RatingEngine::new(store.clone());

    let long = "x".repeat(257);
    let result = engine.rate_book(
        "u1",
        "classics",
        1,
        [3, 3, 3, 3, 3],
        [&long, "", "", "", ""],
        "",
    );
    assert!(matches!(
        result,
        Err(DomainError::Validation(ValidationError::NoteTooLong { .. }))
    ));

    let result = engine.rate_book(
        "u1",
        "classics",
        1,
        [3, 3, 3, 3, 3],
        ["ok", "bad;note", "", "", ""],
        "",
    );
    assert!(matches!(
        result,
        Err(DomainError::Validation(ValidationError::NoteHasDelimiter { .. }))
    ));

    // Blank notes are normalized, not rejected.
    let rating = engine
        .rate_book("u1", "classics", 1, [3, 3, 3, 3, 3], ["  ", "", "n", "", ""], "   ")
        .unwrap();
    assert_eq!(rating.note(Criterion::Stile), "/");
    assert_eq!(rating.note(Criterion::Gradevolezza), "n");
    assert_eq!(rating.overall_note, "/");
}

#[test]
fn all_scores_stay_in_range() {
    let store = memory_store();
    create_library(&store, "u1", "classics", &[1, 2]);
    let engine = RatingEngine::new(store.clone());
    engine
        .rate_book("u1", "classics", 1, [1, 2, 3, 4, 5], [""; 5], "")
        .unwrap();
    engine
        .rate_book("u1", "classics", 2, [5, 5, 5, 5, 5], [""; 5], "")
        .unwrap();

    for book in [1, 2] {
        for rating in store.ratings_for_book(book).unwrap() {
            for c in Criterion::ALL {
                assert!((1..=5).contains(&rating.score(c)));
            }
            let mean = rating.scores.iter().map(|&s| s as f64).sum::<f64>() / 5.0;
            assert!((rating.overall - mean).abs() < 1e-9);
        }
    }
}

// ---- recommendations ----

#[test]
fn recommend_scenario_with_cap() {
    with_each_store(|store| {
        create_library(&store, "u1", "classics", &[1, 2]);
        let engine = RecommendationEngine::new(store.clone(), sample_catalog());

        let first = engine
            .recommend(
                "u1",
                "classics",
                1,
                &[RecommendationTarget::bare(2), RecommendationTarget::bare(3)],
            )
            .unwrap();
        assert_eq!(first.accepted.len(), 2);
        assert!(first.skipped.is_empty());

        let second = engine
            .recommend("u1", "classics", 1, &[RecommendationTarget::bare(4)])
            .unwrap();
        assert_eq!(second.accepted.len(), 1);

        // Cap filled: a fourth attempt fails whole.
        let third = engine.recommend("u1", "classics", 1, &[RecommendationTarget::bare(5)]);
        assert!(matches!(
            third,
            Err(DomainError::Conflict(ConflictError::LimitReached { .. }))
        ));

        let persisted = store.recommendations_by_reader("u1", 1).unwrap();
        assert_eq!(persisted.len(), 3);
        let mut targets: Vec<i64> = persisted.iter().map(|r| r.recommended_book_id).collect();
        targets.sort();
        assert_eq!(targets, vec![2, 3, 4]);
        assert!(!targets.contains(&1));
    });
}

#[test]
fn recommend_requires_owned_read_book() {
    let engine = RecommendationEngine::new(memory_store(), sample_catalog());
    let result = engine.recommend("u1", "classics", 1, &[RecommendationTarget::bare(2)]);
    assert!(matches!(result, Err(DomainError::NotOwned { .. })));
}

#[test]
fn recommend_skips_bad_targets_individually() {
    with_each_store(|store| {
        create_library(&store, "u1", "classics", &[1]);
        let engine = RecommendationEngine::new(store.clone(), sample_catalog());

        let outcome = engine
            .recommend(
                "u1",
                "classics",
                1,
                &[
                    RecommendationTarget::bare(1),  // self
                    RecommendationTarget::bare(2),  // fine
                    RecommendationTarget::bare(2),  // duplicate in call
                    RecommendationTarget::bare(99), // unknown
                    RecommendationTarget::bare(3),  // fine
                ],
            )
            .unwrap();

        let accepted: Vec<i64> = outcome
            .accepted
            .iter()
            .map(|r| r.recommended_book_id)
            .collect();
        assert_eq!(accepted, vec![2, 3]);
        assert_eq!(
            outcome.skipped,
            vec![
                (1, SkipReason::SelfRecommendation),
                (2, SkipReason::Duplicate),
                (99, SkipReason::UnknownBook),
            ]
        );

        // A previously persisted target is also a duplicate.
        let again = engine
            .recommend("u1", "classics", 1, &[RecommendationTarget::bare(2)])
            .unwrap();
        assert!(again.accepted.is_empty());
        assert_eq!(again.skipped, vec![(2, SkipReason::Duplicate)]);
    });
}

#[test]
fn recommend_remaining_slots_bound_acceptance() {
    with_each_store(|store| {
        create_library(&store, "u1", "classics", &[1]);
        let engine = RecommendationEngine::new(store.clone(), sample_catalog());

        engine
            .recommend(
                "u1",
                "classics",
                1,
                &[RecommendationTarget::bare(2), RecommendationTarget::bare(3)],
            )
            .unwrap();

        let outcome = engine
            .recommend(
                "u1",
                "classics",
                1,
                &[RecommendationTarget::bare(4), RecommendationTarget::bare(5)],
            )
            .unwrap();
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.skipped, vec![(5, SkipReason::NoFreeSlot)]);
        assert_eq!(store.recommendations_by_reader("u1", 1).unwrap().len(), 3);
    });
}

#[test]
fn recommend_comment_rules() {
    let store = memory_store();
    create_library(&store, "u1", "classics", &[1]);
    let engine = RecommendationEngine::new(store.clone(), sample_catalog());

    let result = engine.recommend(
        "u1",
        "classics",
        1,
        &[RecommendationTarget {
            book_id: 2,
            comment: Some("spoiler;inside".to_string()),
        }],
    );
    assert!(matches!(
        result,
        Err(DomainError::Validation(ValidationError::NoteHasDelimiter { .. }))
    ));

    let outcome = engine
        .recommend(
            "u1",
            "classics",
            1,
            &[RecommendationTarget {
                book_id: 2,
                comment: Some("stesso autore".to_string()),
            }],
        )
        .unwrap();
    assert_eq!(
        store.recommendations_by_reader("u1", 1).unwrap()[0].comment,
        Some("stesso autore".to_string())
    );
    assert_eq!(outcome.accepted.len(), 1);
}

// ---- aggregation ----

#[test]
fn aggregate_none_without_ratings() {
    let engine = AggregationEngine::new(memory_store());
    assert!(engine.aggregate_ratings(1).unwrap().is_none());
}

#[test]
fn aggregate_means_and_samples() {
    with_each_store(|store| {
        create_library(&store, "u1", "classics", &[1]);
        create_library(&store, "u2", "shelf", &[1]);
        let rating = RatingEngine::new(store.clone());
        rating
            .rate_book("u1", "classics", 1, [5, 4, 5, 4, 5], ["a1", "b1", "c1", "d1", "e1"], "f1")
            .unwrap();
        rating
            .rate_book("u2", "shelf", 1, [3, 2, 1, 2, 3], ["a2", "b2", "c2", "d2", "e2"], "f2")
            .unwrap();

        let engine = AggregationEngine::new(store);
        let mut rng = StdRng::seed_from_u64(7);
        let summary = engine.aggregate_ratings_with(1, &mut rng).unwrap().unwrap();

        assert_eq!(summary.count, 2);
        assert!((summary.mean(Criterion::Stile) - 4.0).abs() < 1e-9);
        assert!((summary.mean(Criterion::Contenuto) - 3.0).abs() < 1e-9);
        assert!((summary.mean(Criterion::Gradevolezza) - 3.0).abs() < 1e-9);
        assert!((summary.mean(Criterion::Originalita) - 3.0).abs() < 1e-9);
        assert!((summary.mean(Criterion::Edizione) - 4.0).abs() < 1e-9);
        assert!((summary.overall_mean - (4.6 + 2.2) / 2.0).abs() < 1e-9);

        // Samples always come from existing notes for that criterion.
        for c in Criterion::ALL {
            let sample = summary.note_sample(c);
            let expected_one_of = [format!("{}1", note_prefix(c)), format!("{}2", note_prefix(c))];
            assert!(expected_one_of.iter().any(|n| n == sample));
        }
        assert!(["f1", "f2"].contains(&summary.overall_note_sample.as_str()));

        // Means are deterministic regardless of the rng.
        let mut other_rng = StdRng::seed_from_u64(12345);
        let again = engine
            .aggregate_ratings_with(1, &mut other_rng)
            .unwrap()
            .unwrap();
        assert_eq!(again.means, summary.means);
        assert_eq!(again.overall_mean, summary.overall_mean);
    });
}

fn note_prefix(c: Criterion) -> &'static str {
    match c {
        Criterion::Stile => "a",
        Criterion::Contenuto => "b",
        Criterion::Gradevolezza => "c",
        Criterion::Originalita => "d",
        Criterion::Edizione => "e",
    }
}

#[test]
fn recommendation_frequency_counts_across_users() {
    with_each_store(|store| {
        create_library(&store, "u1", "classics", &[1]);
        create_library(&store, "u2", "shelf", &[1]);
        let engine = RecommendationEngine::new(store.clone(), sample_catalog());

        engine
            .recommend(
                "u1",
                "classics",
                1,
                &[RecommendationTarget::bare(2), RecommendationTarget::bare(3)],
            )
            .unwrap();
        engine
            .recommend("u2", "shelf", 1, &[RecommendationTarget::bare(2)])
            .unwrap();

        let freq = AggregationEngine::new(store).recommendation_frequency(1).unwrap();
        assert_eq!(freq.get(&2), Some(&2));
        assert_eq!(freq.get(&3), Some(&1));
        assert_eq!(freq.len(), 2);
    });
}

#[test]
fn full_rating_detail_keeps_storage_order() {
    let store = memory_store();
    create_library(&store, "u1", "classics", &[1]);
    create_library(&store, "u2", "shelf", &[1]);
    let rating = RatingEngine::new(store.clone());
    rating
        .rate_book("u1", "classics", 1, [5, 5, 5, 5, 5], [""; 5], "")
        .unwrap();
    rating
        .rate_book("u2", "shelf", 1, [1, 1, 1, 1, 1], [""; 5], "")
        .unwrap();

    let detail = AggregationEngine::new(store).full_rating_detail(1).unwrap();
    assert_eq!(detail.len(), 2);
    assert_eq!(detail[0].owner_id, "u1");
    assert_eq!(detail[1].owner_id, "u2");
}

// ---- flat-store persistence ----

#[test]
fn flat_library_roundtrip() {
    let dir = tempfile::tempdir().unwrap();

    let store: Arc<dyn Store> = Arc::new(FlatStore::open(dir.path()).unwrap());
    create_library(&store, "u1", "classics", &[2, 1, 3]);
    drop(store);

    let reopened = FlatStore::open(dir.path()).unwrap();
    let libraries = reopened.list_libraries("u1").unwrap();
    assert_eq!(libraries.len(), 1);

    let mut ids = libraries[0].book_ids.clone();
    ids.sort();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn flat_rating_roundtrip() {
    let dir = tempfile::tempdir().unwrap();

    let store: Arc<dyn Store> = Arc::new(FlatStore::open(dir.path()).unwrap());
    create_library(&store, "u1", "classics", &[1]);
    RatingEngine::new(store.clone())
        .rate_book("u1", "classics", 1, [5, 4, 5, 4, 5], ["a", "b", "c", "d", "e"], "fine")
        .unwrap();
    drop(store);

    let reopened = FlatStore::open(dir.path()).unwrap();
    let ratings = reopened.ratings_for_book(1).unwrap();
    assert_eq!(ratings.len(), 1);
    assert!((ratings[0].overall - 4.6).abs() < 1e-9);
    assert_eq!(ratings[0].note(Criterion::Edizione), "e");
    assert!(reopened.has_rating("u1", 1).unwrap());
}

#[test]
fn flat_reader_accepts_comma_decimal_mark() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("ValutazioniLibri.dati.csv"),
        "u1;1;5;/;4;/;5;/;4;/;5;/;4,600000;/\n",
    )
    .unwrap();

    let store = FlatStore::open(dir.path()).unwrap();
    let ratings = store.ratings_for_book(1).unwrap();
    assert_eq!(ratings.len(), 1);
    assert!((ratings[0].overall - 4.6).abs() < 1e-9);
}

#[test]
fn flat_skips_malformed_lines() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Librerie.dati.csv"),
        "u1;classics;[1, 2]\nnot a record\nu2;shelf;[3]\n",
    )
    .unwrap();

    let store = FlatStore::open(dir.path()).unwrap();
    assert_eq!(store.list_libraries("u1").unwrap().len(), 1);
    assert_eq!(store.list_libraries("u2").unwrap().len(), 1);
}

// ---- sqlite catalog table ----

#[test]
fn sqlite_book_table_roundtrip() {
    let db = SqliteStore::open_memory().unwrap();
    let books = vec![
        book(1, "Il nome della rosa", "Umberto Eco", "1980"),
        book(2, "Il pendolo di Foucault", "Umberto Eco", "1988"),
    ];
    assert_eq!(db.insert_books(&books).unwrap(), 2);

    let loaded = db.load_books().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].title, "Il nome della rosa");

    let catalog = Catalog::new(loaded);
    assert_eq!(catalog.search_by_author("eco").len(), 2);
}

// ---- users ----

fn sample_user(handle: &str, tax: &str, email: &str) -> User {
    User {
        user_id: handle.to_string(),
        name: "Ada".to_string(),
        surname: "Lovelace".to_string(),
        tax_code: tax.to_string(),
        email: email.to_string(),
        password: "segretissima".to_string(),
    }
}

#[test]
fn user_register_and_authenticate() {
    with_each_store(|store| {
        let directory = UserDirectory::new(store);
        directory
            .register(sample_user("ada", "LVLCAD15D15F205Z", "ada@example.com"))
            .unwrap();

        assert!(directory.authenticate("ada", "segretissima").unwrap());
        assert!(!directory.authenticate("ada", "wrong").unwrap());
        assert!(!directory.authenticate("nobody", "segretissima").unwrap());
        assert!(directory.exists("ada").unwrap());
        assert_eq!(
            directory.find_by_handle("ada").unwrap().unwrap().email,
            "ada@example.com"
        );
    });
}

#[test]
fn user_unique_fields_conflict() {
    with_each_store(|store| {
        let directory = UserDirectory::new(store);
        directory
            .register(sample_user("ada", "LVLCAD15D15F205Z", "ada@example.com"))
            .unwrap();

        for dup in [
            sample_user("ada", "AAAAAA11A11A111A", "other@example.com"),
            sample_user("grace", "LVLCAD15D15F205Z", "grace@example.com"),
            sample_user("grace", "AAAAAA11A11A111A", "ada@example.com"),
        ] {
            assert!(matches!(
                directory.register(dup),
                Err(DomainError::Conflict(ConflictError::DuplicateUser { .. }))
            ));
        }
    });
}

#[test]
fn user_field_validation() {
    let directory = UserDirectory::new(memory_store());

    let mut short_tax = sample_user("ada", "SHORT", "ada@example.com");
    short_tax.tax_code = "SHORT".to_string();
    assert!(matches!(
        directory.register(short_tax),
        Err(DomainError::Validation(ValidationError::InvalidUserField { field: "tax code", .. }))
    ));

    let bad_email = sample_user("ada", "LVLCAD15D15F205Z", "not-an-address");
    assert!(matches!(
        directory.register(bad_email),
        Err(DomainError::Validation(ValidationError::InvalidUserField { field: "email", .. }))
    ));

    let bad_handle = sample_user("a;da", "LVLCAD15D15F205Z", "ada@example.com");
    assert!(matches!(
        directory.register(bad_handle),
        Err(DomainError::Validation(ValidationError::InvalidUserField { field: "user id", .. }))
    ));
}

#[test]
fn user_delete_cascades() {
    with_each_store(|store| {
        let directory = UserDirectory::new(store.clone());
        directory
            .register(sample_user("ada", "LVLCAD15D15F205Z", "ada@example.com"))
            .unwrap();
        create_library(&store, "ada", "classics", &[1]);
        RatingEngine::new(store.clone())
            .rate_book("ada", "classics", 1, [4, 4, 4, 4, 4], [""; 5], "")
            .unwrap();

        assert!(directory.remove("ada").unwrap());
        assert!(!directory.exists("ada").unwrap());
        assert!(store.list_libraries("ada").unwrap().is_empty());
        assert!(store.ratings_for_book(1).unwrap().is_empty());
        assert!(!directory.remove("ada").unwrap());
    });
}

// ---- service facades ----

#[test]
fn catalog_service_passthrough() {
    let service = CatalogService::new(sample_catalog());

    assert_eq!(service.search_by_title("rosa").len(), 1);
    assert_eq!(service.search_by_author("eco").len(), 2);
    assert_eq!(service.search_by_author_and_year("eco", "1988").len(), 1);
    assert_eq!(service.get_book_by_id(3).unwrap().title, "I promessi sposi");
    assert!(service.get_book_by_id(99).is_none());
}

#[test]
fn user_service_passthrough() {
    let service = UserService::new(UserDirectory::new(memory_store()));

    service
        .register(sample_user("ada", "LVLCAD15D15F205Z", "ada@example.com"))
        .unwrap();
    assert!(service.authenticate("ada", "segretissima").unwrap());
    assert!(service.exists("ada").unwrap());
    assert!(service.get_by_handle("nobody").unwrap().is_none());
}

// ---- config ----

#[test]
fn config_parse_toml() {
    let toml = r#"
[storage]
backend = "flat"
data_dir = "/tmp/records"

[catalog]
books_file = "/tmp/Libri.dati.csv"
"#;
    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.storage.backend, crate::config::StorageBackend::Flat);
    assert_eq!(config.storage.data_dir.to_str(), Some("/tmp/records"));
    assert_eq!(config.catalog.books_file.to_str(), Some("/tmp/Libri.dati.csv"));
}

#[test]
fn config_default_values() {
    let config = Config::default();
    assert_eq!(config.storage.backend, crate::config::StorageBackend::Sqlite);
    assert_eq!(config.storage.db_path.to_str(), Some("data/bookrec.db"));
}

//! Flat delimited-file backend.
//!
//! One directory holds one file per record kind, in the legacy layout:
//!
//! - `Librerie.dati.csv` — `owner;name;[id1, id2, id3]`
//! - `ValutazioniLibri.dati.csv` — `owner;book;` then score/note pairs in
//!   criterion order, then `overall;overall_note` (14 fields)
//! - `ConsigliLibri.dati.csv` — `owner;read_book;recommended_book`
//! - `UtentiRegistrati.dati.csv` — `name;surname;tax_code;email;user_id;password`
//!
//! Fields are `;`-separated with no escaping; the validation layer keeps
//! the delimiter out of free text. The whole store is loaded at open,
//! appended on insert and rewritten on delete, with every operation under
//! one lock so validate+write is atomic.

use crate::error::{ConflictError, DomainError, Result};
use crate::store::{
    Criterion, Library, RECOMMENDATION_CAP, Rating, Recommendation, Store, User,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LIBRARIES_FILE: &str = "Librerie.dati.csv";
const RATINGS_FILE: &str = "ValutazioniLibri.dati.csv";
const RECOMMENDATIONS_FILE: &str = "ConsigliLibri.dati.csv";
const USERS_FILE: &str = "UtentiRegistrati.dati.csv";

/// Flat-file store. Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct FlatStore {
    inner: Arc<Mutex<FlatState>>,
}

struct FlatState {
    dir: PathBuf,
    libraries: Vec<Library>,
    ratings: Vec<Rating>,
    recommendations: Vec<Recommendation>,
    users: Vec<User>,
}

impl FlatStore {
    /// Open the store rooted at `dir`, creating the directory if needed
    /// and loading any existing record files.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let state = FlatState {
            dir: dir.to_path_buf(),
            libraries: load_records(&dir.join(LIBRARIES_FILE), parse_library)?,
            ratings: load_records(&dir.join(RATINGS_FILE), parse_rating)?,
            recommendations: load_records(&dir.join(RECOMMENDATIONS_FILE), parse_recommendation)?,
            users: load_records(&dir.join(USERS_FILE), parse_user)?,
        };

        tracing::info!(
            dir = %dir.display(),
            libraries = state.libraries.len(),
            ratings = state.ratings.len(),
            recommendations = state.recommendations.len(),
            users = state.users.len(),
            "flat store opened"
        );

        Ok(Self {
            inner: Arc::new(Mutex::new(state)),
        })
    }
}

impl Store for FlatStore {
    fn insert_library(&self, library: &Library) -> Result<()> {
        let mut state = self.inner.lock();
        if state
            .libraries
            .iter()
            .any(|l| l.owner_id == library.owner_id && l.name == library.name)
        {
            return Err(ConflictError::DuplicateName {
                owner: library.owner_id.clone(),
                name: library.name.clone(),
            }
            .into());
        }

        append_line(&state.dir.join(LIBRARIES_FILE), &format_library(library))?;
        state.libraries.push(library.clone());
        Ok(())
    }

    fn list_libraries(&self, owner: &str) -> Result<Vec<Library>> {
        let state = self.inner.lock();
        Ok(state
            .libraries
            .iter()
            .filter(|l| l.owner_id == owner)
            .cloned()
            .collect())
    }

    fn find_library(&self, owner: &str, name: &str) -> Result<Option<Library>> {
        let state = self.inner.lock();
        Ok(state
            .libraries
            .iter()
            .find(|l| l.owner_id == owner && l.name == name)
            .cloned())
    }

    fn delete_library(&self, owner: &str, name: &str) -> Result<bool> {
        let mut state = self.inner.lock();
        let before = state.libraries.len();
        state
            .libraries
            .retain(|l| !(l.owner_id == owner && l.name == name));
        if state.libraries.len() == before {
            return Ok(false);
        }

        let lines: Vec<String> = state.libraries.iter().map(format_library).collect();
        rewrite_file(&state.dir.join(LIBRARIES_FILE), &lines)?;
        Ok(true)
    }

    fn is_book_owned(&self, owner: &str, book_id: i64) -> Result<bool> {
        let state = self.inner.lock();
        Ok(state
            .libraries
            .iter()
            .any(|l| l.owner_id == owner && l.contains(book_id)))
    }

    fn insert_rating(&self, rating: &Rating) -> Result<()> {
        let mut state = self.inner.lock();
        if state
            .ratings
            .iter()
            .any(|r| r.owner_id == rating.owner_id && r.book_id == rating.book_id)
        {
            return Err(ConflictError::AlreadyRated {
                owner: rating.owner_id.clone(),
                book: rating.book_id,
            }
            .into());
        }

        append_line(&state.dir.join(RATINGS_FILE), &format_rating(rating))?;
        state.ratings.push(rating.clone());
        Ok(())
    }

    fn has_rating(&self, owner: &str, book_id: i64) -> Result<bool> {
        let state = self.inner.lock();
        Ok(state
            .ratings
            .iter()
            .any(|r| r.owner_id == owner && r.book_id == book_id))
    }

    fn ratings_for_book(&self, book_id: i64) -> Result<Vec<Rating>> {
        let state = self.inner.lock();
        Ok(state
            .ratings
            .iter()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect())
    }

    fn insert_recommendations(&self, batch: &[Recommendation]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut state = self.inner.lock();

        // Validate the whole batch against persisted state before any write.
        let mut seen: HashSet<(&str, i64, i64)> = HashSet::new();
        for rec in batch {
            let key = (rec.owner_id.as_str(), rec.read_book_id);
            let existing = state
                .recommendations
                .iter()
                .filter(|r| r.owner_id == rec.owner_id && r.read_book_id == rec.read_book_id);

            if existing.clone().any(|r| {
                r.recommended_book_id == rec.recommended_book_id
            }) || !seen.insert((key.0, key.1, rec.recommended_book_id))
            {
                return Err(ConflictError::DuplicateTarget {
                    owner: rec.owner_id.clone(),
                    read_book: rec.read_book_id,
                    target: rec.recommended_book_id,
                }
                .into());
            }

            let new_for_key = batch
                .iter()
                .filter(|r| r.owner_id == rec.owner_id && r.read_book_id == rec.read_book_id)
                .count();
            if existing.count() + new_for_key > RECOMMENDATION_CAP {
                return Err(ConflictError::LimitReached {
                    owner: rec.owner_id.clone(),
                    read_book: rec.read_book_id,
                    limit: RECOMMENDATION_CAP,
                }
                .into());
            }
        }

        if batch.iter().any(|r| r.comment.is_some()) {
            tracing::debug!("flat layout has no comment column; comments not persisted");
        }

        // One buffered write for the whole batch.
        let mut chunk = String::new();
        for rec in batch {
            let _ = writeln!(chunk, "{}", format_recommendation(rec));
        }
        append_chunk(&state.dir.join(RECOMMENDATIONS_FILE), &chunk)?;
        state.recommendations.extend_from_slice(batch);
        Ok(())
    }

    fn recommendations_by_reader(
        &self,
        owner: &str,
        read_book_id: i64,
    ) -> Result<Vec<Recommendation>> {
        let state = self.inner.lock();
        Ok(state
            .recommendations
            .iter()
            .filter(|r| r.owner_id == owner && r.read_book_id == read_book_id)
            .cloned()
            .collect())
    }

    fn recommendations_for_book(&self, read_book_id: i64) -> Result<Vec<Recommendation>> {
        let state = self.inner.lock();
        Ok(state
            .recommendations
            .iter()
            .filter(|r| r.read_book_id == read_book_id)
            .cloned()
            .collect())
    }

    fn insert_user(&self, user: &User) -> Result<()> {
        let mut state = self.inner.lock();
        for existing in &state.users {
            let field = if existing.user_id == user.user_id {
                Some(("user id", user.user_id.clone()))
            } else if existing.tax_code == user.tax_code {
                Some(("tax code", user.tax_code.clone()))
            } else if existing.email == user.email {
                Some(("email", user.email.clone()))
            } else {
                None
            };
            if let Some((field, value)) = field {
                return Err(ConflictError::DuplicateUser { field, value }.into());
            }
        }

        append_line(&state.dir.join(USERS_FILE), &format_user(user))?;
        state.users.push(user.clone());
        Ok(())
    }

    fn find_user(&self, handle: &str) -> Result<Option<User>> {
        let state = self.inner.lock();
        Ok(state.users.iter().find(|u| u.user_id == handle).cloned())
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let state = self.inner.lock();
        Ok(state.users.clone())
    }

    fn delete_user(&self, handle: &str) -> Result<bool> {
        let mut state = self.inner.lock();
        let before = state.users.len();
        state.users.retain(|u| u.user_id != handle);
        if state.users.len() == before {
            return Ok(false);
        }

        // Cascade: the user's libraries, ratings and recommendations go too.
        state.libraries.retain(|l| l.owner_id != handle);
        state.ratings.retain(|r| r.owner_id != handle);
        state.recommendations.retain(|r| r.owner_id != handle);

        rewrite_file(
            &state.dir.join(USERS_FILE),
            &state.users.iter().map(format_user).collect::<Vec<_>>(),
        )?;
        rewrite_file(
            &state.dir.join(LIBRARIES_FILE),
            &state.libraries.iter().map(format_library).collect::<Vec<_>>(),
        )?;
        rewrite_file(
            &state.dir.join(RATINGS_FILE),
            &state.ratings.iter().map(format_rating).collect::<Vec<_>>(),
        )?;
        rewrite_file(
            &state.dir.join(RECOMMENDATIONS_FILE),
            &state
                .recommendations
                .iter()
                .map(format_recommendation)
                .collect::<Vec<_>>(),
        )?;
        Ok(true)
    }
}

// ---- record parsing ----

fn load_records<T>(path: &Path, parse: fn(&str) -> Option<T>) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse(line) {
            Some(record) => records.push(record),
            None => {
                tracing::warn!(file = %path.display(), line = lineno + 1, "skipping malformed record");
            }
        }
    }
    Ok(records)
}

fn parse_library(line: &str) -> Option<Library> {
    let fields: Vec<&str> = line.split(';').collect();
    if fields.len() != 3 {
        return None;
    }

    let ids = fields[2].trim();
    let ids = ids.strip_prefix('[')?.strip_suffix(']')?;
    let mut book_ids = Vec::new();
    for part in ids.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        book_ids.push(part.parse().ok()?);
    }

    Some(Library {
        owner_id: fields[0].trim().to_string(),
        name: fields[1].trim().to_string(),
        book_ids,
        created_at: 0,
    })
}

fn parse_rating(line: &str) -> Option<Rating> {
    let fields: Vec<&str> = line.split(';').collect();
    if fields.len() != 14 {
        return None;
    }

    let mut scores = [0u8; 5];
    let mut notes: [String; 5] = Default::default();
    for (i, _) in Criterion::ALL.iter().enumerate() {
        scores[i] = fields[2 + i * 2].trim().parse().ok()?;
        notes[i] = fields[3 + i * 2].to_string();
    }

    // The legacy writer was locale-dependent, so accept both decimal marks.
    let overall: f64 = fields[12].trim().replace(',', ".").parse().ok()?;

    Some(Rating {
        owner_id: fields[0].trim().to_string(),
        library: String::new(),
        book_id: fields[1].trim().parse().ok()?,
        scores,
        notes,
        overall,
        overall_note: fields[13].to_string(),
        created_at: 0,
    })
}

fn parse_recommendation(line: &str) -> Option<Recommendation> {
    let fields: Vec<&str> = line.split(';').collect();
    if fields.len() != 3 {
        return None;
    }

    Some(Recommendation {
        owner_id: fields[0].trim().to_string(),
        library: String::new(),
        read_book_id: fields[1].trim().parse().ok()?,
        recommended_book_id: fields[2].trim().parse().ok()?,
        comment: None,
        created_at: 0,
    })
}

fn parse_user(line: &str) -> Option<User> {
    let fields: Vec<&str> = line.split(';').collect();
    if fields.len() != 6 {
        return None;
    }

    Some(User {
        name: fields[0].to_string(),
        surname: fields[1].to_string(),
        tax_code: fields[2].to_string(),
        email: fields[3].to_string(),
        user_id: fields[4].to_string(),
        password: fields[5].to_string(),
    })
}

// ---- record formatting ----

fn format_library(library: &Library) -> String {
    let ids: Vec<String> = library.book_ids.iter().map(|id| id.to_string()).collect();
    format!(
        "{};{};[{}]",
        library.owner_id,
        library.name,
        ids.join(", ")
    )
}

fn format_rating(rating: &Rating) -> String {
    let mut line = format!("{};{}", rating.owner_id, rating.book_id);
    for c in Criterion::ALL {
        let _ = write!(line, ";{};{}", rating.score(c), rating.note(c));
    }
    let _ = write!(line, ";{};{}", rating.overall, rating.overall_note);
    line
}

fn format_recommendation(rec: &Recommendation) -> String {
    format!(
        "{};{};{}",
        rec.owner_id, rec.read_book_id, rec.recommended_book_id
    )
}

fn format_user(user: &User) -> String {
    format!(
        "{};{};{};{};{};{}",
        user.name, user.surname, user.tax_code, user.email, user.user_id, user.password
    )
}

// ---- file I/O ----

fn append_line(path: &Path, line: &str) -> Result<()> {
    append_chunk(path, &format!("{line}\n"))
}

fn append_chunk(path: &Path, chunk: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(chunk.as_bytes())
        .map_err(|e| DomainError::Storage(format!("append to {}: {e}", path.display())))
}

fn rewrite_file(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    std::fs::write(path, content)
        .map_err(|e| DomainError::Storage(format!("rewrite {}: {e}", path.display())))
}

//! Relational backend over SQLite.
//!
//! Tables keep the legacy names (`UtentiRegistrati`, `Libri`, `Librerie`,
//! `Libreria_Libro`, `ValutazioniLibri`, `ConsigliLibri`). Primary keys
//! and UNIQUE constraints are the authoritative duplicate/cap signals:
//! a violation maps to the matching typed `Conflict`, never to a silent
//! overwrite.

use crate::catalog::Book;
use crate::error::{ConflictError, DomainError, Result};
use crate::store::{
    Criterion, Library, RECOMMENDATION_CAP, Rating, Recommendation, Store, User,
};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Arc;

/// SQLite-backed store. Cheap to clone; all clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

/// Apply connection-level settings the storage layer assumes.
///
/// The schema declares foreign keys for documentation, but the code
/// performs its own explicit, ordered cascades (see `delete_user` and
/// `delete_library`) and inserts membership/rating rows without
/// pre-seeding the referenced catalog/user rows. That contract matches
/// SQLite's historical default of *not* enforcing foreign keys; some
/// builds flip the compile-time default on, so pin it off explicitly.
fn configure_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", false)
        .map_err(|e| DomainError::Storage(format!("failed to configure connection: {e}")))?;
    Ok(())
}

impl SqliteStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| DomainError::Storage(format!("failed to open database: {e}")))?;
        configure_connection(&conn)?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DomainError::Storage(format!("failed to open database: {e}")))?;
        configure_connection(&conn)?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            -- Registered users
            CREATE TABLE IF NOT EXISTS UtentiRegistrati (
                user_id        TEXT PRIMARY KEY,
                password       TEXT NOT NULL,
                nome           TEXT NOT NULL,
                cognome        TEXT NOT NULL,
                codice_fiscale TEXT UNIQUE NOT NULL,
                email          TEXT UNIQUE NOT NULL
            );

            -- Cataloged books
            CREATE TABLE IF NOT EXISTS Libri (
                id          INTEGER PRIMARY KEY,
                titolo      TEXT NOT NULL,
                autori      TEXT,
                anno        TEXT,
                descrizione TEXT,
                categorie   TEXT,
                editore     TEXT,
                prezzo      TEXT
            );

            -- Named libraries, unique per owner
            CREATE TABLE IF NOT EXISTS Librerie (
                libreria_id    INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id        TEXT NOT NULL,
                nome_libreria  TEXT NOT NULL,
                data_creazione INTEGER NOT NULL,
                UNIQUE (user_id, nome_libreria),
                FOREIGN KEY (user_id) REFERENCES UtentiRegistrati(user_id) ON DELETE CASCADE
            );

            -- Library membership
            CREATE TABLE IF NOT EXISTS Libreria_Libro (
                libreria_id      INTEGER NOT NULL,
                libro_id         INTEGER NOT NULL,
                data_inserimento INTEGER NOT NULL,
                PRIMARY KEY (libreria_id, libro_id),
                FOREIGN KEY (libreria_id) REFERENCES Librerie(libreria_id) ON DELETE CASCADE,
                FOREIGN KEY (libro_id) REFERENCES Libri(id) ON DELETE RESTRICT
            );

            -- One rating per (user, book)
            CREATE TABLE IF NOT EXISTS ValutazioniLibri (
                user_id           TEXT NOT NULL,
                libreria_id       INTEGER,
                libro_id          INTEGER NOT NULL,
                stile_score       INTEGER NOT NULL CHECK (stile_score BETWEEN 1 AND 5),
                stile_note        TEXT,
                contenuto_score   INTEGER NOT NULL CHECK (contenuto_score BETWEEN 1 AND 5),
                contenuto_note    TEXT,
                gradevolezza_score INTEGER NOT NULL CHECK (gradevolezza_score BETWEEN 1 AND 5),
                gradevolezza_note TEXT,
                originalita_score INTEGER NOT NULL CHECK (originalita_score BETWEEN 1 AND 5),
                originalita_note  TEXT,
                edizione_score    INTEGER NOT NULL CHECK (edizione_score BETWEEN 1 AND 5),
                edizione_note     TEXT,
                voto_complessivo  REAL NOT NULL,
                nota_finale       TEXT,
                data_valutazione  INTEGER NOT NULL,
                PRIMARY KEY (user_id, libro_id),
                FOREIGN KEY (user_id) REFERENCES UtentiRegistrati(user_id) ON DELETE CASCADE
            );

            -- Up to three suggestions per (user, read book)
            CREATE TABLE IF NOT EXISTS ConsigliLibri (
                user_id              TEXT NOT NULL,
                libreria_id          INTEGER,
                libro_letto_id       INTEGER NOT NULL,
                libro_consigliato_id INTEGER NOT NULL,
                commento             TEXT,
                data_consiglio       INTEGER NOT NULL,
                PRIMARY KEY (user_id, libro_letto_id, libro_consigliato_id),
                FOREIGN KEY (user_id) REFERENCES UtentiRegistrati(user_id) ON DELETE CASCADE,
                FOREIGN KEY (libro_consigliato_id) REFERENCES Libri(id)
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_librerie_user ON Librerie(user_id);
            CREATE INDEX IF NOT EXISTS idx_valutazioni_libro ON ValutazioniLibri(libro_id);
            CREATE INDEX IF NOT EXISTS idx_consigli_letto ON ConsigliLibri(libro_letto_id);
            "#,
        )
        .map_err(|e| DomainError::Storage(format!("failed to initialize schema: {e}")))?;

        Ok(())
    }

    // ========== BOOK OPERATIONS ==========

    /// Populate the `Libri` table from an already-parsed book list.
    pub fn insert_books(&self, books: &[Book]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::Storage(format!("failed to start transaction: {e}")))?;

        let mut inserted = 0;
        for book in books {
            inserted += tx
                .execute(
                    "INSERT OR REPLACE INTO Libri (id, titolo, autori, anno, descrizione, categorie, editore, prezzo)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        book.id,
                        book.title,
                        book.authors,
                        book.year,
                        book.description,
                        book.categories,
                        book.publisher,
                        book.price,
                    ],
                )
                .map_err(|e| DomainError::Storage(format!("failed to insert book: {e}")))?;
        }

        tx.commit()
            .map_err(|e| DomainError::Storage(format!("failed to commit books: {e}")))?;
        Ok(inserted)
    }

    /// Load the whole `Libri` table as a catalog source.
    pub fn load_books(&self) -> Result<Vec<Book>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, titolo, autori, anno, descrizione, categorie, editore, prezzo
                 FROM Libri ORDER BY id",
            )
            .map_err(|e| DomainError::Storage(format!("failed to prepare query: {e}")))?;

        let books = stmt
            .query_map([], |row| {
                Ok(Book {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    authors: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    year: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    description: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    categories: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    publisher: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                    price: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                    month: String::new(),
                })
            })
            .map_err(|e| DomainError::Storage(format!("failed to load books: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Storage(format!("failed to collect books: {e}")))?;

        Ok(books)
    }

    fn rating_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Rating> {
        let mut scores = [0u8; 5];
        let mut notes: [String; 5] = Default::default();
        for (i, _) in Criterion::ALL.iter().enumerate() {
            scores[i] = row.get(3 + i * 2)?;
            notes[i] = row.get::<_, Option<String>>(4 + i * 2)?.unwrap_or_default();
        }

        Ok(Rating {
            owner_id: row.get(0)?,
            library: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            book_id: row.get(2)?,
            scores,
            notes,
            overall: row.get(13)?,
            overall_note: row.get::<_, Option<String>>(14)?.unwrap_or_default(),
            created_at: row.get(15)?,
        })
    }
}

const RATING_COLUMNS: &str = "v.user_id, l.nome_libreria, v.libro_id, \
     v.stile_score, v.stile_note, v.contenuto_score, v.contenuto_note, \
     v.gradevolezza_score, v.gradevolezza_note, v.originalita_score, v.originalita_note, \
     v.edizione_score, v.edizione_note, v.voto_complessivo, v.nota_finale, v.data_valutazione";

impl Store for SqliteStore {
    fn insert_library(&self, library: &Library) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::Storage(format!("failed to start transaction: {e}")))?;

        tx.execute(
            "INSERT INTO Librerie (user_id, nome_libreria, data_creazione) VALUES (?1, ?2, ?3)",
            params![library.owner_id, library.name, library.created_at],
        )
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint") {
                DomainError::Conflict(ConflictError::DuplicateName {
                    owner: library.owner_id.clone(),
                    name: library.name.clone(),
                })
            } else {
                DomainError::Storage(format!("failed to insert library: {e}"))
            }
        })?;

        let library_id = tx.last_insert_rowid();
        for book_id in &library.book_ids {
            tx.execute(
                "INSERT OR IGNORE INTO Libreria_Libro (libreria_id, libro_id, data_inserimento)
                 VALUES (?1, ?2, ?3)",
                params![library_id, book_id, library.created_at],
            )
            .map_err(|e| DomainError::Storage(format!("failed to insert library book: {e}")))?;
        }

        tx.commit()
            .map_err(|e| DomainError::Storage(format!("failed to commit library: {e}")))?;
        Ok(())
    }

    fn list_libraries(&self, owner: &str) -> Result<Vec<Library>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT l.libreria_id, l.nome_libreria, l.data_creazione
                 FROM Librerie l WHERE l.user_id = ?1 ORDER BY l.libreria_id",
            )
            .map_err(|e| DomainError::Storage(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map(params![owner], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .map_err(|e| DomainError::Storage(format!("failed to list libraries: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Storage(format!("failed to collect libraries: {e}")))?;

        let mut libraries = Vec::with_capacity(rows.len());
        for (library_id, name, created_at) in rows {
            let mut stmt = conn
                .prepare(
                    "SELECT libro_id FROM Libreria_Libro
                     WHERE libreria_id = ?1 ORDER BY rowid",
                )
                .map_err(|e| DomainError::Storage(format!("failed to prepare query: {e}")))?;
            let book_ids = stmt
                .query_map(params![library_id], |row| row.get(0))
                .map_err(|e| DomainError::Storage(format!("failed to list library books: {e}")))?
                .collect::<std::result::Result<Vec<i64>, _>>()
                .map_err(|e| DomainError::Storage(format!("failed to collect book ids: {e}")))?;

            libraries.push(Library {
                owner_id: owner.to_string(),
                name,
                book_ids,
                created_at,
            });
        }

        Ok(libraries)
    }

    fn find_library(&self, owner: &str, name: &str) -> Result<Option<Library>> {
        Ok(self
            .list_libraries(owner)?
            .into_iter()
            .find(|l| l.name == name))
    }

    fn delete_library(&self, owner: &str, name: &str) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::Storage(format!("failed to start transaction: {e}")))?;

        let library_id: Option<i64> = tx
            .query_row(
                "SELECT libreria_id FROM Librerie WHERE user_id = ?1 AND nome_libreria = ?2",
                params![owner, name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DomainError::Storage(format!("failed to find library: {e}")))?;

        let Some(library_id) = library_id else {
            return Ok(false);
        };

        // Membership rows go with the library; ratings and recommendations
        // referencing its books stay (ownership checks span all libraries).
        tx.execute(
            "DELETE FROM Libreria_Libro WHERE libreria_id = ?1",
            params![library_id],
        )
        .map_err(|e| DomainError::Storage(format!("failed to delete library books: {e}")))?;
        tx.execute(
            "DELETE FROM Librerie WHERE libreria_id = ?1",
            params![library_id],
        )
        .map_err(|e| DomainError::Storage(format!("failed to delete library: {e}")))?;

        tx.commit()
            .map_err(|e| DomainError::Storage(format!("failed to commit delete: {e}")))?;
        Ok(true)
    }

    fn is_book_owned(&self, owner: &str, book_id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM Libreria_Libro ll
                 JOIN Librerie l ON l.libreria_id = ll.libreria_id
                 WHERE l.user_id = ?1 AND ll.libro_id = ?2",
                params![owner, book_id],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::Storage(format!("failed to check ownership: {e}")))?;
        Ok(count > 0)
    }

    fn insert_rating(&self, rating: &Rating) -> Result<()> {
        let conn = self.conn.lock();

        let library_id: Option<i64> = conn
            .query_row(
                "SELECT libreria_id FROM Librerie WHERE user_id = ?1 AND nome_libreria = ?2",
                params![rating.owner_id, rating.library],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DomainError::Storage(format!("failed to resolve library: {e}")))?;

        conn.execute(
            "INSERT INTO ValutazioniLibri
             (user_id, libreria_id, libro_id,
              stile_score, stile_note, contenuto_score, contenuto_note,
              gradevolezza_score, gradevolezza_note, originalita_score, originalita_note,
              edizione_score, edizione_note, voto_complessivo, nota_finale, data_valutazione)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                rating.owner_id,
                library_id,
                rating.book_id,
                rating.score(Criterion::Stile),
                rating.note(Criterion::Stile),
                rating.score(Criterion::Contenuto),
                rating.note(Criterion::Contenuto),
                rating.score(Criterion::Gradevolezza),
                rating.note(Criterion::Gradevolezza),
                rating.score(Criterion::Originalita),
                rating.note(Criterion::Originalita),
                rating.score(Criterion::Edizione),
                rating.note(Criterion::Edizione),
                rating.overall,
                rating.overall_note,
                rating.created_at,
            ],
        )
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint") {
                DomainError::Conflict(ConflictError::AlreadyRated {
                    owner: rating.owner_id.clone(),
                    book: rating.book_id,
                })
            } else {
                DomainError::Storage(format!("failed to insert rating: {e}"))
            }
        })?;
        Ok(())
    }

    fn has_rating(&self, owner: &str, book_id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM ValutazioniLibri WHERE user_id = ?1 AND libro_id = ?2",
                params![owner, book_id],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::Storage(format!("failed to check rating: {e}")))?;
        Ok(count > 0)
    }

    fn ratings_for_book(&self, book_id: i64) -> Result<Vec<Rating>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {RATING_COLUMNS} FROM ValutazioniLibri v
                 LEFT JOIN Librerie l ON l.libreria_id = v.libreria_id
                 WHERE v.libro_id = ?1 ORDER BY v.rowid"
            ))
            .map_err(|e| DomainError::Storage(format!("failed to prepare query: {e}")))?;

        let ratings = stmt
            .query_map(params![book_id], Self::rating_from_row)
            .map_err(|e| DomainError::Storage(format!("failed to get ratings: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Storage(format!("failed to collect ratings: {e}")))?;

        Ok(ratings)
    }

    fn insert_recommendations(&self, batch: &[Recommendation]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::Storage(format!("failed to start transaction: {e}")))?;

        for rec in batch {
            let library_id: Option<i64> = tx
                .query_row(
                    "SELECT libreria_id FROM Librerie WHERE user_id = ?1 AND nome_libreria = ?2",
                    params![rec.owner_id, rec.library],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| DomainError::Storage(format!("failed to resolve library: {e}")))?;

            tx.execute(
                "INSERT INTO ConsigliLibri
                 (user_id, libreria_id, libro_letto_id, libro_consigliato_id, commento, data_consiglio)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    rec.owner_id,
                    library_id,
                    rec.read_book_id,
                    rec.recommended_book_id,
                    rec.comment,
                    rec.created_at,
                ],
            )
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    DomainError::Conflict(ConflictError::DuplicateTarget {
                        owner: rec.owner_id.clone(),
                        read_book: rec.read_book_id,
                        target: rec.recommended_book_id,
                    })
                } else {
                    DomainError::Storage(format!("failed to insert recommendation: {e}"))
                }
            })?;
        }

        // Cap check inside the transaction: an over-cap batch rolls back whole.
        for rec in batch {
            let count: i64 = tx
                .query_row(
                    "SELECT COUNT(*) FROM ConsigliLibri
                     WHERE user_id = ?1 AND libro_letto_id = ?2",
                    params![rec.owner_id, rec.read_book_id],
                    |row| row.get(0),
                )
                .map_err(|e| DomainError::Storage(format!("failed to count recommendations: {e}")))?;
            if count as usize > RECOMMENDATION_CAP {
                return Err(ConflictError::LimitReached {
                    owner: rec.owner_id.clone(),
                    read_book: rec.read_book_id,
                    limit: RECOMMENDATION_CAP,
                }
                .into());
            }
        }

        tx.commit()
            .map_err(|e| DomainError::Storage(format!("failed to commit recommendations: {e}")))?;
        Ok(())
    }

    fn recommendations_by_reader(
        &self,
        owner: &str,
        read_book_id: i64,
    ) -> Result<Vec<Recommendation>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT c.user_id, l.nome_libreria, c.libro_letto_id, c.libro_consigliato_id,
                        c.commento, c.data_consiglio
                 FROM ConsigliLibri c
                 LEFT JOIN Librerie l ON l.libreria_id = c.libreria_id
                 WHERE c.user_id = ?1 AND c.libro_letto_id = ?2 ORDER BY c.rowid",
            )
            .map_err(|e| DomainError::Storage(format!("failed to prepare query: {e}")))?;

        let recs = stmt
            .query_map(params![owner, read_book_id], recommendation_from_row)
            .map_err(|e| DomainError::Storage(format!("failed to get recommendations: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Storage(format!("failed to collect recommendations: {e}")))?;

        Ok(recs)
    }

    fn recommendations_for_book(&self, read_book_id: i64) -> Result<Vec<Recommendation>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT c.user_id, l.nome_libreria, c.libro_letto_id, c.libro_consigliato_id,
                        c.commento, c.data_consiglio
                 FROM ConsigliLibri c
                 LEFT JOIN Librerie l ON l.libreria_id = c.libreria_id
                 WHERE c.libro_letto_id = ?1 ORDER BY c.rowid",
            )
            .map_err(|e| DomainError::Storage(format!("failed to prepare query: {e}")))?;

        let recs = stmt
            .query_map(params![read_book_id], recommendation_from_row)
            .map_err(|e| DomainError::Storage(format!("failed to get recommendations: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Storage(format!("failed to collect recommendations: {e}")))?;

        Ok(recs)
    }

    fn insert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO UtentiRegistrati (user_id, password, nome, cognome, codice_fiscale, email)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.user_id,
                user.password,
                user.name,
                user.surname,
                user.tax_code,
                user.email,
            ],
        )
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint") {
                let (field, value) = if msg.contains("codice_fiscale") {
                    ("tax code", user.tax_code.clone())
                } else if msg.contains("email") {
                    ("email", user.email.clone())
                } else {
                    ("user id", user.user_id.clone())
                };
                DomainError::Conflict(ConflictError::DuplicateUser { field, value })
            } else {
                DomainError::Storage(format!("failed to insert user: {e}"))
            }
        })?;
        Ok(())
    }

    fn find_user(&self, handle: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT user_id, password, nome, cognome, codice_fiscale, email
             FROM UtentiRegistrati WHERE user_id = ?1",
            params![handle],
            user_from_row,
        )
        .optional()
        .map_err(|e| DomainError::Storage(format!("failed to get user: {e}")))
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT user_id, password, nome, cognome, codice_fiscale, email
                 FROM UtentiRegistrati ORDER BY user_id",
            )
            .map_err(|e| DomainError::Storage(format!("failed to prepare query: {e}")))?;

        let users = stmt
            .query_map([], user_from_row)
            .map_err(|e| DomainError::Storage(format!("failed to list users: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Storage(format!("failed to collect users: {e}")))?;

        Ok(users)
    }

    fn delete_user(&self, handle: &str) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::Storage(format!("failed to start transaction: {e}")))?;

        // Explicit cascade, oldest dependents first.
        tx.execute("DELETE FROM ConsigliLibri WHERE user_id = ?1", params![handle])
            .map_err(|e| DomainError::Storage(format!("failed to delete recommendations: {e}")))?;
        tx.execute(
            "DELETE FROM ValutazioniLibri WHERE user_id = ?1",
            params![handle],
        )
        .map_err(|e| DomainError::Storage(format!("failed to delete ratings: {e}")))?;
        tx.execute(
            "DELETE FROM Libreria_Libro WHERE libreria_id IN
             (SELECT libreria_id FROM Librerie WHERE user_id = ?1)",
            params![handle],
        )
        .map_err(|e| DomainError::Storage(format!("failed to delete library books: {e}")))?;
        tx.execute("DELETE FROM Librerie WHERE user_id = ?1", params![handle])
            .map_err(|e| DomainError::Storage(format!("failed to delete libraries: {e}")))?;
        let rows = tx
            .execute("DELETE FROM UtentiRegistrati WHERE user_id = ?1", params![handle])
            .map_err(|e| DomainError::Storage(format!("failed to delete user: {e}")))?;

        tx.commit()
            .map_err(|e| DomainError::Storage(format!("failed to commit delete: {e}")))?;
        Ok(rows > 0)
    }
}

fn recommendation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Recommendation> {
    Ok(Recommendation {
        owner_id: row.get(0)?,
        library: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        read_book_id: row.get(2)?,
        recommended_book_id: row.get(3)?,
        comment: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        password: row.get(1)?,
        name: row.get(2)?,
        surname: row.get(3)?,
        tax_code: row.get(4)?,
        email: row.get(5)?,
    })
}

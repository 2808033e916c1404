//! Delimited catalog file reader.
//!
//! The book source is a comma-delimited file where free-text fields are
//! wrapped in double quotes so they may contain commas:
//! `id,title,"authors","description","categories","publisher",price,month,year`.
//! Quotes toggle a literal-comma mode and are not emitted; no other
//! escaping exists in the format.

use crate::catalog::book::Book;
use crate::error::Result;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Number of fields in a well-formed book record.
const BOOK_FIELDS: usize = 9;

/// Read all books from the given file. Malformed rows (wrong field count,
/// non-numeric id) are skipped with a warning rather than failing the load.
pub fn read_books(path: &Path) -> Result<Vec<Book>> {
    let file = std::fs::File::open(path)?;
    let mut books = Vec::new();

    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_record(&line) {
            Some(book) => books.push(book),
            None => {
                tracing::warn!(line = lineno + 1, "skipping malformed book record");
            }
        }
    }

    tracing::info!(books = books.len(), path = %path.display(), "catalog loaded");
    Ok(books)
}

/// Parse a single record, or `None` if it is malformed.
fn parse_record(line: &str) -> Option<Book> {
    let fields = split_line(line);
    if fields.len() != BOOK_FIELDS {
        return None;
    }

    let id: i64 = fields[0].trim().parse().ok()?;
    Some(Book {
        id,
        title: fields[1].clone(),
        authors: fields[2].clone(),
        description: fields[3].clone(),
        categories: fields[4].clone(),
        publisher: fields[5].clone(),
        price: fields[6].clone(),
        month: fields[7].clone(),
        year: fields[8].clone(),
    })
}

/// Split a record on commas, honoring double quotes: commas inside a
/// quoted span are literal, the quotes themselves are dropped.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

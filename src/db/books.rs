use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::models::{Book, NewBook};

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        genre: row.get(3)?,
        published_year: row.get(4)?,
        available_copies: row.get(5)?,
    })
}

/// Every book in insertion order, as the "View Books" table shows them.
pub fn fetch_books(conn: &Connection) -> Result<Vec<Book>> {
    let mut stmt = conn
        .prepare(
            "SELECT BookID, Title, Author, Genre, PublishedYear, AvailableCopies
             FROM Books
             ORDER BY BookID",
        )
        .context("failed to prepare book query")?;

    let books = stmt
        .query_map([], book_from_row)
        .context("failed to load books")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect books")?;

    Ok(books)
}

/// Books with at least one copy on the shelf; the only ones that can be issued.
pub fn fetch_issuable_books(conn: &Connection) -> Result<Vec<Book>> {
    let mut stmt = conn
        .prepare(
            "SELECT BookID, Title, Author, Genre, PublishedYear, AvailableCopies
             FROM Books
             WHERE AvailableCopies > 0
             ORDER BY BookID",
        )
        .context("failed to prepare issuable book query")?;

    let books = stmt
        .query_map([], book_from_row)
        .context("failed to load issuable books")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect issuable books")?;

    Ok(books)
}

pub fn find_book(conn: &Connection, id: i64) -> Result<Option<Book>> {
    conn.query_row(
        "SELECT BookID, Title, Author, Genre, PublishedYear, AvailableCopies
         FROM Books WHERE BookID = ?1",
        [id],
        book_from_row,
    )
    .optional()
    .context("failed to look up book")
}

/// Insert a book and return the stored row.
pub fn create_book(conn: &Connection, book: &NewBook) -> Result<Book> {
    conn.execute(
        "INSERT INTO Books (Title, Author, Genre, PublishedYear, AvailableCopies)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            book.title,
            book.author,
            book.genre,
            book.published_year,
            book.copies
        ],
    )
    .context("failed to insert book")?;

    let id = conn.last_insert_rowid();
    info!(id, title = %book.title, copies = book.copies, "book added");
    Ok(Book {
        id,
        title: book.title.clone(),
        author: book.author.clone(),
        genre: Some(book.genre.clone()),
        published_year: Some(book.published_year),
        available_copies: book.copies,
    })
}

/// Move a book's available copy count by `delta`. Returns the rows touched so
/// callers can tell a missing book apart from a successful update.
pub(crate) fn adjust_copies(conn: &Connection, id: i64, delta: i64) -> Result<usize> {
    conn.execute(
        "UPDATE Books SET AvailableCopies = AvailableCopies + ?1 WHERE BookID = ?2",
        params![delta, id],
    )
    .context("failed to update available copies")
}

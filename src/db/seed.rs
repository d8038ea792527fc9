use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::{info, warn};

/// Books every fresh catalog starts with: title, author, genre, year, copies.
const SEED_BOOKS: &[(&str, &str, &str, i64, i64)] = &[
    ("The Alchemist", "Paulo Coelho", "Fiction", 1988, 5),
    ("1984", "George Orwell", "Dystopian", 1949, 3),
    ("To Kill a Mockingbird", "Harper Lee", "Classic", 1960, 4),
];

/// Members every fresh catalog starts with: name, email, phone.
const SEED_MEMBERS: &[(&str, &str, &str)] = &[
    ("Alice Johnson", "alice@example.com", "1234567890"),
    ("Bob Smith", "bob@example.com", "9876543210"),
];

/// What a seeding pass changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub books_inserted: usize,
    pub books_skipped: usize,
    pub members_inserted: usize,
    pub members_skipped: usize,
}

/// Insert the fixed starter rows that are not present yet. Books are matched on
/// title and author; members on email, checked up front so a rerun never trips
/// the UNIQUE constraint.
pub fn seed(conn: &Connection) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for &(title, author, genre, year, copies) in SEED_BOOKS {
        if book_exists(conn, title, author)? {
            report.books_skipped += 1;
            continue;
        }
        conn.execute(
            "INSERT INTO Books (Title, Author, Genre, PublishedYear, AvailableCopies)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![title, author, genre, year, copies],
        )
        .context("failed to insert seed book")?;
        report.books_inserted += 1;
    }

    for &(name, email, phone) in SEED_MEMBERS {
        if email_exists(conn, email)? {
            warn!(email, "skipping duplicate email");
            report.members_skipped += 1;
            continue;
        }
        conn.execute(
            "INSERT INTO Members (Name, Email, Phone) VALUES (?1, ?2, ?3)",
            params![name, email, phone],
        )
        .context("failed to insert seed member")?;
        report.members_inserted += 1;
    }

    info!(
        books = report.books_inserted,
        members = report.members_inserted,
        "seed data inserted"
    );
    Ok(report)
}

fn book_exists(conn: &Connection, title: &str, author: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM Books WHERE Title = ?1 AND Author = ?2)",
        params![title, author],
        |row| row.get(0),
    )
    .context("failed to look up seed book")
}

fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM Members WHERE Email = ?1)",
        [email],
        |row| row.get(0),
    )
    .context("failed to look up member email")
}

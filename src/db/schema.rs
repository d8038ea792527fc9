use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

/// Create the catalog tables if they are missing, then bring older files up to
/// date. Every statement is guarded so calling this on each startup is a no-op
/// once the schema exists.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS Books (
            BookID INTEGER PRIMARY KEY AUTOINCREMENT,
            Title TEXT NOT NULL,
            Author TEXT NOT NULL,
            Genre TEXT,
            PublishedYear INTEGER,
            AvailableCopies INTEGER DEFAULT 1
        )",
        [],
    )
    .context("failed to create Books table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Members (
            MemberID INTEGER PRIMARY KEY AUTOINCREMENT,
            Name TEXT NOT NULL,
            Email TEXT UNIQUE NOT NULL,
            Phone TEXT,
            JoinDate TEXT DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("failed to create Members table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Transactions (
            TransactionID INTEGER PRIMARY KEY AUTOINCREMENT,
            BookID INTEGER NOT NULL,
            MemberID INTEGER NOT NULL,
            BorrowDate TEXT DEFAULT CURRENT_TIMESTAMP,
            ReturnDate TEXT,
            Status TEXT CHECK(Status IN ('Borrowed', 'Returned')) NOT NULL DEFAULT 'Borrowed',
            FOREIGN KEY (BookID) REFERENCES Books(BookID) ON DELETE CASCADE,
            FOREIGN KEY (MemberID) REFERENCES Members(MemberID) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create Transactions table")?;

    migrate_due_date(conn)?;
    info!("schema ready");
    Ok(())
}

/// Add `Transactions.DueDate` to databases created before loans had due dates.
/// Returns `true` when the column was added by this call.
pub fn migrate_due_date(conn: &Connection) -> Result<bool> {
    if table_columns(conn, "Transactions")?
        .iter()
        .any(|name| name == "DueDate")
    {
        return Ok(false);
    }

    conn.execute("ALTER TABLE Transactions ADD COLUMN DueDate DATE", [])
        .context("failed to add DueDate column")?;
    info!("added DueDate column to Transactions");
    Ok(true)
}

/// Column names of `table` in declaration order.
pub(crate) fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .context("failed to prepare table_info query")?;

    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .context("failed to read table_info")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect column names")?;

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_count(conn: &Connection, name: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn creates_all_tables_with_due_date() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        for table in ["Books", "Members", "Transactions"] {
            assert_eq!(table_count(&conn, table), 1, "{table} missing");
        }
        let columns = table_columns(&conn, "Transactions").unwrap();
        assert_eq!(columns.last().map(String::as_str), Some("DueDate"));
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        for table in ["Books", "Members", "Transactions"] {
            assert_eq!(table_count(&conn, table), 1);
        }
        let due_columns = table_columns(&conn, "Transactions")
            .unwrap()
            .into_iter()
            .filter(|name| name == "DueDate")
            .count();
        assert_eq!(due_columns, 1);
    }

    #[test]
    fn migration_reports_whether_it_ran() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        assert!(!migrate_due_date(&conn).unwrap());
    }

    #[test]
    fn migration_upgrades_a_legacy_transactions_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Transactions (
                TransactionID INTEGER PRIMARY KEY AUTOINCREMENT,
                BookID INTEGER NOT NULL,
                MemberID INTEGER NOT NULL,
                Status TEXT NOT NULL DEFAULT 'Borrowed'
            );",
        )
        .unwrap();

        assert!(migrate_due_date(&conn).unwrap());
        assert!(table_columns(&conn, "Transactions")
            .unwrap()
            .contains(&"DueDate".to_string()));
    }
}

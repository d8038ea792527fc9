use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, Params, Transaction};
use tracing::{debug, info};

use super::schema::ensure_schema;
use super::seed::{seed, SeedReport};

/// Tables `count_rows` accepts; the name is spliced into SQL.
const CATALOG_TABLES: [&str; 3] = ["Books", "Members", "Transactions"];

/// Whether `execute_query` should hand back the rows it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    None,
    All,
}

/// Rows returned by `execute_query`, one `Vec` of column values per row.
pub type Rows = Vec<Vec<Value>>;

/// Handle to the on-disk catalog. Holding a `Database` does not keep a
/// connection open: each call opens a fresh one and drops it on every exit
/// path, so a failing statement never leaves a handle behind.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Remember the database location, creating its parent directory. The file
    /// itself is created by SQLite on first connect.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("failed to create data directory")?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the schema, apply the DueDate migration and insert seed rows.
    /// Safe to run on every startup.
    pub fn bootstrap(&self) -> Result<SeedReport> {
        self.with_connection(ensure_schema)?;
        let report = self.unit_of_work(|tx| seed(tx))?;

        let books = self.count_rows("Books")?;
        let members = self.count_rows("Members")?;
        info!(
            path = %self.path.display(),
            books,
            members,
            "catalog ready"
        );
        Ok(report)
    }

    /// Execute one statement on a fresh connection. With `Fetch::All` every
    /// result row comes back as its column values in order; otherwise the
    /// statement is run for its side effect and `None` is returned. Writes are
    /// committed as soon as the statement finishes.
    pub fn execute_query<P: Params>(&self, sql: &str, params: P, fetch: Fetch) -> Result<Option<Rows>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .with_context(|| format!("failed to prepare query: {sql}"))?;

            match fetch {
                Fetch::All => {
                    let columns = stmt.column_count();
                    let rows = stmt
                        .query_map(params, |row| {
                            (0..columns)
                                .map(|index| row.get::<_, Value>(index))
                                .collect::<rusqlite::Result<Vec<_>>>()
                        })
                        .context("failed to run query")?
                        .collect::<Result<Vec<_>, _>>()
                        .context("failed to collect query rows")?;
                    Ok(Some(rows))
                }
                Fetch::None => {
                    stmt.execute(params).context("failed to execute statement")?;
                    Ok(None)
                }
            }
        })
    }

    /// Run `f` against a freshly opened connection that is closed afterwards.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.connect()?;
        f(&conn)
    }

    /// Run `f` inside a single SQLite transaction. The transaction commits when
    /// `f` succeeds; any error rolls back every statement `f` issued.
    pub fn unit_of_work<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .context("failed to begin transaction")?;
        let value = f(&tx)?;
        tx.commit().context("failed to commit transaction")?;
        Ok(value)
    }

    /// Count the rows of one catalog table: `Books`, `Members` or
    /// `Transactions`.
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        if !CATALOG_TABLES.contains(&table) {
            bail!("unknown catalog table: {table}");
        }
        let rows = self
            .execute_query(&format!("SELECT COUNT(*) FROM {table}"), [], Fetch::All)?
            .unwrap_or_default();
        match rows.first().map(Vec::as_slice) {
            Some([Value::Integer(count)]) => Ok(*count),
            other => Err(anyhow!("unexpected COUNT(*) result for {table}: {other:?}")),
        }
    }

    fn connect(&self) -> Result<Connection> {
        debug!(path = %self.path.display(), "opening connection");
        let conn = Connection::open(&self.path).context("failed to open SQLite database")?;
        conn.execute("PRAGMA foreign_keys = ON", [])
            .context("failed to enable foreign keys")?;
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    fn temp_database() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("catalog.db")).unwrap();
        (dir, db)
    }

    fn ids_in_t(db: &Database) -> Rows {
        db.execute_query("SELECT id FROM t", [], Fetch::All)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn open_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("catalog.db");
        Database::open(&nested).unwrap();
        assert!(nested.parent().unwrap().is_dir());
    }

    #[test]
    fn execute_query_persists_writes_and_fetches_rows() {
        let (_dir, db) = temp_database();
        db.execute_query("CREATE TABLE t (id INTEGER, name TEXT)", [], Fetch::None)
            .unwrap();
        let written = db
            .execute_query(
                "INSERT INTO t (id, name) VALUES (?1, ?2)",
                params![7, "seven"],
                Fetch::None,
            )
            .unwrap();
        assert!(written.is_none());

        let rows = db
            .execute_query("SELECT id, name FROM t", [], Fetch::All)
            .unwrap()
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![Value::Integer(7), Value::Text("seven".into())]]
        );
    }

    #[test]
    fn execute_query_propagates_database_errors() {
        let (_dir, db) = temp_database();
        let err = db
            .execute_query("SELECT * FROM missing_table", [], Fetch::All)
            .unwrap_err();
        assert!(format!("{err:#}").contains("missing_table"));
    }

    #[test]
    fn unit_of_work_rolls_back_on_error() {
        let (_dir, db) = temp_database();
        db.execute_query("CREATE TABLE t (id INTEGER)", [], Fetch::None)
            .unwrap();

        let result: Result<()> = db.unit_of_work(|tx| {
            tx.execute("INSERT INTO t (id) VALUES (1)", [])?;
            Err(anyhow::anyhow!("boom"))
        });
        assert!(result.is_err());
        assert!(ids_in_t(&db).is_empty());

        db.unit_of_work(|tx| {
            tx.execute("INSERT INTO t (id) VALUES (1)", [])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(ids_in_t(&db), vec![vec![Value::Integer(1)]]);
    }

    #[test]
    fn count_rows_only_accepts_catalog_tables() {
        let (_dir, db) = temp_database();
        db.bootstrap().unwrap();
        assert_eq!(db.count_rows("Books").unwrap(), 3);
        assert_eq!(db.count_rows("Transactions").unwrap(), 0);

        let err = db.count_rows("Books; DROP TABLE Books").unwrap_err();
        assert!(err.to_string().contains("unknown catalog table"));
        assert_eq!(db.count_rows("Books").unwrap(), 3);
    }

    #[test]
    fn count_rows_surfaces_missing_table() {
        let (_dir, db) = temp_database();
        assert!(db.count_rows("Members").is_err());
    }
}

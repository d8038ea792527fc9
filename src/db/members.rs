use anyhow::{Context, Result};
use rusqlite::{params, Connection, Error as SqlError, ErrorCode, OptionalExtension, Row};
use tracing::info;

use crate::error::CatalogError;
use crate::models::{Member, NewMember};

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        join_date: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
    })
}

/// All members in the order they joined.
pub fn fetch_members(conn: &Connection) -> Result<Vec<Member>> {
    let mut stmt = conn
        .prepare(
            "SELECT MemberID, Name, Email, Phone, JoinDate
             FROM Members
             ORDER BY MemberID",
        )
        .context("failed to prepare member query")?;

    let members = stmt
        .query_map([], member_from_row)
        .context("failed to load members")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect members")?;

    Ok(members)
}

pub fn find_member(conn: &Connection, id: i64) -> Result<Option<Member>> {
    conn.query_row(
        "SELECT MemberID, Name, Email, Phone, JoinDate FROM Members WHERE MemberID = ?1",
        [id],
        member_from_row,
    )
    .optional()
    .context("failed to look up member")
}

/// Insert a member. A taken email comes back as
/// [`CatalogError::DuplicateEmail`] rather than a bare constraint error.
pub fn create_member(conn: &Connection, member: &NewMember) -> Result<Member> {
    conn.execute(
        "INSERT INTO Members (Name, Email, Phone) VALUES (?1, ?2, ?3)",
        params![member.name, member.email, member.phone],
    )
    .map_err(|err| map_unique_constraint(err, &member.email))?;

    let id = conn.last_insert_rowid();
    let join_date: String = conn
        .query_row(
            "SELECT JoinDate FROM Members WHERE MemberID = ?1",
            [id],
            |row| row.get(0),
        )
        .context("failed to read member join date")?;

    info!(id, name = %member.name, "member added");
    Ok(Member {
        id,
        name: member.name.clone(),
        email: member.email.clone(),
        phone: Some(member.phone.clone()),
        join_date,
    })
}

/// Email is the only UNIQUE column on `Members`, so a UNIQUE violation is
/// reported as a duplicate email. Other failures keep their SQLite cause.
fn map_unique_constraint(err: SqlError, email: &str) -> anyhow::Error {
    let is_unique = matches!(
        &err,
        SqlError::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    );
    if is_unique {
        CatalogError::DuplicateEmail(email.to_string()).into()
    } else {
        anyhow::Error::new(err).context("failed to insert member")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    fn carol() -> NewMember {
        NewMember {
            name: "Carol White".into(),
            email: "carol@example.com".into(),
            phone: "5550100".into(),
        }
    }

    #[test]
    fn create_member_fills_join_date() {
        let conn = setup();
        let member = create_member(&conn, &carol()).unwrap();
        assert!(!member.join_date.is_empty());
        assert_eq!(fetch_members(&conn).unwrap(), vec![member]);
    }

    #[test]
    fn duplicate_email_surfaces_as_catalog_error() {
        let conn = setup();
        create_member(&conn, &carol()).unwrap();

        let err = create_member(&conn, &carol()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CatalogError>(),
            Some(&CatalogError::DuplicateEmail("carol@example.com".into()))
        );
        assert_eq!(fetch_members(&conn).unwrap().len(), 1);
    }
}

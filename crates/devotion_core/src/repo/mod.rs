//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Keep SQL and timestamp conversion out of service/view code.
//!
//! # Invariants
//! - Lookups that find nothing return `Ok(None)`, never an error.
//! - Mutations on a missing id return `RepoError::NotFound`.
//! - No repository call retries on failure.

pub mod devotion_repo;
pub mod error;
pub mod profile_repo;

pub(crate) fn table_exists(conn: &rusqlite::Connection, table: &str) -> error::RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

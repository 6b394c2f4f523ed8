//! Schema history of the devotion store.
//!
//! Each step is one numbered SQL script. The last applied step is kept in
//! `PRAGMA user_version`, so reopening a database only runs newer steps and
//! all pending steps commit together.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    /// Tables this step introduces.
    tables: &'static [&'static str],
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "devotions",
        tables: &["devotions"],
        sql: include_str!("0001_devotions.sql"),
    },
    SchemaStep {
        version: 2,
        name: "user_profiles",
        tables: &["users"],
        sql: include_str!("0002_user_profiles.sql"),
    },
];

/// Newest schema version this build can open.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Every table a fully migrated store contains.
pub fn expected_tables() -> impl Iterator<Item = &'static str> {
    SCHEMA_STEPS.iter().flat_map(|step| step.tables.iter().copied())
}

/// Brings `conn` up to `latest_version`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={from_version} to_version={latest} steps={}",
        pending.len()
    );
    Ok(())
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

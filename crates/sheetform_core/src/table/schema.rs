//! Workbook file layout and connection bootstrap.
//!
//! # Invariants
//! - The layout version is tracked via `PRAGMA user_version`.
//! - A workbook written by a newer layout is refused, never rewritten.
//! - Returned connections have `foreign_keys=ON` and the layout applied.

use super::{TableError, TableResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Layout version this build reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("workbook_schema.sql");

/// Opens a workbook file, creating it when absent.
pub(crate) fn open_workbook(path: &Path) -> TableResult<Connection> {
    let started_at = Instant::now();
    let result = Connection::open(path)
        .map_err(TableError::from)
        .and_then(|conn| prepare(&conn).map(|()| conn));

    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!(
            "event=workbook_open module=table status=ok path={} duration_ms={duration_ms}",
            path.display()
        ),
        Err(err) => error!(
            "event=workbook_open module=table status=error path={} duration_ms={duration_ms} error={err}",
            path.display()
        ),
    }
    result
}

fn prepare(conn: &Connection) -> TableResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;

    let version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if version > SCHEMA_VERSION {
        return Err(TableError::Access(format!(
            "workbook layout version {version} is newer than supported {SCHEMA_VERSION}"
        )));
    }
    if version == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{open_workbook, SCHEMA_VERSION};
    use crate::table::TableError;
    use rusqlite::Connection;

    fn layout_version(conn: &Connection) -> u32 {
        conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn new_file_gets_current_layout() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_workbook(&dir.path().join("fresh.sqlite3")).unwrap();

        assert_eq!(layout_version(&conn), SCHEMA_VERSION);
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        for name in ["service_accounts", "sheet_rows", "sheets"] {
            assert!(tables.iter().any(|table| table == name), "missing {name}");
        }
    }

    #[test]
    fn newer_layout_is_refused_without_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.sqlite3");
        Connection::open(&path)
            .unwrap()
            .execute_batch("PRAGMA user_version = 7;")
            .unwrap();

        let err = open_workbook(&path).unwrap_err();
        assert!(matches!(err, TableError::Access(ref message) if message.contains("version 7")));
        assert_eq!(layout_version(&Connection::open(&path).unwrap()), 7);
    }
}

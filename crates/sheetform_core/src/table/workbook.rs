//! SQLite-backed workbook implementing the remote table contract.
//!
//! # Responsibility
//! - Gate every session on the service-account credential file.
//! - Store titled sheets as ordered rows of JSON string cells.
//!
//! # Invariants
//! - A session exists only for a credential granted in the workbook.
//! - Row numbers stay contiguous from 1 after every delete.
//! - Key search only inspects the `ID` column of data rows.

use super::credentials::{ServiceAccountCredentials, CREDENTIAL_FILE_NAME};
use super::schema::open_workbook;
use super::{
    records_from_rows, RowHandle, TableClient, TableError, TableHandle, TableResult, TableSession,
};
use crate::model::record::{Record, HEADER};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Default workbook file name used by the shells.
pub const WORKBOOK_FILE_NAME: &str = "sheet.sqlite3";

/// Client that authorizes sessions against a workbook file.
#[derive(Debug, Clone)]
pub struct WorkbookClient {
    workbook_path: PathBuf,
    credential_path: PathBuf,
}

impl WorkbookClient {
    /// Creates a client reading credentials from the fixed `sheet.json`.
    pub fn new(workbook_path: impl Into<PathBuf>) -> Self {
        Self::with_credential_path(workbook_path, CREDENTIAL_FILE_NAME)
    }

    pub fn with_credential_path(
        workbook_path: impl Into<PathBuf>,
        credential_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            workbook_path: workbook_path.into(),
            credential_path: credential_path.into(),
        }
    }

    pub fn workbook_path(&self) -> &Path {
        &self.workbook_path
    }

    /// Grants the current credential and creates `title` with a header row
    /// when it does not exist yet.
    ///
    /// Idempotent. Returns whether the table was created.
    pub fn provision(&self, title: &str) -> TableResult<bool> {
        let credentials = ServiceAccountCredentials::from_json_file(&self.credential_path)?;
        let conn = open_workbook(&self.workbook_path)?;
        conn.execute(
            "INSERT OR IGNORE INTO service_accounts (client_email, private_key_id)
             VALUES (?1, ?2);",
            params![credentials.client_email, credentials.private_key_id],
        )?;

        let existing = find_sheet_id(&conn, title)?;
        if existing.is_some() {
            return Ok(false);
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute("INSERT INTO sheets (title) VALUES (?1);", [title])?;
        let sheet_id = tx.last_insert_rowid();
        insert_row(&tx, sheet_id, 1, &header_cells())?;
        tx.commit()?;

        info!(
            "event=workbook_provision module=table status=ok title={title:?} client_email={}",
            credentials.client_email
        );
        Ok(true)
    }
}

impl TableClient for WorkbookClient {
    type Session = WorkbookSession;

    fn authorize(&self) -> TableResult<WorkbookSession> {
        let credentials = ServiceAccountCredentials::from_json_file(&self.credential_path)?;
        let conn = open_workbook(&self.workbook_path)?;

        let granted: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM service_accounts
                WHERE client_email = ?1 AND private_key_id = ?2
            );",
            params![credentials.client_email, credentials.private_key_id],
            |row| row.get(0),
        )?;
        if !granted {
            return Err(TableError::Auth(format!(
                "service account `{}` has no access to this workbook",
                credentials.client_email
            )));
        }

        let session_id = Uuid::new_v4();
        debug!(
            "event=table_authorize module=table status=ok session_id={session_id} client_email={}",
            credentials.client_email
        );
        Ok(WorkbookSession { conn, session_id })
    }
}

/// One authorized workbook connection.
pub struct WorkbookSession {
    conn: Connection,
    session_id: Uuid,
}

impl WorkbookSession {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn load_rows(&self, table: &TableHandle) -> TableResult<Vec<(usize, Vec<String>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT row_number, cells FROM sheet_rows
             WHERE sheet_id = ?1
             ORDER BY row_number ASC;",
        )?;
        let mut rows = stmt.query([table.key])?;
        let mut loaded = Vec::new();
        while let Some(row) = rows.next()? {
            let row_number: i64 = row.get(0)?;
            let raw: String = row.get(1)?;
            let cells: Vec<String> = serde_json::from_str(&raw).map_err(|err| {
                TableError::Access(format!(
                    "row {row_number} of `{}` has malformed cells: {err}",
                    table.title
                ))
            })?;
            let row_number = usize::try_from(row_number).map_err(|_| {
                TableError::Access(format!("invalid row number {row_number} in `{}`", table.title))
            })?;
            loaded.push((row_number, cells));
        }
        Ok(loaded)
    }
}

impl TableSession for WorkbookSession {
    fn open_table_by_title(&self, title: &str) -> TableResult<TableHandle> {
        match find_sheet_id(&self.conn, title)? {
            Some(key) => Ok(TableHandle {
                key,
                title: title.to_string(),
            }),
            None => Err(TableError::NotFound(format!("table `{title}`"))),
        }
    }

    fn read_all_rows(&self, table: &TableHandle) -> TableResult<Vec<Record>> {
        let rows = self
            .load_rows(table)?
            .into_iter()
            .map(|(_, cells)| cells)
            .collect::<Vec<_>>();
        records_from_rows(&rows)
    }

    fn append_row(&self, table: &TableHandle, record: &Record) -> TableResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let last: i64 = tx.query_row(
            "SELECT COALESCE(MAX(row_number), 0) FROM sheet_rows WHERE sheet_id = ?1;",
            [table.key],
            |row| row.get(0),
        )?;
        let mut next = last + 1;
        if last == 0 {
            // An empty sheet has no header to key records by.
            insert_row(&tx, table.key, next, &header_cells())?;
            next += 1;
        }
        insert_row(&tx, table.key, next, &record.to_cells())?;
        tx.commit()?;
        Ok(())
    }

    fn find_row_by_key(&self, table: &TableHandle, key: &str) -> TableResult<RowHandle> {
        let rows = self.load_rows(table)?;
        let Some(((_, header), data)) = rows.split_first() else {
            return Err(TableError::NotFound(format!("no row with key `{key}`")));
        };
        let id_col = header
            .iter()
            .position(|cell| cell == HEADER[0])
            .ok_or_else(|| TableError::Access("header row is missing column `ID`".to_string()))?;

        data.iter()
            .find(|(_, cells)| cells.get(id_col).is_some_and(|cell| cell == key))
            .map(|(row, _)| RowHandle { row: *row })
            .ok_or_else(|| TableError::NotFound(format!("no row with key `{key}`")))
    }

    fn delete_row(&self, table: &TableHandle, row: RowHandle) -> TableResult<()> {
        if row.row <= 1 {
            return Err(TableError::Access(format!(
                "row {} is not a data row",
                row.row
            )));
        }
        let row_number = i64::try_from(row.row)
            .map_err(|_| TableError::Access(format!("row {} is out of range", row.row)))?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "DELETE FROM sheet_rows WHERE sheet_id = ?1 AND row_number = ?2;",
            params![table.key, row_number],
        )?;
        if changed == 0 {
            return Err(TableError::NotFound(format!(
                "row {} of `{}`",
                row.row, table.title
            )));
        }
        // Shift through negative numbers so the primary key never collides
        // mid-update.
        tx.execute(
            "UPDATE sheet_rows SET row_number = -(row_number - 1)
             WHERE sheet_id = ?1 AND row_number > ?2;",
            params![table.key, row_number],
        )?;
        tx.execute(
            "UPDATE sheet_rows SET row_number = -row_number
             WHERE sheet_id = ?1 AND row_number < 0;",
            [table.key],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list_table_titles(&self) -> TableResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title FROM sheets ORDER BY id ASC;")?;
        let titles = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(titles)
    }
}

fn find_sheet_id(conn: &Connection, title: &str) -> TableResult<Option<i64>> {
    let id = conn
        .query_row("SELECT id FROM sheets WHERE title = ?1;", [title], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(id)
}

fn insert_row(
    conn: &Connection,
    sheet_id: i64,
    row_number: i64,
    cells: &[String],
) -> TableResult<()> {
    let encoded = serde_json::to_string(cells)
        .map_err(|err| TableError::Access(format!("cannot encode row cells: {err}")))?;
    conn.execute(
        "INSERT INTO sheet_rows (sheet_id, row_number, cells) VALUES (?1, ?2, ?3);",
        params![sheet_id, row_number, encoded],
    )?;
    Ok(())
}

fn header_cells() -> Vec<String> {
    HEADER.iter().map(|cell| cell.to_string()).collect()
}

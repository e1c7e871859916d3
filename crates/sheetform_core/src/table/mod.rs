//! Remote table client contract and implementations.
//!
//! # Responsibility
//! - Define the authorize/open/read/append/find/delete surface the record
//!   service consumes.
//! - Keep store transport details out of workflow orchestration.
//!
//! # Invariants
//! - Every session is produced by a fresh `TableClient::authorize` call.
//! - Row 1 of every table is the header row; handles only address data rows.
//! - Errors are classified as `Auth`, `NotFound`, or `Access`.

use crate::model::record::Record;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod credentials;
pub mod memory;
pub mod schema;
pub mod workbook;

pub type TableResult<T> = Result<T, TableError>;

/// Store failure taxonomy.
#[derive(Debug)]
pub enum TableError {
    /// Credential or authorization failure.
    Auth(String),
    /// Named table missing, or no row matches a key.
    NotFound(String),
    /// Any other failure talking to the store.
    Access(String),
}

impl TableError {
    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth_failed",
            Self::NotFound(_) => "not_found",
            Self::Access(_) => "access_failed",
        }
    }
}

impl Display for TableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(message) => write!(f, "authorization failed: {message}"),
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::Access(message) => write!(f, "table access failed: {message}"),
        }
    }
}

impl Error for TableError {}

impl From<rusqlite::Error> for TableError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Access(value.to_string())
    }
}

/// Opened table reference, valid for the session that opened it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    pub(crate) key: i64,
    pub title: String,
}

/// Located row reference. `row` is 1-based and counts the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowHandle {
    pub row: usize,
}

/// Entry point of the remote table service.
pub trait TableClient {
    type Session: TableSession;

    /// Authorizes a new session. Called once per workflow.
    fn authorize(&self) -> TableResult<Self::Session>;
}

/// Operations available on an authorized session.
pub trait TableSession {
    fn open_table_by_title(&self, title: &str) -> TableResult<TableHandle>;
    fn read_all_rows(&self, table: &TableHandle) -> TableResult<Vec<Record>>;
    fn append_row(&self, table: &TableHandle, record: &Record) -> TableResult<()>;
    fn find_row_by_key(&self, table: &TableHandle, key: &str) -> TableResult<RowHandle>;
    fn delete_row(&self, table: &TableHandle, row: RowHandle) -> TableResult<()>;
    fn list_table_titles(&self) -> TableResult<Vec<String>>;
}

/// Maps header-keyed cell rows to records, the way the sheet's first row
/// names its columns.
///
/// Missing cells read as empty text; unknown headers are ignored.
pub(crate) fn records_from_rows(rows: &[Vec<String>]) -> TableResult<Vec<Record>> {
    let Some((header, data)) = rows.split_first() else {
        return Ok(Vec::new());
    };

    let column = |name: &str| -> TableResult<usize> {
        header
            .iter()
            .position(|cell| cell == name)
            .ok_or_else(|| TableError::Access(format!("header row is missing column `{name}`")))
    };
    let id_col = column("ID")?;
    let name_col = column("Name")?;
    let age_col = column("Age")?;

    let cell = |row: &Vec<String>, index: usize| row.get(index).cloned().unwrap_or_default();
    Ok(data
        .iter()
        .map(|row| Record::new(cell(row, id_col), cell(row, name_col), cell(row, age_col)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{records_from_rows, TableError};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn empty_sheet_has_no_records() {
        assert!(records_from_rows(&[]).unwrap().is_empty());
        assert!(records_from_rows(&[row(&["ID", "Name", "Age"])])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn records_follow_header_order_not_column_order() {
        let rows = vec![
            row(&["Age", "ID", "Name"]),
            row(&["30", "7", "Ann"]),
            row(&["", "8"]),
        ];
        let records = records_from_rows(&rows).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "7");
        assert_eq!(records[0].name, "Ann");
        assert_eq!(records[0].age, "30");
        assert_eq!(records[1].id, "8");
        assert_eq!(records[1].name, "");
    }

    #[test]
    fn missing_header_column_is_access_error() {
        let err = records_from_rows(&[row(&["ID", "Name"])]).unwrap_err();
        assert!(matches!(err, TableError::Access(message) if message.contains("Age")));
    }
}

//! In-process table client for tests and demos.
//!
//! Sessions share one set of tables through `Rc<RefCell<_>>`; the client is
//! single-threaded like the form shells. Failures can be injected per
//! operation kind to exercise error paths.

use super::{
    records_from_rows, RowHandle, TableClient, TableError, TableHandle, TableResult, TableSession,
};
use crate::model::record::{Record, HEADER};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Operation kinds that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MemoryOp {
    Authorize,
    Open,
    Read,
    Append,
    Find,
    Delete,
    ListTables,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: Vec<(String, Vec<Vec<String>>)>,
    failing: BTreeSet<MemoryOp>,
    calls: usize,
}

/// Cloneable handle to a shared in-memory workbook.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableClient {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryTableClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client holding one table with a header and `records`.
    pub fn with_table(title: &str, records: &[Record]) -> Self {
        let client = Self::new();
        client.create_table(title);
        for record in records {
            client.push_row(title, record.to_cells());
        }
        client
    }

    pub fn create_table(&self, title: &str) {
        let header = HEADER.iter().map(|cell| cell.to_string()).collect();
        self.state
            .borrow_mut()
            .tables
            .push((title.to_string(), vec![header]));
    }

    /// Appends raw cells without going through a session.
    pub fn push_row(&self, title: &str, cells: Vec<String>) {
        let mut state = self.state.borrow_mut();
        if let Some((_, rows)) = state.tables.iter_mut().find(|(name, _)| name == title) {
            rows.push(cells);
        }
    }

    /// Makes every later call of `op` fail with the matching error kind.
    pub fn fail_on(&self, op: MemoryOp) {
        self.state.borrow_mut().failing.insert(op);
    }

    pub fn recover(&self, op: MemoryOp) {
        self.state.borrow_mut().failing.remove(&op);
    }

    /// Number of client/session calls made so far.
    pub fn calls(&self) -> usize {
        self.state.borrow().calls
    }

    /// Data rows of `title`, header excluded.
    pub fn records(&self, title: &str) -> Vec<Record> {
        let state = self.state.borrow();
        state
            .tables
            .iter()
            .find(|(name, _)| name == title)
            .and_then(|(_, rows)| records_from_rows(rows).ok())
            .unwrap_or_default()
    }
}

impl TableClient for MemoryTableClient {
    type Session = MemorySession;

    fn authorize(&self) -> TableResult<MemorySession> {
        enter(&self.state, MemoryOp::Authorize)?;
        Ok(MemorySession {
            state: Rc::clone(&self.state),
        })
    }
}

/// Session over the shared in-memory tables.
#[derive(Debug)]
pub struct MemorySession {
    state: Rc<RefCell<MemoryState>>,
}

impl MemorySession {
    fn with_rows<T>(
        &self,
        table: &TableHandle,
        f: impl FnOnce(&mut Vec<Vec<String>>) -> TableResult<T>,
    ) -> TableResult<T> {
        let mut state = self.state.borrow_mut();
        let index = usize::try_from(table.key)
            .map_err(|_| TableError::Access(format!("stale table handle `{}`", table.title)))?;
        let result = match state.tables.get_mut(index) {
            Some((title, rows)) if *title == table.title => f(rows),
            _ => Err(TableError::Access(format!(
                "stale table handle `{}`",
                table.title
            ))),
        };
        result
    }
}

impl TableSession for MemorySession {
    fn open_table_by_title(&self, title: &str) -> TableResult<TableHandle> {
        enter(&self.state, MemoryOp::Open)?;
        let state = self.state.borrow();
        state
            .tables
            .iter()
            .position(|(name, _)| name == title)
            .map(|index| TableHandle {
                key: index as i64,
                title: title.to_string(),
            })
            .ok_or_else(|| TableError::NotFound(format!("table `{title}`")))
    }

    fn read_all_rows(&self, table: &TableHandle) -> TableResult<Vec<Record>> {
        enter(&self.state, MemoryOp::Read)?;
        self.with_rows(table, |rows| records_from_rows(rows))
    }

    fn append_row(&self, table: &TableHandle, record: &Record) -> TableResult<()> {
        enter(&self.state, MemoryOp::Append)?;
        self.with_rows(table, |rows| {
            rows.push(record.to_cells());
            Ok(())
        })
    }

    fn find_row_by_key(&self, table: &TableHandle, key: &str) -> TableResult<RowHandle> {
        enter(&self.state, MemoryOp::Find)?;
        self.with_rows(table, |rows| {
            let Some(header) = rows.first() else {
                return Err(TableError::NotFound(format!("no row with key `{key}`")));
            };
            let column = header
                .iter()
                .position(|cell| cell == HEADER[0])
                .ok_or_else(|| {
                    TableError::Access("header row is missing column `ID`".to_string())
                })?;
            rows.iter()
                .enumerate()
                .skip(1)
                .find(|(_, cells)| cells.get(column).is_some_and(|cell| cell == key))
                .map(|(index, _)| RowHandle { row: index + 1 })
                .ok_or_else(|| TableError::NotFound(format!("no row with key `{key}`")))
        })
    }

    fn delete_row(&self, table: &TableHandle, row: RowHandle) -> TableResult<()> {
        enter(&self.state, MemoryOp::Delete)?;
        self.with_rows(table, |rows| {
            if row.row <= 1 || row.row > rows.len() {
                return Err(TableError::Access(format!("row {} is not a data row", row.row)));
            }
            rows.remove(row.row - 1);
            Ok(())
        })
    }

    fn list_table_titles(&self) -> TableResult<Vec<String>> {
        enter(&self.state, MemoryOp::ListTables)?;
        Ok(self
            .state
            .borrow()
            .tables
            .iter()
            .map(|(title, _)| title.clone())
            .collect())
    }
}

fn enter(state: &RefCell<MemoryState>, op: MemoryOp) -> TableResult<()> {
    let mut state = state.borrow_mut();
    state.calls += 1;
    if !state.failing.contains(&op) {
        return Ok(());
    }
    Err(match op {
        MemoryOp::Authorize => TableError::Auth("injected authorization failure".to_string()),
        other => TableError::Access(format!("injected {other:?} failure")),
    })
}

//! Record use-case service.
//!
//! # Responsibility
//! - Run the list/append/load/delete workflows against a `TableClient`.
//! - Return every failure as a `ServiceError` value, logged once.
//!
//! # Invariants
//! - Each workflow authorizes a fresh session before touching the table.
//! - Input preconditions are checked before any client call.
//! - Workflows never mutate form state; callers apply returned values.
//!
//! The duplicate-ID check in `append_record` reads the table and then
//! appends in a separate call. A concurrent writer can append the same ID in
//! between; the store has no uniqueness constraint to catch it.

use crate::model::record::{FieldValidationError, Record};
use crate::table::{TableClient, TableError, TableHandle, TableSession};
use log::{debug, info, log, Level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Fixed title of the backing table.
pub const DEFAULT_TABLE_TITLE: &str = "MY SHEET";

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Workflow step a table failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStep {
    Authorize,
    Open,
    Read,
    Append,
    Find,
    Delete,
    ListTables,
}

impl TableStep {
    fn as_str(self) -> &'static str {
        match self {
            Self::Authorize => "authorize",
            Self::Open => "open",
            Self::Read => "read",
            Self::Append => "append",
            Self::Find => "find",
            Self::Delete => "delete",
            Self::ListTables => "list_tables",
        }
    }
}

/// Service error for record workflows.
#[derive(Debug)]
pub enum ServiceError {
    /// A required field is empty. Carries the user-facing prompt.
    MissingInput(&'static str),
    /// A field holds text its validator rejects.
    InvalidField(FieldValidationError),
    /// An existing record already uses this ID.
    DuplicateId(String),
    /// No record matches this ID.
    RecordNotFound(String),
    /// The table client failed during `step`.
    Table {
        step: TableStep,
        title: String,
        source: TableError,
    },
}

impl ServiceError {
    /// Whether the error was raised before any client call.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::MissingInput(_) | Self::InvalidField(_))
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "missing_input",
            Self::InvalidField(_) => "invalid_field",
            Self::DuplicateId(_) => "duplicate_id",
            Self::RecordNotFound(_) => "record_not_found",
            Self::Table { source, .. } => source.code(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInput(prompt) => f.write_str(prompt),
            Self::InvalidField(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "record id already exists: {id}"),
            Self::RecordNotFound(id) => write!(f, "record not found: {id}"),
            Self::Table {
                step,
                title,
                source,
            } => write!(f, "{} on table `{title}` failed: {source}", step.as_str()),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidField(err) => Some(err),
            Self::Table { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<FieldValidationError> for ServiceError {
    fn from(value: FieldValidationError) -> Self {
        Self::InvalidField(value)
    }
}

/// Use-case service over one backing table.
pub struct RecordService<C: TableClient> {
    client: C,
    table_title: String,
}

impl<C: TableClient> RecordService<C> {
    /// Creates a service bound to the fixed `MY SHEET` table.
    pub fn new(client: C) -> Self {
        Self::with_table_title(client, DEFAULT_TABLE_TITLE)
    }

    pub fn with_table_title(client: C, table_title: impl Into<String>) -> Self {
        Self {
            client,
            table_title: table_title.into(),
        }
    }

    pub fn table_title(&self) -> &str {
        &self.table_title
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Reads all data rows in table order.
    pub fn list_records(&self) -> ServiceResult<Vec<Record>> {
        self.observe("record_list", || {
            let (session, table) = self.open_table()?;
            self.read(&session, &table)
        })
    }

    /// Appends `[id, name, age]` when all fields are set and `id` is unused.
    ///
    /// # Errors
    /// - `MissingInput` / `InvalidField` before any client call.
    /// - `DuplicateId` when an existing record has the same `id` text.
    pub fn append_record(&self, id: &str, name: &str, age: &str) -> ServiceResult<Record> {
        self.observe("record_append", || {
            if id.is_empty() || name.is_empty() || age.is_empty() {
                return Err(ServiceError::MissingInput("Please enter ID, name, and age."));
            }
            let record = Record::new(id, name, age);
            record.validate()?;

            let (session, table) = self.open_table()?;
            let existing = self.read(&session, &table)?;
            if existing.iter().any(|stored| stored.id == record.id) {
                return Err(ServiceError::DuplicateId(record.id));
            }

            session
                .append_row(&table, &record)
                .map_err(|err| self.table_error(TableStep::Append, err))?;
            info!(
                "event=record_appended module=service id={} table={:?}",
                record.id, self.table_title
            );
            Ok(record)
        })
    }

    /// Returns the first record whose `id` equals `id`.
    pub fn load_record_by_id(&self, id: &str) -> ServiceResult<Record> {
        self.observe("record_load", || {
            if id.is_empty() {
                return Err(ServiceError::MissingInput("Please enter an ID."));
            }
            let (session, table) = self.open_table()?;
            self.read(&session, &table)?
                .into_iter()
                .find(|record| record.id == id)
                .ok_or_else(|| ServiceError::RecordNotFound(id.to_string()))
        })
    }

    /// Deletes the row whose key cell equals `id`.
    pub fn delete_record_by_id(&self, id: &str) -> ServiceResult<()> {
        self.observe("record_delete", || {
            if id.is_empty() {
                return Err(ServiceError::MissingInput("Please enter an ID."));
            }
            let (session, table) = self.open_table()?;
            let row = session
                .find_row_by_key(&table, id)
                .map_err(|err| self.table_error(TableStep::Find, err))?;
            session
                .delete_row(&table, row)
                .map_err(|err| self.table_error(TableStep::Delete, err))?;
            info!(
                "event=record_deleted module=service id={id} row={} table={:?}",
                row.row, self.table_title
            );
            Ok(())
        })
    }

    /// Lists the titles of all tables the credential can see.
    pub fn list_tables(&self) -> ServiceResult<Vec<String>> {
        self.observe("table_list", || {
            let session = self.authorize()?;
            session
                .list_table_titles()
                .map_err(|err| self.table_error(TableStep::ListTables, err))
        })
    }

    fn authorize(&self) -> ServiceResult<C::Session> {
        self.client
            .authorize()
            .map_err(|err| self.table_error(TableStep::Authorize, err))
    }

    fn open_table(&self) -> ServiceResult<(C::Session, TableHandle)> {
        let session = self.authorize()?;
        let table = session
            .open_table_by_title(&self.table_title)
            .map_err(|err| self.table_error(TableStep::Open, err))?;
        Ok((session, table))
    }

    fn read(&self, session: &C::Session, table: &TableHandle) -> ServiceResult<Vec<Record>> {
        let records = session
            .read_all_rows(table)
            .map_err(|err| self.table_error(TableStep::Read, err))?;
        debug!(
            "event=records_read module=service count={} table={:?}",
            records.len(),
            self.table_title
        );
        Ok(records)
    }

    fn table_error(&self, step: TableStep, source: TableError) -> ServiceError {
        ServiceError::Table {
            step,
            title: self.table_title.clone(),
            source,
        }
    }

    fn observe<T>(
        &self,
        event: &'static str,
        workflow: impl FnOnce() -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let started_at = Instant::now();
        let result = workflow();
        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
            Err(err) => {
                let level = failure_level(err);
                let status = if level == Level::Warn { "rejected" } else { "error" };
                log!(
                    level,
                    "event={event} module=service status={status} duration_ms={duration_ms} error_code={} error={err}",
                    err.code()
                );
            }
        }
        result
    }
}

/// Missing or malformed input and duplicate ids are user mistakes and log at
/// `warn`; anything else, including an id with no stored record, fails the
/// workflow and logs at `error`.
fn failure_level(err: &ServiceError) -> Level {
    match err {
        ServiceError::MissingInput(_)
        | ServiceError::InvalidField(_)
        | ServiceError::DuplicateId(_) => Level::Warn,
        ServiceError::RecordNotFound(_) | ServiceError::Table { .. } => Level::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::{failure_level, RecordService, ServiceError, TableStep, DEFAULT_TABLE_TITLE};
    use crate::model::record::{Record, RecordField};
    use crate::table::memory::{MemoryOp, MemoryTableClient};
    use crate::table::TableError;
    use log::Level;

    fn service_with(records: &[Record]) -> RecordService<MemoryTableClient> {
        RecordService::new(MemoryTableClient::with_table(DEFAULT_TABLE_TITLE, records))
    }

    #[test]
    fn append_with_empty_field_makes_no_client_call() {
        let service = service_with(&[]);
        for (id, name, age) in [("", "Ann", "30"), ("7", "", "30"), ("7", "Ann", "")] {
            let err = service.append_record(id, name, age).unwrap_err();
            assert!(matches!(err, ServiceError::MissingInput(_)));
        }
        assert_eq!(service.client().calls(), 0);
    }

    #[test]
    fn append_rejects_invalid_field_before_client_call() {
        let service = service_with(&[]);
        let err = service.append_record("7", "Ann", "300").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidField(ref field) if field.field == RecordField::Age
        ));
        assert_eq!(service.client().calls(), 0);
    }

    #[test]
    fn load_and_delete_require_id() {
        let service = service_with(&[]);
        assert!(service.load_record_by_id("").unwrap_err().is_input());
        assert!(service.delete_record_by_id("").unwrap_err().is_input());
        assert_eq!(service.client().calls(), 0);
    }

    #[test]
    fn missing_table_fails_on_open_step() {
        let service = RecordService::new(MemoryTableClient::with_table("OTHER", &[]));
        let err = service.list_records().unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Table {
                step: TableStep::Open,
                source: TableError::NotFound(_),
                ..
            }
        ));
    }

    #[test]
    fn duplicate_check_compares_id_text_exactly() {
        let service = service_with(&[Record::new("7", "Ann", "30")]);
        service.append_record("07", "Bob", "41").unwrap();
        let err = service.append_record("7", "Cid", "22").unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateId(ref id) if id == "7"));
    }

    #[test]
    fn append_failure_reports_append_step() {
        let service = service_with(&[]);
        service.client().fail_on(MemoryOp::Append);
        let err = service.append_record("1", "Ann", "30").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Table {
                step: TableStep::Append,
                ..
            }
        ));
        assert!(service.client().records(DEFAULT_TABLE_TITLE).is_empty());
    }

    #[test]
    fn list_tables_returns_titles_in_creation_order() {
        let client = MemoryTableClient::with_table(DEFAULT_TABLE_TITLE, &[]);
        client.create_table("Archive");
        let service = RecordService::new(client);
        assert_eq!(
            service.list_tables().unwrap(),
            vec![DEFAULT_TABLE_TITLE.to_string(), "Archive".to_string()]
        );
    }

    #[test]
    fn every_workflow_authorizes_again() {
        let service = service_with(&[Record::new("1", "Ann", "30")]);
        service.list_records().unwrap();
        service.client().fail_on(MemoryOp::Authorize);
        let err = service.load_record_by_id("1").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Table {
                step: TableStep::Authorize,
                source: TableError::Auth(_),
                ..
            }
        ));
        service.client().recover(MemoryOp::Authorize);
        assert_eq!(service.load_record_by_id("1").unwrap().name, "Ann");
    }

    #[test]
    fn missing_record_logs_as_error_and_user_mistakes_as_warn() {
        let service = service_with(&[Record::new("1", "Ann", "30")]);
        let missing = service.load_record_by_id("9").unwrap_err();
        assert_eq!(failure_level(&missing), Level::Error);
        let missing_delete = service.delete_record_by_id("9").unwrap_err();
        assert_eq!(failure_level(&missing_delete), Level::Error);

        let duplicate = service.append_record("1", "Bob", "41").unwrap_err();
        assert_eq!(failure_level(&duplicate), Level::Warn);
        let empty = service.load_record_by_id("").unwrap_err();
        assert_eq!(failure_level(&empty), Level::Warn);
    }
}

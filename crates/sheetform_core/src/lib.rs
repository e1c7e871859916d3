//! Core logic for the SheetForm record form.
//! Shells (CLI, FFI) own no business rules; they bind to `FormController`.

pub mod form;
pub mod logging;
pub mod model;
pub mod service;
pub mod table;

pub use form::{Dialog, DialogKind, FormAction, FormController, FormState};
pub use logging::{default_log_dir, default_log_level, init_logging, logging_status};
pub use model::record::{
    validate_age, validate_integer, validate_name, FieldValidationError, Record, RecordField,
};
pub use service::record_service::{
    RecordService, ServiceError, ServiceResult, TableStep, DEFAULT_TABLE_TITLE,
};
pub use table::credentials::{ServiceAccountCredentials, CREDENTIAL_FILE_NAME};
pub use table::memory::{MemoryOp, MemoryTableClient};
pub use table::schema::SCHEMA_VERSION;
pub use table::workbook::{WorkbookClient, WorkbookSession, WORKBOOK_FILE_NAME};
pub use table::{RowHandle, TableClient, TableError, TableHandle, TableResult, TableSession};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

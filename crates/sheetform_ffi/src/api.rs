//! FFI use-case API for the Flutter form window.
//!
//! # Responsibility
//! - Expose the five form buttons and field validation to Dart via FRB.
//! - Keep form state on the Dart side; every call receives the current
//!   field text and returns the updated fields.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Each call authorizes a fresh workbook session.
//! - A response carries at most one dialog.

use log::debug;
use sheetform_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, Dialog, DialogKind,
    FormAction, FormController, FormState, Record, RecordField, RecordService, TableClient,
    WorkbookClient, WORKBOOK_FILE_NAME,
};
use std::path::PathBuf;
use std::sync::OnceLock;

static WORKBOOK_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Current text of the three input fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub id: String,
    pub name: String,
    pub age: String,
}

/// One row of the results view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub id: String,
    pub name: String,
    pub age: String,
}

/// Modal dialog to show after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDialog {
    /// `info|warning|error`.
    pub kind: String,
    pub title: String,
    pub message: String,
}

/// Result envelope of one button action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormResponse {
    /// Field text after the action.
    pub fields: FormFields,
    /// Replacement results view; `None` leaves the view unchanged.
    pub rows: Option<Vec<RecordRow>>,
    pub dialog: Option<FormDialog>,
}

/// Table titles visible to the credential, or the failure dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablesResponse {
    pub titles: Vec<String>,
    pub dialog: Option<FormDialog>,
}

/// Per-keystroke check: whether `text` is acceptable content for `field`
/// (`id|name|age`). Unknown fields accept nothing.
#[flutter_rust_bridge::frb(sync)]
pub fn form_validate_field(field: String, text: String) -> bool {
    RecordField::parse(&field).is_some_and(|field| field.accepts(&text))
}

/// Add button.
#[flutter_rust_bridge::frb(sync)]
pub fn form_add(fields: FormFields) -> FormResponse {
    run_form(workbook_client(), fields, FormAction::Add)
}

/// Clear button. Never touches the workbook.
#[flutter_rust_bridge::frb(sync)]
pub fn form_clear(fields: FormFields) -> FormResponse {
    run_form(workbook_client(), fields, FormAction::Clear)
}

/// Read button.
#[flutter_rust_bridge::frb(sync)]
pub fn form_read(fields: FormFields) -> FormResponse {
    run_form(workbook_client(), fields, FormAction::Read)
}

/// Load button.
#[flutter_rust_bridge::frb(sync)]
pub fn form_load(fields: FormFields) -> FormResponse {
    run_form(workbook_client(), fields, FormAction::Load)
}

/// Delete button.
#[flutter_rust_bridge::frb(sync)]
pub fn form_delete(fields: FormFields) -> FormResponse {
    run_form(workbook_client(), fields, FormAction::Delete)
}

#[flutter_rust_bridge::frb(sync)]
pub fn form_list_tables() -> TablesResponse {
    let form = FormController::new(RecordService::new(workbook_client()));
    match form.tables() {
        Ok(titles) => TablesResponse {
            titles,
            dialog: None,
        },
        Err(dialog) => TablesResponse {
            titles: Vec::new(),
            dialog: Some(to_form_dialog(dialog)),
        },
    }
}

fn run_form<C: TableClient>(client: C, fields: FormFields, action: FormAction) -> FormResponse {
    let state = FormState {
        id: fields.id,
        name: fields.name,
        age: fields.age,
        results: Vec::new(),
    };
    let mut form = FormController::with_state(RecordService::new(client), state);
    let dialog = form.dispatch(action);
    debug!(
        "event=ffi_action module=ffi action={} dialog={}",
        action.label(),
        dialog.is_some()
    );

    let state = form.into_state();
    // Read replaces the view on success and failure; Clear empties it.
    let rows = matches!(action, FormAction::Read | FormAction::Clear)
        .then(|| state.results.into_iter().map(to_record_row).collect());
    FormResponse {
        fields: FormFields {
            id: state.id,
            name: state.name,
            age: state.age,
        },
        rows,
        dialog: dialog.map(to_form_dialog),
    }
}

fn workbook_client() -> WorkbookClient {
    WorkbookClient::new(resolve_workbook_path())
}

fn resolve_workbook_path() -> PathBuf {
    WORKBOOK_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("SHEETFORM_WORKBOOK_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            PathBuf::from(WORKBOOK_FILE_NAME)
        })
        .clone()
}

fn to_record_row(record: Record) -> RecordRow {
    RecordRow {
        id: record.id,
        name: record.name,
        age: record.age,
    }
}

fn to_form_dialog(dialog: Dialog) -> FormDialog {
    let kind = match dialog.kind {
        DialogKind::Info => "info",
        DialogKind::Warning => "warning",
        DialogKind::Error => "error",
    };
    FormDialog {
        kind: kind.to_string(),
        title: dialog.title,
        message: dialog.message,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, form_add, form_validate_field, init_logging, run_form, FormFields,
    };
    use sheetform_core::{FormAction, MemoryOp, MemoryTableClient, Record, DEFAULT_TABLE_TITLE};

    fn fields(id: &str, name: &str, age: &str) -> FormFields {
        FormFields {
            id: id.to_string(),
            name: name.to_string(),
            age: age.to_string(),
        }
    }

    fn seeded() -> MemoryTableClient {
        MemoryTableClient::with_table(DEFAULT_TABLE_TITLE, &[Record::new("1", "Ann", "30")])
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn validate_field_dispatches_by_name() {
        assert!(form_validate_field("ID".to_string(), "42".to_string()));
        assert!(!form_validate_field("age".to_string(), "123".to_string()));
        assert!(form_validate_field("name".to_string(), String::new()));
        assert!(!form_validate_field("email".to_string(), String::new()));
    }

    #[test]
    fn add_with_missing_field_warns_without_workbook() {
        let response = form_add(fields("7", "", "30"));
        let dialog = response.dialog.expect("missing input should warn");
        assert_eq!(dialog.kind, "warning");
        assert_eq!(dialog.title, "Input Error");
        assert_eq!(response.fields, fields("7", "", "30"));
        assert!(response.rows.is_none());
    }

    #[test]
    fn read_returns_rows_without_dialog() {
        let response = run_form(seeded(), FormFields::default(), FormAction::Read);
        assert!(response.dialog.is_none());
        let rows = response.rows.expect("read should replace rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ann");
    }

    #[test]
    fn read_failure_empties_rows_and_reports_error() {
        let client = seeded();
        client.fail_on(MemoryOp::Read);
        let response = run_form(client, fields("1", "Ann", "30"), FormAction::Read);
        assert_eq!(response.rows, Some(Vec::new()));
        let dialog = response.dialog.expect("read failure should report");
        assert_eq!(dialog.kind, "error");
        assert_eq!(dialog.message, "An error occurred while retrieving data.");
        assert_eq!(response.fields, fields("1", "Ann", "30"));
    }

    #[test]
    fn load_fills_name_and_age() {
        let response = run_form(seeded(), fields("1", "", ""), FormAction::Load);
        assert!(response.dialog.is_none());
        assert_eq!(response.fields, fields("1", "Ann", "30"));
        assert!(response.rows.is_none());
    }

    #[test]
    fn delete_then_clear() {
        let client = seeded();
        let response = run_form(client.clone(), fields("1", "Ann", "30"), FormAction::Delete);
        assert_eq!(response.fields, fields("1", "", ""));
        assert!(client.records(DEFAULT_TABLE_TITLE).is_empty());

        let cleared = run_form(client, response.fields, FormAction::Clear);
        assert_eq!(cleared.fields, FormFields::default());
        assert_eq!(cleared.rows, Some(Vec::new()));
        assert_eq!(
            cleared.dialog.map(|dialog| dialog.message).as_deref(),
            Some("All data cleared.")
        );
    }
}

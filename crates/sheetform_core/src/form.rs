//! Form view state and the action dispatcher shells bind to.
//!
//! # Responsibility
//! - Hold the three input fields and the results view as explicit state.
//! - Gate field edits through the record validators.
//! - Turn workflow results into state changes and at most one dialog.
//!
//! # Invariants
//! - A failed workflow leaves all field text untouched.
//! - Only Load and Delete successes rewrite field text.
//! - `Clear` never calls the table client.

use crate::model::record::{Record, RecordField};
use crate::service::record_service::{RecordService, ServiceError, TableStep};
use crate::table::{TableClient, TableError};
use log::warn;

/// Editable view state of the form window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub id: String,
    pub name: String,
    pub age: String,
    /// Rows shown in the results view.
    pub results: Vec<Record>,
}

impl FormState {
    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::Id => &self.id,
            RecordField::Name => &self.name,
            RecordField::Age => &self.age,
        }
    }

    fn field_mut(&mut self, field: RecordField) -> &mut String {
        match field {
            RecordField::Id => &mut self.id,
            RecordField::Name => &mut self.name,
            RecordField::Age => &mut self.age,
        }
    }
}

/// Button actions of the form window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Add,
    Clear,
    Read,
    Load,
    Delete,
}

impl FormAction {
    pub const ALL: [FormAction; 5] = [
        FormAction::Add,
        FormAction::Clear,
        FormAction::Read,
        FormAction::Load,
        FormAction::Delete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Clear => "Clear",
            Self::Read => "Read",
            Self::Load => "Load",
            Self::Delete => "Delete",
        }
    }
}

/// Severity of a modal dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Warning,
    Error,
}

/// Modal message shown after a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
}

impl Dialog {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DialogKind::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DialogKind::Warning, title, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DialogKind::Error, "Error", message)
    }

    fn new(kind: DialogKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Builds the one dialog shown for a failed workflow.
    pub fn from_error(err: &ServiceError) -> Self {
        match err {
            ServiceError::MissingInput(prompt) => Self::warning("Input Error", *prompt),
            ServiceError::InvalidField(err) => Self::warning(
                "Input Error",
                format!("Please enter a valid {}.", err.field.label().to_ascii_lowercase()),
            ),
            ServiceError::DuplicateId(_) => {
                Self::warning("Input Error", "ID already exists. Please enter a unique ID.")
            }
            ServiceError::RecordNotFound(_) => {
                Self::info("Not Found", "No record found with the entered ID.")
            }
            ServiceError::Table { step, title, source } => match (step, source) {
                (_, TableError::Auth(_)) => {
                    Self::error("An error occurred during authorization.")
                }
                (TableStep::Open, TableError::NotFound(_)) => {
                    Self::error(format!("Spreadsheet with title \"{title}\" not found."))
                }
                (TableStep::Read, _) => Self::error("An error occurred while retrieving data."),
                (TableStep::Append, _) => Self::error("An error occurred while appending row."),
                (TableStep::Find | TableStep::Delete, _) => {
                    Self::error("An error occurred while deleting row.")
                }
                (TableStep::ListTables, _) => {
                    Self::error("An error occurred while listing spreadsheets.")
                }
                (TableStep::Authorize | TableStep::Open, _) => {
                    Self::error("An error occurred while accessing the spreadsheet.")
                }
            },
        }
    }
}

/// Form window logic: owns the view state and the record service.
pub struct FormController<C: TableClient> {
    service: RecordService<C>,
    state: FormState,
}

impl<C: TableClient> FormController<C> {
    pub fn new(service: RecordService<C>) -> Self {
        Self::with_state(service, FormState::default())
    }

    pub fn with_state(service: RecordService<C>, state: FormState) -> Self {
        Self { service, state }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn into_state(self) -> FormState {
        self.state
    }

    pub fn service(&self) -> &RecordService<C> {
        &self.service
    }

    /// Replaces `field` with `proposed` if its validator accepts it.
    ///
    /// Returns whether the edit was applied.
    pub fn edit(&mut self, field: RecordField, proposed: &str) -> bool {
        if !field.accepts(proposed) {
            return false;
        }
        *self.state.field_mut(field) = proposed.to_string();
        true
    }

    /// Types `text` into `field` one character at a time, dropping each
    /// keystroke the validator rejects. Returns the number of dropped
    /// keystrokes.
    pub fn type_text(&mut self, field: RecordField, text: &str) -> usize {
        let mut rejected = 0;
        for ch in text.chars() {
            let mut proposed = self.state.field(field).to_string();
            proposed.push(ch);
            if !self.edit(field, &proposed) {
                rejected += 1;
            }
        }
        rejected
    }

    /// Runs one button action and returns the dialog to show, if any.
    pub fn dispatch(&mut self, action: FormAction) -> Option<Dialog> {
        match action {
            FormAction::Add => self.add(),
            FormAction::Clear => Some(self.clear_all()),
            FormAction::Read => self.read(),
            FormAction::Load => self.load(),
            FormAction::Delete => self.delete(),
        }
    }

    /// Lists table titles for the shell's diagnostics view.
    pub fn tables(&self) -> Result<Vec<String>, Dialog> {
        self.service
            .list_tables()
            .map_err(|err| Dialog::from_error(&err))
    }

    fn add(&mut self) -> Option<Dialog> {
        let FormState { id, name, age, .. } = &self.state;
        match self.service.append_record(id, name, age) {
            Ok(_) => Some(Dialog::info("Success", "Data appended successfully.")),
            Err(err) => Some(Dialog::from_error(&err)),
        }
    }

    fn clear_all(&mut self) -> Dialog {
        self.state = FormState::default();
        Dialog::info("Success", "All data cleared.")
    }

    fn read(&mut self) -> Option<Dialog> {
        match self.service.list_records() {
            Ok(records) => {
                self.state.results = records;
                None
            }
            Err(err) => {
                self.state.results.clear();
                Some(Dialog::from_error(&err))
            }
        }
    }

    fn load(&mut self) -> Option<Dialog> {
        match self.service.load_record_by_id(&self.state.id) {
            Ok(record) => {
                self.replace_with_stored(RecordField::Name, record.name);
                self.replace_with_stored(RecordField::Age, record.age);
                None
            }
            Err(err) => Some(Dialog::from_error(&err)),
        }
    }

    /// Empties `field`, then inserts `stored` only if the validator accepts
    /// it. Stored cells can hold text no keystroke sequence could produce.
    fn replace_with_stored(&mut self, field: RecordField, stored: String) {
        let slot = self.state.field_mut(field);
        slot.clear();
        if field.accepts(&stored) {
            *slot = stored;
        } else {
            warn!("event=form_load module=form status=rejected field={field} reason=invalid_cell");
        }
    }

    fn delete(&mut self) -> Option<Dialog> {
        match self.service.delete_record_by_id(&self.state.id) {
            Ok(()) => {
                self.state.name.clear();
                self.state.age.clear();
                Some(Dialog::info("Success", "Data deleted successfully."))
            }
            Err(err) => Some(Dialog::from_error(&err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Dialog, DialogKind, FormController, FormState};
    use crate::model::record::RecordField;
    use crate::service::record_service::{RecordService, ServiceError, TableStep};
    use crate::table::memory::MemoryTableClient;
    use crate::table::TableError;

    fn controller() -> FormController<MemoryTableClient> {
        FormController::new(RecordService::new(MemoryTableClient::new()))
    }

    #[test]
    fn edit_rejects_invalid_text_and_keeps_previous_value() {
        let mut form = controller();
        assert!(form.edit(RecordField::Age, "4"));
        assert!(form.edit(RecordField::Age, "42"));
        assert!(!form.edit(RecordField::Age, "421"));
        assert_eq!(form.state().age, "42");
    }

    #[test]
    fn type_text_drops_rejected_keystrokes() {
        let mut form = controller();
        assert_eq!(form.type_text(RecordField::Name, "An n3e"), 2);
        assert_eq!(form.state().name, "Anne");
        assert_eq!(form.type_text(RecordField::Age, "123"), 1);
        assert_eq!(form.state().age, "12");
        assert_eq!(form.type_text(RecordField::Id, "x9y"), 2);
        assert_eq!(form.state().id, "9");
    }

    #[test]
    fn open_not_found_dialog_names_table() {
        let err = ServiceError::Table {
            step: TableStep::Open,
            title: "MY SHEET".to_string(),
            source: TableError::NotFound("table".to_string()),
        };
        let dialog = Dialog::from_error(&err);
        assert_eq!(dialog.kind, DialogKind::Error);
        assert_eq!(dialog.message, "Spreadsheet with title \"MY SHEET\" not found.");
    }

    #[test]
    fn auth_failures_share_one_message_at_any_step() {
        for step in [TableStep::Authorize, TableStep::Read] {
            let err = ServiceError::Table {
                step,
                title: "MY SHEET".to_string(),
                source: TableError::Auth("expired".to_string()),
            };
            assert_eq!(
                Dialog::from_error(&err).message,
                "An error occurred during authorization."
            );
        }
    }

    #[test]
    fn with_state_round_trips_through_into_state() {
        let state = FormState {
            id: "3".to_string(),
            ..FormState::default()
        };
        let form = FormController::with_state(
            RecordService::new(MemoryTableClient::new()),
            state.clone(),
        );
        assert_eq!(form.into_state(), state);
    }
}

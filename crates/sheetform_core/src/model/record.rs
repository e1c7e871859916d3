//! Record domain model and field validators.
//!
//! # Responsibility
//! - Define the `(id, name, age)` record stored as one backing-table row.
//! - Provide the per-keystroke predicates that gate form field edits.
//!
//! # Invariants
//! - Validators are pure and accept the empty string.
//! - Record values are kept as text exactly as stored; no numeric coercion.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]*$").expect("valid name regex"));
static AGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{0,2}$").expect("valid age regex"));

/// Header cells of the backing table, in column order.
pub const HEADER: [&str; 3] = ["ID", "Name", "Age"];

/// One row of the backing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Lookup/delete key. Unique at append time only.
    pub id: String,
    pub name: String,
    pub age: String,
}

impl Record {
    pub fn new(id: impl Into<String>, name: impl Into<String>, age: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age: age.into(),
        }
    }

    /// Returns the row cells in header order.
    pub fn to_cells(&self) -> Vec<String> {
        vec![self.id.clone(), self.name.clone(), self.age.clone()]
    }

    /// Checks every field against its validator.
    ///
    /// Empty fields pass; completeness is a workflow precondition, not a
    /// field rule.
    pub fn validate(&self) -> Result<(), FieldValidationError> {
        for field in RecordField::ALL {
            let value = field.value_of(self);
            if !field.accepts(value) {
                return Err(FieldValidationError {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Editable form field, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Id,
    Name,
    Age,
}

impl RecordField {
    pub const ALL: [RecordField; 3] = [RecordField::Id, RecordField::Name, RecordField::Age];

    /// Display label, matching the table header.
    pub fn label(self) -> &'static str {
        match self {
            Self::Id => HEADER[0],
            Self::Name => HEADER[1],
            Self::Age => HEADER[2],
        }
    }

    /// Parses a field name case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "age" => Some(Self::Age),
            _ => None,
        }
    }

    /// Returns whether `text` is an acceptable full content for this field.
    pub fn accepts(self, text: &str) -> bool {
        match self {
            Self::Id => validate_integer(text),
            Self::Name => validate_name(text),
            Self::Age => validate_age(text),
        }
    }

    fn value_of(self, record: &Record) -> &str {
        match self {
            Self::Id => record.id.as_str(),
            Self::Name => record.name.as_str(),
            Self::Age => record.age.as_str(),
        }
    }
}

impl Display for RecordField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A record field holds text its validator rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValidationError {
    pub field: RecordField,
    pub value: String,
}

impl Display for FieldValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} value `{}`", self.field, self.value)
    }
}

impl Error for FieldValidationError {}

/// ID field rule: empty, or ASCII digits only.
pub fn validate_integer(text: &str) -> bool {
    text.bytes().all(|byte| byte.is_ascii_digit())
}

/// Name field rule: `^[A-Za-z]*$`.
pub fn validate_name(text: &str) -> bool {
    NAME_RE.is_match(text)
}

/// Age field rule: `^[0-9]{0,2}$`.
pub fn validate_age(text: &str) -> bool {
    AGE_RE.is_match(text)
}

//! Domain model for form records.
//!
//! # Invariants
//! - A record is one `(id, name, age)` row; `id` is the lookup key.
//! - Field rules are the same predicates the form applies per keystroke.

pub mod record;

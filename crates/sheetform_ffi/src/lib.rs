//! Flutter-facing bridge for the SheetForm desktop window.

pub mod api;

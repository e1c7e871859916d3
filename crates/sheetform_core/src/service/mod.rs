//! Record workflows.
//!
//! # Responsibility
//! - Orchestrate table client calls into use-case level APIs.
//! - Keep shells decoupled from store details.

pub mod record_service;

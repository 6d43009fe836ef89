//! Error types for Wardley map operations.
//!
//! This module provides the main error type [`WardleyError`] which wraps
//! the error conditions that can occur while converting maps.

use std::io;

use thiserror::Error;

use wardley_parser::error::ParseError;

use crate::reconcile::ReconcileError;

/// The main error type for Wardley map operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the diagnostics so a
/// front end can render labeled snippets.
#[derive(Debug, Error)]
pub enum WardleyError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("{0} is not in canonical form")]
    NotCanonical(String),
}

impl WardleyError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}

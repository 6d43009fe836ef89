//! Error codes for the Wardley diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E1xx` - Syntax errors, reported per line by the parser
//! - `E2xx` - Validation findings, reported over the whole document

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Syntax Errors (E1xx)
    // =========================================================================
    /// Unknown syntax.
    ///
    /// The line matched no statement form: not a title, declaration,
    /// reserved keyword, or edge.
    E100,

    /// Invalid number.
    ///
    /// A coordinate had the shape of a number (digits, dots and, for label
    /// offsets, minus signs) but is not a decimal, e.g. `1.2.3`.
    E101,

    // =========================================================================
    // Validation Errors (E2xx)
    // =========================================================================
    /// Undefined component reference.
    ///
    /// An edge endpoint names a component that is not declared.
    E200,

    /// Duplicate component name.
    ///
    /// The same name is declared more than once; edges resolve to the last
    /// declaration.
    E201,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E100").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "unknown syntax",
            ErrorCode::E101 => "invalid number",
            ErrorCode::E200 => "undefined component",
            ErrorCode::E201 => "duplicate component",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

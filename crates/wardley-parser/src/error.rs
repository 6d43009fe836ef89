//! Error and diagnostic system for the Wardley map engine.
//!
//! Parsing and validation never fail outright: they return their findings as
//! plain lists ([`SyntaxError`](crate::SyntaxError) and
//! [`ValidationError`](crate::ValidationError)). This module supplies the
//! uniform reporting form both convert into:
//!
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Example
//!
//! ```
//! # use wardley_parser::error::{Diagnostic, ErrorCode};
//! # use wardley_parser::Span;
//!
//! let diag = Diagnostic::warning("component `Kettle` is declared more than once")
//!     .with_code(ErrorCode::E201)
//!     .with_label(Span::new(60..89), "later declaration wins")
//!     .with_secondary_label(Span::new(20..49), "first declared here");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;

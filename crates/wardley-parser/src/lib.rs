//! # Wardley Parser
//!
//! The text side of a Wardley map: a small line-oriented DSL that declares
//! components with a position and links them with dependency edges.
//!
//! The crate provides three independent operations:
//!
//! 1. [`parse`] turns text into a [`ParseResult`], recovering from bad lines
//! 2. [`generate`] turns a persisted [`MapSnapshot`] back into canonical text
//! 3. [`validate`] checks that every edge names a declared component
//!
//! [`check`] chains parsing and validation into a single `Result` carrying
//! rich [`Diagnostic`](error::Diagnostic)s.
//!
//! ## Usage
//!
//! ```
//! # use wardley_parser::{check, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = "
//!         title Tea Shop
//!         anchor Customer [0.95, 0.65]
//!         component Cup of Tea [0.79, 0.61]
//!         Customer->Cup of Tea
//!     ";
//!
//!     let checked = check(source)?;
//!     assert_eq!(checked.parsed().components().len(), 2);
//!     Ok(())
//! }
//! ```
//!
//! [`MapSnapshot`]: wardley_core::record::MapSnapshot

mod document;
pub mod error;
mod generator;
mod parser;
mod span;
mod validate;

pub use document::{ParseResult, SyntaxError};
pub use generator::generate;
pub use parser::parse;
pub use span::Span;
pub use validate::{Endpoint, ValidationError, validate};

use log::{debug, info};

use error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError};

/// A document that parsed and validated without errors.
#[derive(Debug, Clone)]
pub struct CheckedMap {
    parsed: ParseResult,
    warnings: Vec<Diagnostic>,
}

impl CheckedMap {
    pub fn parsed(&self) -> &ParseResult {
        &self.parsed
    }

    /// Non-fatal findings, such as redeclared components.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Consume the check result and keep only the parsed document.
    pub fn into_parsed(self) -> ParseResult {
        self.parsed
    }
}

/// Parse and validate source text in one step.
///
/// This is the strict counterpart of [`parse`]. It runs:
///
/// 1. **Parse** - Classify every line, collecting syntax errors
/// 2. **Validate** - Resolve every edge endpoint
/// 3. **Redeclarations** - Warn about names declared more than once
///
/// Every finding is collected so the caller sees all problems at once.
///
/// # Returns
///
/// The parsed document with its warnings, or a [`ParseError`] holding every
/// diagnostic when at least one error was found.
pub fn check(source: &str) -> Result<CheckedMap, ParseError> {
    let parsed = parse(source);
    let invalid = validate(&parsed);

    let mut collector = DiagnosticCollector::new();
    collector.extend(parsed.errors().iter().map(Diagnostic::from));
    collector.extend(invalid.iter().map(Diagnostic::from));
    collector.extend(redeclaration_warnings(&parsed));

    debug!(
        syntax_errors = parsed.errors().len(),
        validation_errors = invalid.len();
        "Checked map text"
    );

    let warnings = collector.finish()?;
    info!(
        components = parsed.components().len(),
        edges = parsed.edges().len(),
        warnings = warnings.len();
        "Map text is valid"
    );

    Ok(CheckedMap { parsed, warnings })
}

fn redeclaration_warnings(parsed: &ParseResult) -> Vec<Diagnostic> {
    parsed
        .redeclarations()
        .into_iter()
        .map(|(shadowed, winner)| {
            let name = parsed.components()[winner].name();
            let mut diag = Diagnostic::warning(format!(
                "component `{name}` is declared more than once"
            ))
            .with_code(ErrorCode::E201)
            .with_help("edges resolve to the last declaration; remove or rename the others");

            if let Some(span) = parsed.component_span(winner).filter(|span| !span.is_empty()) {
                diag = diag.with_label(span, "later declaration wins");
            }
            if let Some(span) = parsed.component_span(shadowed).filter(|span| !span.is_empty()) {
                diag = diag.with_secondary_label(span, "shadowed declaration");
            }
            diag
        })
        .collect()
}

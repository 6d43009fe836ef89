//! Referential checks over a parsed document.

use std::{collections::HashSet, fmt};

use serde::Serialize;
use thiserror::Error;

use crate::{
    document::ParseResult,
    error::{Diagnostic, ErrorCode},
};

/// Which end of an edge failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Source => write!(f, "source"),
            Endpoint::Target => write!(f, "target"),
        }
    }
}

/// An edge endpoint that names no declared component.
///
/// Serializes to `{ message }`; validation findings carry no line number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
    #[serde(skip)]
    endpoint: Endpoint,
    #[serde(skip)]
    name: String,
}

impl ValidationError {
    fn missing(endpoint: Endpoint, name: &str) -> Self {
        Self {
            message: format!("Edge {endpoint} \"{name}\" not found"),
            endpoint,
            name: name.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// The unresolved component name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&ValidationError> for Diagnostic {
    fn from(err: &ValidationError) -> Self {
        Diagnostic::error(err.message())
            .with_code(ErrorCode::E200)
            .with_help(format!(
                "declare it with `component {} [<visibility>, <evolution>]`",
                err.name()
            ))
    }
}

/// Check that every edge endpoint names a declared component.
///
/// Emits one error per missing endpoint, in edge order and source before
/// target within an edge. Duplicate declarations are not reported here.
pub fn validate(parsed: &ParseResult) -> Vec<ValidationError> {
    let declared: HashSet<&str> = parsed
        .components()
        .iter()
        .map(|component| component.name())
        .collect();

    let mut errors = Vec::new();
    for edge in parsed.edges() {
        if !declared.contains(edge.source()) {
            errors.push(ValidationError::missing(Endpoint::Source, edge.source()));
        }
        if !declared.contains(edge.target()) {
            errors.push(ValidationError::missing(Endpoint::Target, edge.target()));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use wardley_core::semantic::{Component, ComponentKind, Edge};

    use super::*;

    fn document(names: &[&str], edges: &[(&str, &str)]) -> ParseResult {
        ParseResult::new(
            None,
            names
                .iter()
                .map(|name| Component::new(*name, ComponentKind::Component, 0.5, 0.5))
                .collect(),
            edges
                .iter()
                .map(|(source, target)| Edge::new(*source, *target))
                .collect(),
        )
    }

    #[test]
    fn test_all_endpoints_declared() {
        let parsed = document(&["A", "B"], &[("A", "B"), ("B", "A")]);
        assert!(validate(&parsed).is_empty());
    }

    #[test]
    fn test_missing_target() {
        let errors = validate(&document(&["A"], &[("A", "B")]));

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Edge target \"B\" not found");
        assert_eq!(errors[0].endpoint(), Endpoint::Target);
        assert_eq!(errors[0].name(), "B");
    }

    #[test]
    fn test_both_endpoints_missing_in_order() {
        let errors = validate(&document(&["A"], &[("X", "Y"), ("A", "Z")]));

        let messages: Vec<_> = errors.iter().map(ValidationError::message).collect();
        assert_eq!(
            messages,
            vec![
                "Edge source \"X\" not found",
                "Edge target \"Y\" not found",
                "Edge target \"Z\" not found",
            ]
        );
    }

    #[test]
    fn test_duplicate_names_are_not_flagged() {
        let parsed = document(&["A", "A", "B"], &[("A", "B")]);
        assert!(validate(&parsed).is_empty());
    }

    #[test]
    fn test_diagnostic_carries_code() {
        let errors = validate(&document(&[], &[("A", "A")]));
        let diag = Diagnostic::from(&errors[0]);

        assert_eq!(diag.code(), Some(ErrorCode::E200));
        assert_eq!(errors.len(), 2);
    }
}

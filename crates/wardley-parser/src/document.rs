//! Parse output: the structured form of one map document.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use wardley_core::semantic::{Component, Edge};

use crate::{
    error::{Diagnostic, ErrorCode},
    span::Span,
};

/// A line-addressed syntax error.
///
/// Serializes to `{ line, message }`. The code and span are extra context
/// for diagnostic rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    line: usize,
    message: String,
    #[serde(skip)]
    code: ErrorCode,
    #[serde(skip)]
    span: Span,
}

impl SyntaxError {
    /// A line that matched no statement form.
    pub fn unknown_syntax(line: usize, text: &str, span: Span) -> Self {
        Self {
            line,
            message: format!("Unknown syntax: {text}"),
            code: ErrorCode::E100,
            span,
        }
    }

    /// A coordinate shaped like a number that does not parse as one.
    pub fn invalid_number(line: usize, raw: &str, span: Span) -> Self {
        Self {
            line,
            message: format!("Invalid number: {raw}"),
            code: ErrorCode::E101,
            span,
        }
    }

    /// 1-based line number.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Byte span of the trimmed offending line.
    pub fn span(&self) -> Span {
        self.span
    }
}

impl From<&SyntaxError> for Diagnostic {
    fn from(err: &SyntaxError) -> Self {
        let diag = Diagnostic::error(err.message()).with_code(err.code());
        match err.code() {
            ErrorCode::E101 => diag
                .with_label(err.span(), "not a decimal number")
                .with_help("coordinates are plain decimals such as `0.65`"),
            _ => diag
                .with_label(err.span(), "not a title, declaration or edge")
                .with_help("declare with `component <name> [<visibility>, <evolution>]` or link with `<source>-><target>`"),
        }
    }
}

/// The structured result of parsing one map document.
///
/// Components and edges keep source line order. A name lookup built during
/// the parse resolves names to the *last* component declared with that name;
/// earlier duplicates stay in [`components`](Self::components) but are
/// shadowed for resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseResult {
    title: Option<String>,
    components: Vec<Component>,
    edges: Vec<Edge>,
    errors: Vec<SyntaxError>,
    #[serde(skip)]
    spans: Vec<Span>,
    #[serde(skip)]
    by_name: IndexMap<String, usize>,
}

impl ParseResult {
    /// Assemble a result from already-built parts, e.g. for validation of
    /// programmatically constructed documents.
    pub fn new(title: Option<String>, components: Vec<Component>, edges: Vec<Edge>) -> Self {
        let mut result = Self {
            title,
            ..Self::default()
        };
        for component in components {
            result.push_component(component, Span::default());
        }
        result.edges = edges;
        result
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Declared components in source order, duplicates included.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Edges in source order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Syntax errors in source order.
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// Returns `true` when no line failed to parse.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Resolve a name to its component; the last declaration wins.
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.component_index(name)
            .and_then(|index| self.components.get(index))
    }

    /// Index into [`components`](Self::components) of the declaration a
    /// name resolves to.
    pub fn component_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Byte span of the line declaring the component at `index`.
    ///
    /// Results assembled with [`ParseResult::new`] carry empty spans.
    pub fn component_span(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied()
    }

    /// Pairs of `(shadowed, winning)` component indexes for every name
    /// declared more than once, in source order of the shadowed declaration.
    pub fn redeclarations(&self) -> Vec<(usize, usize)> {
        self.components
            .iter()
            .enumerate()
            .filter_map(|(index, component)| {
                let winner = *self.by_name.get(component.name())?;
                (winner != index).then_some((index, winner))
            })
            .collect()
    }

    pub(crate) fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    /// Record a component; returns the index of the declaration it shadows.
    pub(crate) fn push_component(&mut self, component: Component, span: Span) -> Option<usize> {
        let index = self.components.len();
        let shadowed = self.by_name.insert(component.name().to_string(), index);
        self.components.push(component);
        self.spans.push(span);
        shadowed
    }

    pub(crate) fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub(crate) fn push_error(&mut self, error: SyntaxError) {
        self.errors.push(error);
    }
}

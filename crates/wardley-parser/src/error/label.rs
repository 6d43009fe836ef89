//! Labeled source spans for diagnostic messages.

use crate::span::Span;

/// A labeled span in map source text.
///
/// - **Primary labels** mark the offending line.
/// - **Secondary labels** point at related context, such as the earlier
///   declaration of a duplicated component.
///
/// ```text
/// warning[E201]: component `Kettle` is declared more than once
///   --> tea.wm:6:1
///    |
///  6 | component Kettle [0.35, 0.43]
///    | ----------------------------- later declaration wins
///    |
///  3 | component Kettle [0.30, 0.40]
///    | ----------------------------- first declared here
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    /// Get the span this label applies to.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Get the label message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a primary label.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Check if this is a secondary label.
    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}

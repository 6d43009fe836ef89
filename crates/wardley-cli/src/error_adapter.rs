//! miette rendering for map diagnostics and engine errors.
//!
//! A failed check turns into one report per diagnostic, each pointing into
//! the map source. Warnings from a successful check go through the same
//! adapter, so redeclarations render with their two labeled lines.

use std::fmt;

use miette::{
    Diagnostic as MietteDiagnostic, GraphicalReportHandler, LabeledSpan, Severity as MietteSeverity,
    SourceSpan,
};

use wardley::WardleyError;
use wardley_parser::{
    Span,
    error::{Diagnostic, Severity},
};

/// A boxed report ready for [`render`].
pub type Report<'a> = Box<dyn MietteDiagnostic + 'a>;

/// A map diagnostic together with the text it points into.
#[derive(Debug)]
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    src: &'a str,
}

impl<'a> DiagnosticAdapter<'a> {
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|code| Box::new(code) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<MietteSeverity> {
        Some(match self.diag.severity() {
            Severity::Error => MietteSeverity::Error,
            Severity::Warning => MietteSeverity::Warning,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let message = Some(label.message().to_string());
            let span = span_to_miette(label.span());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// An engine error with no position in the map text.
#[derive(Debug)]
pub struct ErrorAdapter<'a>(pub &'a WardleyError);

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            WardleyError::Io(_) => "wardley::io",
            WardleyError::Parse { .. } => return None,
            WardleyError::Json(_) => "wardley::json",
            WardleyError::Reconcile(_) => "wardley::reconcile",
            WardleyError::NotCanonical(_) => "wardley::fmt",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            WardleyError::Json(_) => "a snapshot is an object with `title`, `nodes` and `edges`",
            WardleyError::Reconcile(_) => {
                "fix the map text first; an empty or broken map is never applied"
            }
            WardleyError::NotCanonical(_) => "run `wardley fmt` without `--check` to rewrite it",
            WardleyError::Io(_) | WardleyError::Parse { .. } => return None,
        };
        Some(Box::new(help))
    }
}

fn span_to_miette(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Split an error into reports: one per diagnostic for a failed check, a
/// single report otherwise.
pub fn to_reports(err: &WardleyError) -> Vec<Report<'_>> {
    match err {
        WardleyError::Parse { err: parse_err, src } => parse_err
            .diagnostics()
            .iter()
            .map(|diag| Box::new(DiagnosticAdapter::new(diag, src)) as Report<'_>)
            .collect(),
        _ => vec![Box::new(ErrorAdapter(err))],
    }
}

/// Render a report with miette's graphical handler, falling back to the
/// plain message.
pub fn render(report: &dyn MietteDiagnostic) -> String {
    let mut writer = String::new();
    if GraphicalReportHandler::new()
        .render_report(&mut writer, report)
        .is_err()
    {
        return report.to_string();
    }
    writer
}

#[cfg(test)]
mod tests {
    use wardley::reconcile::ReconcileError;
    use wardley_parser::error::{ErrorCode, ParseError};

    use super::*;

    fn code_of(report: &dyn MietteDiagnostic) -> Option<String> {
        report.code().map(|code| code.to_string())
    }

    #[test]
    fn test_each_diagnostic_becomes_a_report() {
        let parse_err = ParseError::from(vec![
            Diagnostic::error("Unknown syntax: foo")
                .with_code(ErrorCode::E100)
                .with_label(Span::new(0..3), "not a title, declaration or edge"),
            Diagnostic::error("Edge target \"B\" not found").with_code(ErrorCode::E200),
        ]);
        let err = WardleyError::new_parse_error(parse_err, "foo\nA->B");

        let reports = to_reports(&err);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].to_string(), "Unknown syntax: foo");
        assert_eq!(code_of(reports[1].as_ref()), Some("E200".to_string()));
        assert!(reports[0].source_code().is_some());
    }

    #[test]
    fn test_engine_error_is_a_single_report() {
        let err = WardleyError::Reconcile(ReconcileError::Empty);

        let reports = to_reports(&err);

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].to_string(), "map text declares no components");
        assert_eq!(
            code_of(reports[0].as_ref()),
            Some("wardley::reconcile".to_string())
        );
        assert!(reports[0].labels().is_none());
    }

    #[test]
    fn test_not_canonical_suggests_fmt() {
        let err = WardleyError::NotCanonical("tea.wm".to_string());
        let adapter = ErrorAdapter(&err);

        let help = adapter.help().map(|help| help.to_string());

        assert_eq!(
            help.as_deref(),
            Some("run `wardley fmt` without `--check` to rewrite it")
        );
    }

    #[test]
    fn test_redeclaration_warning_keeps_both_labels() {
        let diag = Diagnostic::warning("component `K` is declared more than once")
            .with_code(ErrorCode::E201)
            .with_label(Span::new(23..47), "later declaration wins")
            .with_secondary_label(Span::new(0..22), "shadowed declaration");
        let adapter = DiagnosticAdapter::new(&diag, "component K [0.1, 0.2]\ncomponent K [0.3, 0.4]");

        let labels: Vec<_> = adapter.labels().unwrap().collect();

        assert_eq!(adapter.severity(), Some(MietteSeverity::Warning));
        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary());
        assert_eq!(labels[1].label(), Some("shadowed declaration"));
        assert_eq!(labels[1].offset(), 0);
    }

    #[test]
    fn test_render_includes_code_and_message() {
        let diag = Diagnostic::error("Unknown syntax: foo")
            .with_code(ErrorCode::E100)
            .with_label(Span::new(0..3), "not a title, declaration or edge");

        let rendered = render(&DiagnosticAdapter::new(&diag, "foo"));

        assert!(rendered.contains("E100"));
        assert!(rendered.contains("Unknown syntax: foo"));
    }
}

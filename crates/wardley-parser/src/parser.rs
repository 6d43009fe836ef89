//! Line-oriented parser for Wardley map text.
//!
//! Every line is classified on its own; there are no multi-line constructs.
//! Classification walks [`RULES`] in order and the first rule that matches
//! wins. A line no rule matches becomes an `Unknown syntax` error and
//! scanning continues with the next line.
//!
//! The public entry point is [`parse`].

use log::{debug, trace};
use winnow::{
    Parser as _,
    combinator::{alt, delimited, opt, preceded, separated_pair},
    error::{ContextError, ErrMode, ModalResult},
    token::{any, take_till, take_until, take_while},
};

use wardley_core::semantic::{Component, ComponentKind, Edge, LabelOffset};

use crate::{
    document::{ParseResult, SyntaxError},
    span::Span,
};

type Input<'a> = &'a str;

/// A classified line, still holding raw coordinate text.
#[derive(Debug, Clone, PartialEq)]
enum Statement<'a> {
    Title(&'a str),
    Declaration(Declaration<'a>),
    /// Recognized keyword with no behaviour yet (`evolve`, `note`, ...).
    Reserved(&'a str),
    Edge {
        source: &'a str,
        target: &'a str,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Declaration<'a> {
    kind: ComponentKind,
    name: &'a str,
    /// `(visibility, evolution)`
    position: (&'a str, &'a str),
    /// `(dx, dy)`
    label: Option<(&'a str, &'a str)>,
}

impl Declaration<'_> {
    /// Convert the raw coordinates, reporting the first one that is not a number.
    fn resolve(&self) -> Result<Component, &str> {
        let visibility = number(self.position.0)?;
        let evolution = number(self.position.1)?;
        let component = Component::new(self.name, self.kind, visibility, evolution);

        match self.label {
            Some((dx, dy)) => {
                let offset = LabelOffset::new(number(dx)?, number(dy)?);
                Ok(component.with_label_offset(offset))
            }
            None => Ok(component),
        }
    }
}

fn number(raw: &str) -> Result<f64, &str> {
    raw.parse::<f64>().map_err(|_| raw)
}

type Rule = for<'a> fn(&mut Input<'a>) -> ModalResult<Statement<'a>>;

/// Statement rules in precedence order.
const RULES: [(&str, Rule); 5] = [
    ("title", title),
    ("anchor", anchor),
    ("component", component),
    ("reserved", reserved),
    ("edge", edge),
];

fn whitespace0<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    take_while(0.., |c: char| c.is_whitespace()).parse_next(input)
}

fn whitespace1<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_whitespace()).parse_next(input)
}

/// Consume whatever is left of the line.
fn remainder<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    take_while(0.., |_: char| true).parse_next(input)
}

/// Unsigned decimal shape: digits and dots.
fn decimal<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_digit() || c == '.').parse_next(input)
}

/// Signed decimal shape: digits, dots and minus signs.
fn signed_decimal<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_digit() || c == '.' || c == '-').parse_next(input)
}

/// `[<visibility>, <evolution>]`
fn position<'a>(input: &mut Input<'a>) -> ModalResult<(&'a str, &'a str)> {
    delimited('[', separated_pair(decimal, (',', whitespace0), decimal), ']').parse_next(input)
}

/// ` label [<dx>, <dy>]`
fn label_clause<'a>(input: &mut Input<'a>) -> ModalResult<(&'a str, &'a str)> {
    preceded(
        (whitespace1, "label", whitespace1),
        delimited(
            '[',
            separated_pair(signed_decimal, (',', whitespace0), signed_decimal),
            ']',
        ),
    )
    .parse_next(input)
}

/// A name followed by whitespace and a position.
///
/// The name is the shortest prefix for which the rest of the line continues
/// with whitespace and a well-formed position, so names may contain spaces
/// and punctuation. Anything after the closing bracket is left unconsumed.
fn named_position<'a>(input: &mut Input<'a>) -> ModalResult<(&'a str, (&'a str, &'a str))> {
    let text = *input;
    for (offset, ch) in text.char_indices().skip(1) {
        if !ch.is_whitespace() {
            continue;
        }
        let mut tail = &text[offset..];
        if let Ok(coordinates) = preceded(whitespace1, position).parse_next(&mut tail) {
            *input = tail;
            return Ok((text[..offset].trim(), coordinates));
        }
    }
    Err(ErrMode::Backtrack(ContextError::new()))
}

/// `title <text>`
fn title<'a>(input: &mut Input<'a>) -> ModalResult<Statement<'a>> {
    preceded("title ", remainder)
        .map(|text| Statement::Title(text.trim()))
        .parse_next(input)
}

/// `anchor <name> [<visibility>, <evolution>]`
fn anchor<'a>(input: &mut Input<'a>) -> ModalResult<Statement<'a>> {
    preceded(("anchor", whitespace1), named_position)
        .map(|(name, position)| {
            Statement::Declaration(Declaration {
                kind: ComponentKind::Anchor,
                name,
                position,
                label: None,
            })
        })
        .parse_next(input)
}

/// `component <name> [<visibility>, <evolution>]`, optionally followed by
/// `label [<dx>, <dy>]`
fn component<'a>(input: &mut Input<'a>) -> ModalResult<Statement<'a>> {
    (
        preceded(("component", whitespace1), named_position),
        opt(label_clause),
    )
        .map(|((name, position), label)| {
            Statement::Declaration(Declaration {
                kind: ComponentKind::Component,
                name,
                position,
                label,
            })
        })
        .parse_next(input)
}

/// Keywords of the richer dialect that are accepted and ignored.
fn reserved<'a>(input: &mut Input<'a>) -> ModalResult<Statement<'a>> {
    alt(("evolve ", "annotations ", "annotation ", "note ", "style "))
        .map(|keyword: &'a str| Statement::Reserved(keyword.trim_end()))
        .parse_next(input)
}

/// `<source>-><target>`, optionally followed by `; <comment>`
///
/// The source ends at the first arrow; the target ends at the first `;`.
fn edge<'a>(input: &mut Input<'a>) -> ModalResult<Statement<'a>> {
    (
        (any, take_until(0.., "->")).take().map(|source: &'a str| source.trim()),
        preceded("->", take_till(1.., ';')).map(|target: &'a str| target.trim()),
        remainder,
    )
        .verify(|(source, target, _): &(&'a str, &'a str, &'a str)| {
            !source.is_empty() && !target.is_empty()
        })
        .map(|(source, target, _)| Statement::Edge { source, target })
        .parse_next(input)
}

/// Run the rules over one trimmed line.
fn classify(line: &str) -> Option<(&'static str, Statement<'_>)> {
    RULES.iter().find_map(|(name, rule)| {
        let mut input = line;
        rule(&mut input).ok().map(|statement| (*name, statement))
    })
}

/// Accumulates the parse result line by line.
struct Scanner {
    result: ParseResult,
}

impl Scanner {
    fn new() -> Self {
        Self {
            result: ParseResult::default(),
        }
    }

    /// Scan a single raw line starting at byte `offset` of the source.
    fn scan_line(&mut self, line_number: usize, raw: &str, offset: usize) {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            return;
        }

        let start = offset + (raw.len() - raw.trim_start().len());
        let span = Span::new(start..start + line.len());

        let Some((rule, statement)) = classify(line) else {
            trace!(line = line_number; "No statement rule matched");
            self.result
                .push_error(SyntaxError::unknown_syntax(line_number, line, span));
            return;
        };
        trace!(line = line_number, rule; "Matched statement");

        match statement {
            Statement::Title(title) => self.result.set_title(title),
            Statement::Declaration(declaration) => match declaration.resolve() {
                Ok(component) => {
                    if let Some(shadowed) = self.result.push_component(component, span) {
                        debug!(
                            line = line_number,
                            name = declaration.name,
                            shadowed;
                            "Component redeclared, later declaration wins"
                        );
                    }
                }
                Err(raw_number) => {
                    self.result.push_error(SyntaxError::invalid_number(
                        line_number,
                        raw_number,
                        span,
                    ));
                }
            },
            Statement::Reserved(keyword) => {
                trace!(line = line_number, keyword; "Skipping reserved statement");
            }
            Statement::Edge { source, target } => {
                self.result.push_edge(Edge::new(source, target));
            }
        }
    }

    fn finish(self) -> ParseResult {
        self.result
    }
}

/// Parse map text into a [`ParseResult`].
///
/// Never fails: lines that cannot be understood are recorded in
/// [`ParseResult::errors`] and the remaining lines are still parsed. Edge
/// endpoints are not checked here; see [`validate`](crate::validate).
///
/// # Example
///
/// ```
/// let parsed = wardley_parser::parse("title Tea Shop\nanchor Customer [0.95, 0.65]");
///
/// assert_eq!(parsed.title(), Some("Tea Shop"));
/// assert_eq!(parsed.components().len(), 1);
/// assert!(parsed.is_clean());
/// ```
pub fn parse(source: &str) -> ParseResult {
    let mut scanner = Scanner::new();

    let mut offset = 0;
    for (index, raw) in source.split('\n').enumerate() {
        scanner.scan_line(index + 1, raw, offset);
        offset += raw.len() + 1;
    }

    let result = scanner.finish();
    debug!(
        components = result.components().len(),
        edges = result.edges().len(),
        errors = result.errors().len();
        "Parsed map text"
    );
    result
}

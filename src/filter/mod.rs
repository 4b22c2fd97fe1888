//! Filter language: a small boolean DSL over entity fields.
//!
//! ```text
//! street == 'street42' && (user.email != null || number >= 3)
//! ```
//!
//! - `==` / `!=` compare text case-insensitively, `===` / `!==` exactly
//! - `<`, `<=`, `>`, `>=` on numeric, enum and temporal fields
//! - `relation.field` reaches through one relation of the root entity
//! - literals: quoted strings, integers, decimals, `true`, `false`, `null`
//!
//! Parsing is pure. [`compiler`] resolves the parsed tree against a schema
//! and emits a SQL predicate.

pub mod ast;
pub mod compiler;
pub mod lexer;
pub mod parser;

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};

pub use ast::{CompareOp, Comparison, FilterExpr, FilterLiteral, LeftValue};
pub use compiler::{compile, CompiledFilter, FilterError, FilterResult};

/// A syntax error with its location in the filter text.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub span: Range<usize>,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at {}..{})", self.message, self.span.start, self.span.end)
    }
}

/// Malformed filter text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid filter: {}", summary(.diagnostics))]
pub struct ParseError {
    pub diagnostics: Vec<Diagnostic>,
}

fn summary(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse filter text.
///
/// Blank input means "no filter" and yields `Ok(None)` without invoking the
/// parser.
pub fn parse(source: &str) -> Result<Option<FilterExpr>, ParseError> {
    use chumsky::error::Rich;
    use chumsky::input::Input;
    use chumsky::span::SimpleSpan;
    use chumsky::span::Span as _;
    use chumsky::Parser as _;

    if source.trim().is_empty() {
        return Ok(None);
    }

    // Step 1: Lexical analysis
    let (tokens, lex_errs) = lexer::lexer().parse(source).into_output_errors();
    let mut diagnostics: Vec<Diagnostic> = lex_errs
        .into_iter()
        .map(|e: Rich<'_, char>| {
            let span = e.span();
            Diagnostic {
                span: span.start()..span.end(),
                message: e.to_string(),
            }
        })
        .collect();

    let tokens: Vec<(lexer::Token<'_>, SimpleSpan)> = match tokens {
        Some(t) if diagnostics.is_empty() => t,
        _ => return Err(ParseError { diagnostics }),
    };

    // Step 2: Parsing
    let len = source.len();
    let eoi: SimpleSpan = (len..len).into();
    let token_stream = tokens
        .as_slice()
        .map(eoi, |(tok, span): &(lexer::Token<'_>, SimpleSpan)| (tok, span));

    let (expr, parse_errs) = parser::parser().parse(token_stream).into_output_errors();
    diagnostics.extend(
        parse_errs
            .into_iter()
            .map(|e: Rich<'_, lexer::Token<'_>, SimpleSpan>| {
                let span = e.span();
                Diagnostic {
                    span: span.start()..span.end(),
                    message: e.to_string(),
                }
            }),
    );

    match expr {
        Some(expr) if diagnostics.is_empty() => Ok(Some(expr)),
        _ => Err(ParseError { diagnostics }),
    }
}

/// Render diagnostics as an annotated report over the filter text.
pub fn render_diagnostics(source: &str, diagnostics: &[Diagnostic]) -> String {
    let mut out = Vec::new();
    for diag in diagnostics {
        let report = Report::build(ReportKind::Error, diag.span.clone())
            .with_config(Config::default().with_color(false))
            .with_message("invalid filter")
            .with_label(Label::new(diag.span.clone()).with_message(&diag.message))
            .finish();
        if report.write(Source::from(source), &mut out).is_err() {
            out.extend_from_slice(diag.to_string().as_bytes());
            out.push(b'\n');
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

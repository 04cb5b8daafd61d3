//! Diagnostics and parse-error types (spec.md section 7).
//!
//! Parse errors are recoverable: they accumulate in a [`DiagnosticSink`]
//! owned by the [`crate::session::Session`] and parsing continues to
//! end-of-file (spec.md section 7, "Propagation"). Reachability (C6) and
//! codegen (C7) never produce a `Diagnostic` — a violated invariant there is
//! a compiler bug and is reported with `debug_assert!`/`unreachable!`
//! instead (spec.md section 7, "Compiler bugs").

use crate::base::{Span, Symbol};
use thiserror::Error;

/// A parse-time error, carrying enough context to format an
/// "expected X, found Y" message (spec.md section 7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("in {rule}: expected {expected}, found {found}")]
    Expected {
        rule: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("in {rule}: unexpected end of file")]
    UnexpectedEof { rule: &'static str },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Severity of a recorded [`Diagnostic`]. Only `Error` prevents a session
/// from reporting success (spec.md section 7, "warnings are non-fatal").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single recorded diagnostic: a parse error or a stylistic warning
/// (e.g. the `BAD_SEMI`/`MISSING_SEMI` flags described in spec.md 4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
        }
    }
}

/// Accumulates diagnostics for one compilation session.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn push_error(&mut self, err: ParseError, span: Span) {
        self.push(Diagnostic::error(err.to_string(), span));
    }

    /// A session reports success iff no diagnostic has `Severity::Error`
    /// (spec.md section 7).
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Raised when the codegen driver (C7) cannot lower a field's type. Carries
/// the field index so the caller can fail fast on exactly the offending
/// field (spec.md section 9, resolving the `codegen_struct` Open Question;
/// see SPEC_FULL.md section 3 item 8).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("field {field_index} of type {type_name:?} has no lowering")]
    UnlowerableField {
        type_name: Symbol,
        field_index: usize,
    },
}

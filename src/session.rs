//! Ties the ambient stack together (SPEC_FULL.md section 6). Not a distinct
//! component in spec.md section 2, but required by spec.md section 7:
//! "[parse errors] accumulate in a diagnostic list held by the session...
//! [a session] reports success iff the diagnostic list has no errors."
//!
//! `Session` owns the arena, interner, diagnostic sink, and parser
//! configuration for one compilation (spec.md section 5: "one compilation
//! session per thread... no locks are needed"), gathering what would
//! otherwise be scattered global state — see DESIGN.md's Open Question
//! decision on the string interner being per-`Session` rather than a true
//! process global.

use crate::ast::{Arena, NodeId};
use crate::base::Interner;
use crate::combinators::{Parser, ParserConfig};
use crate::error::DiagnosticSink;
use crate::grammar;
use crate::token::{Lexer, TokenStream};

/// Owns every piece of mutable state for one compilation of one module
/// (spec.md section 5, "per-compilation" resources): the AST arena, the
/// string interner, accumulated diagnostics, and parser configuration.
pub struct Session {
    pub arena: Arena,
    pub interner: Interner,
    pub diagnostics: DiagnosticSink,
    pub config: ParserConfig,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Session {
            arena: Arena::new(),
            interner: Interner::new(),
            diagnostics: DiagnosticSink::new(),
            config,
        }
    }

    /// Parses one module's `tokens` into the session's arena, recording any
    /// parse error in `self.diagnostics` (spec.md section 7, "Parse errors
    /// accumulate in a diagnostic list held by the session; parsing
    /// continues until end-of-file" for the top-level `RESTART` points —
    /// a hard failure inside a single declaration still surfaces here as one
    /// diagnostic, since `class_def`'s own `RESTART` call already
    /// resynchronizes at the next declaration keyword).
    ///
    /// Returns the `Module` node even on error: grammar.rs's `module` always
    /// produces a node, since `RESTART` recovery keeps the rule progressing
    /// to `Eof` rather than unwinding the whole parse.
    pub fn parse_module(&mut self, tokens: impl TokenStream) -> NodeId {
        let mut parser = Parser::new(tokens, &mut self.arena, &mut self.diagnostics, self.config);
        match grammar::module(&mut parser) {
            Ok(node) => node,
            Err(err) => {
                let pos = parser.position();
                let span = crate::base::Span::point(pos);
                self.diagnostics.push_error(err, span);
                self.arena.new_node(crate::ast::NodeKind::Module)
            }
        }
    }

    /// Convenience entry point driving the crate's own `logos`-backed
    /// [`Lexer`] over an in-memory source string (spec.md section 1's
    /// "out of scope: lexing details" still leaves the core needing *a*
    /// lexer to exercise itself against; see SPEC_FULL.md section 4.2).
    pub fn parse_source<'a>(&mut self, source: &'a str) -> NodeId {
        self.parse_module(Lexer::new(source))
    }

    /// A session reports success iff its diagnostic list has no errors
    /// (spec.md section 7, warnings are non-fatal).
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn parses_a_minimal_module_with_no_errors() {
        let mut session = Session::new();
        let module = session.parse_source("primitive None\n");
        assert_eq!(session.arena.kind(module), NodeKind::Module);
        assert!(!session.has_errors());
    }

    #[test]
    fn accumulates_a_diagnostic_on_malformed_input_and_keeps_going() {
        let mut session = Session::new();
        // `RESTART` resynchronizes at the next class keyword, so `B` still
        // parses cleanly after the stray token between declarations (spec.md
        // section 8, "RESTART recovery").
        let _module = session.parse_source("class A junk class B\n");
        assert!(session.has_errors());
    }

    #[test]
    fn reports_success_when_only_warnings_are_recorded() {
        let mut session = Session::new();
        session
            .diagnostics
            .push(crate::error::Diagnostic::warning(
                "stylistic nit",
                crate::base::Span::point(crate::base::SourceLoc::new(0, 0, 0u32.into())),
            ));
        assert!(!session.has_errors());
    }
}

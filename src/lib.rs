//! # frontcore
//!
//! Parser, AST model, reachability analysis, and codegen-layout driver for
//! the front end of a capability-based actor language compiler.
//!
//! ## Module structure (dependency order)
//!
//! ```text
//! session     → ties arena + interner + diagnostics + config together
//!   ↓
//! codegen     → struct layout + GC trace-action classification (C7)
//!   ↓
//! reach       → worklist reachability analysis (C6)
//!   ↓
//! types       → capability lattice, subtype predicates (C5)
//!   ↓
//! grammar     → one function per grammar production (C4)
//!   ↓
//! combinators → parser state + combinator methods (C3)
//!   ↓
//! ast         → arena, NodeId, NodeKind, NodeFlags (C2)
//!   ↓
//! token       → TokenKind, Token, TokenStream, logos lexer (C1)
//!   ↓
//! base        → Symbol interning, Span/SourceLoc
//! ```

// ============================================================================
// MODULES (dependency order: base → token → ast → combinators → grammar →
// types → reach → codegen → session)
// ============================================================================

/// Foundation types: interned symbols, source positions.
pub mod base;

/// C1: token kinds and the logos-backed lexer.
pub mod token;

/// C2: the AST arena and node model.
pub mod ast;

/// C3: parser state and combinator methods.
pub mod combinators;

/// Parse errors and the diagnostic sink.
pub mod error;

/// C4: one function per grammar production.
pub mod grammar;

/// C5: the capability lattice and subtype predicates.
pub mod types;

/// C6: worklist reachability analysis.
pub mod reach;

/// C7: struct layout and GC trace-action classification.
pub mod codegen;

/// Ties the ambient stack together: arena, interner, diagnostics, config.
pub mod session;

// Re-export the types most callers need without reaching into submodules.
pub use ast::{Arena, Node, NodeFlags, NodeId, NodeKind, ScopeId, ScopeTable};
pub use base::{Interner, SourceLoc, Span, Symbol, TextRange, TextSize};
pub use combinators::ParserConfig;
pub use error::{Diagnostic, DiagnosticSink, LayoutError, ParseError, ParseResult, Severity};
pub use session::Session;
pub use token::{Lexer, Token, TokenKind, TokenStream};

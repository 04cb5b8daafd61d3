//! C1: the token stream contract, plus a runnable lexer that satisfies it.
//!
//! `spec.md` treats lexing as an external collaborator and only specifies the
//! contract the parser needs (`peek`/`advance`/`position`, a closed
//! `TokenKind` enumeration, and the three newline-leading synthetic variants
//! used to disambiguate statement boundaries without mandatory semicolons).
//! This module supplies both: the contract (`TokenStream`) that
//! `frontcore::combinators`/`frontcore::grammar` depend on, and a concrete
//! `logos`-backed implementation so the crate's own tests have something to
//! drive the parser with. A production driver may supply any other
//! `TokenStream` impl instead.

use crate::base::SourceLoc;
use logos::Logos;

/// The subset of [`TokenKind`] that `logos` matches directly from source
/// text. `TokenKind` adds the newline-leading synthetic variants and `Eof`,
/// neither of which `logos` ever produces on its own — the lexer
/// synthesizes them (see `Lexer::lex_next`).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r]+")]
enum RawKind {
    // Keywords
    #[token("use")]
    Use,
    #[token("type")]
    Type,
    #[token("interface")]
    Interface,
    #[token("trait")]
    Trait,
    #[token("primitive")]
    Primitive,
    #[token("struct")]
    Struct,
    #[token("class")]
    Class,
    #[token("actor")]
    Actor,
    #[token("is")]
    Is,
    #[token("isnt")]
    Isnt,
    #[token("var")]
    Var,
    #[token("let")]
    Let,
    #[token("embed")]
    Embed,
    #[token("delegate")]
    Delegate,
    #[token("fun")]
    Fun,
    #[token("be")]
    Be,
    #[token("new")]
    New,
    #[token("if")]
    If,
    #[token("elseif")]
    ElseIf,
    #[token("else")]
    Else,
    #[token("ifdef")]
    IfDef,
    #[token("then")]
    Then,
    #[token("match")]
    Match,
    #[token("where")]
    Where,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("repeat")]
    Repeat,
    #[token("until")]
    Until,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("with")]
    With,
    #[token("try")]
    Try,
    #[token("recover")]
    Recover,
    #[token("consume")]
    Consume,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("error")]
    Error,
    #[token("compile_intrinsic")]
    CompileIntrinsic,
    #[token("compile_error")]
    CompileError,
    #[token("this")]
    This,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("object")]
    Object,
    #[token("lambda")]
    Lambda,
    #[token("as")]
    As,
    #[token("not")]
    Not,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("xor")]
    Xor,
    #[token("end")]
    End,

    // Capabilities
    #[token("iso")]
    Iso,
    #[token("trn")]
    Trn,
    #[token("ref")]
    Ref,
    #[token("val")]
    Val,
    #[token("box")]
    Box_,
    #[token("tag")]
    Tag,

    // Generic capabilities
    #[token("#read")]
    CapRead,
    #[token("#send")]
    CapSend,
    #[token("#share")]
    CapShare,
    #[token("#any")]
    CapAny,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LSquare,
    #[token("]")]
    RSquare,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
    #[token("~")]
    Tilde,
    #[token("@")]
    At,
    #[token("?")]
    Question,
    #[token("=")]
    Assign,
    #[token("->")]
    Arrow,
    #[token("=>")]
    DblArrow,
    #[token("|")]
    Pipe,
    #[token("&")]
    Amp,
    #[token("...")]
    Ellipsis,
    #[token("^")]
    Ephemeral,
    #[token("!")]
    Borrowed,
    #[token("_")]
    Dontcare,
    #[token("identityof")]
    Identity,

    // Binary operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Multiply,
    #[token("/")]
    Divide,
    #[token("%")]
    Mod,
    #[token("<<")]
    LShift,
    #[token(">>")]
    RShift,
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token(">")]
    Gt,

    // Literals
    #[regex("[A-Za-z_][A-Za-z0-9_]*'*")]
    Id,
    #[regex("[0-9][0-9_]*")]
    Int,
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*")]
    Float,
    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    // Synthetic test-only tokens (spec.md section 4.1, "synthetic test kinds")
    #[token("$updatearg")]
    TestUpdateArg,
    #[token("$extra")]
    TestExtra,
    #[token("$borrowed")]
    TestBorrowed,

    /// Explicit newline token; a genuine lexical token, not trivia `logos`
    /// discards. `Lexer::lex_next` returns it like any other token — it's
    /// `combinators::Parser` that skips it transparently for every rule
    /// except `grammar::semi`/`grammar::nosemi`, which query
    /// `Parser::newline_before_current` to decide `BAD_SEMI`/`MISSING_SEMI`
    /// (spec.md section 4.2, "Newline sensitivity"; `parser.c:845,847,859`).
    #[regex(r"\n")]
    Newline,
}

/// The closed set of lexical token kinds the grammar (C4) matches against.
/// A strict superset of [`RawKind`]: adds the three newline-leading
/// synthetic variants and `Eof`, which the lexer produces itself rather
/// than matching from a `logos` pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Use, Type, Interface, Trait, Primitive, Struct, Class, Actor, Is, Isnt,
    Var, Let, Embed, Delegate, Fun, Be, New, If, ElseIf, Else, IfDef, Then,
    Match, Where, While, Do, Repeat, Until, For, In, With, Try, Recover,
    Consume, Return, Break, Continue, Error, CompileIntrinsic, CompileError,
    This, True, False, Object, Lambda, As, Not, And, Or, Xor, End,
    Iso, Trn, Ref, Val, Box_, Tag,
    CapRead, CapSend, CapShare, CapAny,
    LParen, RParen, LSquare, RSquare,
    /// Synthesized from `LParen` by the lexer when preceded by a newline.
    LParenNew,
    /// Synthesized from `LSquare` by the lexer when preceded by a newline.
    LSquareNew,
    Comma, Colon, Semi, Dot, Tilde, At, Question, Assign, Arrow, DblArrow,
    Pipe, Amp, Ellipsis, Ephemeral, Borrowed, Dontcare, Identity,
    Plus, Minus,
    /// Synthesized from `Minus` by the lexer when preceded by a newline.
    MinusNew,
    Multiply, Divide, Mod, LShift, RShift, Eq, Ne, Lt, Le, Ge, Gt,
    Id, Int, Float, String,
    TestUpdateArg, TestExtra, TestBorrowed,
    Newline,
    /// Emitted once after the last real token.
    Eof,
}

impl TokenKind {
    /// True for the three synthetic "newline-leading" variants (spec.md
    /// section 3).
    pub fn is_newline_leading(self) -> bool {
        matches!(
            self,
            TokenKind::LParenNew | TokenKind::LSquareNew | TokenKind::MinusNew
        )
    }
}

impl From<RawKind> for TokenKind {
    fn from(raw: RawKind) -> Self {
        match raw {
            RawKind::Use => TokenKind::Use,
            RawKind::Type => TokenKind::Type,
            RawKind::Interface => TokenKind::Interface,
            RawKind::Trait => TokenKind::Trait,
            RawKind::Primitive => TokenKind::Primitive,
            RawKind::Struct => TokenKind::Struct,
            RawKind::Class => TokenKind::Class,
            RawKind::Actor => TokenKind::Actor,
            RawKind::Is => TokenKind::Is,
            RawKind::Isnt => TokenKind::Isnt,
            RawKind::Var => TokenKind::Var,
            RawKind::Let => TokenKind::Let,
            RawKind::Embed => TokenKind::Embed,
            RawKind::Delegate => TokenKind::Delegate,
            RawKind::Fun => TokenKind::Fun,
            RawKind::Be => TokenKind::Be,
            RawKind::New => TokenKind::New,
            RawKind::If => TokenKind::If,
            RawKind::ElseIf => TokenKind::ElseIf,
            RawKind::Else => TokenKind::Else,
            RawKind::IfDef => TokenKind::IfDef,
            RawKind::Then => TokenKind::Then,
            RawKind::Match => TokenKind::Match,
            RawKind::Where => TokenKind::Where,
            RawKind::While => TokenKind::While,
            RawKind::Do => TokenKind::Do,
            RawKind::Repeat => TokenKind::Repeat,
            RawKind::Until => TokenKind::Until,
            RawKind::For => TokenKind::For,
            RawKind::In => TokenKind::In,
            RawKind::With => TokenKind::With,
            RawKind::Try => TokenKind::Try,
            RawKind::Recover => TokenKind::Recover,
            RawKind::Consume => TokenKind::Consume,
            RawKind::Return => TokenKind::Return,
            RawKind::Break => TokenKind::Break,
            RawKind::Continue => TokenKind::Continue,
            RawKind::Error => TokenKind::Error,
            RawKind::CompileIntrinsic => TokenKind::CompileIntrinsic,
            RawKind::CompileError => TokenKind::CompileError,
            RawKind::This => TokenKind::This,
            RawKind::True => TokenKind::True,
            RawKind::False => TokenKind::False,
            RawKind::Object => TokenKind::Object,
            RawKind::Lambda => TokenKind::Lambda,
            RawKind::As => TokenKind::As,
            RawKind::Not => TokenKind::Not,
            RawKind::And => TokenKind::And,
            RawKind::Or => TokenKind::Or,
            RawKind::Xor => TokenKind::Xor,
            RawKind::End => TokenKind::End,
            RawKind::Iso => TokenKind::Iso,
            RawKind::Trn => TokenKind::Trn,
            RawKind::Ref => TokenKind::Ref,
            RawKind::Val => TokenKind::Val,
            RawKind::Box_ => TokenKind::Box_,
            RawKind::Tag => TokenKind::Tag,
            RawKind::CapRead => TokenKind::CapRead,
            RawKind::CapSend => TokenKind::CapSend,
            RawKind::CapShare => TokenKind::CapShare,
            RawKind::CapAny => TokenKind::CapAny,
            RawKind::LParen => TokenKind::LParen,
            RawKind::RParen => TokenKind::RParen,
            RawKind::LSquare => TokenKind::LSquare,
            RawKind::RSquare => TokenKind::RSquare,
            RawKind::Comma => TokenKind::Comma,
            RawKind::Colon => TokenKind::Colon,
            RawKind::Semi => TokenKind::Semi,
            RawKind::Dot => TokenKind::Dot,
            RawKind::Tilde => TokenKind::Tilde,
            RawKind::At => TokenKind::At,
            RawKind::Question => TokenKind::Question,
            RawKind::Assign => TokenKind::Assign,
            RawKind::Arrow => TokenKind::Arrow,
            RawKind::DblArrow => TokenKind::DblArrow,
            RawKind::Pipe => TokenKind::Pipe,
            RawKind::Amp => TokenKind::Amp,
            RawKind::Ellipsis => TokenKind::Ellipsis,
            RawKind::Ephemeral => TokenKind::Ephemeral,
            RawKind::Borrowed => TokenKind::Borrowed,
            RawKind::Dontcare => TokenKind::Dontcare,
            RawKind::Identity => TokenKind::Identity,
            RawKind::Plus => TokenKind::Plus,
            RawKind::Minus => TokenKind::Minus,
            RawKind::Multiply => TokenKind::Multiply,
            RawKind::Divide => TokenKind::Divide,
            RawKind::Mod => TokenKind::Mod,
            RawKind::LShift => TokenKind::LShift,
            RawKind::RShift => TokenKind::RShift,
            RawKind::Eq => TokenKind::Eq,
            RawKind::Ne => TokenKind::Ne,
            RawKind::Lt => TokenKind::Lt,
            RawKind::Le => TokenKind::Le,
            RawKind::Ge => TokenKind::Ge,
            RawKind::Gt => TokenKind::Gt,
            RawKind::Id => TokenKind::Id,
            RawKind::Int => TokenKind::Int,
            RawKind::Float => TokenKind::Float,
            RawKind::String => TokenKind::String,
            RawKind::TestUpdateArg => TokenKind::TestUpdateArg,
            RawKind::TestExtra => TokenKind::TestExtra,
            RawKind::TestBorrowed => TokenKind::TestBorrowed,
            RawKind::Newline => TokenKind::Newline,
        }
    }
}

/// One lexical token: its kind, source text, and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: smol_str::SmolStr,
    pub loc: SourceLoc,
}

/// The contract the parser (C3) and grammar (C4) depend on (spec.md section
/// 6, "Token-stream collaborator"). Any implementation satisfying this trait
/// can back the parser; lexing details beyond this contract are out of
/// scope for the core (spec.md section 1).
pub trait TokenStream {
    /// Return the next token without consuming it.
    fn peek(&self) -> Token;
    /// Consume and return the next token.
    fn advance(&mut self) -> Token;
    /// The source position the stream is currently positioned at.
    fn position(&self) -> SourceLoc;
}

/// A `logos`-backed [`TokenStream`] over an in-memory source string.
///
/// Tracks whether the previous character was a newline so it can synthesize
/// `LParenNew`/`LSquareNew`/`MinusNew` in place of their ordinary
/// counterparts (spec.md section 3).
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, RawKind>,
    peeked: Option<Token>,
    line: u32,
    line_start_offset: u32,
    /// True if the upcoming token is the first on its physical line.
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Self {
            source,
            inner: RawKind::lexer(source),
            peeked: None,
            line: 0,
            line_start_offset: 0,
            at_line_start: true,
        };
        lexer.peeked = Some(lexer.lex_next());
        lexer
    }

    fn loc_at(&self, offset: u32) -> SourceLoc {
        SourceLoc::new(
            self.line,
            offset.saturating_sub(self.line_start_offset),
            text_size::TextSize::from(offset),
        )
    }

    fn lex_next(&mut self) -> Token {
        loop {
            let was_at_line_start = self.at_line_start;
            let Some(result) = self.inner.next() else {
                let offset = self.source.len() as u32;
                return Token {
                    kind: TokenKind::Eof,
                    text: smol_str::SmolStr::new_static(""),
                    loc: self.loc_at(offset),
                };
            };
            let span = self.inner.span();
            let start = span.start as u32;
            let text = &self.source[span.clone()];

            let kind = match result {
                Ok(RawKind::Newline) => {
                    self.line += 1;
                    self.line_start_offset = span.end as u32;
                    self.at_line_start = true;
                    // Returns directly rather than falling through to the
                    // common `at_line_start = false` reset below: a newline
                    // must stay "at line start" for whatever token follows it.
                    return Token {
                        kind: TokenKind::Newline,
                        text: smol_str::SmolStr::new(text),
                        loc: self.loc_at(start),
                    };
                }
                Ok(RawKind::LParen) if was_at_line_start => TokenKind::LParenNew,
                Ok(RawKind::LSquare) if was_at_line_start => TokenKind::LSquareNew,
                Ok(RawKind::Minus) if was_at_line_start => TokenKind::MinusNew,
                Ok(k) => k.into(),
                Err(()) => {
                    self.at_line_start = false;
                    continue;
                }
            };
            self.at_line_start = false;
            return Token {
                kind,
                text: smol_str::SmolStr::new(text),
                loc: self.loc_at(start),
            };
        }
    }
}

impl<'a> TokenStream for Lexer<'a> {
    fn peek(&self) -> Token {
        self.peeked.clone().expect("lexer always has a peeked token")
    }

    fn advance(&mut self) -> Token {
        let next = self.lex_next();
        std::mem::replace(&mut self.peeked, Some(next)).expect("lexer always has a peeked token")
    }

    fn position(&self) -> SourceLoc {
        self.peeked.as_ref().expect("peeked token").loc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.advance();
            if tok.kind == TokenKind::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        assert_eq!(
            kinds("class Foo is Bar"),
            vec![
                TokenKind::Class,
                TokenKind::Id,
                TokenKind::Is,
                TokenKind::Id
            ]
        );
    }

    #[test]
    fn newline_leading_paren_is_distinguished() {
        assert_eq!(kinds("foo (1)"), vec![TokenKind::Id, TokenKind::LParen, TokenKind::Int, TokenKind::RParen]);
        assert_eq!(
            kinds("foo\n(1)"),
            vec![
                TokenKind::Id,
                TokenKind::Newline,
                TokenKind::LParenNew,
                TokenKind::Int,
                TokenKind::RParen
            ]
        );
    }

    #[test]
    fn newline_leading_square_and_minus() {
        assert_eq!(
            kinds("foo\n[1]"),
            vec![
                TokenKind::Id,
                TokenKind::Newline,
                TokenKind::LSquareNew,
                TokenKind::Int,
                TokenKind::RSquare
            ]
        );
        assert_eq!(
            kinds("foo\n-1"),
            vec![TokenKind::Id, TokenKind::Newline, TokenKind::MinusNew, TokenKind::Int]
        );
    }

    #[test]
    fn newline_is_a_genuine_token() {
        assert_eq!(kinds("foo\nbar"), vec![TokenKind::Id, TokenKind::Newline, TokenKind::Id]);
    }

    #[test]
    fn capability_and_generic_cap_tokens() {
        assert_eq!(
            kinds("iso trn ref val box tag #read #send #share #any"),
            vec![
                TokenKind::Iso,
                TokenKind::Trn,
                TokenKind::Ref,
                TokenKind::Val,
                TokenKind::Box_,
                TokenKind::Tag,
                TokenKind::CapRead,
                TokenKind::CapSend,
                TokenKind::CapShare,
                TokenKind::CapAny,
            ]
        );
    }
}

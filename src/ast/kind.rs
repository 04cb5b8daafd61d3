//! The closed node-kind enumeration (spec.md section 3, "`kind` — tag from a
//! closed enumeration (≈200 values)"). Partitioned exactly as spec.md 4.1
//! describes: lexical, operator, structural, declaration, type, and
//! synthetic test kinds, plus the `None` placeholder used for omitted
//! optional children (spec.md section 3, "Invariants").
//!
//! Grounded on the token/node vocabulary actually produced by
//! `examples/original_source/src/libponyc/ast/parser.c` (the `TK_*` names
//! referenced by every `DEF`/`AST_NODE`/`TOKEN`/`MAP_ID` call).

/// One node kind. `#[repr(u16)]` so a future backend can pack a node's kind
/// tag densely (spec.md section 9, "tagged-variant or pattern matching on a
/// closed enumeration is the natural representation").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum NodeKind {
    // ---- lexical ----
    Id,
    Int,
    Float,
    StringLit,
    This,
    True,
    False,

    // ---- operator: binary ----
    Plus,
    Minus,
    UnaryMinus,
    Multiply,
    Divide,
    Mod,
    LShift,
    RShift,
    Is,
    Isnt,
    Eq,
    Ne,
    Lt,
    Le,
    Ge,
    Gt,
    And,
    Or,
    Xor,
    As,
    /// Test-only equivalents of `and`/`or` (spec.md 4.2 `test_binop`),
    /// thrown out by syntax normalization.
    IfdefAnd,
    IfdefOr,

    // ---- operator: unary / prefix ----
    Not,
    AddressOf,
    Identity,

    // ---- operator: assignment ----
    Assign,

    // ---- capability leaves (spec.md 4.4 "capability lattice") ----
    Iso,
    Trn,
    Ref,
    Val,
    Box,
    Tag,
    CapRead,
    CapSend,
    CapShare,
    CapAny,
    /// The `^` ephemerality marker following a nominal type.
    Ephemeral,

    // ---- bare marker leaves ----
    /// A bare `?` marking a partial (may-error) signature.
    Question,
    /// The `@` marking a `class_def` as a C-API entity.
    CApi,
    Ellipsis,

    // ---- structural ----
    Seq,
    Flatten,
    Tuple,
    TupleType,
    Members,
    Cases,
    Case,
    Params,
    Param,
    Typeparams,
    Typeparam,
    Typeargs,
    PositionalArgs,
    NamedArgs,
    NamedArg,
    /// Test-only alternate spelling of `NamedArg` (spec.md 4.3,
    /// "synthetic test constructs"; Supplemental Feature 5).
    UpdateArg,
    None,

    // ---- declaration ----
    Module,
    Use,
    UseUri,
    FfiDecl,
    TypeDef,
    Interface,
    Trait,
    Primitive,
    Struct,
    Class,
    Actor,
    Fvar,
    Flet,
    Embed,
    Fun,
    Be,
    New,
    Provides,

    // ---- type ----
    Nominal,
    UnionType,
    IsectType,
    Arrow,
    ThisType,
    BoxType,

    // ---- expressions / terms ----
    Reference,
    Array,
    Object,
    Lambda,
    LambdaCapture,
    LambdaCaptures,
    FfiCall,
    Dot,
    Tilde,
    Qualify,
    Call,
    Let,
    Var,
    If,
    IfDef,
    Match,
    While,
    Repeat,
    For,
    With,
    Try,
    /// Test-only `$TRY_NO_CHECK` spelling of `Try` (spec.md 4.3).
    TryNoCheck,
    Recover,
    Consume,
    /// The `!` borrowed-reference marker following a nominal type, sibling
    /// to `Ephemeral`'s `^`.
    Borrowed,
    Dontcare,
    Return,
    Break,
    Continue,
    Error,
    CompileIntrinsic,
    CompileError,

    // ---- synthetic test kinds (spec.md 4.1 "TEST_*") ----
    TestSeq,
    TestNoSeq,
    TestSeqScope,
    TestIfdefFlag,
    TestPrefixNot,
}

impl NodeKind {
    /// True for the `TK_TEST_*`-equivalent synthetic kinds that must be
    /// stripped by syntax normalization before semantic analysis (spec.md
    /// section 3, "their presence after that pass is a compiler bug").
    /// Mirrors the `AST_FLAG_TEST_ONLY` flag rather than kind alone — most
    /// test-only nodes keep an ordinary kind (`UpdateArg` aside) and are
    /// distinguished purely by the flag, so callers should prefer
    /// `NodeFlags::TEST_ONLY` over this helper; it exists for the kinds that
    /// exist *only* to be test-only.
    pub fn is_inherently_test_only(self) -> bool {
        matches!(
            self,
            NodeKind::TestSeq
                | NodeKind::TestNoSeq
                | NodeKind::TestSeqScope
                | NodeKind::TestIfdefFlag
                | NodeKind::TestPrefixNot
                | NodeKind::UpdateArg
                | NodeKind::TryNoCheck
                | NodeKind::IfdefAnd
                | NodeKind::IfdefOr
        )
    }

    /// Partition membership, for debug assertions and dumps.
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::Module
                | NodeKind::Use
                | NodeKind::UseUri
                | NodeKind::FfiDecl
                | NodeKind::TypeDef
                | NodeKind::Interface
                | NodeKind::Trait
                | NodeKind::Primitive
                | NodeKind::Struct
                | NodeKind::Class
                | NodeKind::Actor
                | NodeKind::Fvar
                | NodeKind::Flet
                | NodeKind::Embed
                | NodeKind::Fun
                | NodeKind::Be
                | NodeKind::New
        )
    }

    pub fn is_type(self) -> bool {
        matches!(
            self,
            NodeKind::Nominal
                | NodeKind::UnionType
                | NodeKind::IsectType
                | NodeKind::TupleType
                | NodeKind::Arrow
                | NodeKind::ThisType
                | NodeKind::BoxType
        )
    }

    /// Entity-declaration kinds that a `nominal` type's `data` back-link may
    /// point to (spec.md section 4.4 `is-entity(kind)`).
    pub fn is_entity_kind(self) -> bool {
        matches!(
            self,
            NodeKind::Interface
                | NodeKind::Trait
                | NodeKind::Primitive
                | NodeKind::Struct
                | NodeKind::Class
                | NodeKind::Actor
                | NodeKind::TypeDef
        )
    }
}

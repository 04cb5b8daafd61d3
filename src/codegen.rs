//! C7: the codegen driver — type layout + trace function emission
//! (spec.md section 4.7).
//!
//! Translated from `examples/original_source/src/libponyc/codegen/gentype.c`
//! (`codegen_struct`, the builtin-numeric short-circuit in `codegen_nominal`)
//! and `examples/original_source/src/libponyc/codegen/gentrace.c`
//! (`trace_as_tag`, `gentrace`, `trace_maybe`, `trace_known`, `trace_tuple`).
//! The actual SSA/LLVM emission is an external collaborator (spec.md section
//! 6, "Backend SSA builder"); this module only decides *which* runtime trace
//! hook a field needs and drives a caller-supplied [`TraceBuilder`] that
//! performs the actual emission, so this crate never depends on a concrete
//! IR type.

use crate::ast::{Arena, NodeId, NodeKind};
use crate::base::{Interner, Symbol};
use crate::error::LayoutError;
use crate::reach::ReachableTypes;
use crate::types::{self, Cap};

/// Mirrors the table in spec.md section 4.7 exactly. `Tag` and the "no
/// generated trace function" fallback for a known class/struct field both
/// emit the same runtime call (`gentrace.c`'s `trace_known` falls back to a
/// bare `pony_trace` when `LLVMGetNamedFunction` finds nothing, which is the
/// identical call `trace_tag` makes) — see [`classify_field_trace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceAction {
    /// Machine word or primitive: no runtime hook is called at all.
    None,
    /// Opaque-pointer trace: a `tag`-capability field, or a class/struct
    /// field whose referent has no generated `$trace` function.
    Tag,
    /// A non-tag class/struct field whose referent has a generated
    /// `$trace` function, named by its mangled type.
    Known(Symbol),
    Actor,
    /// An interface/trait field (runtime descriptor dispatch).
    Unknown,
    /// A union/intersection (or interface/trait) field whose every nominal
    /// leaf is capability `tag`.
    TagOrActor,
    /// A tuple field, traced by calling its own specialized `$trace_tuple`.
    Tuple(Symbol),
    /// `Maybe[T]`: a null test gates tracing the non-null branch as `T`.
    Maybe(Box<TraceAction>),
}

#[derive(Debug, Clone)]
pub struct FieldLayout {
    pub name: Symbol,
    pub ty: NodeId,
    pub trace_action: TraceAction,
}

#[derive(Debug, Clone)]
pub struct StructLayout {
    pub name: Symbol,
    pub fields: Vec<FieldLayout>,
}

/// The result of classifying a reachable type for codegen (spec.md section
/// 4.7, closing paragraph: "Builtin numeric names... short-circuit to
/// backend primitive types without struct layout").
#[derive(Debug, Clone)]
pub enum Layout {
    Struct(StructLayout),
    Primitive,
}

const BUILTIN_NUMERIC: &[&str] = &[
    "I8", "I16", "I32", "I64", "I128", "U8", "U16", "U32", "U64", "U128", "F16", "F32", "F64",
    "Bool",
];

fn is_builtin_numeric(name: &str) -> bool {
    BUILTIN_NUMERIC.contains(&name)
}

/// `trace_as_tag` (`gentrace.c`): folds unions/intersections — the result is
/// tag iff every nominal leaf has capability `tag`. A tuple leaf is never a
/// tag (mirrors the original's `case TK_TUPLETYPE: return false;`).
pub fn classify_trace_as_tag(arena: &Arena, ty: NodeId) -> bool {
    match arena.kind(ty) {
        NodeKind::UnionType | NodeKind::IsectType => {
            arena.children(ty).all(|c| classify_trace_as_tag(arena, c))
        }
        NodeKind::TupleType => false,
        NodeKind::Nominal => types::cap_single(arena, ty) == Cap::Tag,
        other => {
            debug_assert!(false, "classify_trace_as_tag: unexpected type kind {other:?}");
            false
        }
    }
}

fn mangle_type_text(interner: &mut Interner, arena: &Arena, ty: NodeId) -> String {
    match arena.kind(ty) {
        NodeKind::Nominal => {
            let id = arena.child_at(ty, 1).expect("nominal has a name child");
            let name = arena
                .node(id)
                .token
                .as_ref()
                .expect("nominal name leaf has a token")
                .text
                .to_string();
            let targs = arena.child_at(ty, 2);
            match targs {
                Some(t) if arena.kind(t) != NodeKind::None => {
                    let args: Vec<String> = arena
                        .children(t)
                        .collect::<Vec<_>>()
                        .into_iter()
                        .map(|c| mangle_type_text(interner, arena, c))
                        .collect();
                    format!("{name}[{}]", args.join(","))
                }
                _ => name,
            }
        }
        NodeKind::TupleType => {
            let elems: Vec<String> = arena
                .children(ty)
                .collect::<Vec<_>>()
                .into_iter()
                .map(|c| mangle_type_text(interner, arena, c))
                .collect();
            format!("({})", elems.join(","))
        }
        other => unreachable!("mangle_type_text: unexpected type kind {other:?}"),
    }
}

fn mangle_type(interner: &mut Interner, arena: &Arena, ty: NodeId) -> Symbol {
    let text = mangle_type_text(interner, arena, ty);
    interner.intern(&text)
}

/// `gentrace`'s per-field dispatch (spec.md section 4.7 table), minus the
/// union/intersection/tag fold already captured in [`classify_trace_as_tag`].
/// Returns `None` when the field's type cannot be lowered at all (an
/// unresolved nominal), letting the caller attach the field index
/// (Supplemental Feature 8, SPEC_FULL.md section 3 item 8).
fn classify_field_trace(
    arena: &Arena,
    reachable: &ReachableTypes,
    interner: &mut Interner,
    ty: NodeId,
) -> Option<TraceAction> {
    match arena.kind(ty) {
        NodeKind::Nominal => {
            if types::is_machine_word(arena, ty) {
                return Some(TraceAction::None);
            }
            let is_tag = classify_trace_as_tag(arena, ty);
            let def = arena.node(ty).data?;
            match arena.kind(def) {
                NodeKind::Primitive => Some(TraceAction::None),
                NodeKind::Interface | NodeKind::Trait => Some(if is_tag {
                    TraceAction::TagOrActor
                } else {
                    TraceAction::Unknown
                }),
                NodeKind::Actor => {
                    if is_tag {
                        Some(TraceAction::Tag)
                    } else {
                        Some(TraceAction::Actor)
                    }
                }
                NodeKind::Struct | NodeKind::Class => {
                    if types::is_maybe(arena, ty) {
                        // `trace_maybe(c, ctx, value, type, tag)` (gentrace.c):
                        // skips the null test entirely when the element is a
                        // machine word (nothing to trace either way); the
                        // null test otherwise always runs, and the non-null
                        // branch traces as a tag if the Maybe itself is a
                        // tag, otherwise recurses into the element type.
                        let targs = arena.child_at(ty, 2)?;
                        let elem = arena.first_child(targs)?;
                        if types::is_machine_word(arena, elem) {
                            return Some(TraceAction::None);
                        }
                        let inner = if is_tag {
                            TraceAction::Tag
                        } else {
                            classify_field_trace(arena, reachable, interner, elem)?
                        };
                        return Some(TraceAction::Maybe(Box::new(inner)));
                    }
                    if is_tag {
                        return Some(TraceAction::Tag);
                    }
                    let mangled = mangle_type(interner, arena, ty);
                    if reachable.get(mangled).is_some() {
                        Some(TraceAction::Known(mangled))
                    } else {
                        // No generated trace function for this referent
                        // (not reachable as a struct/class/actor): fall
                        // back to the opaque-pointer trace, exactly as
                        // gentrace.c's trace_known does when
                        // LLVMGetNamedFunction returns null.
                        Some(TraceAction::Tag)
                    }
                }
                _ => None,
            }
        }
        NodeKind::UnionType | NodeKind::IsectType => {
            let is_tag = classify_trace_as_tag(arena, ty);
            Some(if is_tag {
                TraceAction::TagOrActor
            } else {
                TraceAction::Unknown
            })
        }
        NodeKind::TupleType => {
            let mangled = mangle_type(interner, arena, ty);
            if reachable.get(mangled).is_some() {
                Some(TraceAction::Tuple(mangled))
            } else {
                // "There will be no trace function if the tuple doesn't
                // need tracing" (gentrace.c trace_tuple).
                Some(TraceAction::None)
            }
        }
        _ => None,
    }
}

fn field_name_and_type(arena: &Arena, field: NodeId) -> Option<(&str, NodeId)> {
    // field reorder (grammar.rs `field`): id, type, value, delegate_type.
    let id = arena.child_at(field, 0)?;
    let name = arena.node(id).token.as_ref()?.text.as_str();
    let ty = arena.child_at(field, 1)?;
    Some((name, ty))
}

/// `codegen_struct` (`gentype.c`): builds a named aggregate's field layout
/// in declaration order. `type_name` must already be a key in `reachable`
/// (the caller is expected to have reached it via C6 first).
pub fn build_struct_layout(
    arena: &Arena,
    reachable: &ReachableTypes,
    interner: &mut Interner,
    type_name: Symbol,
) -> Result<StructLayout, LayoutError> {
    let rtype = reachable
        .get(type_name)
        .unwrap_or_else(|| panic!("build_struct_layout: {type_name:?} is not reachable"));
    let def = arena
        .node(rtype.ty)
        .data
        .unwrap_or_else(|| panic!("build_struct_layout: {type_name:?} has no definition"));
    debug_assert!(
        matches!(
            arena.kind(def),
            NodeKind::Struct | NodeKind::Class | NodeKind::Actor
        ),
        "build_struct_layout: {type_name:?} is not a struct/class/actor"
    );
    // class_def reorder (grammar.rs `class_def`): id type_params cap
    // provides members c_api docstring — members is child index 4.
    let members = arena
        .child_at(def, 4)
        .unwrap_or_else(|| panic!("build_struct_layout: {type_name:?} has no members list"));

    let mut fields = Vec::new();
    for (index, member) in arena.children(members).enumerate() {
        if !matches!(
            arena.kind(member),
            NodeKind::Fvar | NodeKind::Flet | NodeKind::Embed
        ) {
            continue;
        }
        let Some((name, ty)) = field_name_and_type(arena, member) else {
            return Err(LayoutError::UnlowerableField {
                type_name,
                field_index: index,
            });
        };
        let name_sym = interner.intern(name);
        let trace_action = classify_field_trace(arena, reachable, interner, ty).ok_or(
            LayoutError::UnlowerableField {
                type_name,
                field_index: index,
            },
        )?;
        fields.push(FieldLayout {
            name: name_sym,
            ty,
            trace_action,
        });
    }

    Ok(StructLayout {
        name: type_name,
        fields,
    })
}

/// `codegen_nominal`'s builtin-numeric short-circuit plus the
/// struct/primitive dispatch in one entry point: resolves `type_name`'s
/// layout, never building a struct for a builtin numeric or a primitive
/// definition (spec.md section 4.7, closing paragraph).
pub fn classify_layout(
    arena: &Arena,
    reachable: &ReachableTypes,
    interner: &mut Interner,
    type_name: Symbol,
) -> Result<Layout, LayoutError> {
    if is_builtin_numeric(interner.resolve(type_name)) {
        return Ok(Layout::Primitive);
    }
    let Some(rtype) = reachable.get(type_name) else {
        return Ok(Layout::Primitive);
    };
    let Some(def) = arena.node(rtype.ty).data else {
        return Ok(Layout::Primitive);
    };
    match arena.kind(def) {
        NodeKind::Struct | NodeKind::Class | NodeKind::Actor => {
            Ok(Layout::Struct(build_struct_layout(arena, reachable, interner, type_name)?))
        }
        _ => Ok(Layout::Primitive),
    }
}

/// Abstracts the runtime trace ABI (spec.md section 6, "Runtime trace ABI")
/// so this crate never depends on a concrete SSA/IR type. A production
/// driver implements this against its own backend; [`emit_trace_function`]
/// only decides which method to call and in what order.
pub trait TraceBuilder: Sized {
    type Val: Copy;
    type FnRef: Copy;

    /// `runtime.trace(ctx, void*)`.
    fn trace(&mut self, ctx: Self::Val, ptr: Self::Val);
    /// `runtime.trace_tag_or_actor(ctx, object*)`.
    fn trace_tag_or_actor(&mut self, ctx: Self::Val, ptr: Self::Val);
    /// `runtime.trace_actor(ctx, object*)`.
    fn trace_actor(&mut self, ctx: Self::Val, ptr: Self::Val);
    /// `runtime.trace_known(ctx, object*, trace-fn)`.
    fn trace_known(&mut self, ctx: Self::Val, ptr: Self::Val, trace_fn: Self::FnRef);
    /// `runtime.trace_unknown(ctx, object*)`.
    fn trace_unknown(&mut self, ctx: Self::Val, ptr: Self::Val);
    /// Direct call to a tuple's specialized `$trace_tuple` function.
    fn trace_tuple_call(&mut self, ctx: Self::Val, ptr: Self::Val, tuple_trace_fn: Self::FnRef);
    /// Emits a null test on `ptr`, running `inner` only on the non-null
    /// branch (spec.md section 4.7, `Maybe[T]` row).
    fn trace_maybe(&mut self, ctx: Self::Val, ptr: Self::Val, inner: impl FnOnce(&mut Self, Self::Val, Self::Val));
    /// Resolves a mangled type name to its generated `$trace` function, if
    /// one exists (mirrors `LLVMGetNamedFunction` in `gentrace.c`).
    fn lookup_trace_fn(&self, name: Symbol) -> Option<Self::FnRef>;
    /// As `lookup_trace_fn`, for a tuple's `$trace_tuple` function.
    fn lookup_tuple_trace_fn(&self, name: Symbol) -> Option<Self::FnRef>;
}

fn emit_action<B: TraceBuilder>(builder: &mut B, ctx: B::Val, ptr: B::Val, action: &TraceAction) {
    match action {
        TraceAction::None => {}
        TraceAction::Tag => builder.trace(ctx, ptr),
        TraceAction::Known(name) => match builder.lookup_trace_fn(*name) {
            Some(f) => builder.trace_known(ctx, ptr, f),
            None => builder.trace(ctx, ptr),
        },
        TraceAction::Actor => builder.trace_actor(ctx, ptr),
        TraceAction::Unknown => builder.trace_unknown(ctx, ptr),
        TraceAction::TagOrActor => builder.trace_tag_or_actor(ctx, ptr),
        TraceAction::Tuple(name) => {
            if let Some(f) = builder.lookup_tuple_trace_fn(*name) {
                builder.trace_tuple_call(ctx, ptr, f);
            }
        }
        TraceAction::Maybe(inner) => {
            let inner = (**inner).clone();
            builder.trace_maybe(ctx, ptr, move |b, ctx2, ptr2| emit_action(b, ctx2, ptr2, &inner));
        }
    }
}

/// Emits a single `$trace` function's body for `layout`: for each field,
/// `field_ptr` computes the field's pointer (wrapping the external SSA
/// builder's struct-GEP primitive, spec.md section 6) and the matching
/// runtime hook is invoked through `builder`.
pub fn emit_trace_function<B: TraceBuilder>(
    builder: &mut B,
    layout: &StructLayout,
    ctx: B::Val,
    mut field_ptr: impl FnMut(&mut B, usize) -> B::Val,
) {
    for (index, field) in layout.fields.iter().enumerate() {
        if field.trace_action == TraceAction::None {
            continue;
        }
        let ptr = field_ptr(builder, index);
        emit_action(builder, ctx, ptr, &field.trace_action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SourceLoc;
    use crate::token::{Token, TokenKind as TokKind};
    use crate::reach::{NoFfi, ReachEngine};
    use text_size::TextSize;

    fn id_tok(name: &str) -> Token {
        Token {
            kind: TokKind::Id,
            text: name.into(),
            loc: SourceLoc::new(0, 0, TextSize::from(0)),
        }
    }

    fn make_nominal(arena: &mut Arena, name: &str, cap: Option<NodeKind>) -> NodeId {
        let ty = arena.new_node(NodeKind::Nominal);
        let none_pkg = arena.new_none();
        arena.append_child(ty, none_pkg);
        let id = arena.new_leaf(NodeKind::Id, id_tok(name));
        arena.append_child(ty, id);
        let none_targs = arena.new_none();
        arena.append_child(ty, none_targs);
        match cap {
            Some(k) => {
                let c = arena.new_node(k);
                arena.append_child(ty, c);
            }
            None => {
                let none_cap = arena.new_none();
                arena.append_child(ty, none_cap);
            }
        }
        let none_eph = arena.new_none();
        arena.append_child(ty, none_eph);
        ty
    }

    fn make_field(arena: &mut Arena, name: &str, field_ty: NodeId) -> NodeId {
        let field = arena.new_node(NodeKind::Fvar);
        let id = arena.new_leaf(NodeKind::Id, id_tok(name));
        arena.append_child(field, id);
        arena.append_child(field, field_ty);
        let none_value = arena.new_none();
        arena.append_child(field, none_value);
        let none_delegate = arena.new_none();
        arena.append_child(field, none_delegate);
        field
    }

    /// Builds `class Point var x: I32 var y: I32`, reaches it, and checks
    /// both fields trace as no-op machine words (spec.md section 8,
    /// "A struct with only machine-word fields emits a trace that calls no
    /// runtime hook").
    fn make_class_with_fields(
        arena: &mut Arena,
        name: &str,
        fields: Vec<NodeId>,
    ) -> NodeId {
        let def = arena.new_node(NodeKind::Class);
        let id = arena.new_leaf(NodeKind::Id, id_tok(name));
        arena.append_child(def, id); // 0: id
        let none_tp = arena.new_none();
        arena.append_child(def, none_tp); // 1: type_params
        let none_cap = arena.new_none();
        arena.append_child(def, none_cap); // 2: cap
        let none_provides = arena.new_none();
        arena.append_child(def, none_provides); // 3: provides
        let members = arena.new_node(NodeKind::Members);
        for f in fields {
            arena.append_child(members, f);
        }
        arena.append_child(def, members); // 4: members
        let ty = make_nominal(arena, name, None);
        arena.attach_data(ty, def);
        ty
    }

    #[test]
    fn machine_word_fields_trace_to_nothing() {
        let mut arena = Arena::new();
        let mut interner = Interner::new();

        let x_ty = make_nominal(&mut arena, "I32", None);
        let y_ty = make_nominal(&mut arena, "I32", None);
        let x = make_field(&mut arena, "x", x_ty);
        let y = make_field(&mut arena, "y", y_ty);
        let point_ty = make_class_with_fields(&mut arena, "Point", vec![x, y]);

        let mut engine = ReachEngine::new(&mut arena, &mut interner, &NoFfi);
        engine.add_type(point_ty);
        let reachable = engine.types;

        let point_name = interner.intern("Point");
        let layout = build_struct_layout(&arena, &reachable, &mut interner, point_name).unwrap();
        assert_eq!(layout.fields.len(), 2);
        assert!(layout.fields.iter().all(|f| f.trace_action == TraceAction::None));
    }

    #[test]
    fn tag_field_traces_as_tag() {
        let mut arena = Arena::new();
        let mut interner = Interner::new();

        let other_def = arena.new_node(NodeKind::Class);
        let other_ty_field = make_nominal(&mut arena, "Other", Some(NodeKind::Tag));
        arena.attach_data(other_ty_field, other_def);
        let field = make_field(&mut arena, "o", other_ty_field);
        let holder_ty = make_class_with_fields(&mut arena, "Holder", vec![field]);

        let mut engine = ReachEngine::new(&mut arena, &mut interner, &NoFfi);
        engine.add_type(holder_ty);
        let reachable = engine.types;

        let holder_name = interner.intern("Holder");
        let layout = build_struct_layout(&arena, &reachable, &mut interner, holder_name).unwrap();
        assert_eq!(layout.fields[0].trace_action, TraceAction::Tag);
    }

    #[test]
    fn actor_field_traces_as_actor() {
        let mut arena = Arena::new();
        let mut interner = Interner::new();

        let actor_def = arena.new_node(NodeKind::Actor);
        let actor_id = arena.new_leaf(NodeKind::Id, id_tok("Worker"));
        arena.append_child(actor_def, actor_id);
        for _ in 0..3 {
            let n = arena.new_none();
            arena.append_child(actor_def, n);
        }
        let members = arena.new_node(NodeKind::Members);
        arena.append_child(actor_def, members);

        let actor_field_ty = make_nominal(&mut arena, "Worker", None);
        arena.attach_data(actor_field_ty, actor_def);
        let field = make_field(&mut arena, "w", actor_field_ty);
        let holder_ty = make_class_with_fields(&mut arena, "Holder", vec![field]);

        let mut engine = ReachEngine::new(&mut arena, &mut interner, &NoFfi);
        engine.add_type(holder_ty);
        let reachable = engine.types;

        let holder_name = interner.intern("Holder");
        let layout = build_struct_layout(&arena, &reachable, &mut interner, holder_name).unwrap();
        assert_eq!(layout.fields[0].trace_action, TraceAction::Actor);
    }

    #[test]
    fn known_class_field_traces_via_its_own_trace_fn() {
        let mut arena = Arena::new();
        let mut interner = Interner::new();

        let inner_field_ty = make_nominal(&mut arena, "I32", None);
        let inner_field = make_field(&mut arena, "v", inner_field_ty);
        let inner_ty_for_reach = make_class_with_fields(&mut arena, "Inner", vec![inner_field]);

        let inner_field_ty2 = make_nominal(&mut arena, "Inner", None);
        let inner_def = arena.node(inner_ty_for_reach).data.unwrap();
        arena.attach_data(inner_field_ty2, inner_def);
        let holder_field = make_field(&mut arena, "inner", inner_field_ty2);
        let holder_ty = make_class_with_fields(&mut arena, "Holder", vec![holder_field]);

        let mut engine = ReachEngine::new(&mut arena, &mut interner, &NoFfi);
        engine.add_type(inner_ty_for_reach);
        engine.add_type(holder_ty);
        let reachable = engine.types;

        let holder_name = interner.intern("Holder");
        let layout = build_struct_layout(&arena, &reachable, &mut interner, holder_name).unwrap();
        let inner_name = interner.intern("Inner");
        assert_eq!(layout.fields[0].trace_action, TraceAction::Known(inner_name));
    }

    #[test]
    fn maybe_field_wraps_inner_classification() {
        let mut arena = Arena::new();
        let mut interner = Interner::new();

        let elem_def = arena.new_node(NodeKind::Class);
        let elem_ty = make_nominal(&mut arena, "Foo", Some(NodeKind::Tag));
        arena.attach_data(elem_ty, elem_def);
        let targs = arena.new_node(NodeKind::Typeargs);
        arena.append_child(targs, elem_ty);
        let maybe_def = arena.new_node(NodeKind::Class);
        let maybe_field_ty = arena.new_node(NodeKind::Nominal);
        let none_pkg = arena.new_none();
        arena.append_child(maybe_field_ty, none_pkg);
        let maybe_id = arena.new_leaf(NodeKind::Id, id_tok("Maybe"));
        arena.append_child(maybe_field_ty, maybe_id);
        arena.append_child(maybe_field_ty, targs);
        let none_cap = arena.new_none();
        arena.append_child(maybe_field_ty, none_cap);
        let none_eph = arena.new_none();
        arena.append_child(maybe_field_ty, none_eph);
        arena.attach_data(maybe_field_ty, maybe_def);

        let field = make_field(&mut arena, "m", maybe_field_ty);
        let holder_ty = make_class_with_fields(&mut arena, "Holder", vec![field]);

        let mut engine = ReachEngine::new(&mut arena, &mut interner, &NoFfi);
        engine.add_type(holder_ty);
        let reachable = engine.types;

        let holder_name = interner.intern("Holder");
        let layout = build_struct_layout(&arena, &reachable, &mut interner, holder_name).unwrap();
        assert_eq!(
            layout.fields[0].trace_action,
            TraceAction::Maybe(Box::new(TraceAction::Tag))
        );
    }

    #[test]
    fn maybe_of_machine_word_traces_to_nothing() {
        let mut arena = Arena::new();
        let mut interner = Interner::new();

        let elem_ty = make_nominal(&mut arena, "I32", None);
        let targs = arena.new_node(NodeKind::Typeargs);
        arena.append_child(targs, elem_ty);
        let maybe_def = arena.new_node(NodeKind::Class);
        let maybe_field_ty = arena.new_node(NodeKind::Nominal);
        let none_pkg = arena.new_none();
        arena.append_child(maybe_field_ty, none_pkg);
        let maybe_id = arena.new_leaf(NodeKind::Id, id_tok("Maybe"));
        arena.append_child(maybe_field_ty, maybe_id);
        arena.append_child(maybe_field_ty, targs);
        let none_cap = arena.new_none();
        arena.append_child(maybe_field_ty, none_cap);
        let none_eph = arena.new_none();
        arena.append_child(maybe_field_ty, none_eph);
        arena.attach_data(maybe_field_ty, maybe_def);

        let field = make_field(&mut arena, "m", maybe_field_ty);
        let holder_ty = make_class_with_fields(&mut arena, "Holder", vec![field]);

        let mut engine = ReachEngine::new(&mut arena, &mut interner, &NoFfi);
        engine.add_type(holder_ty);
        let reachable = engine.types;

        let holder_name = interner.intern("Holder");
        let layout = build_struct_layout(&arena, &reachable, &mut interner, holder_name).unwrap();
        assert_eq!(layout.fields[0].trace_action, TraceAction::None);
    }

    #[test]
    fn builtin_numeric_names_classify_as_primitive_layout() {
        let arena = Arena::new();
        let mut interner = Interner::new();
        let reachable = ReachableTypes::new();
        let i32_name = interner.intern("I32");
        let layout = classify_layout(&arena, &reachable, &mut interner, i32_name).unwrap();
        assert!(matches!(layout, Layout::Primitive));
    }
}

//! C5: structural type predicates & lookup (spec.md section 4.4).
//!
//! Every predicate here is a pure function of `(&Arena, NodeId)` over a type
//! AST subtree — no mutation, no interning, no diagnostics. Grounded on
//! `examples/original_source/src/libponyc/type/subtype.h` (the function
//! list) and the `add_nominal`/`add_isect_or_union`/`add_tuple` dispatch in
//! `examples/original_source/src/libponyc/reach/reach.c` for how union,
//! intersection and tuple types fold.

use crate::ast::{Arena, NodeId, NodeKind};

/// The capability lattice (spec.md section 4.4, GLOSSARY "Capability").
/// Ordered so `Copy`/`PartialOrd`-style comparisons aren't meaningful —
/// subtyping between capabilities is not a total order, so it's expressed
/// as the explicit [`Cap::subtype_of`] table below rather than derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cap {
    Iso,
    Trn,
    Ref,
    Val,
    Box,
    Tag,
}

impl Cap {
    fn from_kind(kind: NodeKind) -> Option<Cap> {
        match kind {
            NodeKind::Iso => Some(Cap::Iso),
            NodeKind::Trn => Some(Cap::Trn),
            NodeKind::Ref => Some(Cap::Ref),
            NodeKind::Val => Some(Cap::Val),
            NodeKind::Box => Some(Cap::Box),
            NodeKind::Tag => Some(Cap::Tag),
            _ => None,
        }
    }

    /// `sub <: sup`. `tag` is always a valid supertype (it only grants
    /// identity, which every other capability can give up); everything else
    /// follows the standard `iso`/`trn`/`ref`/`val`/`box` readable/writable
    /// lattice. This table is a simplified reconstruction — the spec
    /// explicitly calls the full lattice "standard and not restated here"
    /// (spec.md section 4.4), and `examples/original_source/` did not
    /// retrieve `type/cap.c`; see DESIGN.md Open Question decisions.
    pub fn subtype_of(self, other: Cap) -> bool {
        if other == Cap::Tag {
            return true;
        }
        matches!(
            (self, other),
            (Cap::Iso, Cap::Iso)
                | (Cap::Trn, Cap::Trn | Cap::Val | Cap::Box)
                | (Cap::Val, Cap::Val | Cap::Box)
                | (Cap::Ref, Cap::Ref | Cap::Val | Cap::Box)
                | (Cap::Box, Cap::Box)
                | (Cap::Tag, Cap::Tag)
        )
    }
}

/// A generic capability bound (spec.md GLOSSARY "Generic cap").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenCap {
    Read,
    Send,
    Share,
    Any,
}

impl GenCap {
    fn from_kind(kind: NodeKind) -> Option<GenCap> {
        match kind {
            NodeKind::CapRead => Some(GenCap::Read),
            NodeKind::CapSend => Some(GenCap::Send),
            NodeKind::CapShare => Some(GenCap::Share),
            NodeKind::CapAny => Some(GenCap::Any),
            _ => None,
        }
    }

    /// Which concrete capabilities `self` stands for.
    pub fn includes(self, cap: Cap) -> bool {
        match self {
            GenCap::Any => true,
            GenCap::Read => cap != Cap::Tag,
            GenCap::Send => matches!(cap, Cap::Iso | Cap::Val | Cap::Tag),
            GenCap::Share => matches!(cap, Cap::Val | Cap::Tag),
        }
    }
}

/// `cap-single(t)` (spec.md section 4.4): the effective capability of a
/// nominal type. Absent an explicit cap child, a nominal type defaults to
/// `ref` (the parser's `nominal` production always appends a `NONE`
/// placeholder when no cap/gencap is written, spec.md section 4.3).
pub fn cap_single(arena: &Arena, ty: NodeId) -> Cap {
    debug_assert_eq!(arena.kind(ty), NodeKind::Nominal);
    let cap_child = arena.child_at(ty, 3);
    match cap_child {
        Some(c) => Cap::from_kind(arena.kind(c)).unwrap_or(Cap::Ref),
        None => Cap::Ref,
    }
}

/// The generic-cap bound on a nominal type's cap child, if it wrote one
/// (`#read`/`#send`/`#share`/`#any`) instead of a concrete capability.
pub fn gencap_single(arena: &Arena, ty: NodeId) -> Option<GenCap> {
    debug_assert_eq!(arena.kind(ty), NodeKind::Nominal);
    let cap_child = arena.child_at(ty, 3)?;
    GenCap::from_kind(arena.kind(cap_child))
}

fn nominal_id_text<'a>(arena: &'a Arena, ty: NodeId) -> Option<&'a str> {
    let id = arena.child_at(ty, 1)?;
    arena.node(id).token.as_ref().map(|t| t.text.as_str())
}

/// `is-entity(kind)` (spec.md section 4.4): true if `ty` is a nominal type
/// whose `data` back-link points to a declaration of exactly `kind`.
pub fn is_entity(arena: &Arena, ty: NodeId, kind: NodeKind) -> bool {
    if arena.kind(ty) != NodeKind::Nominal {
        return false;
    }
    match arena.node(ty).data {
        Some(def) => arena.kind(def) == kind,
        None => false,
    }
}

/// `is-known(t)` (spec.md section 4.4): a nominal type whose referent has
/// been resolved to a concrete entity declaration.
pub fn is_known(arena: &Arena, ty: NodeId) -> bool {
    if arena.kind(ty) != NodeKind::Nominal {
        return false;
    }
    match arena.node(ty).data {
        Some(def) => arena.kind(def).is_entity_kind(),
        None => false,
    }
}

/// `is-concrete(t)` (spec.md section 4.4): nominal, known, and not an
/// interface/trait — the definition kinds reachability instantiates structs
/// and trace functions for.
pub fn is_concrete(arena: &Arena, ty: NodeId) -> bool {
    if arena.kind(ty) != NodeKind::Nominal {
        return false;
    }
    match arena.node(ty).data {
        Some(def) => matches!(
            arena.kind(def),
            NodeKind::Primitive | NodeKind::Struct | NodeKind::Class | NodeKind::Actor
        ),
        None => false,
    }
}

fn is_named(arena: &Arena, ty: NodeId, name: &str) -> bool {
    arena.kind(ty) == NodeKind::Nominal && nominal_id_text(arena, ty) == Some(name)
}

/// `is-literal(name)` (spec.md section 4.4): recognize a nominal type by its
/// interned name (spelled as a plain `&str` compare here — the module has
/// no interner of its own, see DESIGN.md).
pub fn is_literal(arena: &Arena, ty: NodeId, name: &str) -> bool {
    is_named(arena, ty, name)
}

const SIGNED_INTS: &[&str] = &["I8", "I16", "I32", "I64", "I128"];
const UNSIGNED_INTS: &[&str] = &["U8", "U16", "U32", "U64", "U128"];
const FLOATS: &[&str] = &["F16", "F32", "F64"];

pub fn is_bool(arena: &Arena, ty: NodeId) -> bool {
    is_named(arena, ty, "Bool")
}

pub fn is_integer(arena: &Arena, ty: NodeId) -> bool {
    let Some(name) = nominal_id_text(arena, ty) else {
        return false;
    };
    SIGNED_INTS.contains(&name) || UNSIGNED_INTS.contains(&name)
}

pub fn is_float(arena: &Arena, ty: NodeId) -> bool {
    let Some(name) = nominal_id_text(arena, ty) else {
        return false;
    };
    FLOATS.contains(&name)
}

pub fn is_signed(arena: &Arena, ty: NodeId) -> bool {
    let Some(name) = nominal_id_text(arena, ty) else {
        return false;
    };
    SIGNED_INTS.contains(&name) || FLOATS.contains(&name)
}

/// `is-machine-word` (spec.md section 4.4): bool, integer, or float — the
/// field types that emit no trace action at all (spec.md section 4.7 table).
pub fn is_machine_word(arena: &Arena, ty: NodeId) -> bool {
    is_bool(arena, ty) || is_integer(arena, ty) || is_float(arena, ty)
}

pub fn is_maybe(arena: &Arena, ty: NodeId) -> bool {
    is_named(arena, ty, "Maybe")
}

pub fn is_pointer(arena: &Arena, ty: NodeId) -> bool {
    is_named(arena, ty, "Pointer")
}

pub fn is_none(arena: &Arena, ty: NodeId) -> bool {
    is_named(arena, ty, "None")
}

pub fn is_env(arena: &Arena, ty: NodeId) -> bool {
    is_named(arena, ty, "Env")
}

/// Entity definitions a nominal type's `provides` clause lists, recursively
/// (interfaces/traits can themselves provide other interfaces/traits).
/// `provides` has a single type child (spec.md 4.3 `provides`); that type
/// may itself be an intersection of several.
fn provided_defs(arena: &Arena, def: NodeId, out: &mut Vec<NodeId>) {
    // class_def reorder order: id, type_params, cap, provides, members,
    // c_api, docstring (grammar.rs `class_def`).
    let Some(provides) = arena.child_at(def, 3) else {
        return;
    };
    if arena.kind(provides) != NodeKind::Provides {
        return;
    }
    let Some(provided_ty) = arena.first_child(provides) else {
        return;
    };
    collect_provided(arena, provided_ty, out);
}

fn collect_provided(arena: &Arena, ty: NodeId, out: &mut Vec<NodeId>) {
    match arena.kind(ty) {
        NodeKind::IsectType => {
            for child in arena.children(ty) {
                collect_provided(arena, child, out);
            }
        }
        NodeKind::Nominal => {
            if let Some(def) = arena.node(ty).data {
                out.push(def);
                provided_defs(arena, def, out);
            }
        }
        _ => {}
    }
}

/// Whether concrete/interface entity `sub_def` transitively provides
/// `sup_def`, by AST-node identity of the defining declarations.
fn provides_transitively(arena: &Arena, sub_def: NodeId, sup_def: NodeId) -> bool {
    if sub_def == sup_def {
        return true;
    }
    let mut provided = Vec::new();
    provided_defs(arena, sub_def, &mut provided);
    provided.contains(&sup_def)
}

/// `is-subtype(a, b)` (spec.md section 4.4): structural rules over nominal
/// definitions, unions/intersections, tuples, and capability subtyping.
pub fn is_subtype(arena: &Arena, a: NodeId, b: NodeId) -> bool {
    match (arena.kind(a), arena.kind(b)) {
        (NodeKind::UnionType, _) => arena.children(a).all(|v| is_subtype(arena, v, b)),
        (_, NodeKind::UnionType) => arena.children(b).any(|v| is_subtype(arena, a, v)),
        (NodeKind::IsectType, _) => arena.children(a).any(|v| is_subtype(arena, v, b)),
        (_, NodeKind::IsectType) => arena.children(b).all(|v| is_subtype(arena, a, v)),
        (NodeKind::TupleType, NodeKind::TupleType) => {
            arena.childcount(a) == arena.childcount(b)
                && arena
                    .children(a)
                    .zip(arena.children(b))
                    .all(|(x, y)| is_subtype(arena, x, y))
        }
        (NodeKind::TupleType, _) | (_, NodeKind::TupleType) => false,
        (NodeKind::ThisType, NodeKind::ThisType) => true,
        (NodeKind::BoxType, NodeKind::BoxType) => true,
        (NodeKind::Nominal, NodeKind::Nominal) => {
            let (Some(a_def), Some(b_def)) = (arena.node(a).data, arena.node(b).data) else {
                return false;
            };
            let defs_compatible = provides_transitively(arena, a_def, b_def);
            if !defs_compatible {
                return false;
            }
            let a_cap = cap_single(arena, a);
            match gencap_single(arena, b) {
                Some(gc) => gc.includes(a_cap),
                None => a_cap.subtype_of(cap_single(arena, b)),
            }
        }
        _ => false,
    }
}

pub fn is_eqtype(arena: &Arena, a: NodeId, b: NodeId) -> bool {
    is_subtype(arena, a, b) && is_subtype(arena, b, a)
}

/// `lookup(type, member-name)` (spec.md section 4.4): walk the member list
/// of the definition (or, for unions/intersections, intersect/union member
/// sets — unions need the member on every variant, intersections on any
/// one) to return the method or field AST.
pub fn lookup(arena: &Arena, ty: NodeId, member_name: &str) -> Option<NodeId> {
    match arena.kind(ty) {
        NodeKind::Nominal => {
            let def = arena.node(ty).data?;
            lookup_in_def(arena, def, member_name)
        }
        NodeKind::UnionType => {
            let all_defined = arena
                .children(ty)
                .all(|variant| lookup(arena, variant, member_name).is_some());
            if !all_defined {
                return None;
            }
            arena
                .children(ty)
                .next()
                .and_then(|first| lookup(arena, first, member_name))
        }
        NodeKind::IsectType => arena.children(ty).find_map(|v| lookup(arena, v, member_name)),
        _ => None,
    }
}

/// `lookup-try`: as `lookup`, but never panics/asserts on an unresolved
/// type — returns `None` instead (spec.md section 4.4).
pub fn lookup_try(arena: &Arena, ty: NodeId, member_name: &str) -> Option<NodeId> {
    lookup(arena, ty, member_name)
}

fn lookup_in_def(arena: &Arena, def: NodeId, member_name: &str) -> Option<NodeId> {
    let members = arena.child_at(def, 4)?;
    for member in arena.children(members) {
        match arena.kind(member) {
            NodeKind::Fvar | NodeKind::Flet | NodeKind::Embed => {
                if field_name(arena, member) == Some(member_name) {
                    return Some(member);
                }
            }
            NodeKind::Fun | NodeKind::Be | NodeKind::New => {
                if method_name(arena, member) == Some(member_name) {
                    return Some(member);
                }
            }
            _ => {}
        }
    }
    None
}

fn field_name<'a>(arena: &'a Arena, field: NodeId) -> Option<&'a str> {
    let id = arena.child_at(field, 0)?;
    arena.node(id).token.as_ref().map(|t| t.text.as_str())
}

/// A method node's name leaf (spec.md section 4.3 `method`'s reorder:
/// `cap id type_params params return_type error body docstring`).
pub fn method_name<'a>(arena: &'a Arena, method: NodeId) -> Option<&'a str> {
    let id = arena.child_at(method, 1)?;
    arena.node(id).token.as_ref().map(|t| t.text.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SourceLoc;
    use crate::token::{Token, TokenKind};
    use text_size::TextSize;

    fn id_tok(name: &str) -> Token {
        Token {
            kind: TokenKind::Id,
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

    #[test]
    fn recognizes_well_known_numeric_names() {
        let mut a = Arena::new();
        let i32_ty = make_nominal(&mut a, "I32", None);
        let bool_ty = make_nominal(&mut a, "Bool", None);
        let f64_ty = make_nominal(&mut a, "F64", None);
        assert!(is_integer(&a, i32_ty));
        assert!(is_signed(&a, i32_ty));
        assert!(is_bool(&a, bool_ty));
        assert!(is_float(&a, f64_ty));
        assert!(is_machine_word(&a, i32_ty));
        assert!(is_machine_word(&a, bool_ty));
        assert!(is_machine_word(&a, f64_ty));
    }

    #[test]
    fn default_cap_is_ref() {
        let mut a = Arena::new();
        let ty = make_nominal(&mut a, "Foo", None);
        assert_eq!(cap_single(&a, ty), Cap::Ref);
    }

    #[test]
    fn explicit_cap_is_read_back() {
        let mut a = Arena::new();
        let ty = make_nominal(&mut a, "Foo", Some(NodeKind::Iso));
        assert_eq!(cap_single(&a, ty), Cap::Iso);
    }

    #[test]
    fn cap_lattice_tag_is_universal_supertype() {
        assert!(Cap::Iso.subtype_of(Cap::Tag));
        assert!(Cap::Val.subtype_of(Cap::Tag));
        assert!(!Cap::Tag.subtype_of(Cap::Ref));
    }

    #[test]
    fn nominal_subtype_requires_same_definition_and_cap() {
        let mut a = Arena::new();
        let def = a.new_node(NodeKind::Class);
        let sub = make_nominal(&mut a, "Foo", Some(NodeKind::Val));
        a.attach_data(sub, def);
        let sup = make_nominal(&mut a, "Foo", Some(NodeKind::Box));
        a.attach_data(sup, def);
        assert!(is_subtype(&a, sub, sup));

        let sup_ref = make_nominal(&mut a, "Foo", Some(NodeKind::Ref));
        a.attach_data(sup_ref, def);
        assert!(!is_subtype(&a, sub, sup_ref));
    }

    #[test]
    fn union_subtype_requires_every_variant() {
        let mut a = Arena::new();
        let def_a = a.new_node(NodeKind::Class);
        let def_b = a.new_node(NodeKind::Class);
        let iface_def = a.new_node(NodeKind::Interface);

        let ta = make_nominal(&mut a, "A", Some(NodeKind::Val));
        a.attach_data(ta, def_a);
        let tb = make_nominal(&mut a, "B", Some(NodeKind::Val));
        a.attach_data(tb, def_b);
        let union = a.new_node(NodeKind::UnionType);
        a.append_child(union, ta);
        a.append_child(union, tb);

        let iface = make_nominal(&mut a, "Printable", Some(NodeKind::Val));
        a.attach_data(iface, iface_def);

        // Neither A nor B provides Printable yet.
        assert!(!is_subtype(&a, union, iface));
    }
}

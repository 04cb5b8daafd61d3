//! C6: the reachability analyzer (spec.md section 4.5).
//!
//! Translated function-for-function from
//! `examples/original_source/src/libponyc/reach/reach.c`: `add_type` /
//! `add_nominal` / `add_tuple` / `add_method` / `add_rmethod` /
//! `add_methods_to_type` / `add_types_to_trait` / `add_traits_to_type` /
//! `add_special` / `reachable_expr` / `reachable_pattern` / `reachable_fun`
//! (here `reachable_method_ref`, to avoid colliding with this module's
//! `reachable_method`) / `reachable_call` / `reachable_ffi` /
//! `reachable_addressof` / `handle_stack` / `reach_primitives`. Keys are
//! `Symbol`s from a single `Interner` (spec.md section 3, "Keys in every
//! map are interned pointers; equality is pointer identity").
//!
//! Reachability never emits a [`crate::error::Diagnostic`] (spec.md section
//! 7): a violated invariant here — an AST shape the semantic passes were
//! supposed to rule out — is a `debug_assert!`/`unreachable!` compiler bug,
//! never a recoverable error.

use crate::ast::{Arena, NodeId, NodeKind};
use crate::base::{Interner, Symbol};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;

/// One concrete method instantiation (spec.md section 3, "Reachable method
/// instance `RM`").
#[derive(Debug, Clone)]
pub struct ReachableMethod {
    pub mangled_name: Symbol,
    pub type_args: Option<NodeId>,
    pub reified_fun: NodeId,
    pub vtable_index: u32,
}

/// All instantiations reached for one method name on one type (spec.md
/// section 3, "Reachable method name `MN`").
#[derive(Debug, Default)]
pub struct ReachableMethodName {
    pub name: Symbol,
    pub instantiations: IndexMap<Symbol, ReachableMethod>,
}

/// One reachable concrete or trait/interface type (spec.md section 3,
/// "Reachable type `T`").
#[derive(Debug)]
pub struct ReachableType {
    pub name: Symbol,
    /// The canonical type AST: capability `REF`, ephemerality `NONE`
    /// (spec.md section 3, "Invariants on reachability").
    pub ty: NodeId,
    pub methods: IndexMap<Symbol, ReachableMethodName>,
    pub subtypes: FxHashSet<Symbol>,
    pub vtable_size: u32,
}

/// The closed reachable-types set, keyed by mangled name (spec.md section
/// 4.5, "Output").
#[derive(Debug, Default)]
pub struct ReachableTypes {
    types: IndexMap<Symbol, ReachableType>,
}

impl ReachableTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: Symbol) -> Option<&ReachableType> {
        self.types.get(&name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &ReachableType)> {
        self.types.iter()
    }

    pub fn method_count(&self, name: Symbol) -> usize {
        self.types
            .get(&name)
            .map(|t| t.methods.values().map(|n| n.instantiations.len()).sum())
            .unwrap_or(0)
    }

    /// True iff `(name, type_args_mangled)` is reachable on `name_on`
    /// (used by the trait-propagation testable property, spec.md section
    /// 8). `type_args_mangled` is the already-mangled instantiation key.
    pub fn has_method(&self, on: Symbol, method_name: Symbol, instantiation: Symbol) -> bool {
        self.types
            .get(&on)
            .and_then(|t| t.methods.get(&method_name))
            .is_some_and(|n| n.instantiations.contains_key(&instantiation))
    }
}

/// Declaration-site override for an FFI call's return type (spec.md
/// section 4.5 step 6, Supplemental Feature 6 in SPEC_FULL.md): a package's
/// `use @foo[T](...)` declarations are an external package/project concern,
/// so the caller supplies a lookup instead of this crate walking package
/// scope itself.
pub trait FfiTable {
    /// Returns the `FfiDecl` AST node for `name`, if one was declared.
    fn lookup(&self, name: &str) -> Option<NodeId>;
}

/// An `FfiTable` with no declarations, for programs/tests with no FFI use.
pub struct NoFfi;
impl FfiTable for NoFfi {
    fn lookup(&self, _name: &str) -> Option<NodeId> {
        None
    }
}

struct PendingMethod {
    type_name: Symbol,
    method_name: Symbol,
    instantiation: Symbol,
}

/// Drives the worklist algorithm (spec.md section 4.5). Owns no AST or
/// interner state itself — both are borrowed for the engine's lifetime, per
/// spec.md section 5 ("single-owner until a synchronization point").
pub struct ReachEngine<'a, F: FfiTable> {
    arena: &'a mut Arena,
    interner: &'a mut Interner,
    ffi: &'a F,
    pub types: ReachableTypes,
    worklist: Vec<PendingMethod>,
}

impl<'a, F: FfiTable> ReachEngine<'a, F> {
    pub fn new(arena: &'a mut Arena, interner: &'a mut Interner, ffi: &'a F) -> Self {
        ReachEngine {
            arena,
            interner,
            ffi,
            types: ReachableTypes::new(),
            worklist: Vec::new(),
        }
    }

    fn sym(&mut self, s: &str) -> Symbol {
        self.interner.intern(s)
    }

    // ---- mangling ----

    fn mangle_type_text(&mut self, ty: NodeId) -> String {
        match self.arena.kind(ty) {
            NodeKind::Nominal => {
                let id = self
                    .arena
                    .child_at(ty, 1)
                    .expect("nominal has a name child");
                let name = self
                    .arena
                    .node(id)
                    .token
                    .as_ref()
                    .expect("nominal name leaf has a token")
                    .text
                    .to_string();
                let targs = self.arena.child_at(ty, 2);
                match targs {
                    Some(t) if self.arena.kind(t) != NodeKind::None => {
                        let args: Vec<String> = self
                            .arena
                            .children(t)
                            .collect::<Vec<_>>()
                            .into_iter()
                            .map(|c| self.mangle_type_text(c))
                            .collect();
                        format!("{name}[{}]", args.join(","))
                    }
                    _ => name,
                }
            }
            NodeKind::TupleType => {
                let elems: Vec<String> = self
                    .arena
                    .children(ty)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .map(|c| self.mangle_type_text(c))
                    .collect();
                format!("({})", elems.join(","))
            }
            other => unreachable!("mangle_type_text called on non-nominal/tuple kind {other:?}"),
        }
    }

    fn mangle_type(&mut self, ty: NodeId) -> Symbol {
        let text = self.mangle_type_text(ty);
        self.sym(&text)
    }

    fn mangle_method(&mut self, base_name: &str, typeargs: Option<NodeId>) -> Symbol {
        let text = match typeargs {
            Some(t) if self.arena.kind(t) != NodeKind::None => {
                let args: Vec<String> = self
                    .arena
                    .children(t)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .map(|c| self.mangle_type_text(c))
                    .collect();
                format!("{base_name}[{}]", args.join(","))
            }
            _ => base_name.to_string(),
        };
        self.sym(&text)
    }

    // ---- canonicalization (cap REF, ephemerality NONE) ----

    /// Rebuilds a type subtree with every nominal's capability forced to
    /// `ref` and ephemerality/borrow markers stripped (spec.md section 3,
    /// "Canonical type stored in `RType.type`...") so `Foo ref`, `Foo val`,
    /// `Foo^`, and bare `Foo` all reach the same [`ReachableType`].
    fn canonicalize_type(&mut self, ty: NodeId) -> NodeId {
        match self.arena.kind(ty) {
            NodeKind::Nominal => {
                let pkg = self.arena.child_at(ty, 0).unwrap();
                let id = self.arena.child_at(ty, 1).unwrap();
                let targs = self.arena.child_at(ty, 2).unwrap();
                let data = self.arena.node(ty).data;

                let new_ty = self.arena.new_node(NodeKind::Nominal);
                let new_pkg = self.clone_verbatim(pkg);
                self.arena.append_child(new_ty, new_pkg);
                let new_id = self.arena.clone_leaf(id);
                self.arena.append_child(new_ty, new_id);

                let new_targs = if self.arena.kind(targs) == NodeKind::None {
                    self.arena.new_none()
                } else {
                    let node = self.arena.new_node(NodeKind::Typeargs);
                    let children: Vec<NodeId> = self.arena.children(targs).collect();
                    for c in children {
                        let cc = self.canonicalize_type(c);
                        self.arena.append_child(node, cc);
                    }
                    node
                };
                self.arena.append_child(new_ty, new_targs);
                let cap_none = self.arena.new_none();
                self.arena.append_child(new_ty, cap_none);
                let eph_none = self.arena.new_none();
                self.arena.append_child(new_ty, eph_none);
                if let Some(d) = data {
                    self.arena.attach_data(new_ty, d);
                }
                new_ty
            }
            NodeKind::TupleType => {
                let new_ty = self.arena.new_node(NodeKind::TupleType);
                let children: Vec<NodeId> = self.arena.children(ty).collect();
                for c in children {
                    let cc = self.canonicalize_type(c);
                    self.arena.append_child(new_ty, cc);
                }
                new_ty
            }
            _ => self.clone_verbatim(ty),
        }
    }

    fn clone_verbatim(&mut self, id: NodeId) -> NodeId {
        let new_id = self.arena.clone_leaf(id);
        let children: Vec<NodeId> = self.arena.children(id).collect();
        for c in children {
            let cc = self.clone_verbatim(c);
            self.arena.append_child(new_id, cc);
        }
        new_id
    }

    // ---- reification ----

    /// `reify`: clone `body`, substituting any bare (unqualified,
    /// type-argument-less) nominal reference to one of `typeparam_names`
    /// with a clone of the corresponding entry in `typeargs` (spec.md
    /// section 4.5 step 5, "reify the method... using its own type
    /// parameters vs. given type arguments").
    fn reify(&mut self, body: NodeId, typeparam_names: &[Symbol], typeargs: &[NodeId]) -> NodeId {
        if self.arena.kind(body) == NodeKind::Nominal {
            let pkg = self.arena.child_at(body, 0).unwrap();
            let targs = self.arena.child_at(body, 2).unwrap();
            if self.arena.kind(pkg) == NodeKind::None && self.arena.kind(targs) == NodeKind::None {
                if let Some(id_leaf) = self.arena.child_at(body, 1) {
                    if let Some(tok) = self.arena.node(id_leaf).token.clone() {
                        let hit = typeparam_names
                            .iter()
                            .position(|s| self.interner.resolve(*s) == tok.text.as_str());
                        if let Some(i) = hit {
                            if let Some(&replacement) = typeargs.get(i) {
                                return self.clone_verbatim(replacement);
                            }
                        }
                    }
                }
            }
        }

        let new_id = self.arena.clone_leaf(body);
        let children: Vec<NodeId> = self.arena.children(body).collect();
        for c in children {
            let cc = self.reify(c, typeparam_names, typeargs);
            self.arena.append_child(new_id, cc);
        }
        new_id
    }

    fn typeparam_names_of(&mut self, def: NodeId) -> Vec<Symbol> {
        // class_def / method reorder both put the type-parameter list
        // directly after the name; callers pass the right child in.
        if self.arena.kind(def) == NodeKind::None {
            return Vec::new();
        }
        self.arena
            .children(def)
            .collect::<Vec<_>>()
            .into_iter()
            .filter_map(|tp| {
                let id = self.arena.child_at(tp, 0)?;
                let text = self.arena.node(id).token.as_ref()?.text.to_string();
                Some(self.sym(&text))
            })
            .collect()
    }

    fn typeargs_list(&self, typeargs: Option<NodeId>) -> Vec<NodeId> {
        match typeargs {
            Some(t) if self.arena.kind(t) != NodeKind::None => self.arena.children(t).collect(),
            _ => Vec::new(),
        }
    }

    // ---- add_type family ----

    /// `add_type` (spec.md section 4.5 step 4). `pub(crate)` rather than
    /// private so other core modules (e.g. `frontcore::codegen`'s tests,
    /// which need a reachable type with no method reached on it yet) can
    /// seed a [`ReachableTypes`] set directly instead of going through
    /// [`Self::reach`].
    pub(crate) fn add_type(&mut self, ty: NodeId) -> Option<Symbol> {
        match self.arena.kind(ty) {
            NodeKind::UnionType | NodeKind::IsectType => {
                let children: Vec<NodeId> = self.arena.children(ty).collect();
                for c in children {
                    self.add_type(c);
                }
                None
            }
            NodeKind::TupleType => Some(self.add_tuple(ty)),
            NodeKind::Nominal => Some(self.add_nominal(ty)),
            other => {
                debug_assert!(false, "add_type: unexpected type kind {other:?}");
                None
            }
        }
    }

    fn add_reachable_type(&mut self, ty: NodeId, name: Symbol) -> Symbol {
        let canonical = self.canonicalize_type(ty);
        self.types.types.insert(
            name,
            ReachableType {
                name,
                ty: canonical,
                methods: IndexMap::new(),
                subtypes: FxHashSet::default(),
                vtable_size: 0,
            },
        );
        name
    }

    fn add_tuple(&mut self, ty: NodeId) -> Symbol {
        let name = self.mangle_type(ty);
        if self.types.types.contains_key(&name) {
            return name;
        }
        self.add_reachable_type(ty, name);
        let children: Vec<NodeId> = self.arena.children(ty).collect();
        for c in children {
            self.add_type(c);
        }
        name
    }

    fn add_nominal(&mut self, ty: NodeId) -> Symbol {
        let name = self.mangle_type(ty);
        if self.types.types.contains_key(&name) {
            return name;
        }
        self.add_reachable_type(ty, name);

        let targs = self.arena.child_at(ty, 2);
        for arg in self.typeargs_list(targs) {
            self.add_type(arg);
        }

        let Some(def) = self.arena.node(ty).data else {
            return name;
        };
        match self.arena.kind(def) {
            NodeKind::Interface | NodeKind::Trait => self.add_types_to_trait(name),
            NodeKind::Primitive => {
                self.add_traits_to_type(name);
                self.add_special(name, ty, "_init");
                self.add_special(name, ty, "_final");
            }
            NodeKind::Struct | NodeKind::Class => {
                self.add_traits_to_type(name);
                self.add_special(name, ty, "_final");
            }
            NodeKind::Actor => {
                self.add_traits_to_type(name);
                self.add_special(name, ty, "_event_notify");
                self.add_special(name, ty, "_final");
            }
            _ => {}
        }
        name
    }

    fn add_special(&mut self, t: Symbol, ty: NodeId, special: &str) {
        if crate::types::lookup_try(self.arena, ty, special).is_some() {
            self.add_method(t, special, None);
        }
    }

    /// `add_types_to_trait`: `t` is a newly reachable interface/trait; link
    /// every already-reachable concrete type that is one of its subtypes,
    /// both ways, and propagate `t`'s already-reached methods onto them
    /// (spec.md section 4.6).
    fn add_types_to_trait(&mut self, t: Symbol) {
        let t_ty = self.types.types[&t].ty;
        let candidates: Vec<Symbol> = self.types.types.keys().copied().collect();
        for t2 in candidates {
            if t2 == t {
                continue;
            }
            let t2_ty = self.types.types[&t2].ty;
            if self.arena.kind(t2_ty) == NodeKind::TupleType {
                continue;
            }
            let Some(def2) = self.arena.node(t2_ty).data else {
                continue;
            };
            let is_concrete_kind = matches!(
                self.arena.kind(def2),
                NodeKind::Primitive | NodeKind::Class | NodeKind::Actor
            );
            if !is_concrete_kind {
                continue;
            }
            if crate::types::is_subtype(self.arena, t2_ty, t_ty) {
                self.types.types.get_mut(&t).unwrap().subtypes.insert(t2);
                self.types.types.get_mut(&t2).unwrap().subtypes.insert(t);
                self.add_methods_to_type(t, t2);
            }
        }
    }

    /// `add_traits_to_type`: `t` is a newly reachable concrete type; link
    /// every already-reachable interface/trait it implements, both ways,
    /// and pick up that trait's already-reached methods (spec.md section
    /// 4.6).
    fn add_traits_to_type(&mut self, t: Symbol) {
        let t_ty = self.types.types[&t].ty;
        let candidates: Vec<Symbol> = self.types.types.keys().copied().collect();
        for t2 in candidates {
            if t2 == t {
                continue;
            }
            let t2_ty = self.types.types[&t2].ty;
            if self.arena.kind(t2_ty) == NodeKind::TupleType {
                continue;
            }
            let Some(def2) = self.arena.node(t2_ty).data else {
                continue;
            };
            if !matches!(self.arena.kind(def2), NodeKind::Interface | NodeKind::Trait) {
                continue;
            }
            if crate::types::is_subtype(self.arena, t_ty, t2_ty) {
                self.types.types.get_mut(&t).unwrap().subtypes.insert(t2);
                self.types.types.get_mut(&t2).unwrap().subtypes.insert(t);
                self.add_methods_to_type(t2, t);
            }
        }
    }

    /// Copies every `(name, type_args)` already reached on `from` onto
    /// `to` (spec.md section 4.6 "copy every already-reached method").
    fn add_methods_to_type(&mut self, from: Symbol, to: Symbol) {
        let entries: Vec<(Symbol, Option<NodeId>)> = self.types.types[&from]
            .methods
            .values()
            .flat_map(|n| {
                n.instantiations
                    .values()
                    .map(|m| (n.name, m.type_args))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (name_sym, typeargs) in entries {
            let name_text = self.interner.resolve(name_sym).to_string();
            self.add_method(to, &name_text, typeargs);
        }
    }

    // ---- add_method / add_rmethod ----

    fn add_method(&mut self, t: Symbol, name: &str, typeargs: Option<NodeId>) {
        let name_sym = self.sym(name);
        self.types
            .types
            .get_mut(&t)
            .unwrap()
            .methods
            .entry(name_sym)
            .or_insert_with(|| ReachableMethodName {
                name: name_sym,
                instantiations: IndexMap::new(),
            });

        self.add_rmethod(t, name_sym, name, typeargs);

        let t_ty = self.types.types[&t].ty;
        let Some(def) = self.arena.node(t_ty).data else {
            return;
        };
        if matches!(self.arena.kind(def), NodeKind::Interface | NodeKind::Trait) {
            let subtypes: Vec<Symbol> = self.types.types[&t].subtypes.iter().copied().collect();
            for t2 in subtypes {
                self.add_method(t2, name, typeargs);
            }
        }
    }

    fn add_rmethod(&mut self, t: Symbol, name_sym: Symbol, name: &str, typeargs: Option<NodeId>) {
        let mangled = self.mangle_method(name, typeargs);
        if self.types.types[&t].methods[&name_sym]
            .instantiations
            .contains_key(&mangled)
        {
            return;
        }

        let t_ty = self.types.types[&t].ty;
        let Some(fun) = crate::types::lookup(self.arena, t_ty, name) else {
            // Well-typed programs always resolve a reached method name;
            // an unresolved lookup here means the semantic-pass
            // collaborator didn't hold up its contract (spec.md section 6).
            debug_assert!(false, "reach: method {name} not found on reached type");
            return;
        };

        let reified_fun = match typeargs {
            Some(t) if self.arena.kind(t) != NodeKind::None => {
                // method reorder: cap id type_params params return_type
                // error body docstring (grammar.rs `method`).
                let typeparams_node = self.arena.child_at(fun, 2).unwrap();
                let tp_names = self.typeparam_names_of(typeparams_node);
                let ta_list = self.typeargs_list(Some(t));
                self.reify(fun, &tp_names, &ta_list)
            }
            _ => self.clone_verbatim(fun),
        };

        let method = ReachableMethod {
            mangled_name: mangled,
            type_args: typeargs,
            reified_fun,
            vtable_index: u32::MAX,
        };
        self.types
            .types
            .get_mut(&t)
            .unwrap()
            .methods
            .get_mut(&name_sym)
            .unwrap()
            .instantiations
            .insert(mangled, method);

        self.worklist.push(PendingMethod {
            type_name: t,
            method_name: name_sym,
            instantiation: mangled,
        });
    }

    // ---- reachable_method (type-directed dispatch) ----

    /// `reachable_method` in `reach.c`: resolves `name` on `ty`, adding the
    /// owning type and, for unions/intersections, every variant that
    /// actually defines `name`.
    fn reachable_method(&mut self, ty: NodeId, name: &str, typeargs: Option<NodeId>) {
        match self.arena.kind(ty) {
            NodeKind::Nominal => {
                let Some(t) = self.add_type(ty) else {
                    debug_assert!(false, "add_type on a nominal type must produce an RType");
                    return;
                };
                self.add_method(t, name, typeargs);
            }
            NodeKind::UnionType | NodeKind::IsectType => {
                let children: Vec<NodeId> = self.arena.children(ty).collect();
                for child in children {
                    if crate::types::lookup_try(self.arena, child, name).is_some() {
                        self.reachable_method(child, name, typeargs);
                    }
                }
            }
            other => {
                debug_assert!(false, "reachable_method: unexpected type kind {other:?}");
            }
        }
    }

    // ---- worklist drain ----

    fn handle_stack(&mut self) {
        while let Some(pending) = self.worklist.pop() {
            tracing::debug!(
                type_name = ?pending.type_name,
                method = ?pending.method_name,
                instantiation = ?pending.instantiation,
                "reachability worklist pop"
            );
            let reified_fun = self.types.types[&pending.type_name].methods[&pending.method_name]
                .instantiations[&pending.instantiation]
                .reified_fun;
            // method reorder: cap id type_params params return_type error
            // body docstring — body is child index 6.
            if let Some(body) = self.arena.child_at(reified_fun, 6) {
                self.reachable_expr(body);
            }
        }
    }

    fn reachable_expr(&mut self, ast: NodeId) {
        match self.arena.kind(ast) {
            NodeKind::True | NodeKind::False | NodeKind::Int | NodeKind::Float | NodeKind::StringLit => {
                if let Some(ty) = self.arena.node(ast).ty {
                    self.reachable_method(ty, "create", None);
                }
            }
            NodeKind::Case => {
                let pattern = self.arena.child_at(ast, 0);
                let guard = self.arena.child_at(ast, 1);
                let body = self.arena.child_at(ast, 2);
                if let Some(p) = pattern {
                    self.reachable_pattern(p);
                }
                if let Some(g) = guard {
                    self.reachable_expr(g);
                }
                if let Some(b) = body {
                    self.reachable_expr(b);
                }
                return; // children already covered explicitly, as in reach.c
            }
            NodeKind::Call => self.reachable_call(ast),
            NodeKind::FfiCall => self.reachable_ffi(ast),
            NodeKind::AddressOf => self.reachable_addressof(ast),
            _ => {}
        }

        let children: Vec<NodeId> = self.arena.children(ast).collect();
        for c in children {
            self.reachable_expr(c);
        }
    }

    fn reachable_pattern(&mut self, ast: NodeId) {
        match self.arena.kind(ast) {
            NodeKind::Dontcare | NodeKind::None => {}
            NodeKind::Var | NodeKind::Let => {
                if let Some(ty) = self.arena.child_at(ast, 1) {
                    self.add_type(ty);
                }
            }
            NodeKind::Tuple | NodeKind::Seq => {
                let children: Vec<NodeId> = self.arena.children(ast).collect();
                for c in children {
                    self.reachable_pattern(c);
                }
            }
            _ => {
                if let Some(ty) = self.arena.node(ast).ty {
                    self.reachable_method(ty, "eq", None);
                }
                self.reachable_expr(ast);
            }
        }
    }

    /// `reachable_fun`: digs through a postfix method-reference node
    /// (spec.md section 9 Open Question — resolved here as a
    /// `debug_assert!`-guarded exhaustive match over the four kinds the
    /// original names, matching spec.md section 7 "assume a well-typed AST
    /// and assert otherwise").
    ///
    /// A qualified (typeargs-bearing) method reference is a `Qualify` node
    /// whose child 0 is the underlying `Dot`/`Tilde` and child 1 is the
    /// `Typeargs` (grammar.rs `qualify`); dig through it first. Either way
    /// the innermost `Dot`/`Tilde` node's own child 0 is the receiver
    /// *expression* (whose `.ty` is what's dispatched on) and child 1 is
    /// the method-name leaf — not the `Qualify`/`Dot` node's own `.ty`,
    /// which is never assigned.
    fn reachable_method_ref(&mut self, ast: NodeId) {
        let (dot_like, typeargs) = if self.arena.kind(ast) == NodeKind::Qualify {
            (self.arena.child_at(ast, 0), self.arena.child_at(ast, 1))
        } else {
            (Some(ast), None)
        };
        let Some(dot_like) = dot_like else {
            debug_assert!(false, "reachable_fun: qualify node missing underlying reference");
            return;
        };

        let receiver = self.arena.child_at(dot_like, 0);
        let method_name_node = self.arena.child_at(dot_like, 1);
        let (Some(receiver), Some(method_name_node)) = (receiver, method_name_node) else {
            debug_assert!(false, "reachable_fun: postfix node missing receiver/method");
            return;
        };

        let Some(ty) = self.arena.node(receiver).ty else {
            debug_assert!(false, "reachable_fun: receiver has no resolved type");
            return;
        };
        let Some(name) = self
            .arena
            .node(method_name_node)
            .token
            .as_ref()
            .map(|t| t.text.to_string())
        else {
            return;
        };
        self.reachable_method(ty, &name, typeargs);
    }

    fn reachable_addressof(&mut self, ast: NodeId) {
        let Some(expr) = self.arena.first_child(ast) else {
            return;
        };
        if matches!(self.arena.kind(expr), NodeKind::Dot | NodeKind::Qualify) {
            self.reachable_method_ref(expr);
        }
    }

    fn reachable_call(&mut self, ast: NodeId) {
        // call reorder (grammar.rs `call`): positional, named, receiver.
        if let Some(receiver) = self.arena.child_at(ast, 2) {
            self.reachable_method_ref(receiver);
        }
    }

    fn reachable_ffi(&mut self, ast: NodeId) {
        let name_node = self.arena.child_at(ast, 0);
        let mut return_typeargs = self.arena.child_at(ast, 1);

        if let Some(name_node) = name_node {
            if let Some(tok) = self.arena.node(name_node).token.clone() {
                if let Some(decl) = self.ffi.lookup(tok.text.as_str()) {
                    return_typeargs = self.arena.child_at(decl, 1);
                }
            }
        }

        if let Some(rt) = return_typeargs {
            if let Some(ret_ty) = self.arena.first_child(rt) {
                self.add_type(ret_ty);
            }
        }
    }

    // ---- public entry points ----

    /// `reach(type, method-name, type-args)` (spec.md section 4.5, step 2).
    pub fn reach(&mut self, ty: NodeId, method_name: &str, typeargs: Option<NodeId>) {
        self.reachable_method(ty, method_name, typeargs);
        self.handle_stack();
    }

    /// `reach_primitives`: seeds the worklist with the builtin numeric/bool
    /// types, matching `reach.c`'s exact list (`F16` is *not* seeded —
    /// Supplemental Feature in SPEC_FULL.md section 3). `resolve` stands in
    /// for `type_builtin`: package/stdlib resolution is an external
    /// collaborator (spec.md section 1), so the caller supplies a lookup
    /// from builtin name to its nominal type AST.
    pub fn reach_primitives(&mut self, resolve: impl Fn(&str) -> Option<NodeId>) {
        const NAMES: &[&str] = &[
            "Bool", "I8", "I16", "I32", "I64", "I128", "U8", "U16", "U32", "U64", "U128", "F32",
            "F64",
        ];
        for name in NAMES {
            if let Some(ty) = resolve(name) {
                self.add_type(ty);
            }
        }
        self.handle_stack();
    }
}

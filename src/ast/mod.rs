//! C2: the AST node model (spec.md section 4.1).
//!
//! An arena owns every [`Node`]; tree edges (`parent`/`first_child`/
//! `next_sibling`) and the non-owning back-references (`data`/`ty`/`scope`)
//! are all [`NodeId`] indices into that arena, per spec.md section 9's
//! "ownership strategy" design note (arena + index, rather than the
//! parent/child/sibling ownership cycle a naive pointer tree would create).

mod kind;

pub use kind::NodeKind;

use crate::base::Symbol;
use crate::token::Token;
use bitflags::bitflags;
use indexmap::IndexMap;
use std::num::NonZeroU32;

bitflags! {
    /// Node flag bitset (spec.md section 3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// Node was parsed inside an explicit parenthesized group.
        const IN_PARENS    = 0b0000_0001;
        /// An explicit `;` was followed by a newline (discouraged style).
        const BAD_SEMI     = 0b0000_0010;
        /// Two expressions appeared on the same physical line with no `;`.
        const MISSING_SEMI = 0b0000_0100;
        /// Produced by a synthetic `TEST_*` grammar production; must be
        /// removed by syntax normalization before semantic analysis.
        const TEST_ONLY    = 0b0000_1000;
        /// Must survive normalization even if otherwise empty (spec.md
        /// 4.3 `lambda`'s `SET_CHILD_FLAG` on 4 children).
        const PRESERVE     = 0b0001_0000;
    }
}

/// A 1-based index into an [`Arena`]. `NonZeroU32`-backed so
/// `Option<NodeId>` is pointer-sized (spec.md section 9 ownership strategy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    fn from_index(index: usize) -> Self {
        NodeId(NonZeroU32::new((index as u32) + 1).expect("arena index overflow"))
    }

    fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// A scope-bearing node's bindings (spec.md section 3, "`scope` — optional
/// symbol-table"). Resolution order/shadowing is an external semantic-pass
/// concern (spec.md section 1); this only stores what a later pass put here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(NonZeroU32);

#[derive(Debug, Default)]
pub struct ScopeTable {
    pub parent: Option<ScopeId>,
    pub bindings: IndexMap<Symbol, NodeId>,
}

/// One AST node. See spec.md section 3 for the field-by-field contract.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub token: Option<Token>,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub flags: NodeFlags,
    /// Back-reference to the defining declaration of a name (filled in by
    /// the semantic-pass collaborator, spec.md section 6).
    pub data: Option<NodeId>,
    /// Back-reference to the canonicalized type of an expression node.
    pub ty: Option<NodeId>,
    pub scope: Option<ScopeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            token: None,
            parent: None,
            first_child: None,
            next_sibling: None,
            flags: NodeFlags::empty(),
            data: None,
            ty: None,
            scope: None,
        }
    }
}

/// Owns every [`Node`] allocated while parsing one package (spec.md section
/// 3, "Lifecycle": "AST nodes are allocated from an arena owned by the
/// package being compiled; they live until the package is discarded").
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
    scopes: Vec<ScopeTable>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// `new(kind)` (spec.md section 4.1): create an empty node of the given
    /// kind with no children, no token, no flags.
    pub fn new_node(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        NodeId::from_index(self.nodes.len() - 1)
    }

    pub fn new_leaf(&mut self, kind: NodeKind, token: Token) -> NodeId {
        let id = self.new_node(kind);
        self.nodes[id.to_index()].token = Some(token);
        id
    }

    /// The `NONE` placeholder used in place of an omitted optional child
    /// (spec.md section 3, "missing optional children are represented by a
    /// distinguished `NONE` placeholder rather than omission").
    pub fn new_none(&mut self) -> NodeId {
        self.new_node(NodeKind::None)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.to_index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.to_index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    /// Retag a node's kind in place, used by `MAP_ID` (spec.md section 4.2).
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.node_mut(id).kind = kind;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// `childcount` (spec.md section 4.1).
    pub fn childcount(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// `child-at(i)` (spec.md section 4.1): indexed access into the
    /// ordered child list. Order is semantically significant (spec.md
    /// section 3, "Invariants").
    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).nth(index)
    }

    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            arena: self,
            next: self.first_child(id),
        }
    }

    /// `append-child`: add `child` as the new last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        match self.last_child(parent) {
            Some(last) => self.node_mut(last).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
    }

    /// `prepend-child`: add `child` as the new first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        let old_first = self.node(parent).first_child;
        self.node_mut(child).next_sibling = old_first;
        self.node_mut(parent).first_child = Some(child);
    }

    fn last_child(&self, parent: NodeId) -> Option<NodeId> {
        self.children(parent).last()
    }

    /// `replace`: swap the subtree at `old` for `new` in `old`'s parent's
    /// child list, preserving `new`'s own children.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        let parent = self.node(old).parent;
        let next = self.node(old).next_sibling;
        self.node_mut(new).parent = parent;
        self.node_mut(new).next_sibling = next;

        if let Some(parent) = parent {
            if self.node(parent).first_child == Some(old) {
                self.node_mut(parent).first_child = Some(new);
            } else {
                let mut cur = self.node(parent).first_child;
                while let Some(c) = cur {
                    if self.node(c).next_sibling == Some(old) {
                        self.node_mut(c).next_sibling = Some(new);
                        break;
                    }
                    cur = self.node(c).next_sibling;
                }
            }
        }
    }

    /// `swap`: exchange the positions of two sibling or unrelated subtrees.
    pub fn swap(&mut self, a: NodeId, b: NodeId) {
        let a_parent = self.node(a).parent;
        let a_next = self.node(a).next_sibling;
        let b_parent = self.node(b).parent;
        let b_next = self.node(b).next_sibling;

        self.relink(a_parent, a, b);
        self.relink(b_parent, b, a);

        self.node_mut(a).parent = b_parent;
        self.node_mut(a).next_sibling = b_next;
        self.node_mut(b).parent = a_parent;
        self.node_mut(b).next_sibling = a_next;
    }

    fn relink(&mut self, parent: Option<NodeId>, old: NodeId, new: NodeId) {
        let Some(parent) = parent else { return };
        if self.node(parent).first_child == Some(old) {
            self.node_mut(parent).first_child = Some(new);
            return;
        }
        let mut cur = self.node(parent).first_child;
        while let Some(c) = cur {
            if self.node(c).next_sibling == Some(old) {
                self.node_mut(c).next_sibling = Some(new);
                break;
            }
            cur = self.node(c).next_sibling;
        }
    }

    pub fn set_flag(&mut self, id: NodeId, flag: NodeFlags) {
        self.node_mut(id).flags.insert(flag);
    }

    pub fn clear_flag(&mut self, id: NodeId, flag: NodeFlags) {
        self.node_mut(id).flags.remove(flag);
    }

    pub fn has_flag(&self, id: NodeId, flag: NodeFlags) -> bool {
        self.node(id).flags.contains(flag)
    }

    /// Clone a single node's kind/token/flags/`data`/`ty` into a fresh,
    /// childless node. Used by reachability (C6) to build reified method
    /// bodies and canonical type subtrees (spec.md section 4.5, "store a
    /// clone of the reified AST") without walking children itself — callers
    /// that need a full subtree clone drive the recursion and call this per
    /// node (see `frontcore::reach::clone_subtree`).
    pub fn clone_leaf(&mut self, id: NodeId) -> NodeId {
        let kind = self.node(id).kind;
        let token = self.node(id).token.clone();
        let flags = self.node(id).flags;
        let data = self.node(id).data;
        let ty = self.node(id).ty;
        let new_id = self.new_node(kind);
        let new_node = self.node_mut(new_id);
        new_node.token = token;
        new_node.flags = flags;
        new_node.data = data;
        new_node.ty = ty;
        new_id
    }

    pub fn attach_data(&mut self, id: NodeId, data: NodeId) {
        self.node_mut(id).data = Some(data);
    }

    pub fn attach_type(&mut self, id: NodeId, ty: NodeId) {
        self.node_mut(id).ty = Some(ty);
    }

    pub fn attach_scope(&mut self, id: NodeId, scope: ScopeId) {
        self.node_mut(id).scope = Some(scope);
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(ScopeTable {
            parent,
            bindings: IndexMap::new(),
        });
        ScopeId(NonZeroU32::new(self.scopes.len() as u32).unwrap())
    }

    pub fn scope(&self, id: ScopeId) -> &ScopeTable {
        &self.scopes[(id.0.get() - 1) as usize]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut ScopeTable {
        &mut self.scopes[(id.0.get() - 1) as usize]
    }

    /// `reorder(perm)` (spec.md section 4.1): rebuild `parent`'s child list
    /// in the order given by `perm`, a permutation of the current children's
    /// positions. The grammar uses this to canonicalize production output
    /// (e.g. `ifdef`'s `{cond, then, else, else-cond}` regardless of source
    /// order) so later passes see a stable positional schema.
    pub fn reorder(&mut self, parent: NodeId, perm: &[usize]) {
        let children: Vec<NodeId> = self.children(parent).collect();
        debug_assert_eq!(
            children.len(),
            perm.len(),
            "reorder permutation length must match child count"
        );
        let reordered: Vec<NodeId> = perm.iter().map(|&i| children[i]).collect();

        self.node_mut(parent).first_child = None;
        for (i, &child) in reordered.iter().enumerate() {
            self.node_mut(child).parent = Some(parent);
            self.node_mut(child).next_sibling = reordered.get(i + 1).copied();
        }
        self.node_mut(parent).first_child = reordered.first().copied();
    }

    /// Recursively discard a subtree. The arena's own `Drop` already frees
    /// all nodes when the package is discarded (spec.md section 3,
    /// "Lifecycle"); this exists so `RESTART` recovery can discard a
    /// partially built subtree without waiting for arena teardown (spec.md
    /// section 9, mirroring `ast_free` being called explicitly mid-parse).
    /// `data`/`type`/`scope` back-references are not followed: they do not
    /// own their targets (spec.md section 3).
    pub fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(child) = self.node(n).first_child {
                stack.push(child);
            }
            if let Some(sib) = self.node(n).next_sibling {
                stack.push(sib);
            }
            self.node_mut(n).first_child = None;
            self.node_mut(n).next_sibling = None;
        }
    }
}

pub struct ChildIter<'a> {
    arena: &'a Arena,
    next: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.arena.sibling(cur);
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SourceLoc;
    use crate::token::TokenKind;
    use text_size::TextSize;

    fn tok(kind: TokenKind) -> Token {
        Token {
            kind,
            text: "x".into(),
            loc: SourceLoc::new(0, 0, TextSize::from(0)),
        }
    }

    #[test]
    fn append_child_builds_ordered_list() {
        let mut a = Arena::new();
        let parent = a.new_node(NodeKind::Seq);
        let c1 = a.new_leaf(NodeKind::Id, tok(TokenKind::Id));
        let c2 = a.new_leaf(NodeKind::Int, tok(TokenKind::Int));
        a.append_child(parent, c1);
        a.append_child(parent, c2);
        assert_eq!(a.childcount(parent), 2);
        assert_eq!(a.child_at(parent, 0), Some(c1));
        assert_eq!(a.child_at(parent, 1), Some(c2));
        assert_eq!(a.parent(c1), Some(parent));
    }

    #[test]
    fn prepend_child_inserts_at_front() {
        let mut a = Arena::new();
        let parent = a.new_node(NodeKind::Seq);
        let c1 = a.new_node(NodeKind::Id);
        let c2 = a.new_node(NodeKind::Int);
        a.append_child(parent, c1);
        a.prepend_child(parent, c2);
        assert_eq!(a.child_at(parent, 0), Some(c2));
        assert_eq!(a.child_at(parent, 1), Some(c1));
    }

    #[test]
    fn reorder_permutes_children_and_preserves_parent_links() {
        let mut a = Arena::new();
        let parent = a.new_node(NodeKind::IfDef);
        let cond = a.new_node(NodeKind::Id);
        let then_ = a.new_node(NodeKind::Seq);
        let else_ = a.new_node(NodeKind::None);
        let else_cond = a.new_node(NodeKind::None);
        for c in [cond, then_, else_, else_cond] {
            a.append_child(parent, c);
        }
        // condition then_clause else_clause else_condition -> 0,2,3,1 in the
        // source ponyc ifdef/elseifdef REORDER call.
        a.reorder(parent, &[0, 2, 3, 1]);
        assert_eq!(a.child_at(parent, 0), Some(cond));
        assert_eq!(a.child_at(parent, 1), Some(else_));
        assert_eq!(a.child_at(parent, 2), Some(else_cond));
        assert_eq!(a.child_at(parent, 3), Some(then_));
        assert_eq!(a.parent(else_), Some(parent));
    }

    #[test]
    fn flags_are_independent_bits() {
        let mut a = Arena::new();
        let n = a.new_node(NodeKind::Seq);
        a.set_flag(n, NodeFlags::BAD_SEMI);
        assert!(a.has_flag(n, NodeFlags::BAD_SEMI));
        assert!(!a.has_flag(n, NodeFlags::MISSING_SEMI));
        a.set_flag(n, NodeFlags::MISSING_SEMI);
        a.clear_flag(n, NodeFlags::BAD_SEMI);
        assert!(!a.has_flag(n, NodeFlags::BAD_SEMI));
        assert!(a.has_flag(n, NodeFlags::MISSING_SEMI));
    }

    #[test]
    fn swap_exchanges_two_children() {
        let mut a = Arena::new();
        let parent = a.new_node(NodeKind::Seq);
        let c1 = a.new_node(NodeKind::Id);
        let c2 = a.new_node(NodeKind::Int);
        let c3 = a.new_node(NodeKind::Float);
        for c in [c1, c2, c3] {
            a.append_child(parent, c);
        }
        a.swap(c1, c3);
        assert_eq!(a.child_at(parent, 0), Some(c3));
        assert_eq!(a.child_at(parent, 2), Some(c1));
    }

    #[test]
    fn none_placeholder_is_distinguished_kind() {
        let mut a = Arena::new();
        let none = a.new_none();
        assert_eq!(a.kind(none), NodeKind::None);
    }
}

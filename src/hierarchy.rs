//! Bounded relationship graph construction over the project index.
//!
//! Builds a [`GraphNode`] tree rooted at one symbol, expanding up to
//! `max_depth` levels in one or two independent directions: callers/callees
//! for call hierarchies, overrides/base-chain for override hierarchies. One
//! visited set per direction guarantees each symbol is expanded at most once
//! per direction, which bounds traversal to the number of distinct reachable
//! symbols even on cyclic or diamond-shaped call graphs.

use std::collections::VecDeque;

use ahash::AHashSet;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{CodeNavError, Result};
use crate::index::ProjectIndex;
use crate::schema::{classify_relation, RelationKind, SymbolKind, SymbolRef};

/// System ceiling on requested traversal depth.
pub const MAX_DEPTH_CEILING: usize = 32;

/// Which side(s) of the relationship to expand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
    Both,
}

impl Direction {
    pub fn wants_incoming(self) -> bool {
        matches!(self, Direction::Incoming | Direction::Both)
    }

    pub fn wants_outgoing(self) -> bool {
        matches!(self, Direction::Outgoing | Direction::Both)
    }
}

#[derive(Debug, Clone)]
pub struct HierarchyOptions {
    pub max_depth: usize,
    pub direction: Direction,
    /// Keep edges into dependency symbols even when they match nothing in the
    /// allow-list. External nodes are never expanded either way.
    pub include_external: bool,
    /// Display-name fragments of external symbols worth keeping regardless of
    /// `include_external` (well-known execution/persistence entry points).
    pub external_allowlist: Vec<String>,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            direction: Direction::Both,
            include_external: false,
            external_allowlist: Vec::new(),
        }
    }
}

/// One element of a relationship graph
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub symbol: SymbolRef,

    /// Callers, or overriding/implementing members
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub incoming: Vec<GraphNode>,

    /// Callees, or the overridden base chain
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outgoing: Vec<GraphNode>,

    /// Depth bound hit, or the symbol was already expanded elsewhere
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_truncated: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_external: bool,

    /// Recovered through the derived-type fallback rather than a direct
    /// implementation lookup
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_relation_derived: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationKind>,
}

impl GraphNode {
    pub fn new(symbol: SymbolRef) -> Self {
        let is_external = symbol.is_external;
        Self {
            symbol,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            is_truncated: false,
            is_external,
            is_relation_derived: false,
            relation: None,
        }
    }
}

/// Builds call and override hierarchies for one root symbol.
///
/// Holds no mutable state of its own: visited sets are created per build call,
/// so a builder is reusable and the traversal stays reentrant.
pub struct HierarchyBuilder<'a> {
    index: &'a dyn ProjectIndex,
    options: HierarchyOptions,
    cancel: CancellationToken,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(
        index: &'a dyn ProjectIndex,
        options: HierarchyOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self { index, options, cancel }
    }

    /// Callers (incoming) and callees (outgoing) of `root`, to the configured
    /// depth.
    pub fn build_call_hierarchy(&self, root: SymbolRef) -> Result<GraphNode> {
        let mut node = GraphNode::new(root);

        if self.options.direction.wants_incoming() {
            let mut visited = AHashSet::new();
            visited.insert(node.symbol.id.clone());
            self.expand_callers(&mut node, self.options.max_depth, &mut visited)?;
        }

        if self.options.direction.wants_outgoing() {
            let mut visited = AHashSet::new();
            visited.insert(node.symbol.id.clone());
            self.expand_callees(&mut node, self.options.max_depth, &mut visited)?;
        }

        Ok(node)
    }

    /// Overriding/implementing members (incoming) and the overridden base
    /// chain (outgoing) of `root`.
    pub fn build_override_hierarchy(&self, root: SymbolRef) -> Result<GraphNode> {
        let mut node = GraphNode::new(root);

        if self.options.direction.wants_incoming() {
            let mut visited = AHashSet::new();
            visited.insert(node.symbol.id.clone());
            self.expand_overrides(&mut node, self.options.max_depth, &mut visited)?;
        }

        if self.options.direction.wants_outgoing() {
            let mut visited = AHashSet::new();
            visited.insert(node.symbol.id.clone());
            self.walk_base_chain(&mut node, &mut visited)?;
        }

        Ok(node)
    }

    fn expand_callers(
        &self,
        node: &mut GraphNode,
        remaining_depth: usize,
        visited: &mut AHashSet<String>,
    ) -> Result<()> {
        self.checkpoint()?;
        if remaining_depth == 0 {
            node.is_truncated = true;
            return Ok(());
        }

        for caller in self.callers_of(&node.symbol)? {
            let mut child = GraphNode::new(caller);
            child.relation = Some(RelationKind::Call);
            if visited.insert(child.symbol.id.clone()) {
                self.expand_callers(&mut child, remaining_depth - 1, visited)?;
            } else {
                // Already expanded under an earlier parent; keep the node as a
                // leaf so the edge stays visible.
                child.is_truncated = true;
            }
            node.incoming.push(child);
        }
        Ok(())
    }

    fn expand_callees(
        &self,
        node: &mut GraphNode,
        remaining_depth: usize,
        visited: &mut AHashSet<String>,
    ) -> Result<()> {
        self.checkpoint()?;
        if remaining_depth == 0 {
            node.is_truncated = true;
            return Ok(());
        }

        for callee in self.callees_of(&node.symbol)? {
            let mut child = GraphNode::new(callee);
            child.relation = Some(RelationKind::Call);
            if child.is_external {
                // Dependency symbols are terminal: their call graphs are
                // unbounded from the project's point of view.
                visited.insert(child.symbol.id.clone());
            } else if visited.insert(child.symbol.id.clone()) {
                self.expand_callees(&mut child, remaining_depth - 1, visited)?;
            } else {
                child.is_truncated = true;
            }
            node.outgoing.push(child);
        }
        Ok(())
    }

    fn expand_overrides(
        &self,
        node: &mut GraphNode,
        remaining_depth: usize,
        visited: &mut AHashSet<String>,
    ) -> Result<()> {
        self.checkpoint()?;
        if remaining_depth == 0 {
            node.is_truncated = true;
            return Ok(());
        }

        let mut members = self.index.find_implementations(&node.symbol)?;
        let mut relation_derived = false;

        // Direct lookup misses overrides of abstract (non-interface) members
        // in some indexes; recover them by scanning derived types for a
        // same-named member that overrides this one.
        if members.is_empty()
            && node.symbol.modifiers.is_abstract
            && node.symbol.kind != SymbolKind::Interface
        {
            members = self.derived_member_overrides(&node.symbol)?;
            relation_derived = true;
        }

        for member in dedup_and_sort(members) {
            let mut child = GraphNode::new(member);
            child.relation = Some(classify_relation(&child.symbol, &node.symbol));
            child.is_relation_derived = relation_derived;
            if visited.insert(child.symbol.id.clone()) {
                self.expand_overrides(&mut child, remaining_depth - 1, visited)?;
            } else {
                child.is_truncated = true;
            }
            node.incoming.push(child);
        }
        Ok(())
    }

    /// Linear walk over "overridden member" pointers. Override chains are
    /// acyclic in a sound type system; the visited set is kept anyway so a
    /// corrupt index cannot hang the walk.
    fn walk_base_chain(
        &self,
        node: &mut GraphNode,
        visited: &mut AHashSet<String>,
    ) -> Result<()> {
        self.checkpoint()?;
        let base = match self.index.overridden_member(&node.symbol)? {
            Some(base) => base,
            None => return Ok(()),
        };
        if !visited.insert(base.id.clone()) {
            return Ok(());
        }

        let mut child = GraphNode::new(base);
        child.relation = Some(RelationKind::BaseDefinition);
        self.walk_base_chain(&mut child, visited)?;
        node.outgoing.push(child);
        Ok(())
    }

    /// Resolve each reference site to its enclosing declaration. Sites with no
    /// resolvable declaration are skipped, not errors.
    fn callers_of(&self, symbol: &SymbolRef) -> Result<Vec<SymbolRef>> {
        let sites = self.index.find_references(symbol)?;
        let mut callers = Vec::new();
        for site in sites {
            self.checkpoint()?;
            if let Some(decl) = self
                .index
                .resolve_enclosing_declaration(&site.document, site.span)?
            {
                callers.push(decl);
            }
        }
        Ok(dedup_and_sort(callers))
    }

    fn callees_of(&self, symbol: &SymbolRef) -> Result<Vec<SymbolRef>> {
        self.checkpoint()?;
        let callees = self.index.callees_of(symbol)?;
        let kept = callees
            .into_iter()
            .filter(|c| self.keep_outgoing_edge(c))
            .collect();
        Ok(dedup_and_sort(kept))
    }

    fn keep_outgoing_edge(&self, callee: &SymbolRef) -> bool {
        if !callee.is_external {
            return true;
        }
        if self.options.include_external {
            return true;
        }
        let display = callee.display();
        self.options
            .external_allowlist
            .iter()
            .any(|entry| display.contains(entry.as_str()))
    }

    fn derived_member_overrides(&self, member: &SymbolRef) -> Result<Vec<SymbolRef>> {
        let declaring_type = match self.declaring_type_of(member)? {
            Some(ty) => ty,
            None => return Ok(Vec::new()),
        };

        let mut found = Vec::new();
        for ty in self.index.find_derived_types(&declaring_type, true)? {
            self.checkpoint()?;
            if let Some(candidate) = self.index.member_named(&ty, &member.name)? {
                if self.overrides_member(&candidate, member)? {
                    found.push(candidate);
                }
            }
        }
        Ok(found)
    }

    fn declaring_type_of(&self, member: &SymbolRef) -> Result<Option<SymbolRef>> {
        if member.container.is_empty() {
            return Ok(None);
        }
        let candidates = self.index.find_symbols_named(&member.container)?;
        Ok(candidates.into_iter().find(|s| s.kind.is_type_like()))
    }

    /// Walk the candidate's override chain looking for `base`. Falls back to
    /// the override modifier when the index has no chain for the candidate.
    fn overrides_member(&self, candidate: &SymbolRef, base: &SymbolRef) -> Result<bool> {
        let mut guard = AHashSet::new();
        let mut current = candidate.clone();
        while let Some(overridden) = self.index.overridden_member(&current)? {
            if overridden.id == base.id {
                return Ok(true);
            }
            if !guard.insert(overridden.id.clone()) {
                break;
            }
            current = overridden;
        }
        Ok(candidate.modifiers.is_override && candidate.name == base.name)
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(CodeNavError::Cancelled);
        }
        Ok(())
    }
}

/// De-duplicate by display identity (first wins) and order deterministically:
/// declared symbols by source position, locationless last by display name.
fn dedup_and_sort(symbols: Vec<SymbolRef>) -> Vec<SymbolRef> {
    let mut seen = AHashSet::new();
    let mut out: Vec<SymbolRef> = symbols
        .into_iter()
        .filter(|s| seen.insert(s.display()))
        .collect();
    out.sort_by(|a, b| match (&a.location, &b.location) {
        (Some(la), Some(lb)) => (&la.file, la.line, la.column, a.display())
            .cmp(&(&lb.file, lb.line, lb.column, b.display())),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.display().cmp(&b.display()),
    });
    out
}

/// Breadth-first flattening of a graph over both directions.
///
/// One global visited set keyed by symbol id, so an element reachable as both
/// a caller and a callee is counted once. Order is the shaping order: the
/// reducer keeps a prefix of exactly this sequence.
pub fn flatten(root: &GraphNode) -> Vec<&GraphNode> {
    let mut seen: AHashSet<&str> = AHashSet::new();
    let mut queue: VecDeque<&GraphNode> = VecDeque::new();
    let mut out = Vec::new();

    seen.insert(root.symbol.id.as_str());
    queue.push_back(root);

    while let Some(node) = queue.pop_front() {
        out.push(node);
        for child in node.incoming.iter().chain(node.outgoing.iter()) {
            if seen.insert(child.symbol.id.as_str()) {
                queue.push_back(child);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Modifiers;

    fn leaf(id: &str) -> GraphNode {
        GraphNode::new(SymbolRef {
            id: id.to_string(),
            name: id.to_string(),
            container: String::new(),
            kind: SymbolKind::Function,
            modifiers: Modifiers::default(),
            is_external: false,
            location: None,
        })
    }

    #[test]
    fn flatten_counts_shared_nodes_once() {
        // root has "shared" both as caller and callee
        let mut root = leaf("root");
        root.incoming.push(leaf("shared"));
        root.outgoing.push(leaf("shared"));
        root.outgoing.push(leaf("other"));

        let flat = flatten(&root);
        let ids: Vec<&str> = flat.iter().map(|n| n.symbol.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "shared", "other"]);
    }

    #[test]
    fn flatten_is_breadth_first() {
        let mut a = leaf("a");
        let mut b = leaf("b");
        b.incoming.push(leaf("d"));
        a.incoming.push(b);
        a.incoming.push(leaf("c"));

        let ids: Vec<String> = flatten(&a)
            .iter()
            .map(|n| n.symbol.id.clone())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }
}

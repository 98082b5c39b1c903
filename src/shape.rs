//! Result shaping: budget estimation, reduction, overflow capture, envelopes.
//!
//! Every tool runs its full result through here before returning it. Flat
//! results keep a budget-sized prefix; hierarchy results additionally have
//! their tree pruned so only nodes that survived reduction stay reachable
//! from the root. When anything is cut, the untruncated result goes to the
//! overflow store and the envelope carries the overflow id plus a notice.

use ahash::AHashSet;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::CodeNavError;
use crate::estimate::graph_node_cost;
use crate::hierarchy::{flatten, GraphNode};
use crate::overflow::OverflowStore;
use crate::reduce::{reduce_to_budget, TruncationDecision};

/// Shaping knobs for one tool invocation
#[derive(Debug, Clone)]
pub struct ShapePolicy {
    /// Hard safety budget in cost units
    pub budget: usize,
    /// Fixed envelope overhead
    pub base_cost: usize,
    /// Caller-requested maximum item count
    pub requested_max: usize,
    /// Descending candidate sizes for the reduction search
    pub steps: Vec<usize>,
    /// Page size of the overflow record written on truncation
    pub page_size: usize,
}

/// Response envelope common to every tool
#[derive(Debug, Serialize)]
pub struct ToolEnvelope {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub total_found: usize,
    pub returned: usize,
    pub truncated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow_id: Option<String>,

    /// Advisory list; a truncation notice is always its first entry when
    /// truncation occurred.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ToolEnvelope {
    pub fn error(err: &CodeNavError) -> Self {
        Self {
            success: false,
            message: Some(err.to_string()),
            total_found: 0,
            returned: 0,
            truncated: false,
            overflow_id: None,
            notices: err.recovery_hints().iter().map(|s| s.to_string()).collect(),
            items: None,
            tree: None,
            error_code: err.error_code().map(str::to_string),
        }
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Shape a flat result list: reduce, capture overflow, emit the envelope.
pub fn shape_list<T: Serialize>(
    label: &str,
    items: &[T],
    per_item: impl Fn(&T) -> usize,
    policy: &ShapePolicy,
    store: &OverflowStore,
) -> ToolEnvelope {
    let mut decision = reduce_to_budget(
        items,
        &per_item,
        policy.base_cost,
        policy.requested_max,
        policy.budget,
        &policy.steps,
    );

    let mut notices = Vec::new();
    if decision.was_truncated {
        let full: Vec<Value> = items.iter().map(to_json_value).collect();
        let id = store.store(label, full, policy.page_size);
        notices.push(truncation_notice(label, &decision, &id, policy.page_size));
        decision.overflow_id = Some(id);
    }

    let returned: Vec<Value> = items[..decision.returned_count]
        .iter()
        .map(to_json_value)
        .collect();

    ToolEnvelope {
        success: true,
        message: None,
        total_found: decision.total_count,
        returned: decision.returned_count,
        truncated: decision.was_truncated,
        overflow_id: decision.overflow_id.clone(),
        notices,
        items: Some(Value::Array(returned)),
        tree: None,
        error_code: None,
    }
}

/// Shape a hierarchy result: reduce over the breadth-first flattening, then
/// prune the tree structure to the kept set.
pub fn shape_tree(
    label: &str,
    root: &GraphNode,
    policy: &ShapePolicy,
    store: &OverflowStore,
) -> ToolEnvelope {
    let flat = flatten(root);
    let mut decision = reduce_to_budget(
        &flat,
        |n| graph_node_cost(n),
        policy.base_cost,
        policy.requested_max,
        policy.budget,
        &policy.steps,
    );

    let mut notices = Vec::new();
    if decision.was_truncated {
        let full: Vec<Value> = flat.iter().map(|n| node_entry(n)).collect();
        let id = store.store(label, full, policy.page_size);
        notices.push(truncation_notice(label, &decision, &id, policy.page_size));
        decision.overflow_id = Some(id);
    }

    let kept: AHashSet<&str> = flat[..decision.returned_count]
        .iter()
        .map(|n| n.symbol.id.as_str())
        .collect();
    let pruned = prune_tree(root, &kept);

    ToolEnvelope {
        success: true,
        message: None,
        total_found: decision.total_count,
        returned: decision.returned_count,
        truncated: decision.was_truncated,
        overflow_id: decision.overflow_id.clone(),
        notices,
        items: None,
        tree: serde_json::to_value(&pruned).ok(),
        error_code: None,
    }
}

/// Keep only nodes whose id is in `kept` and whose whole ancestor chain also
/// survived; the root always survives. Dropping a child marks the parent
/// truncated so the reader can tell the structure was cut.
pub fn prune_tree(root: &GraphNode, kept: &AHashSet<&str>) -> GraphNode {
    fn prune_children(children: &[GraphNode], kept: &AHashSet<&str>) -> (Vec<GraphNode>, bool) {
        let mut out = Vec::new();
        let mut dropped = false;
        for child in children {
            if kept.contains(child.symbol.id.as_str()) {
                out.push(prune_node(child, kept));
            } else {
                dropped = true;
            }
        }
        (out, dropped)
    }

    fn prune_node(node: &GraphNode, kept: &AHashSet<&str>) -> GraphNode {
        let (incoming, dropped_in) = prune_children(&node.incoming, kept);
        let (outgoing, dropped_out) = prune_children(&node.outgoing, kept);
        GraphNode {
            symbol: node.symbol.clone(),
            incoming,
            outgoing,
            is_truncated: node.is_truncated || dropped_in || dropped_out,
            is_external: node.is_external,
            is_relation_derived: node.is_relation_derived,
            relation: node.relation,
        }
    }

    prune_node(root, kept)
}

/// Flat per-node view used for overflow records and counting; children are
/// intentionally absent so a stored graph does not duplicate subtrees.
fn node_entry(node: &GraphNode) -> Value {
    json!({
        "symbol": to_json_value(&node.symbol),
        "relation": node.relation,
        "is_truncated": node.is_truncated,
        "is_external": node.is_external,
        "is_relation_derived": node.is_relation_derived,
    })
}

fn truncation_notice(
    label: &str,
    decision: &TruncationDecision,
    overflow_id: &str,
    page_size: usize,
) -> String {
    let pages = decision.total_count.div_ceil(page_size);
    format!(
        "Truncated: showing {} of {} {}. The full result is stored as overflow {} ({} page(s) of up to {} items); retrieve it with get_overflow_page.",
        decision.returned_count, decision.total_count, label, overflow_id, pages, page_size
    )
}

fn to_json_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Modifiers, SymbolKind, SymbolRef};

    fn node(id: &str) -> GraphNode {
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
    fn pruned_tree_keeps_ancestor_chains_closed() {
        let mut root = node("root");
        let mut a = node("a");
        a.incoming.push(node("deep"));
        root.incoming.push(a);
        root.incoming.push(node("b"));

        // "deep" kept but its parent "a" is not: both must disappear
        let kept: AHashSet<&str> = ["root", "b", "deep"].into_iter().collect();
        let pruned = prune_tree(&root, &kept);

        assert_eq!(pruned.incoming.len(), 1);
        assert_eq!(pruned.incoming[0].symbol.id, "b");
        assert!(pruned.is_truncated);
    }

    #[test]
    fn pruning_preserves_surviving_structure() {
        let mut root = node("root");
        let mut a = node("a");
        a.incoming.push(node("deep"));
        root.incoming.push(a);

        let kept: AHashSet<&str> = ["root", "a", "deep"].into_iter().collect();
        let pruned = prune_tree(&root, &kept);

        assert_eq!(pruned.incoming.len(), 1);
        assert_eq!(pruned.incoming[0].incoming.len(), 1);
        assert_eq!(pruned.incoming[0].incoming[0].symbol.id, "deep");
        assert!(!pruned.is_truncated);
    }
}

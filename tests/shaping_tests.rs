//! Result shaping tests: estimator/reducer behavior over real traversals,
//! tree pruning consistency, and overflow capture of truncated graphs.

mod common;

use ahash::AHashSet;
use codenav_engine::estimate::{estimate_cost, graph_node_cost};
use codenav_engine::hierarchy::{flatten, Direction, GraphNode, HierarchyBuilder, HierarchyOptions};
use codenav_engine::overflow::OverflowStore;
use codenav_engine::reduce::DEFAULT_REDUCTION_STEPS;
use codenav_engine::shape::{prune_tree, shape_list, shape_tree, ShapePolicy};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use common::{fanout_index, sym};

fn policy(budget: usize, requested_max: usize) -> ShapePolicy {
    ShapePolicy {
        budget,
        base_cost: 500,
        requested_max,
        steps: DEFAULT_REDUCTION_STEPS.to_vec(),
        page_size: 100,
    }
}

fn caller_graph(n: u32, depth: usize) -> GraphNode {
    let index = fanout_index(n);
    let options = HierarchyOptions {
        max_depth: depth,
        direction: Direction::Incoming,
        include_external: false,
        external_allowlist: Vec::new(),
    };
    let builder = HierarchyBuilder::new(&index, options, CancellationToken::new());
    builder.build_call_hierarchy(sym(&index, "target")).unwrap()
}

// ============================================================================
// Estimator over Real Graphs
// ============================================================================

#[test]
fn graph_estimate_grows_with_prefix_length() {
    let root = caller_graph(30, 3);
    let flat = flatten(&root);

    let mut last = 0;
    for n in 0..=flat.len() {
        let cost = estimate_cost(&flat[..n], |node| graph_node_cost(node), 500);
        assert!(cost >= last);
        last = cost;
    }
}

// ============================================================================
// Tree Shaping
// ============================================================================

#[test]
fn fitting_graph_passes_through_unreduced() {
    let root = caller_graph(12, 3);
    let store = OverflowStore::default();
    let envelope = shape_tree("callers", &root, &policy(1_000_000, 100), &store);

    assert!(envelope.success);
    assert_eq!(envelope.total_found, 13); // root + 12 callers
    assert_eq!(envelope.returned, 13);
    assert!(!envelope.truncated);
    assert!(envelope.overflow_id.is_none());
    assert!(store.is_empty());
}

#[test]
fn oversized_graph_is_reduced_and_stored() {
    let root = caller_graph(80, 3);
    let store = OverflowStore::default();
    let envelope = shape_tree("callers", &root, &policy(2_000, 100), &store);

    assert!(envelope.truncated);
    assert!(envelope.returned < envelope.total_found);
    assert_eq!(envelope.total_found, 81);

    let id = envelope.overflow_id.expect("truncated response carries an id");
    assert_eq!(
        envelope.notices.len(),
        1,
        "truncation notice leads the advisory list"
    );
    assert!(envelope.notices[0].contains(&id));

    // The stored record replays the full flattened graph in order.
    let page1 = store.page(&id, 1).unwrap();
    assert_eq!(page1.total_items, 81);
}

#[test]
fn pruned_tree_only_contains_returned_nodes() {
    let root = caller_graph(80, 3);
    let store = OverflowStore::default();
    let envelope = shape_tree("callers", &root, &policy(2_000, 100), &store);

    let tree = envelope.tree.expect("hierarchy envelope carries a tree");
    let node_count = count_nodes(&tree);
    assert_eq!(node_count, envelope.returned);
    assert!(
        tree.get("is_truncated").and_then(Value::as_bool).unwrap_or(false),
        "root reports its pruned children"
    );
}

fn count_nodes(tree: &Value) -> usize {
    let mut count = 1;
    for side in ["incoming", "outgoing"] {
        if let Some(Value::Array(children)) = tree.get(side) {
            count += children.iter().map(count_nodes).sum::<usize>();
        }
    }
    count
}

#[test]
fn pruning_keeps_ancestor_chains_closed_under_arbitrary_kept_sets() {
    let root = caller_graph(5, 3);
    let flat = flatten(&root);

    // Keep root and every second node of the flattening.
    let kept: AHashSet<&str> = flat
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 2 == 0)
        .map(|(_, n)| n.symbol.id.as_str())
        .collect();
    let pruned = prune_tree(&root, &kept);

    // Every node present in the pruned tree must itself be kept, and since
    // presence implies its parent was visited, ancestor chains are closed.
    assert_all_kept(&pruned, &kept);
}

fn assert_all_kept(node: &GraphNode, kept: &AHashSet<&str>) {
    for child in node.incoming.iter().chain(node.outgoing.iter()) {
        assert!(kept.contains(child.symbol.id.as_str()));
        assert_all_kept(child, kept);
    }
}

// ============================================================================
// List Shaping
// ============================================================================

#[test]
fn list_shaping_respects_requested_max_before_budget() {
    let items: Vec<u32> = (0..250).collect();
    let store = OverflowStore::default();
    let envelope = shape_list("numbers", &items, |_| 1, &policy(1_000_000, 40), &store);

    assert_eq!(envelope.returned, 40);
    assert_eq!(envelope.total_found, 250);
    assert!(envelope.truncated);

    let id = envelope.overflow_id.unwrap();
    let page = store.page(&id, 3).unwrap();
    assert_eq!(page.items.len(), 50, "pages 1-2 hold 100 each, page 3 the rest");
}

#[test]
fn returned_items_are_a_prefix_of_the_full_sequence() {
    let items: Vec<u32> = (0..250).collect();
    let store = OverflowStore::default();
    let envelope = shape_list("numbers", &items, |_| 1, &policy(1_000_000, 40), &store);

    let returned = match envelope.items {
        Some(Value::Array(values)) => values,
        other => panic!("expected items array, got {:?}", other),
    };
    let as_numbers: Vec<u64> = returned.iter().filter_map(Value::as_u64).collect();
    let expected: Vec<u64> = (0..40).collect();
    assert_eq!(as_numbers, expected);
}

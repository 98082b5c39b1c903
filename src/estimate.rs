//! Serializer-free size estimation for tool results.
//!
//! Every tool estimates the cost of its result set before returning it, so
//! estimation has to be cheap enough to run on every response and must never
//! require an actual serializer. Costs are abstract units roughly tracking
//! serialized characters.

use crate::hierarchy::GraphNode;
use crate::schema::{Diagnostic, ReferenceSite, TextEdit};

/// Fixed envelope overhead charged once per response.
pub const BASE_RESPONSE_COST: usize = 500;

/// Structural overhead per item: punctuation, field names, flags.
const ITEM_OVERHEAD: usize = 40;

/// Overhead of a serialized span or location.
const SPAN_OVERHEAD: usize = 24;

/// Estimated cost of a collection: `base + Σ per_item(item)`.
///
/// Pure and monotonic: appending items never decreases the estimate.
pub fn estimate_cost<T>(items: &[T], per_item: impl Fn(&T) -> usize, base: usize) -> usize {
    base + items.iter().map(per_item).sum::<usize>()
}

/// Sampled per-item cost for collections whose items are assumed uniformly
/// distributed (diagnostic messages): averages the first `sample_size` items
/// and rounds up, keeping the estimate conservative without touching every
/// item.
pub fn sampled_item_cost<T>(
    items: &[T],
    sample_size: usize,
    per_item: impl Fn(&T) -> usize,
) -> usize {
    if items.is_empty() {
        return 0;
    }
    let n = sample_size.max(1).min(items.len());
    let sampled: usize = items[..n].iter().map(per_item).sum();
    sampled.div_ceil(n)
}

pub fn graph_node_cost(node: &GraphNode) -> usize {
    let symbol = &node.symbol;
    let location = symbol
        .location
        .as_ref()
        .map(|l| l.file.len() + SPAN_OVERHEAD)
        .unwrap_or(0);
    symbol.id.len() + symbol.name.len() + symbol.container.len() + location + ITEM_OVERHEAD
}

pub fn reference_cost(site: &ReferenceSite) -> usize {
    site.document.len() + SPAN_OVERHEAD + ITEM_OVERHEAD
}

pub fn diagnostic_cost(diagnostic: &Diagnostic) -> usize {
    diagnostic.file.len()
        + diagnostic.message.len()
        + diagnostic.code.as_ref().map(String::len).unwrap_or(0)
        + SPAN_OVERHEAD
        + ITEM_OVERHEAD
}

pub fn text_edit_cost(edit: &TextEdit) -> usize {
    edit.file.len() + edit.replacement.len() + SPAN_OVERHEAD + ITEM_OVERHEAD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_is_monotonic_in_prefix_length() {
        let items: Vec<String> = (0..50).map(|i| "x".repeat(i % 7 + 1)).collect();
        let mut last = 0;
        for n in 0..=items.len() {
            let cost = estimate_cost(&items[..n], |s| s.len(), 100);
            assert!(cost >= last, "estimate decreased at n={}", n);
            last = cost;
        }
    }

    #[test]
    fn sampled_cost_rounds_up() {
        let items = vec!["ab".to_string(), "abc".to_string(), "a".to_string()];
        // mean of 2 and 3 over the 2-item sample is 2.5, rounded up to 3
        assert_eq!(sampled_item_cost(&items, 2, |s| s.len()), 3);
    }

    #[test]
    fn sampled_cost_of_empty_is_zero() {
        let items: Vec<String> = Vec::new();
        assert_eq!(sampled_item_cost(&items, 16, |s| s.len()), 0);
    }
}

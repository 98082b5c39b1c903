//! Progressive reduction of result sets to a response budget.
//!
//! Two phases: estimate the caller-requested prefix first and return it when
//! it fits; otherwise walk a small descending table of candidate sizes. The
//! table bounds the worst case to a constant number of estimate calls, and
//! the floor rule guarantees a non-empty result whenever the source list has
//! any items, trading strict budget adherence for usability at the floor.

use serde::Serialize;

use crate::estimate::estimate_cost;

/// System-wide ceiling on returned items, independent of caller input.
pub const HARD_RESULT_CAP: usize = 500;

/// Default descending candidate sizes; tools may override.
pub const DEFAULT_REDUCTION_STEPS: &[usize] = &[50, 40, 30, 20, 10];

/// Outcome of one reduction. Immutable; produced once per tool invocation.
#[derive(Debug, Clone, Serialize)]
pub struct TruncationDecision {
    pub returned_count: usize,
    pub total_count: usize,
    pub estimated_cost: usize,
    pub was_truncated: bool,

    /// Filled in by the shaper once the full result is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow_id: Option<String>,
}

impl TruncationDecision {
    fn new(returned_count: usize, total_count: usize, estimated_cost: usize) -> Self {
        Self {
            returned_count,
            total_count,
            estimated_cost,
            was_truncated: returned_count < total_count,
            overflow_id: None,
        }
    }
}

/// Largest prefix of `items` that respects both the requested maximum and the
/// safety budget.
pub fn reduce_to_budget<T>(
    items: &[T],
    per_item: impl Fn(&T) -> usize,
    base_cost: usize,
    requested_max: usize,
    budget: usize,
    steps: &[usize],
) -> TruncationDecision {
    let total = items.len();
    if total == 0 {
        return TruncationDecision::new(0, 0, base_cost);
    }

    // Fast path: the requested size usually fits.
    let candidate = requested_max.min(HARD_RESULT_CAP).min(total);
    let cost = estimate_cost(&items[..candidate], &per_item, base_cost);
    if cost <= budget {
        return TruncationDecision::new(candidate, total, cost);
    }

    for &step in steps {
        let size = step.min(total);
        if size >= candidate {
            continue;
        }
        let cost = estimate_cost(&items[..size], &per_item, base_cost);
        if cost <= budget {
            return TruncationDecision::new(size, total, cost);
        }
    }

    // Nothing fits: return the smallest step anyway rather than an empty
    // result.
    let floor = steps.last().copied().unwrap_or(1).clamp(1, candidate);
    let cost = estimate_cost(&items[..floor], &per_item, base_cost);
    TruncationDecision::new(floor, total, cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_cost(_: &u32) -> usize {
        120
    }

    #[test]
    fn requested_size_that_fits_is_returned_whole() {
        // 12 items at 120 units over a 500-unit base: 1940 <= 2000
        let items: Vec<u32> = (0..12).collect();
        let decision = reduce_to_budget(&items, flat_cost, 500, 100, 2000, DEFAULT_REDUCTION_STEPS);
        assert_eq!(decision.returned_count, 12);
        assert_eq!(decision.total_count, 12);
        assert_eq!(decision.estimated_cost, 1940);
        assert!(!decision.was_truncated);
    }

    #[test]
    fn oversized_result_falls_back_to_descending_steps() {
        // 40 items: 5300 > 2000; steps 30/20 still over; 10 gives 1700
        let items: Vec<u32> = (0..40).collect();
        let decision = reduce_to_budget(&items, flat_cost, 500, 100, 2000, DEFAULT_REDUCTION_STEPS);
        assert_eq!(decision.returned_count, 10);
        assert_eq!(decision.total_count, 40);
        assert_eq!(decision.estimated_cost, 1700);
        assert!(decision.was_truncated);
    }

    #[test]
    fn never_exceeds_requested_max_or_hard_cap() {
        let items: Vec<u32> = (0..1000).collect();
        let decision =
            reduce_to_budget(&items, |_| 0, 0, 800, usize::MAX, DEFAULT_REDUCTION_STEPS);
        assert_eq!(decision.returned_count, HARD_RESULT_CAP);
        assert!(decision.was_truncated);

        let decision = reduce_to_budget(&items, |_| 0, 0, 7, usize::MAX, DEFAULT_REDUCTION_STEPS);
        assert_eq!(decision.returned_count, 7);
    }

    #[test]
    fn floor_returns_smallest_step_when_nothing_fits() {
        let items: Vec<u32> = (0..40).collect();
        let decision = reduce_to_budget(&items, flat_cost, 500, 100, 100, DEFAULT_REDUCTION_STEPS);
        assert_eq!(decision.returned_count, 10);
        assert!(decision.was_truncated);
        assert!(decision.estimated_cost > 100);
    }

    #[test]
    fn empty_input_stays_empty() {
        let items: Vec<u32> = Vec::new();
        let decision = reduce_to_budget(&items, flat_cost, 500, 100, 0, DEFAULT_REDUCTION_STEPS);
        assert_eq!(decision.returned_count, 0);
        assert!(!decision.was_truncated);
    }

    #[test]
    fn short_list_floor_never_exceeds_list_length() {
        let items: Vec<u32> = (0..3).collect();
        let decision = reduce_to_budget(&items, flat_cost, 500, 100, 100, DEFAULT_REDUCTION_STEPS);
        assert_eq!(decision.returned_count, 3);
        assert!(!decision.was_truncated);
    }
}

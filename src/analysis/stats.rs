//! Summary statistics over metric groups.

use crate::models::{GroupedRecords, Statistics};
use std::collections::BTreeMap;

/// Compute per-metric summary statistics for every group in `metric_groups`.
///
/// Values that fail numeric coercion are dropped from the aggregate
/// without raising; a group left with no numeric values yields the zero
/// placeholder. Recomputed on every analysis run, never cached.
pub fn compute_statistics(metric_groups: &GroupedRecords) -> BTreeMap<String, Statistics> {
    metric_groups
        .iter()
        .map(|(metric, records)| {
            let values: Vec<f64> = records.iter().filter_map(|r| r.value.as_f64()).collect();
            (metric.clone(), summarize(&values))
        })
        .collect()
}

fn summarize(values: &[f64]) -> Statistics {
    if values.is_empty() {
        return Statistics::zero();
    }

    let total: f64 = values.iter().sum();
    let average = total / values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Statistics {
        average: format!("{average:.2}"),
        min,
        max,
        total: format!("{total:.2}"),
    }
}

//! Aggregate statistics of a target field, full population vs. subset
//!
//! [`stat_division`] computes [`AggregateStats`] for one target field over
//! the full dataset and over a subset in one call. The result answers every
//! [`Aggregator`] so the caller can pick the one its main field uses.
//!
//! [`FieldStats`] annotates one side of a division with the main field
//! definition and the field metadata it was computed for; it is what the
//! store publishes as `global_stats`, `selection_stats` and `diff_stats`.

use std::collections::BTreeMap;

use breakout_data::{Aggregator, FieldMeta, MainField, Row, find_field};
use breakout_stats::aggregate::{AggregateAccumulator, AggregateStats};
use serde::{Deserialize, Serialize};

/// Aggregates of one field over the full population and a subset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatDivision {
    pub global: AggregateStats,
    pub subset: AggregateStats,
}

impl StatDivision {
    /// Returns the `(global, subset)` values of one aggregator.
    #[must_use]
    pub fn get(&self, aggregator: Aggregator) -> (Option<f64>, Option<f64>) {
        (self.global.get(aggregator), self.subset.get(aggregator))
    }

    /// Returns the `(global, subset)` values of every aggregator.
    #[must_use]
    pub fn pairs(&self) -> BTreeMap<Aggregator, (Option<f64>, Option<f64>)> {
        Aggregator::ALL
            .into_iter()
            .map(|aggregator| (aggregator, self.get(aggregator)))
            .collect()
    }
}

/// Aggregate statistics of a main field over a row subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    /// The main field definition these statistics were computed for.
    pub definition: MainField,
    /// The field the statistics are measured on.
    pub field: FieldMeta,
    pub stats: AggregateStats,
}

impl FieldStats {
    /// Returns the value of the definition's aggregator.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.stats.get(self.definition.aggregator)
    }
}

/// Aggregates `fid` over `rows`.
#[must_use]
pub fn aggregate_field(rows: &[Row], fid: &str) -> AggregateStats {
    let mut acc = AggregateAccumulator::new();
    for row in rows {
        acc.push(row.get(fid).observation());
    }
    acc.finish()
}

/// Aggregates `target_fid` over `full_data` and over `subset_data`.
///
/// Returns `None` when `target_fid` is not a known field. An empty subset
/// yields neutral statistics (`rows == 0`, `mean == None`).
#[must_use]
pub fn stat_division(
    full_data: &[Row],
    subset_data: &[Row],
    fields: &[FieldMeta],
    target_fid: &str,
) -> Option<StatDivision> {
    find_field(fields, target_fid)?;
    Some(StatDivision {
        global: aggregate_field(full_data, target_fid),
        subset: aggregate_field(subset_data, target_fid),
    })
}

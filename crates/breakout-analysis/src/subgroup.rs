use std::cmp::Ordering;

use breakout_data::Filter;
use serde::{Deserialize, Serialize};

/// One ranked candidate explanation: a bucket of a splitting field, or the
/// field as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupResult {
    /// The splitting field.
    pub fid: String,
    /// Position of the bucket within its field's bucketing, `None` for a
    /// whole-field entry.
    pub bucket: Option<usize>,
    /// Filter selecting the bucket's rows.
    pub divider: Filter,
    /// Number of rows of the analyzed population inside the bucket.
    pub size: usize,
    /// Aggregate of the main field inside the bucket.
    pub inside: Option<f64>,
    /// Aggregate of the main field in the rest of the population.
    pub outside: Option<f64>,
    /// The comparison group's side of the bucket (comparison analysis only).
    pub counterpart: Option<Counterpart>,
    /// Signed term of the decomposition. Bucket terms of one field are
    /// additive; a whole-field entry carries the part of the gap explained by
    /// the field.
    pub contribution: f64,
    /// Ranking score, `|contribution|`.
    pub score: f64,
}

/// The comparison group's view of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Counterpart {
    pub size: usize,
    pub inside: Option<f64>,
}

fn ranking_order(a: &SubgroupResult, b: &SubgroupResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.size.cmp(&a.size))
        .then_with(|| a.fid.cmp(&b.fid))
        .then_with(|| a.bucket.cmp(&b.bucket))
}

/// Sorts by descending score, then descending size, field id and bucket,
/// whole-field entries first.
pub fn rank_results(results: &mut [SubgroupResult]) {
    results.sort_by(ranking_order);
}

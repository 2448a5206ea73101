//! Aggregation of a target field over a subset of observations
//!
//! Three aggregators are supported: [`Aggregator::Mean`], [`Aggregator::Sum`]
//! and [`Aggregator::Count`]. A single pass over the observations produces an
//! [`AggregateStats`] holding everything needed to answer all three.
//!
//! # Conventions
//!
//! - `rows` counts every observation, missing or not
//! - `count` counts observations whose value is present (numeric or not)
//! - `sum` adds finite numeric values and is `0.0` when there are none
//! - `mean` is `sum / numeric`, and `None` when no numeric value was seen
//!
//! An empty subset therefore produces `rows == 0`, `count == 0`, `sum == 0.0`
//! and `mean == None`: never a NaN.
//!
//! # Ratio decomposition
//!
//! Each aggregator can be written as a [`Ratio`]:
//!
//! | Aggregator | Numerator | Denominator |
//! |---|---|---|
//! | Mean | `sum` | `numeric` |
//! | Sum | `sum` | `rows` (sum per row) |
//! | Count | `count` | `rows` (coverage) |
//!
//! For a partition of a population into buckets, the bucket terms
//! `(den_b / den) * (num_b / den_b)` add up exactly to `num / den`. This is
//! what makes contribution scores of sub-populations additive.

use serde::{Deserialize, Serialize};

/// Aggregation function applied to the main field.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Aggregator {
    #[display("mean")]
    Mean,
    #[display("sum")]
    Sum,
    #[display("count")]
    Count,
}

impl Aggregator {
    /// All supported aggregators, in a stable order.
    pub const ALL: [Aggregator; 3] = [Aggregator::Mean, Aggregator::Sum, Aggregator::Count];

    /// Returns whether this aggregator needs numeric values to be meaningful.
    #[must_use]
    pub fn requires_numeric(self) -> bool {
        matches!(self, Aggregator::Mean | Aggregator::Sum)
    }
}

/// A single observation of the target field on one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// The value is missing on this row.
    Missing,
    /// The value is present but not numeric (e.g. a category).
    Present,
    /// The value is numeric.
    Number(f64),
}

/// Aggregate statistics of one field over one subset of rows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Number of rows in the subset.
    pub rows: usize,
    /// Number of rows with a present value.
    pub count: usize,
    /// Number of rows with a finite numeric value.
    pub numeric: usize,
    /// Sum of finite numeric values.
    pub sum: f64,
    /// Mean of finite numeric values, if any.
    pub mean: Option<f64>,
}

impl AggregateStats {
    /// Computes statistics from an iterator of observations.
    ///
    /// # Examples
    ///
    /// ```
    /// # use breakout_stats::aggregate::{AggregateStats, Observation};
    /// let stats = AggregateStats::from_observations([
    ///     Observation::Number(1.0),
    ///     Observation::Number(3.0),
    /// ]);
    /// assert_eq!(stats.mean, Some(2.0));
    /// assert_eq!(stats.sum, 4.0);
    /// ```
    #[must_use]
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut acc = AggregateAccumulator::new();
        for observation in observations {
            acc.push(observation);
        }
        acc.finish()
    }

    /// Returns whether the subset contained no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Returns the statistics of `self` with the sub-population `part` removed.
    ///
    /// `part` must have been aggregated over a subset of the rows of `self`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn complement(&self, part: &AggregateStats) -> AggregateStats {
        let numeric = self.numeric.saturating_sub(part.numeric);
        let sum = if numeric == 0 { 0.0 } else { self.sum - part.sum };
        AggregateStats {
            rows: self.rows.saturating_sub(part.rows),
            count: self.count.saturating_sub(part.count),
            numeric,
            sum,
            mean: (numeric > 0).then(|| sum / numeric as f64),
        }
    }

    /// Returns the value of the given aggregator.
    ///
    /// `Mean` is `None` when the subset holds no numeric value; `Sum` and
    /// `Count` are always defined.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn get(&self, aggregator: Aggregator) -> Option<f64> {
        match aggregator {
            Aggregator::Mean => self.mean,
            Aggregator::Sum => Some(self.sum),
            Aggregator::Count => Some(self.count as f64),
        }
    }

    /// Returns the aggregator expressed as a decomposable ratio.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn ratio(&self, aggregator: Aggregator) -> Ratio {
        match aggregator {
            Aggregator::Mean => Ratio::new(self.sum, self.numeric as f64),
            Aggregator::Sum => Ratio::new(self.sum, self.rows as f64),
            Aggregator::Count => Ratio::new(self.count as f64, self.rows as f64),
        }
    }
}

/// A `numerator / denominator` pair with a guarded division.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ratio {
    pub numerator: f64,
    pub denominator: f64,
}

impl Ratio {
    #[must_use]
    pub fn new(numerator: f64, denominator: f64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Returns `numerator / denominator`, or `None` for an empty denominator.
    ///
    /// # Examples
    ///
    /// ```
    /// # use breakout_stats::aggregate::Ratio;
    /// assert_eq!(Ratio::new(6.0, 3.0).value(), Some(2.0));
    /// assert_eq!(Ratio::new(6.0, 0.0).value(), None);
    /// ```
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        (self.denominator > 0.0).then(|| self.numerator / self.denominator)
    }

    /// Returns this ratio's share of `total`'s denominator.
    #[must_use]
    pub fn weight_in(&self, total: &Ratio) -> f64 {
        if total.denominator > 0.0 {
            self.denominator / total.denominator
        } else {
            0.0
        }
    }
}

/// Single-pass accumulator producing [`AggregateStats`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateAccumulator {
    rows: usize,
    count: usize,
    numeric: usize,
    sum: f64,
}

impl AggregateAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one observation.
    pub fn push(&mut self, observation: Observation) {
        self.rows += 1;
        match observation {
            Observation::Missing => {}
            Observation::Present => self.count += 1,
            Observation::Number(value) => {
                self.count += 1;
                if value.is_finite() {
                    self.numeric += 1;
                    self.sum += value;
                }
            }
        }
    }

    /// Combines another accumulator into this one.
    pub fn merge(&mut self, other: &AggregateAccumulator) {
        self.rows += other.rows;
        self.count += other.count;
        self.numeric += other.numeric;
        self.sum += other.sum;
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn finish(self) -> AggregateStats {
        let mean = (self.numeric > 0).then(|| self.sum / self.numeric as f64);
        AggregateStats {
            rows: self.rows,
            count: self.count,
            numeric: self.numeric,
            sum: self.sum,
            mean,
        }
    }
}

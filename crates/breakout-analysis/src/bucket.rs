//! Splitting a population by one candidate field
//!
//! A [`Bucketing`] partitions rows by the value of one field:
//!
//! - **Continuous fields** (quantitative, ordinal, temporal): equal-frequency
//!   bins from [`create_adaptive_bins`], aiming for
//!   [`BucketPolicy::quantitative_bins`] buckets. A run of equal values is
//!   never split, so low-cardinality fields get one bucket per value. Values
//!   are placed by [`Value::as_ordered`], so date text bins by its time.
//! - **Nominal fields**: one bucket per distinct value. Fields with more
//!   than [`BucketPolicy::max_categories`] distinct values are treated as
//!   identifiers and are not split at all.
//! - **Continuous fields with unordered values** (a present value that is
//!   neither a finite number nor date text, such as ordinal levels
//!   `"low"`/`"high"`): split like nominal fields.
//!
//! Rows where the field is missing form a dedicated trailing bucket, so that
//! the buckets of a field cover every row and decomposition terms add up.
//!
//! Every bucket converts back into a [`Filter`] that selects exactly its
//! rows, which lets a consumer apply a ranked result as a new filter.

use std::collections::BTreeSet;

use breakout_data::{CategoryKey, FieldMeta, Filter, Row, Value};
use breakout_stats::{
    aggregate::AggregateAccumulator,
    binning::{BinInfo, create_adaptive_bins, find_bin},
};
use serde::{Deserialize, Serialize};

/// Policy deciding which fields are split and how finely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketPolicy {
    /// Target number of bins for continuous fields.
    pub quantitative_bins: usize,
    /// Nominal fields with more distinct values are not split.
    pub max_categories: usize,
    /// Minimum number of samples per continuous bin.
    pub min_bucket_size: usize,
}

impl Default for BucketPolicy {
    fn default() -> Self {
        Self {
            quantitative_bins: 5,
            max_categories: 24,
            min_bucket_size: 1,
        }
    }
}

#[derive(Debug, Clone)]
enum Scheme {
    Bins(Vec<BinInfo>),
    Categories(Vec<CategoryKey>),
}

/// The buckets of one candidate field.
#[derive(Debug, Clone)]
pub struct Bucketing<'a> {
    field: &'a FieldMeta,
    scheme: Scheme,
    has_missing: bool,
}

impl<'a> Bucketing<'a> {
    /// Builds the buckets of `field` over the union of `populations`.
    ///
    /// Returns `None` when the field is not worth splitting: fewer than two
    /// buckets, or a nominal field above the category limit.
    #[must_use]
    pub fn for_field(
        field: &'a FieldMeta,
        populations: &[&[Row]],
        policy: &BucketPolicy,
    ) -> Option<Self> {
        let rows = || populations.iter().flat_map(|rows| rows.iter());
        let present = || {
            rows()
                .map(|row| row.get(&field.fid))
                .filter(|value| !value.is_missing())
        };
        let has_missing = rows().any(|row| row.get(&field.fid).is_missing());

        // Continuous fields fall back to categories when a present value has
        // no position, e.g. ordinal levels stored as text.
        let positions = field
            .semantic_type
            .is_continuous()
            .then(|| {
                present()
                    .map(|value| value.as_ordered().filter(|v| v.is_finite()))
                    .collect::<Option<Vec<_>>>()
            })
            .flatten();

        let scheme = if let Some(mut values) = positions {
            values.sort_by(f64::total_cmp);
            Scheme::Bins(create_adaptive_bins(
                &values,
                policy.quantitative_bins,
                policy.min_bucket_size,
            ))
        } else {
            let keys = present()
                .map(Value::category_key)
                .collect::<BTreeSet<_>>();
            if keys.len() > policy.max_categories {
                return None;
            }
            if field.semantic_type.is_continuous() {
                log::debug!(
                    "{} field {} has non-ordered values, splitting by category",
                    field.semantic_type,
                    field.fid
                );
            }
            Scheme::Categories(keys.into_iter().collect())
        };

        let bucketing = Self {
            field,
            scheme,
            has_missing,
        };
        (bucketing.len() >= 2).then_some(bucketing)
    }

    #[must_use]
    pub fn field(&self) -> &FieldMeta {
        self.field
    }

    /// Number of buckets holding present values. The missing bucket, if
    /// any, comes after them.
    #[must_use]
    pub fn value_buckets(&self) -> usize {
        match &self.scheme {
            Scheme::Bins(bins) => bins.len(),
            Scheme::Categories(keys) => keys.len(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.value_buckets() + usize::from(self.has_missing)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bucket index of `row`, if it falls in any bucket.
    #[must_use]
    pub fn bucket_of(&self, row: &Row) -> Option<usize> {
        let value = row.get(&self.field.fid);
        if value.is_missing() {
            return self.has_missing.then(|| self.value_buckets());
        }
        match &self.scheme {
            Scheme::Bins(bins) => find_bin(bins, value.as_ordered()?),
            Scheme::Categories(keys) => keys.binary_search(&value.category_key()).ok(),
        }
    }

    /// Returns the filter selecting exactly the rows of bucket `idx`.
    #[must_use]
    pub fn divider(&self, idx: usize) -> Filter {
        let fid = self.field.fid.clone();
        if idx == self.value_buckets() {
            return Filter::values(fid, [Value::Null]);
        }
        match &self.scheme {
            Scheme::Bins(bins) => Filter::range(fid, bins[idx].start, bins[idx].end),
            Scheme::Categories(keys) => Filter::values(fid, [keys[idx].to_value()]),
        }
    }

    /// Returns the filter selecting every row where the field is present.
    #[must_use]
    pub fn present_divider(&self) -> Option<Filter> {
        let fid = self.field.fid.clone();
        match &self.scheme {
            Scheme::Bins(bins) => Some(Filter::range(fid, bins.first()?.start, bins.last()?.end)),
            Scheme::Categories(keys) if !keys.is_empty() => Some(Filter::values(
                fid,
                keys.iter().map(CategoryKey::to_value),
            )),
            Scheme::Categories(_) => None,
        }
    }

    /// Aggregates `target_fid` per bucket over `rows`.
    #[must_use]
    pub fn accumulate(&self, rows: &[Row], target_fid: &str) -> Vec<AggregateAccumulator> {
        let mut accs = vec![AggregateAccumulator::new(); self.len()];
        for row in rows {
            if let Some(idx) = self.bucket_of(row) {
                accs[idx].push(row.get(target_fid).observation());
            }
        }
        accs
    }
}

#[cfg(test)]
mod tests {
    use breakout_data::{AnalyticRole, SemanticType, apply_dividers};

    use super::*;

    fn rows() -> Vec<Row> {
        vec![
            Row::from_iter([("x", Value::from(1)), ("c", Value::from("a"))]),
            Row::from_iter([("x", Value::from(2)), ("c", Value::from("b"))]),
            Row::from_iter([("x", Value::from(3)), ("c", Value::from("a"))]),
            Row::from_iter([("x", Value::from(4)), ("c", Value::Null)]),
            Row::from_iter([("x", Value::Null), ("c", Value::from("b"))]),
        ]
    }

    #[test]
    fn test_continuous_bins_with_missing_bucket() {
        let rows = rows();
        let field = FieldMeta::measure("x");
        let policy = BucketPolicy {
            quantitative_bins: 2,
            ..BucketPolicy::default()
        };
        let bucketing = Bucketing::for_field(&field, &[&rows], &policy).unwrap();
        assert_eq!(bucketing.len(), 3);
        assert_eq!(bucketing.divider(0), Filter::range("x", 1.0, 2.0));
        assert_eq!(bucketing.divider(1), Filter::range("x", 3.0, 4.0));
        assert_eq!(bucketing.divider(2), Filter::values("x", [Value::Null]));
        assert_eq!(bucketing.bucket_of(&rows[4]), Some(2));
    }

    #[test]
    fn test_categories_sorted() {
        let rows = rows();
        let field = FieldMeta::dimension("c");
        let bucketing = Bucketing::for_field(&field, &[&rows], &BucketPolicy::default()).unwrap();
        assert_eq!(bucketing.len(), 3);
        assert_eq!(bucketing.divider(0), Filter::values("c", ["a"]));
        assert_eq!(bucketing.divider(1), Filter::values("c", ["b"]));
        assert_eq!(bucketing.bucket_of(&rows[1]), Some(1));
    }

    #[test]
    fn test_present_divider_skips_missing() {
        let rows = rows();
        for field in [FieldMeta::measure("x"), FieldMeta::dimension("c")] {
            let bucketing =
                Bucketing::for_field(&field, &[&rows], &BucketPolicy::default()).unwrap();
            let division = apply_dividers(&rows, &[bucketing.present_divider().unwrap()]);
            assert_eq!(division.matched.len(), 4);
            assert!(
                division
                    .matched
                    .iter()
                    .all(|row| bucketing
                        .bucket_of(row)
                        .is_some_and(|idx| idx < bucketing.value_buckets()))
            );
        }
    }

    #[test]
    fn test_high_cardinality_nominal_is_skipped() {
        let rows = (0..30)
            .map(|i| Row::from_iter([("id", Value::from(format!("row-{i}")))]))
            .collect::<Vec<_>>();
        let field = FieldMeta::dimension("id");
        assert!(Bucketing::for_field(&field, &[&rows], &BucketPolicy::default()).is_none());
    }

    #[test]
    fn test_constant_field_is_skipped() {
        let rows = vec![Row::from_iter([("k", 1)]), Row::from_iter([("k", 1)])];
        let field = FieldMeta::measure("k");
        assert!(Bucketing::for_field(&field, &[&rows], &BucketPolicy::default()).is_none());
    }

    #[test]
    fn test_dividers_reproduce_buckets() {
        let rows = rows();
        for field in [FieldMeta::measure("x"), FieldMeta::dimension("c")] {
            let bucketing =
                Bucketing::for_field(&field, &[&rows], &BucketPolicy::default()).unwrap();
            for idx in 0..bucketing.len() {
                let division = apply_dividers(&rows, &[bucketing.divider(idx)]);
                assert!(!division.matched.is_empty());
                assert!(
                    division
                        .matched
                        .iter()
                        .all(|row| bucketing.bucket_of(row) == Some(idx))
                );
            }
        }
    }

    #[test]
    fn test_ordinal_text_splits_by_level() {
        let rows = ["low", "mid", "high", "mid"]
            .into_iter()
            .map(|grade| Row::from_iter([("grade", grade)]))
            .chain([Row::from_iter([("grade", Value::Null)])])
            .collect::<Vec<_>>();
        let field = FieldMeta::new("grade", "Grade", SemanticType::Ordinal, AnalyticRole::Dimension);
        let bucketing = Bucketing::for_field(&field, &[&rows], &BucketPolicy::default()).unwrap();
        assert_eq!(bucketing.len(), 4);
        assert_eq!(bucketing.divider(0), Filter::values("grade", ["high"]));
        assert_eq!(bucketing.bucket_of(&rows[1]), Some(2));
        assert_eq!(bucketing.bucket_of(&rows[4]), Some(3));
        assert!(rows.iter().all(|row| bucketing.bucket_of(row).is_some()));
    }

    #[test]
    fn test_temporal_text_is_binned_by_time() {
        let rows = ["2024-01-01", "2024-01-02", "2024-06-01", "2024-06-02"]
            .into_iter()
            .map(|day| Row::from_iter([("day", day)]))
            .collect::<Vec<_>>();
        let field = FieldMeta::new("day", "Day", SemanticType::Temporal, AnalyticRole::Dimension);
        let policy = BucketPolicy {
            quantitative_bins: 2,
            ..BucketPolicy::default()
        };
        let bucketing = Bucketing::for_field(&field, &[&rows], &policy).unwrap();
        assert_eq!(bucketing.len(), 2);
        assert_eq!(bucketing.bucket_of(&rows[1]), Some(0));
        assert_eq!(bucketing.bucket_of(&rows[2]), Some(1));
        for idx in 0..bucketing.len() {
            let division = apply_dividers(&rows, &[bucketing.divider(idx)]);
            assert_eq!(division.matched.len(), 2);
            assert!(
                division
                    .matched
                    .iter()
                    .all(|row| bucketing.bucket_of(row) == Some(idx))
            );
        }
    }

    #[test]
    fn test_bins_span_all_populations() {
        let left = vec![Row::from_iter([("x", 1)])];
        let right = vec![Row::from_iter([("x", 9)])];
        let field = FieldMeta::measure("x");
        let bucketing =
            Bucketing::for_field(&field, &[&left, &right], &BucketPolicy::default()).unwrap();
        assert_eq!(bucketing.bucket_of(&left[0]), Some(0));
        assert_eq!(bucketing.bucket_of(&right[0]), Some(1));
    }
}

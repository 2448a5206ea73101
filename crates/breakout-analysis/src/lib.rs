//! Subgroup statistics and ranking for the Breakout exploration engine
//!
//! This crate holds the pure statistical functions the reactive store is
//! built from. None of them keep state; all of them accept empty
//! populations and answer with neutral results.
//!
//! # Overview
//!
//! 1. **Stat division** ([`stat_division`]): Aggregate a target field over the
//!    full dataset and over a subset, for every aggregator at once
//! 2. **Bucketing** ([`bucket`]): Split a population by one candidate field,
//!    into adaptive bins (continuous fields) or categories (nominal fields)
//! 3. **Contribution analysis** ([`contribution`]): Rank buckets by how far
//!    they pull one group's aggregate away from the global baseline
//! 4. **Comparison analysis** ([`comparison`]): Rank buckets by how much they
//!    explain the gap between a selection group and a comparison group
//!
//! Both analyzers produce [`subgroup::SubgroupResult`] lists sorted by
//! descending score with deterministic tie-breaking.
//!
//! # Scoring
//!
//! Each aggregator is expressed as a ratio (see
//! [`breakout_stats::aggregate`]), which makes bucket terms additive: for a
//! given candidate field, the signed `contribution` of its buckets sums to
//! the total deviation being explained. The ranking score is the magnitude of
//! that term, so large and strongly deviating buckets come first.
//!
//! # Examples
//!
//! ```
//! use breakout_analysis::{bucket::BucketPolicy, comparison::analyze_comparisons};
//! use breakout_data::{Aggregator, FieldMeta, MainField, Row};
//!
//! let fields = vec![FieldMeta::measure("f")];
//! let selection = vec![Row::from_iter([("f", 10)]), Row::from_iter([("f", 20)])];
//! let comparison = vec![Row::from_iter([("f", 30)]), Row::from_iter([("f", 40)])];
//! let main_field = MainField::new("f", Aggregator::Mean);
//!
//! let results = analyze_comparisons(
//!     &selection,
//!     &comparison,
//!     &fields,
//!     &main_field,
//!     &BucketPolicy::default(),
//! )?;
//!
//! // The groups do not overlap, so `f` as a whole explains the gap
//! assert_eq!(results[0].bucket, None);
//! assert_eq!(results[0].inside, Some(15.0));
//! assert_eq!(results[0].counterpart.unwrap().inside, Some(35.0));
//!
//! // The bucket terms of `f` add up to the full 15-vs-35 gap
//! let gap: f64 = results
//!     .iter()
//!     .filter(|r| r.bucket.is_some())
//!     .map(|r| r.contribution)
//!     .sum();
//! assert!((gap - (15.0 - 35.0)).abs() < 1e-9);
//! # Ok::<(), breakout_analysis::AnalysisError>(())
//! ```

use breakout_data::{Aggregator, FieldMeta, MainField, find_field};

pub mod bucket;
pub mod comparison;
pub mod contribution;
pub mod stat_division;
pub mod subgroup;

/// Errors raised by the analyzers on inputs they cannot interpret.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum AnalysisError {
    #[display("Unknown target field '{fid}'")]
    UnknownField { fid: String },
    #[display("Field '{fid}' is not numeric and cannot be aggregated with {aggregator}")]
    NonNumericTarget { fid: String, aggregator: Aggregator },
}

/// Looks up the main field's target and checks it can carry its aggregator.
fn check_target<'a>(
    fields: &'a [FieldMeta],
    main_field: &MainField,
) -> Result<&'a FieldMeta, AnalysisError> {
    let field =
        find_field(fields, &main_field.fid).ok_or_else(|| AnalysisError::UnknownField {
            fid: main_field.fid.clone(),
        })?;
    if main_field.aggregator.requires_numeric() && !field.semantic_type.is_continuous() {
        return Err(AnalysisError::NonNumericTarget {
            fid: field.fid.clone(),
            aggregator: main_field.aggregator,
        });
    }
    Ok(field)
}

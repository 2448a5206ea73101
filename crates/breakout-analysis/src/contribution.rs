//! Contribution analysis: which sub-populations pull one group's aggregate
//! away from the global baseline
//!
//! # Algorithm
//!
//! With `m = num / den` the main field's aggregate written as a ratio (see
//! [`breakout_stats::aggregate`]) and `m₀` the baseline ratio:
//!
//! 1. For every candidate field except the main field, bucket the population
//!    ([`Bucketing`])
//! 2. For every bucket `b`, aggregate the main field inside it
//! 3. Score the bucket by `(den_b / den) * (m_b - m₀)`
//!
//! For one field, the terms add up to `m_population - m₀`: the full
//! deviation of the population from the baseline. A bucket ranks high when
//! it is both large and far from the baseline.
//!
//! For `sum` and `count`, the ratio is taken per row, so a subset of the
//! dataset is compared to the global sum (or count) per row rather than to
//! the global total.

use breakout_data::{FieldMeta, MainField, Row};
use breakout_stats::aggregate::AggregateStats;

use crate::{
    AnalysisError,
    bucket::{BucketPolicy, Bucketing},
    check_target,
    stat_division::aggregate_field,
    subgroup::{SubgroupResult, rank_results},
};

/// Ranks buckets of `population` by their contribution to the deviation of
/// the main field's aggregate from `baseline`.
///
/// `baseline` is the main field's aggregate over the full dataset. An empty
/// population, or a baseline without a defined value, yields no results.
pub fn analyze_contributions(
    population: &[Row],
    fields: &[FieldMeta],
    main_field: &MainField,
    baseline: &AggregateStats,
    policy: &BucketPolicy,
) -> Result<Vec<SubgroupResult>, AnalysisError> {
    check_target(fields, main_field)?;
    let aggregator = main_field.aggregator;
    let Some(base) = baseline.ratio(aggregator).value() else {
        return Ok(vec![]);
    };
    if population.is_empty() {
        return Ok(vec![]);
    }

    let total = aggregate_field(population, &main_field.fid);
    let total_ratio = total.ratio(aggregator);

    let mut results = vec![];
    for field in fields.iter().filter(|field| field.fid != main_field.fid) {
        let Some(bucketing) = Bucketing::for_field(field, &[population], policy) else {
            continue;
        };
        let accs = bucketing.accumulate(population, &main_field.fid);
        for (idx, acc) in accs.into_iter().enumerate() {
            let inside = acc.finish();
            let ratio = inside.ratio(aggregator);
            let Some(value) = ratio.value() else {
                continue;
            };
            let contribution = ratio.weight_in(&total_ratio) * (value - base);
            results.push(SubgroupResult {
                fid: field.fid.clone(),
                bucket: Some(idx),
                divider: bucketing.divider(idx),
                size: inside.rows,
                inside: inside.get(aggregator),
                outside: total.complement(&inside).get(aggregator),
                counterpart: None,
                contribution,
                score: contribution.abs(),
            });
        }
    }

    log::debug!(
        "contribution analysis of {main_field}: {} rows, {} candidates",
        population.len(),
        results.len()
    );
    rank_results(&mut results);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use breakout_data::{Aggregator, AnalyticRole, Filter, SemanticType, Value};

    use super::*;

    fn fields() -> Vec<FieldMeta> {
        vec![
            FieldMeta::measure("price"),
            FieldMeta::dimension("city"),
            FieldMeta::measure("rooms"),
        ]
    }

    fn row(price: i32, city: &str, rooms: i32) -> Row {
        Row::from_iter([
            ("price", Value::from(price)),
            ("city", Value::from(city)),
            ("rooms", Value::from(rooms)),
        ])
    }

    fn dataset() -> Vec<Row> {
        vec![
            row(100, "a", 1),
            row(110, "a", 2),
            row(90, "a", 1),
            row(100, "a", 2),
            row(400, "b", 3),
            row(420, "b", 3),
        ]
    }

    fn baseline(rows: &[Row]) -> AggregateStats {
        aggregate_field(rows, "price")
    }

    #[test]
    fn test_empty_population() {
        let rows = dataset();
        let main_field = MainField::new("price", Aggregator::Mean);
        let results = analyze_contributions(
            &[],
            &fields(),
            &main_field,
            &baseline(&rows),
            &BucketPolicy::default(),
        )
        .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_excludes_main_field_and_sorts() {
        let rows = dataset();
        let main_field = MainField::new("price", Aggregator::Mean);
        let results = analyze_contributions(
            &rows,
            &fields(),
            &main_field,
            &baseline(&rows),
            &BucketPolicy::default(),
        )
        .unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.fid != "price"));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_terms_sum_to_deviation() {
        let rows = dataset();
        // Baseline from the full dataset, population is the first five rows
        let population = rows[..5].to_vec();
        let base = baseline(&rows);
        for aggregator in Aggregator::ALL {
            let main_field = MainField::new("price", aggregator);
            let results = analyze_contributions(
                &population,
                &fields(),
                &main_field,
                &base,
                &BucketPolicy::default(),
            )
            .unwrap();
            let expected = aggregate_field(&population, "price")
                .ratio(aggregator)
                .value()
                .unwrap()
                - base.ratio(aggregator).value().unwrap();
            let city_total: f64 = results
                .iter()
                .filter(|r| r.fid == "city")
                .map(|r| r.contribution)
                .sum();
            assert!(
                (city_total - expected).abs() < 1e-9,
                "{aggregator}: {city_total} != {expected}"
            );
        }
    }

    #[test]
    fn test_largest_pull_ranks_first() {
        let rows = dataset();
        let population = rows[..5].to_vec();
        let main_field = MainField::new("price", Aggregator::Mean);
        let results = analyze_contributions(
            &population,
            &[FieldMeta::measure("price"), FieldMeta::dimension("city")],
            &main_field,
            &baseline(&rows),
            &BucketPolicy::default(),
        )
        .unwrap();
        // Baseline mean is 203.33: the four cheap "a" rows pull hardest
        assert_eq!(results[0].divider, Filter::values("city", ["a"]));
        assert_eq!(results[0].size, 4);
        assert_eq!(results[0].inside, Some(100.0));
        assert_eq!(results[0].outside, Some(400.0));
        assert!(results[0].contribution < 0.0);
    }

    #[test]
    fn test_ordinal_text_levels_are_candidates() {
        let rows = ["low", "mid", "high"]
            .into_iter()
            .cycle()
            .take(9)
            .map(|grade| {
                let price = if grade == "high" { 300 } else { 100 };
                Row::from_iter([("price", Value::from(price)), ("grade", Value::from(grade))])
            })
            .collect::<Vec<_>>();
        let fields = vec![
            FieldMeta::measure("price"),
            FieldMeta::new("grade", "Grade", SemanticType::Ordinal, AnalyticRole::Dimension),
        ];
        let results = analyze_contributions(
            &rows[..6],
            &fields,
            &MainField::new("price", Aggregator::Mean),
            &baseline(&rows),
            &BucketPolicy::default(),
        )
        .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].divider, Filter::values("grade", ["high"]));
        assert_eq!(results[0].size, 2);
        assert_eq!(results[0].inside, Some(300.0));
        assert_eq!(results.iter().map(|r| r.size).sum::<usize>(), 6);
        let total: f64 = results.iter().map(|r| r.contribution).sum();
        assert!(total.abs() < 1e-9);
    }

    #[test]
    fn test_unknown_and_non_numeric_target() {
        let rows = dataset();
        let err = analyze_contributions(
            &rows,
            &fields(),
            &MainField::new("nope", Aggregator::Mean),
            &baseline(&rows),
            &BucketPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(err, AnalysisError::UnknownField { fid: "nope".into() });

        let err = analyze_contributions(
            &rows,
            &fields(),
            &MainField::new("city", Aggregator::Sum),
            &baseline(&rows),
            &BucketPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::NonNumericTarget { .. }));
    }
}

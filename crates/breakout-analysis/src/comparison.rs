//! Comparison analysis: which sub-populations explain the gap between a
//! selection group and a comparison group
//!
//! Both groups are bucketed with the same [`Bucketing`], built over their
//! union, so that a bucket means the same thing on both sides. The main field
//! itself is a candidate too: a gap in price is often best explained by price
//! ranges.
//!
//! With `w_X,b` the weight of bucket `b` in group `X` (its share of `X`'s
//! ratio denominator) and `m_X,b` the bucket's aggregate, the term of a bucket
//! is `w_S,b * m_S,b - w_C,b * m_C,b`. For one field, the terms add up to
//! `m_S - m_C`.
//!
//! Every candidate field also gets a whole-field entry covering its present
//! values. It reports both groups' aggregates side by side, and its term is
//! the gap between them scaled by how far apart the groups' bucket weights
//! are (total variation distance): the full gap when the groups fall into
//! disjoint buckets, nothing when they spread identically.

use breakout_data::{Aggregator, FieldMeta, MainField, Row};
use breakout_stats::aggregate::{AggregateAccumulator, AggregateStats};

use crate::{
    AnalysisError,
    bucket::{BucketPolicy, Bucketing},
    check_target,
    stat_division::aggregate_field,
    subgroup::{Counterpart, SubgroupResult, rank_results},
};

/// Ranks buckets and whole fields by how much of the gap between
/// `selection` and `comparison` they explain.
///
/// Returns no results when either group is empty or has no defined
/// aggregate.
pub fn analyze_comparisons(
    selection: &[Row],
    comparison: &[Row],
    fields: &[FieldMeta],
    main_field: &MainField,
    policy: &BucketPolicy,
) -> Result<Vec<SubgroupResult>, AnalysisError> {
    check_target(fields, main_field)?;
    if selection.is_empty() || comparison.is_empty() {
        return Ok(vec![]);
    }
    let aggregator = main_field.aggregator;
    let total_s = aggregate_field(selection, &main_field.fid);
    let total_c = aggregate_field(comparison, &main_field.fid);
    let ratio_s = total_s.ratio(aggregator);
    let ratio_c = total_c.ratio(aggregator);
    if ratio_s.value().is_none() || ratio_c.value().is_none() {
        return Ok(vec![]);
    }

    let mut results = vec![];
    for field in fields {
        let Some(bucketing) = Bucketing::for_field(field, &[selection, comparison], policy)
        else {
            continue;
        };
        let accs_s = bucketing.accumulate(selection, &main_field.fid);
        let accs_c = bucketing.accumulate(comparison, &main_field.fid);
        results.extend(field_entry(
            &bucketing,
            &accs_s,
            &accs_c,
            &total_s,
            aggregator,
        ));
        for (idx, (acc_s, acc_c)) in accs_s.into_iter().zip(accs_c).enumerate() {
            let inside = acc_s.finish();
            let other = acc_c.finish();
            if inside.is_empty() && other.is_empty() {
                continue;
            }
            let rs = inside.ratio(aggregator);
            let rc = other.ratio(aggregator);
            let contribution = rs.weight_in(&ratio_s) * rs.value().unwrap_or(0.0)
                - rc.weight_in(&ratio_c) * rc.value().unwrap_or(0.0);
            results.push(SubgroupResult {
                fid: field.fid.clone(),
                bucket: Some(idx),
                divider: bucketing.divider(idx),
                size: inside.rows,
                inside: inside.get(aggregator),
                outside: total_s.complement(&inside).get(aggregator),
                counterpart: Some(Counterpart {
                    size: other.rows,
                    inside: other.get(aggregator),
                }),
                contribution,
                score: contribution.abs(),
            });
        }
    }

    log::debug!(
        "comparison analysis of {main_field}: {} vs {} rows, {} candidates",
        selection.len(),
        comparison.len(),
        results.len()
    );
    rank_results(&mut results);
    Ok(results)
}

fn merged(accs: &[AggregateAccumulator]) -> AggregateAccumulator {
    accs.iter()
        .fold(AggregateAccumulator::new(), |mut total, acc| {
            total.merge(acc);
            total
        })
}

/// Builds the whole-field entry over the value buckets of `bucketing`.
///
/// `None` when either group has no defined aggregate on present values.
fn field_entry(
    bucketing: &Bucketing<'_>,
    accs_s: &[AggregateAccumulator],
    accs_c: &[AggregateAccumulator],
    total_s: &AggregateStats,
    aggregator: Aggregator,
) -> Option<SubgroupResult> {
    let values = bucketing.value_buckets();
    let (accs_s, accs_c) = (&accs_s[..values], &accs_c[..values]);
    let present_s = merged(accs_s).finish();
    let present_c = merged(accs_c).finish();
    let ratio_s = present_s.ratio(aggregator);
    let ratio_c = present_c.ratio(aggregator);
    let gap = ratio_s.value()? - ratio_c.value()?;

    let distance = accs_s
        .iter()
        .zip(accs_c)
        .map(|(acc_s, acc_c)| {
            let w_s = acc_s.finish().ratio(aggregator).weight_in(&ratio_s);
            let w_c = acc_c.finish().ratio(aggregator).weight_in(&ratio_c);
            (w_s - w_c).abs()
        })
        .sum::<f64>()
        / 2.0;
    let contribution = gap * distance;

    Some(SubgroupResult {
        fid: bucketing.field().fid.clone(),
        bucket: None,
        divider: bucketing.present_divider()?,
        size: present_s.rows,
        inside: present_s.get(aggregator),
        outside: total_s.complement(&present_s).get(aggregator),
        counterpart: Some(Counterpart {
            size: present_c.rows,
            inside: present_c.get(aggregator),
        }),
        contribution,
        score: contribution.abs(),
    })
}

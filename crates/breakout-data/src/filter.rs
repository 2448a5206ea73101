//! Single-field filters and the filter engine
//!
//! A [`Filter`] is a predicate over one field:
//!
//! - `{ "fid": "age", "range": [18, 30] }`: inclusive numeric range, for
//!   quantitative, ordinal and temporal fields. Date text is compared by its
//!   epoch milliseconds (see [`Value::as_ordered`]).
//! - `{ "fid": "city", "values": ["Oslo", "Bergen"] }`: membership test, for
//!   nominal fields and for ordinal fields with text levels
//!
//! A filter set is the conjunction of its filters. [`apply_dividers`]
//! partitions rows into those matching every filter and the rest.
//!
//! # Missing values
//!
//! A missing value never satisfies a range filter. It satisfies a value-set
//! filter only when `null` is listed in `values`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    row::Row,
    value::{CategoryKey, Value},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    Range { fid: String, range: [f64; 2] },
    Values { fid: String, values: Vec<Value> },
}

impl Filter {
    #[must_use]
    pub fn range(fid: impl Into<String>, min: f64, max: f64) -> Self {
        Filter::Range {
            fid: fid.into(),
            range: [min, max],
        }
    }

    #[must_use]
    pub fn values<I, V>(fid: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::Values {
            fid: fid.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn fid(&self) -> &str {
        match self {
            Filter::Range { fid, .. } | Filter::Values { fid, .. } => fid,
        }
    }

    /// Compiles this filter for repeated evaluation.
    #[must_use]
    pub fn divider(&self) -> Divider<'_> {
        Divider::new(self)
    }

    /// Tests a single row. Prefer [`apply_dividers`] for many rows.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.divider().matches(row)
    }
}

/// A filter with a stable identifier, used to key filter lists in a UI.
///
/// The identifier plays no role in computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueFilter {
    pub id: u64,
    pub filter: Filter,
}

impl UniqueFilter {
    #[must_use]
    pub fn new(filter: Filter) -> Self {
        Self {
            id: rand::random(),
            filter,
        }
    }

    /// Strips identifiers off a keyed filter list.
    #[must_use]
    pub fn into_filters(filters: Vec<UniqueFilter>) -> Vec<Filter> {
        filters.into_iter().map(|f| f.filter).collect()
    }
}

impl From<Filter> for UniqueFilter {
    fn from(filter: Filter) -> Self {
        Self::new(filter)
    }
}

/// A compiled [`Filter`].
#[derive(Debug, Clone)]
pub enum Divider<'a> {
    Range {
        fid: &'a str,
        min: f64,
        max: f64,
    },
    Values {
        fid: &'a str,
        keys: HashSet<CategoryKey>,
    },
}

impl<'a> Divider<'a> {
    #[must_use]
    pub fn new(filter: &'a Filter) -> Self {
        match filter {
            Filter::Range { fid, range } => {
                let [a, b] = *range;
                Divider::Range {
                    fid,
                    min: a.min(b),
                    max: a.max(b),
                }
            }
            Filter::Values { fid, values } => Divider::Values {
                fid,
                keys: values.iter().map(Value::category_key).collect(),
            },
        }
    }

    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Divider::Range { fid, min, max } => row
                .get(fid)
                .as_ordered()
                .is_some_and(|v| *min <= v && v <= *max),
            Divider::Values { fid, keys } => keys.contains(&row.get(fid).category_key()),
        }
    }
}

/// Result of dividing rows by a filter set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Division {
    /// Rows satisfying every filter, in input order.
    pub matched: Vec<Row>,
    /// Rows failing at least one filter, in input order.
    pub unmatched: Vec<Row>,
}

/// Partitions `rows` by the conjunction of `filters`.
///
/// An empty filter set matches every row. Input order is preserved on both
/// sides, and the input is not modified.
#[must_use]
pub fn apply_dividers(rows: &[Row], filters: &[Filter]) -> Division {
    if filters.is_empty() {
        return Division {
            matched: rows.to_vec(),
            unmatched: vec![],
        };
    }

    let dividers = filters.iter().map(Divider::new).collect::<Vec<_>>();
    let (matched, unmatched) = rows
        .iter()
        .cloned()
        .partition(|row| dividers.iter().all(|divider| divider.matches(row)));
    Division { matched, unmatched }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Row> {
        vec![
            Row::from_iter([("f", Value::from(10)), ("c", Value::from("a"))]),
            Row::from_iter([("f", Value::from(20)), ("c", Value::from("b"))]),
            Row::from_iter([("f", Value::from(30)), ("c", Value::Null)]),
            Row::from_iter([("c", Value::from("a"))]),
        ]
    }

    fn values_of(rows: &[Row], fid: &str) -> Vec<Value> {
        rows.iter().map(|row| row.get(fid).clone()).collect()
    }

    #[test]
    fn test_empty_filters_match_everything() {
        let rows = rows();
        let division = apply_dividers(&rows, &[]);
        assert_eq!(division.matched, rows);
        assert!(division.unmatched.is_empty());
    }

    #[test]
    fn test_range_is_inclusive_and_rejects_missing() {
        let rows = rows();
        let division = apply_dividers(&rows, &[Filter::range("f", 10.0, 20.0)]);
        assert_eq!(values_of(&division.matched, "f"), vec![Value::from(10), Value::from(20)]);
        assert_eq!(division.unmatched.len(), 2);
    }

    #[test]
    fn test_reversed_range_bounds() {
        let rows = rows();
        let division = apply_dividers(&rows, &[Filter::range("f", 25.0, 15.0)]);
        assert_eq!(values_of(&division.matched, "f"), vec![Value::from(20)]);
    }

    #[test]
    fn test_values_filter_membership() {
        let rows = rows();
        let division = apply_dividers(&rows, &[Filter::values("c", ["a"])]);
        assert_eq!(division.matched.len(), 2);

        let with_null = Filter::values("c", [Value::from("b"), Value::Null]);
        let division = apply_dividers(&rows, &[with_null]);
        assert_eq!(values_of(&division.matched, "f"), vec![Value::from(20), Value::from(30)]);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let rows = rows();
        let filters = [Filter::values("c", ["a"]), Filter::range("f", 0.0, 100.0)];
        let division = apply_dividers(&rows, &filters);
        assert_eq!(division.matched.len(), 1);
        assert_eq!(division.matched[0].get("f"), &Value::from(10));
    }

    #[test]
    fn test_unknown_field_matches_nothing() {
        let rows = rows();
        let division = apply_dividers(&rows, &[Filter::range("nope", 0.0, 1.0)]);
        assert!(division.matched.is_empty());
        assert_eq!(division.unmatched.len(), rows.len());
    }

    #[test]
    fn test_partition_covers_input_exactly_once() {
        let rows = rows();
        let filter_sets = [
            vec![Filter::range("f", 15.0, 35.0)],
            vec![Filter::values("c", [Value::Null])],
            vec![Filter::values("c", ["a", "b"]), Filter::range("f", 0.0, 15.0)],
        ];
        for filters in &filter_sets {
            let division = apply_dividers(&rows, filters);
            assert_eq!(division.matched.len() + division.unmatched.len(), rows.len());
            for row in &rows {
                let in_matched = division.matched.iter().filter(|r| r.ptr_eq(row)).count();
                let in_unmatched = division.unmatched.iter().filter(|r| r.ptr_eq(row)).count();
                assert_eq!(in_matched + in_unmatched, 1);
            }
        }
    }

    #[test]
    fn test_unique_filter_ids_do_not_affect_division() {
        let rows = rows();
        let keyed: Vec<UniqueFilter> = vec![Filter::range("f", 15.0, 35.0).into()];
        let filters = UniqueFilter::into_filters(keyed.clone());
        assert_eq!(filters, vec![keyed[0].filter.clone()]);
        assert_eq!(
            apply_dividers(&rows, &filters),
            apply_dividers(&rows, &[Filter::range("f", 15.0, 35.0)])
        );
    }

    #[test]
    fn test_range_over_date_text() {
        let rows = vec![
            Row::from_iter([("d", "2024-01-01")]),
            Row::from_iter([("d", "2024-03-01")]),
            Row::from_iter([("d", "soon")]),
        ];
        let from = crate::parse_temporal("2024-02-01").unwrap();
        let to = crate::parse_temporal("2024-12-31").unwrap();
        let division = apply_dividers(&rows, &[Filter::range("d", from, to)]);
        assert_eq!(values_of(&division.matched, "d"), vec![Value::from("2024-03-01")]);
        assert_eq!(division.unmatched.len(), 2);
    }

    #[test]
    fn test_filter_json_shapes() {
        let filters: Vec<Filter> =
            serde_json::from_str(r#"[{"fid": "f", "range": [0, 25]}, {"fid": "c", "values": ["a", null]}]"#)
                .unwrap();
        assert_eq!(filters[0], Filter::range("f", 0.0, 25.0));
        assert_eq!(filters[1], Filter::values("c", [Value::from("a"), Value::Null]));
    }
}

use std::fmt;

use breakout_stats::aggregate::Aggregator;
use serde::{Deserialize, Serialize};

use crate::field::{FieldMeta, find_field};

/// The measure being tracked and decomposed: a field plus an aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MainField {
    pub fid: String,
    pub aggregator: Aggregator,
}

impl MainField {
    #[must_use]
    pub fn new(fid: impl Into<String>, aggregator: Aggregator) -> Self {
        Self {
            fid: fid.into(),
            aggregator,
        }
    }
}

impl fmt::Display for MainField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.aggregator, self.fid)
    }
}

/// The concrete field a [`MainField`] is measured on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareTarget {
    pub field: FieldMeta,
}

/// Maps a main field to the field its statistics are computed over.
///
/// Derived measures (rates, ratios) may target a different column than the
/// one the user picked; implementations decide that mapping. Returning
/// `None` marks the main field as unresolvable, and every stage depending on
/// it short-circuits to its empty state.
pub trait CompareTargetResolver: fmt::Debug {
    fn resolve(&self, main_field: &MainField, fields: &[FieldMeta]) -> Option<CompareTarget>;
}

/// Resolves a main field to the field with the same id.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldLookupResolver;

impl CompareTargetResolver for FieldLookupResolver {
    fn resolve(&self, main_field: &MainField, fields: &[FieldMeta]) -> Option<CompareTarget> {
        find_field(fields, &main_field.fid).map(|field| CompareTarget {
            field: field.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_resolver() {
        let fields = vec![FieldMeta::measure("price"), FieldMeta::dimension("city")];
        let resolver = FieldLookupResolver;

        let target = resolver
            .resolve(&MainField::new("price", Aggregator::Mean), &fields)
            .unwrap();
        assert_eq!(target.field.fid, "price");

        assert!(
            resolver
                .resolve(&MainField::new("missing", Aggregator::Sum), &fields)
                .is_none()
        );
    }

    #[test]
    fn test_display() {
        let main_field = MainField::new("price", Aggregator::Sum);
        assert_eq!(main_field.to_string(), "sum(price)");
    }
}

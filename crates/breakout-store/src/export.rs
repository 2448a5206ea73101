//! Serializable snapshot of the store's inputs
//!
//! [`StoreSnapshot`] is what [`BreakoutStore::export`](crate::BreakoutStore::export)
//! hands to a persistence layer. Each entry carries the display name and
//! semantic type of the field it refers to, so a saved session stays
//! readable without the field list. Entries whose field cannot be resolved
//! are left out.
//!
//! ```json
//! {
//!   "main_field": {
//!     "main_field": { "fid": "price", "aggregator": "mean" },
//!     "name": "Price",
//!     "semantic_type": "quantitative"
//!   },
//!   "main_field_filters": [
//!     { "filter": { "fid": "city", "values": ["Oslo"] }, "name": "City", "semantic_type": "nominal" }
//!   ],
//!   "comparison_filters": []
//! }
//! ```

use breakout_data::{FieldMeta, Filter, MainField, SemanticType, find_field};
use serde::{Deserialize, Serialize};

/// Exported inputs of a store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub main_field: Option<ExportedMainField>,
    #[serde(default)]
    pub main_field_filters: Vec<ExportedFilter>,
    #[serde(default)]
    pub comparison_filters: Vec<ExportedFilter>,
}

/// A main field annotated with its resolved target field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedMainField {
    pub main_field: MainField,
    pub name: String,
    pub semantic_type: SemanticType,
}

/// A filter annotated with the field it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedFilter {
    pub filter: Filter,
    pub name: String,
    pub semantic_type: SemanticType,
}

impl ExportedMainField {
    pub(crate) fn new(main_field: &MainField, target: &FieldMeta) -> Self {
        Self {
            main_field: main_field.clone(),
            name: target.name.clone(),
            semantic_type: target.semantic_type,
        }
    }
}

/// Annotates `filters`, dropping those on unknown fields.
pub(crate) fn export_filters(filters: &[Filter], fields: &[FieldMeta]) -> Vec<ExportedFilter> {
    filters
        .iter()
        .filter_map(|filter| {
            let Some(field) = find_field(fields, filter.fid()) else {
                log::debug!("export: dropping filter on unknown field '{}'", filter.fid());
                return None;
            };
            Some(ExportedFilter {
                filter: filter.clone(),
                name: field.name.clone(),
                semantic_type: field.semantic_type,
            })
        })
        .collect()
}

impl StoreSnapshot {
    /// Returns the filters of an exported list, without annotations.
    #[must_use]
    pub fn filters(exported: &[ExportedFilter]) -> Vec<Filter> {
        exported.iter().map(|e| e.filter.clone()).collect()
    }
}

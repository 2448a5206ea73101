//! Data model of the Breakout exploration engine
//!
//! - [`value`]: Scalar cell values and hashable category keys
//! - [`row`]: Immutable, cheaply clonable rows
//! - [`field`]: Field metadata (semantic type, analytic role)
//! - [`filter`]: Single-field filters and the filter engine ([`apply_dividers`])
//! - [`main_field`]: The tracked measure and its compare-target resolution
//!
//! Everything here is read-only once constructed; the dataset handed to the
//! store is a `Vec<Row>` that is never mutated.

pub use self::{
    field::{AnalyticRole, FieldMeta, SemanticType, find_field},
    filter::{Divider, Division, Filter, UniqueFilter, apply_dividers},
    main_field::{CompareTarget, CompareTargetResolver, FieldLookupResolver, MainField},
    row::Row,
    value::{CategoryKey, Value, parse_temporal},
};
pub use breakout_stats::aggregate::Aggregator;

pub mod field;
pub mod filter;
pub mod main_field;
pub mod row;
pub mod value;

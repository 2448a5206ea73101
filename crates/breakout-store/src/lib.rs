//! Reactive subgroup-discovery store
//!
//! [`BreakoutStore`] owns three inputs (the main field, the selection
//! filters and the comparison filters) over an immutable dataset, and keeps
//! seven published outputs in sync with them.
//!
//! # Dataflow
//!
//! ```text
//! main_field ──► global ──────────────┬──────────────► general_analyses
//!                  │                  │                     ▲
//! main_field_filters ──► main_group ──┼── selection ────────┤
//!                  │                  │                     ▼
//! comparison_filters ──► compare_group ── diff_group ──► comparison_analyses
//! ```
//!
//! - **`global`**: resolves the main field to its target field and
//!   aggregates it over the whole dataset (`global_stats`)
//! - **`main_group`**: filters the dataset into `selection`, and aggregates
//!   the target over it (`selection_stats`) when filters are set
//! - **`compare_group`**: the same for the comparison filters (`diff_group`,
//!   `diff_stats`)
//! - **analyses**: contribution analysis of `selection` against the global
//!   baseline, and comparison analysis of `selection` against `diff_group`
//!
//! Every setter bumps a version counter. Stages remember the versions they
//! last ran with and only rerun when one of their inputs was replaced.
//!
//! # Scheduling
//!
//! Group stages run synchronously inside the setters. The analyses are
//! throttled (200 ms by default, see [`StoreConfig`]): the first change
//! after a quiet period is analyzed at once, and a burst of later changes
//! collapses into a single trailing run with the latest inputs. The host
//! drives trailing runs with [`BreakoutStore::poll`] from its event loop, or
//! blocks on [`BreakoutStore::settle`].
//!
//! # Failures
//!
//! A stage that panics is logged and keeps its previous output. An analysis
//! error (for example a non-numeric target with a `mean` aggregator) is
//! logged and publishes an empty list.
//!
//! # Examples
//!
//! ```
//! use breakout_data::{Aggregator, FieldMeta, Filter, MainField, Row};
//! use breakout_store::BreakoutStore;
//!
//! let data: Vec<Row> = [10, 20, 30, 40]
//!     .into_iter()
//!     .map(|v| Row::from_iter([("f", v)]))
//!     .collect();
//! let mut store = BreakoutStore::new(data, vec![FieldMeta::measure("f")]);
//!
//! store.set_main_field(Some(MainField::new("f", Aggregator::Mean)));
//! assert_eq!(store.global_stats().and_then(|s| s.value()), Some(25.0));
//!
//! store.set_main_field_filters(vec![Filter::range("f", 0.0, 25.0)]);
//! store.set_comparison_filters(vec![Filter::range("f", 25.0, 40.0)]);
//! store.settle();
//!
//! assert_eq!(store.selection_stats().and_then(|s| s.value()), Some(15.0));
//! assert_eq!(store.diff_stats().and_then(|s| s.value()), Some(35.0));
//! assert_eq!(store.comparison_analyses()[0].fid, "f");
//! ```

pub use self::{
    clock::{Clock, ManualClock, SystemClock},
    config::StoreConfig,
    export::{ExportedFilter, ExportedMainField, StoreSnapshot},
    observable::SubscriptionId,
    store::BreakoutStore,
};

mod clock;
mod config;
mod export;
mod observable;
mod stage;
mod store;
mod throttle;

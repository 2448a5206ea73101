//! Statistical building blocks for the Breakout exploration engine.
//!
//! This crate is data-model agnostic: it works on plain numbers and
//! observations, and knows nothing about rows, fields or filters.
//!
//! - **Aggregation**: Mean, sum and count over a stream of observations,
//!   including missing values
//! - **Ratio decomposition**: Every aggregator expressed as
//!   `numerator / denominator`, so that sub-population terms add up exactly
//! - **Adaptive binning**: Equal-frequency bins for splitting continuous values
//!
//! # Modules
//!
//! - [`aggregate`]: Aggregators, accumulators and aggregate statistics
//! - [`binning`]: Adaptive (equal-frequency) binning of sorted values
//!
//! # Examples
//!
//! ## Aggregating observations
//!
//! ```
//! use breakout_stats::aggregate::{AggregateAccumulator, Aggregator, Observation};
//!
//! let mut acc = AggregateAccumulator::new();
//! acc.push(Observation::Number(10.0));
//! acc.push(Observation::Number(20.0));
//! acc.push(Observation::Missing);
//! let stats = acc.finish();
//!
//! assert_eq!(stats.get(Aggregator::Mean), Some(15.0));
//! assert_eq!(stats.get(Aggregator::Count), Some(2.0));
//! assert_eq!(stats.rows, 3);
//! ```
//!
//! ## Binning continuous values
//!
//! ```
//! use breakout_stats::binning::create_adaptive_bins;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let bins = create_adaptive_bins(&values, 3, 1);
//! assert_eq!(bins.len(), 3);
//! assert_eq!((bins[0].start, bins[0].end), (1.0, 2.0));
//! ```

pub mod aggregate;
pub mod binning;

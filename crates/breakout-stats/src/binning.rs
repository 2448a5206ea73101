//! Adaptive binning for continuous values
//!
//! Bins are built from the data distribution rather than fixed intervals:
//! each bin collects roughly the same number of samples (equal-frequency
//! binning), and a run of identical values is never split across bins.
//!
//! # Algorithm
//!
//! 1. Walk the sorted values run by run (one run per unique value)
//! 2. Target samples per bin: `max(ceil(total / target_bins), min_samples)`
//! 3. Accumulate runs into the current bin until it reaches the target
//! 4. Close the bin, recording `[start, end]` and its sample count
//! 5. Any remaining runs form the last bin
//!
//! Because bins are made of whole runs, the inclusive ranges `[start, end]`
//! never overlap, and every input value falls in exactly one bin.
//!
//! # Examples
//!
//! ```
//! use breakout_stats::binning::create_adaptive_bins;
//!
//! // Skewed distribution: many zeros, a few large values
//! let mut values = vec![0.0; 6];
//! values.extend([1.0, 2.0, 50.0, 60.0]);
//!
//! let bins = create_adaptive_bins(&values, 3, 1);
//!
//! // The zeros are one run and get their own bin
//! assert_eq!((bins[0].start, bins[0].end, bins[0].count), (0.0, 0.0, 6));
//! // The sparse tail is grouped
//! assert_eq!(bins.last().unwrap().end, 60.0);
//! ```

/// Information about an adaptive bin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinInfo {
    /// The minimum value in this bin
    pub start: f64,
    /// The maximum value in this bin (inclusive)
    pub end: f64,
    /// Total number of samples in this bin
    pub count: usize,
    /// Representative value for this bin (median of its unique values)
    pub representative: f64,
}

impl BinInfo {
    fn from_unique_values(values: &[f64], count: usize) -> Self {
        Self {
            start: values[0],
            end: values[values.len() - 1],
            count,
            representative: values[values.len() / 2],
        }
    }

    /// Returns whether `value` lies in `[start, end]`.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.start <= value && value <= self.end
    }
}

/// Create adaptive bins over sorted, finite values
///
/// # Arguments
///
/// * `sorted_values` - Values sorted in ascending order
/// * `target_bins` - Desired number of bins; fewer are produced when the data
///   has fewer unique values or when `min_samples` dominates
/// * `min_samples` - Minimum number of samples per bin (the last bin may hold
///   fewer)
///
/// # Returns
///
/// Bins in ascending order. Empty input or `target_bins == 0` yields no bins.
///
/// # Panics
///
/// Panics if `sorted_values` is not sorted in ascending order.
#[must_use]
pub fn create_adaptive_bins(
    sorted_values: &[f64],
    target_bins: usize,
    min_samples: usize,
) -> Vec<BinInfo> {
    assert!(
        sorted_values.is_sorted_by(|a, b| a <= b),
        "values must be sorted in ascending order"
    );

    if sorted_values.is_empty() || target_bins == 0 {
        return vec![];
    }

    let total_samples = sorted_values.len();
    let target_samples_per_bin = total_samples
        .div_ceil(target_bins)
        .max(min_samples)
        .min(total_samples);

    let mut bins = vec![];
    let mut current_bin_values: Vec<f64> = vec![];
    let mut current_bin_count = 0;

    // On sorted input `a >= b` means IEEE equality, which keeps `-0.0` and
    // `0.0` in one run.
    for run in sorted_values.chunk_by(|a, b| a >= b) {
        current_bin_values.push(run[0]);
        current_bin_count += run.len();

        if current_bin_count >= target_samples_per_bin {
            bins.push(BinInfo::from_unique_values(
                &current_bin_values,
                current_bin_count,
            ));
            current_bin_values.clear();
            current_bin_count = 0;
        }
    }

    if !current_bin_values.is_empty() {
        bins.push(BinInfo::from_unique_values(
            &current_bin_values,
            current_bin_count,
        ));
    }

    bins
}

/// Finds the bin containing `value`.
///
/// Values in the gap between two bins, or outside all bins, yield `None`.
#[must_use]
pub fn find_bin(bins: &[BinInfo], value: f64) -> Option<usize> {
    let idx = bins.partition_point(|bin| bin.end < value);
    bins.get(idx).filter(|bin| bin.contains(value)).map(|_| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(create_adaptive_bins(&[], 5, 1).is_empty());
        assert!(create_adaptive_bins(&[1.0], 0, 1).is_empty());
    }

    #[test]
    fn test_single_value() {
        let bins = create_adaptive_bins(&[42.0], 5, 1);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].start, 42.0);
        assert_eq!(bins[0].end, 42.0);
        assert_eq!(bins[0].representative, 42.0);
        assert_eq!(bins[0].count, 1);
    }

    #[test]
    fn test_uniform_distribution() {
        let values = (1..=10).map(f64::from).collect::<Vec<_>>();
        let bins = create_adaptive_bins(&values, 5, 1);
        assert_eq!(bins.len(), 5);
        assert!(bins.iter().all(|bin| bin.count == 2));
        assert_eq!((bins[4].start, bins[4].end), (9.0, 10.0));
    }

    #[test]
    fn test_runs_are_never_split() {
        let values = [1.0, 1.0, 1.0, 2.0, 3.0, 3.0, 3.0, 3.0];
        let bins = create_adaptive_bins(&values, 4, 1);
        for value in values {
            let containing = bins.iter().filter(|bin| bin.contains(value)).count();
            assert_eq!(containing, 1, "value {value} must be in exactly one bin");
        }
        assert_eq!(bins.iter().map(|bin| bin.count).sum::<usize>(), values.len());
    }

    #[test]
    fn test_minimum_samples_constraint() {
        let values = (0..10).map(f64::from).collect::<Vec<_>>();
        let bins = create_adaptive_bins(&values, 10, 4);
        // 4 samples per bin: [0..3], [4..7], [8..9]
        assert_eq!(bins.len(), 3);
        assert_eq!(bins[2].count, 2);
    }

    #[test]
    fn test_all_same_value() {
        let bins = create_adaptive_bins(&[7.0; 20], 5, 1);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 20);
    }

    #[test]
    fn test_signed_zeros_share_a_bin() {
        let values = [-0.0, 0.0, 1.0];
        let bins = create_adaptive_bins(&values, 3, 1);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 2);
        assert_eq!(find_bin(&bins, -0.0), Some(0));
        assert_eq!(find_bin(&bins, 0.0), Some(0));
        assert_eq!(find_bin(&bins, 1.0), Some(1));
    }

    #[test]
    fn test_find_bin() {
        let values = [1.0, 2.0, 10.0, 11.0];
        let bins = create_adaptive_bins(&values, 2, 1);
        assert_eq!(find_bin(&bins, 1.0), Some(0));
        assert_eq!(find_bin(&bins, 2.0), Some(0));
        assert_eq!(find_bin(&bins, 11.0), Some(1));
        // Gap between bins
        assert_eq!(find_bin(&bins, 5.0), None);
        assert_eq!(find_bin(&bins, 100.0), None);
    }
}

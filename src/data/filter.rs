use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{Result, SieveError};
use super::model::{count_present, Sample, Sequence};
use super::window::rolling_mean;

// ---------------------------------------------------------------------------
// Strategy: which filter to run and with which parameters
// ---------------------------------------------------------------------------

/// An outlier filter together with its parameters.
///
/// Serialized with a `kind` tag so cleaning plans can list steps as
/// `{ "kind": "rolling_mean", "threshold": 0.5, "window": 60 }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterStrategy {
    /// Drop samples that jump away from their immediate neighbors.
    Neighbor { threshold: f64 },
    /// Drop samples far from the centered rolling mean.
    RollingMean { threshold: f64, window: usize },
}

impl FilterStrategy {
    pub fn threshold(&self) -> f64 {
        match *self {
            FilterStrategy::Neighbor { threshold } => threshold,
            FilterStrategy::RollingMean { threshold, .. } => threshold,
        }
    }

    /// Reject non-positive or non-finite thresholds and empty windows.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.threshold();
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(SieveError::InvalidThreshold(threshold));
        }
        if let FilterStrategy::RollingMean { window, .. } = *self {
            if window == 0 {
                return Err(SieveError::InvalidWindow(window));
            }
        }
        Ok(())
    }

    /// Validate, then run the filter over `values`.
    pub fn apply(&self, values: &[Sample]) -> Result<Sequence> {
        self.validate()?;
        Ok(match *self {
            FilterStrategy::Neighbor { threshold } => neighbor_filter(values, threshold),
            FilterStrategy::RollingMean { threshold, window } => {
                rolling_filter(values, threshold, window)
            }
        })
    }
}

impl fmt::Display for FilterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStrategy::Neighbor { threshold } => write!(
                f,
                "Max difference between value and its neighbors: {threshold}"
            ),
            FilterStrategy::RollingMean { threshold, window } => write!(
                f,
                "Number of data for moving average: {window}\n\
                 Max difference between value and moving average: {threshold}"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Neighbor-deviation filter.
///
/// A sample is kept only when it lies within `threshold` of every usable
/// neighbor. At either end of the sequence only the existing neighbor is
/// checked; a missing neighbor is ignored the same way. A sample with no
/// usable neighbor at all is kept.
pub fn neighbor_filter(values: &[Sample], threshold: f64) -> Sequence {
    (0..values.len())
        .map(|i| {
            let x = values[i]?;
            let left = i.checked_sub(1).and_then(|j| values[j]);
            let right = values.get(i + 1).copied().flatten();
            let within = |n: Option<f64>| n.map_or(true, |n| (x - n).abs() < threshold);
            (within(left) && within(right)).then_some(x)
        })
        .collect()
}

/// Rolling-mean-deviation filter.
///
/// Positions where the rolling mean is undefined are passed through untouched.
pub fn rolling_filter(values: &[Sample], threshold: f64, window: usize) -> Sequence {
    let mean = rolling_mean(values, window);
    values
        .iter()
        .zip(&mean)
        .map(|(&x, &m)| match (x, m) {
            (Some(x), Some(m)) => ((x - m).abs() < threshold).then_some(x),
            _ => x,
        })
        .collect()
}

/// Positions present in `before` but missing in `after`.
pub fn flagged_positions(before: &[Sample], after: &[Sample]) -> Vec<usize> {
    before
        .iter()
        .zip(after)
        .enumerate()
        .filter(|(_, (b, a))| b.is_some() && a.is_none())
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Summary of one filter run
// ---------------------------------------------------------------------------

/// Counts reported after a filter run.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSummary {
    pub column: String,
    pub strategy: FilterStrategy,
    /// Number of rows in the column.
    pub total: usize,
    /// Non-missing samples before filtering.
    pub kept_before: usize,
    /// Non-missing samples after filtering.
    pub kept_after: usize,
    /// Rows turned into missing by this run.
    pub flagged: Vec<usize>,
}

impl FilterSummary {
    pub fn new(
        column: &str,
        strategy: FilterStrategy,
        before: &[Sample],
        after: &[Sample],
    ) -> Self {
        FilterSummary {
            column: column.to_string(),
            strategy,
            total: before.len(),
            kept_before: count_present(before),
            kept_after: count_present(after),
            flagged: flagged_positions(before, after),
        }
    }

    /// Number of samples removed by this run.
    pub fn removed(&self) -> usize {
        self.kept_before - self.kept_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(values: &[f64]) -> Sequence {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn test_neighbor_boundary_rule() {
        // First sample is judged on its right neighbor only, last on its left.
        let out = neighbor_filter(&present(&[10.0, 10.0, 100.0]), 5.0);
        assert_eq!(out, vec![Some(10.0), None, None]);
    }

    #[test]
    fn test_neighbor_requires_both_sides() {
        // Index 2 is close to its left neighbor but far from its right one.
        let values = present(&[1.0, 1.0, 1.5, 9.0, 9.0]);
        let out = neighbor_filter(&values, 1.0);
        assert_eq!(out[0], Some(1.0));
        assert_eq!(out[1], Some(1.0));
        assert_eq!(out[2], None);
        assert_eq!(out[3], None);
        assert_eq!(out[4], Some(9.0));
    }

    #[test]
    fn test_neighbor_spike_takes_its_neighbors_along() {
        // Rows next to the spike see it as their neighbor too.
        let out = neighbor_filter(&present(&[2.0, 2.1, 30.0, 2.2, 2.0]), 5.0);
        assert_eq!(out, vec![Some(2.0), None, None, None, Some(2.0)]);
    }

    #[test]
    fn test_neighbor_ignores_missing_neighbors() {
        let values = vec![Some(5.0), None, Some(5.2), Some(5.1)];
        let out = neighbor_filter(&values, 0.5);
        assert_eq!(out, values);
    }

    #[test]
    fn test_neighbor_single_sample_kept() {
        assert_eq!(neighbor_filter(&[Some(3.0)], 0.1), vec![Some(3.0)]);
    }

    #[test]
    fn test_neighbor_threshold_is_strict() {
        let out = neighbor_filter(&present(&[0.0, 1.0]), 1.0);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn test_rolling_isolates_spike_with_wide_threshold() {
        let values = present(&[1.0, 1.0, 1.0, 1.0, 50.0, 1.0, 1.0, 1.0, 1.0]);
        let out = rolling_filter(&values, 10.0, 5);
        let summary = FilterSummary::new(
            "x",
            FilterStrategy::RollingMean {
                threshold: 10.0,
                window: 5,
            },
            &values,
            &out,
        );
        assert_eq!(summary.flagged, vec![4]);
        assert_eq!(summary.kept_after, 8);
        assert_eq!(summary.total, 9);
        for (i, (a, b)) in values.iter().zip(&out).enumerate() {
            if i != 4 {
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn test_rolling_spike_drags_neighbors_under_tight_threshold() {
        // The spike lifts the local mean of rows 2..=6 to 10.8, so a
        // threshold of 2 drops every row whose window contains it.
        let values = present(&[1.0, 1.0, 1.0, 1.0, 50.0, 1.0, 1.0, 1.0, 1.0]);
        let out = rolling_filter(&values, 2.0, 5);
        assert_eq!(flagged_positions(&values, &out), vec![2, 3, 4, 5, 6]);
        assert_eq!(count_present(&out), 4);
    }

    #[test]
    fn test_rolling_keeps_samples_without_mean() {
        // Window 9 needs three samples; the sparse tail has none nearby.
        let mut values: Sequence = vec![None; 20];
        values[0] = Some(1.0);
        values[1] = Some(1.0);
        values[2] = Some(1.0);
        values[19] = Some(1000.0);
        let mean = rolling_mean(&values, 9);
        let out = rolling_filter(&values, 0.1, 9);
        for i in 0..values.len() {
            if mean[i].is_none() {
                assert_eq!(out[i], values[i]);
            }
        }
        assert_eq!(out[19], Some(1000.0));
    }

    #[test]
    fn test_strategy_validation() {
        assert_eq!(
            FilterStrategy::Neighbor { threshold: 0.0 }.validate(),
            Err(SieveError::InvalidThreshold(0.0))
        );
        assert!(FilterStrategy::Neighbor {
            threshold: f64::NAN
        }
        .validate()
        .is_err());
        assert_eq!(
            FilterStrategy::RollingMean {
                threshold: 1.0,
                window: 0
            }
            .validate(),
            Err(SieveError::InvalidWindow(0))
        );
        assert!(FilterStrategy::RollingMean {
            threshold: 0.5,
            window: 60
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn test_strategy_serde_tag() {
        let s: FilterStrategy =
            serde_json::from_str(r#"{"kind":"rolling_mean","threshold":0.5,"window":60}"#)
                .unwrap();
        assert_eq!(
            s,
            FilterStrategy::RollingMean {
                threshold: 0.5,
                window: 60
            }
        );
        let s: FilterStrategy =
            serde_json::from_str(r#"{"kind":"neighbor","threshold":0.3}"#).unwrap();
        assert_eq!(s, FilterStrategy::Neighbor { threshold: 0.3 });
    }
}

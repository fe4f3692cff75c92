//! Metric binning
//!
//! Raw analyzer metrics (ratios, rates) are mapped to labeled bins.
//! Bins are ordered by their lower edge; a value on a shared boundary
//! belongs to the upper bin.

use crate::error::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

/// One labeled half-open interval `[low, high)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricBin {
    pub label: String,
    pub low: f64,
    pub high: f64,
}

impl MetricBin {
    pub fn center(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value < self.high
    }
}

/// Ordered bin table for one metric
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricBinTable {
    bins: Vec<MetricBin>,
}

impl MetricBinTable {
    pub fn new(bins: Vec<MetricBin>) -> Self {
        Self { bins }
    }

    /// Convenience constructor from `(label, low, high)` triples
    pub fn from_edges(edges: &[(&str, f64, f64)]) -> Self {
        Self {
            bins: edges
                .iter()
                .map(|(label, low, high)| MetricBin {
                    label: (*label).to_string(),
                    low: *low,
                    high: *high,
                })
                .collect(),
        }
    }

    pub fn bins(&self) -> &[MetricBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Label for a raw metric value
    ///
    /// First bin with `low <= value < high` wins; values at or past the
    /// last upper edge fall into the last bin. Returns `None` only for
    /// an empty table.
    pub fn label_for(&self, value: f64) -> Option<&str> {
        for bin in &self.bins {
            if bin.contains(value) {
                return Some(&bin.label);
            }
        }
        self.bins.last().map(|b| b.label.as_str())
    }

    /// Piecewise-linear position of a value across the table
    ///
    /// Returns a coordinate in `0.0..=len`: bin `i` spans `i..i+1`
    /// regardless of its width, so a narrow bin and a wide catch-all
    /// bin occupy equal stretches. Values outside the table clamp to
    /// the ends.
    pub fn coordinate(&self, value: f64) -> f64 {
        if self.bins.is_empty() {
            return 0.0;
        }
        if value < self.bins[0].low {
            return 0.0;
        }
        for (i, bin) in self.bins.iter().enumerate() {
            if value < bin.high {
                let frac = ((value - bin.low) / (bin.high - bin.low)).clamp(0.0, 1.0);
                return i as f64 + frac;
            }
        }
        self.bins.len() as f64
    }

    /// Checks interval sanity and contiguity
    ///
    /// Bins must be ordered, non-overlapping and gap-free: each bin's
    /// lower edge must equal the previous bin's upper edge.
    pub fn validate(&self, metric: &str) -> AnalysisResult<()> {
        let mut prev_high: Option<f64> = None;
        for bin in &self.bins {
            if bin.low >= bin.high {
                return Err(AnalysisError::Config(format!(
                    "metric '{}': bin '{}' has low {} >= high {}",
                    metric, bin.label, bin.low, bin.high
                )));
            }
            if let Some(prev_high) = prev_high {
                if (bin.low - prev_high).abs() > 1e-9 {
                    return Err(AnalysisError::Config(format!(
                        "metric '{}': bin '{}' starts at {} but the previous bin ends at {}",
                        metric, bin.label, bin.low, prev_high
                    )));
                }
            }
            prev_high = Some(bin.high);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gesture_bins() -> MetricBinTable {
        MetricBinTable::from_edges(&[
            ("INACTIVE", 0.0, 0.15),
            ("LOW", 0.15, 0.35),
            ("MODERATE", 0.35, 0.55),
            ("ACTIVE", 0.55, 1.0),
        ])
    }

    #[test]
    fn assigns_values_to_correct_bins() {
        let table = gesture_bins();
        assert_eq!(table.label_for(0.05), Some("INACTIVE"));
        assert_eq!(table.label_for(0.25), Some("LOW"));
        assert_eq!(table.label_for(0.45), Some("MODERATE"));
        assert_eq!(table.label_for(0.75), Some("ACTIVE"));
    }

    #[test]
    fn boundary_value_goes_to_upper_bin() {
        let table = gesture_bins();
        assert_eq!(table.label_for(0.15), Some("LOW"));
        assert_eq!(table.label_for(0.35), Some("MODERATE"));
        assert_eq!(table.label_for(0.55), Some("ACTIVE"));
    }

    #[test]
    fn out_of_range_falls_to_last_bin() {
        let table = gesture_bins();
        assert_eq!(table.label_for(1.0), Some("ACTIVE"));
        assert_eq!(table.label_for(3.5), Some("ACTIVE"));
    }

    #[test]
    fn empty_table_has_no_label() {
        let table = MetricBinTable::default();
        assert_eq!(table.label_for(0.5), None);
    }

    #[test]
    fn coordinate_is_linear_within_a_bin() {
        let table = gesture_bins();
        // LOW spans 0.15..0.35, so its midpoint sits at coordinate 1.5
        assert!((table.coordinate(0.25) - 1.5).abs() < 1e-9);
        assert!((table.coordinate(0.15) - 1.0).abs() < 1e-9);
        assert!((table.coordinate(0.0) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn coordinate_clamps_outside_the_table() {
        let table = gesture_bins();
        assert_eq!(table.coordinate(-0.5), 0.0);
        assert_eq!(table.coordinate(2.0), 4.0);
    }

    #[test]
    fn narrow_and_wide_bins_occupy_equal_stretches() {
        let table = MetricBinTable::from_edges(&[
            ("CLEAN", 0.0, 0.015),
            ("LOW", 0.015, 0.03),
            ("HEAVY", 0.03, 1.0),
        ]);
        // Center of the narrow first bin and of the wide last bin both
        // land mid-stretch.
        assert!((table.coordinate(0.0075) - 0.5).abs() < 1e-9);
        assert!((table.coordinate(0.515) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_inverted_interval() {
        let table = MetricBinTable::from_edges(&[("BAD", 0.5, 0.1)]);
        assert!(table.validate("test_metric").is_err());
    }

    #[test]
    fn validate_rejects_gaps_between_bins() {
        let table = MetricBinTable::from_edges(&[("LOW", 0.0, 0.3), ("HIGH", 0.4, 1.0)]);
        assert!(table.validate("test_metric").is_err());
    }

    #[test]
    fn validate_rejects_overlapping_bins() {
        let table = MetricBinTable::from_edges(&[("LOW", 0.0, 0.5), ("HIGH", 0.4, 1.0)]);
        assert!(table.validate("test_metric").is_err());
    }

    #[test]
    fn validate_accepts_ordered_bins() {
        assert!(gesture_bins().validate("gesture_active_ratio").is_ok());
    }
}

//! Continuous metric-to-score mapping
//!
//! Hard bin lookups produce score jumps at bin edges. The continuous
//! mapper instead blends the per-bin scores, weighting each bin by a
//! sigmoid of the distance from the value to the bin center. Distances
//! are measured in bin-coordinate space (one unit per bin, see
//! `MetricBinTable::coordinate`) so narrow bins and wide catch-all bins
//! blend the same way. Two values on either side of an edge then score
//! nearly the same.

use super::binning::MetricBinTable;
use std::collections::BTreeMap;

/// Default sigmoid steepness; higher values converge on hard binning
pub const DEFAULT_STEEPNESS: f64 = 10.0;

/// Half a bin, in coordinate units; the sigmoid crosses 0.5 at bin edges
const HALF_BIN: f64 = 0.5;

/// Sigmoid-weighted bin score blender
#[derive(Debug, Clone, Copy)]
pub struct ContinuousMapper {
    steepness: f64,
}

impl ContinuousMapper {
    pub fn new(steepness: f64) -> Self {
        Self { steepness }
    }

    pub fn steepness(&self) -> f64 {
        self.steepness
    }

    /// Map a raw value to a blended score over the bin table
    ///
    /// Degenerate tables short-circuit: an empty table scores 0.0 and a
    /// single bin returns its score exactly. If every weight underflows
    /// to zero the nearest bin center wins outright.
    pub fn map(
        &self,
        value: f64,
        table: &MetricBinTable,
        scores: &BTreeMap<String, f64>,
    ) -> f64 {
        if table.is_empty() {
            return 0.0;
        }
        if table.len() == 1 {
            let only = &table.bins()[0];
            return scores.get(&only.label).copied().unwrap_or(0.0);
        }

        let u = table.coordinate(value);
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for (i, bin) in table.bins().iter().enumerate() {
            let score = scores.get(&bin.label).copied().unwrap_or(0.0);
            let distance = (u - (i as f64 + 0.5)).abs();
            let weight = 1.0 / (1.0 + (self.steepness * (distance - HALF_BIN)).exp());
            weighted_sum += weight * score;
            weight_total += weight;
        }

        if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            // All weights underflowed (extreme steepness); fall back to
            // the nearest bin center.
            table
                .bins()
                .iter()
                .enumerate()
                .min_by(|(i, _), (j, _)| {
                    let da = (u - (*i as f64 + 0.5)).abs();
                    let db = (u - (*j as f64 + 0.5)).abs();
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                })
                .and_then(|(_, bin)| scores.get(&bin.label).copied())
                .unwrap_or(0.0)
        }
    }
}

impl Default for ContinuousMapper {
    fn default() -> Self {
        Self::new(DEFAULT_STEEPNESS)
    }
}

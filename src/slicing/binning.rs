use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Binning collaborator contract
// ---------------------------------------------------------------------------

/// Failure of a binning procedure. Surfaced unchanged through
/// [`SliceError::Binning`](crate::error::SliceError::Binning); never retried
/// here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BinningError {
    #[error("no values to bin")]
    EmptyInput,

    #[error("non-finite feature value {0}")]
    NonFinite(f64),

    #[error("binning exceeded its time limit of {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),
}

/// Produces ordered split points for one numeric feature, optionally
/// guided by a numeric target aligned with it.
pub trait Binner {
    fn fit_and_split(
        &self,
        feature: &[f64],
        target: Option<&[f64]>,
    ) -> Result<Vec<f64>, BinningError>;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    /// Upper bound on the number of bins.
    pub max_bins: usize,
    /// Smallest bin, as a fraction of the rows.
    pub min_prebin_size: f64,
    pub time_limit_secs: u64,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            max_bins: 10,
            min_prebin_size: 0.02,
            time_limit_secs: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// QuantileBinner – equal-frequency reference binner
// ---------------------------------------------------------------------------

/// Equal-frequency binning. Ignores the target; a split is kept only when
/// both sides hold at least `min_prebin_size` of the rows.
#[derive(Debug, Clone, Default)]
pub struct QuantileBinner {
    config: BinningConfig,
}

impl QuantileBinner {
    pub fn new(config: BinningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BinningConfig {
        &self.config
    }
}

impl Binner for QuantileBinner {
    fn fit_and_split(
        &self,
        feature: &[f64],
        target: Option<&[f64]>,
    ) -> Result<Vec<f64>, BinningError> {
        if feature.is_empty() {
            return Err(BinningError::EmptyInput);
        }
        if let Some(bad) = feature.iter().find(|v| !v.is_finite()) {
            return Err(BinningError::NonFinite(*bad));
        }
        if let Some(target) = target {
            if target.len() != feature.len() {
                return Err(BinningError::Failed(format!(
                    "target has {} values but feature has {}",
                    target.len(),
                    feature.len()
                )));
            }
        }

        let started = Instant::now();
        let limit = Duration::from_secs(self.config.time_limit_secs);

        let mut sorted = feature.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let max_bins = self.config.max_bins.max(1);
        let min_bin = ((self.config.min_prebin_size * n as f64).ceil() as usize).max(1);

        let mut splits = Vec::new();
        let mut bin_start = 0;
        for i in 1..max_bins {
            if started.elapsed() > limit {
                return Err(BinningError::Timeout(limit));
            }
            let cut = sorted[i * n / max_bins];
            let start = sorted.partition_point(|v| *v < cut);
            if start - bin_start < min_bin || n - start < min_bin {
                continue;
            }
            splits.push(cut);
            bin_start = start;
        }
        Ok(splits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binner(max_bins: usize, min_prebin_size: f64) -> QuantileBinner {
        QuantileBinner::new(BinningConfig {
            max_bins,
            min_prebin_size,
            ..BinningConfig::default()
        })
    }

    #[test]
    fn equal_frequency_splits() {
        let ages = [5.0, 15.0, 25.0, 35.0, 45.0, 55.0, 65.0, 75.0, 85.0, 95.0];
        let splits = binner(3, 0.02).fit_and_split(&ages, None).unwrap();
        assert_eq!(splits, vec![35.0, 65.0]);
    }

    #[test]
    fn splits_are_strictly_ascending_with_ties() {
        let values = [1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0];
        let splits = binner(10, 0.0).fit_and_split(&values, None).unwrap();
        assert_eq!(splits, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn constant_feature_has_no_splits() {
        let splits = binner(4, 0.02).fit_and_split(&[7.0; 20], None).unwrap();
        assert!(splits.is_empty());
    }

    #[test]
    fn min_bin_size_drops_small_bins() {
        let values: Vec<f64> = (0..10).map(f64::from).collect();
        let splits = binner(10, 0.3).fit_and_split(&values, None).unwrap();
        assert_eq!(splits, vec![3.0, 6.0]);
    }

    #[test]
    fn rejects_bad_input() {
        let b = QuantileBinner::default();
        assert_eq!(b.fit_and_split(&[], None), Err(BinningError::EmptyInput));
        assert!(matches!(
            b.fit_and_split(&[1.0, f64::INFINITY], None),
            Err(BinningError::NonFinite(_))
        ));
        assert!(matches!(
            b.fit_and_split(&[1.0, 2.0], Some(&[1.0])),
            Err(BinningError::Failed(_))
        ));
    }
}

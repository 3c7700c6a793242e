//! Turning split points over one numeric feature into range slices.
//!
//! For ascending splits `s_1 < ... < s_k` the generator emits `k + 1`
//! half-open intervals:
//!
//! ```text
//!   f < s_1 | s_1 <= f < s_2 | ... | s_k <= f
//! ```
//!
//! A value equal to a split lands in the interval starting at that split.

use log::debug;

use crate::error::{Result, SliceError};

use super::clause::Clause;
use super::function::QueryBasedSliceFunction;
use super::query::Query;

#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionGenerator;

impl PartitionGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Partition `feature`'s domain at `splits`. No splits yields the single
    /// identity slice.
    pub fn generate(&self, feature: &str, splits: &[f64]) -> Result<Vec<QueryBasedSliceFunction>> {
        let ascending = splits.iter().all(|s| s.is_finite())
            && splits.windows(2).all(|w| w[0] < w[1]);
        if !ascending {
            return Err(SliceError::InvalidSplits {
                feature: feature.to_string(),
                splits: splits.to_vec(),
            });
        }

        let lowers = std::iter::once(None).chain(splits.iter().copied().map(Some));
        let uppers = splits.iter().copied().map(Some).chain(std::iter::once(None));

        let slices: Vec<QueryBasedSliceFunction> = lowers
            .zip(uppers)
            .map(|(lower, upper)| {
                let mut clauses = Vec::with_capacity(2);
                if let Some(lo) = lower {
                    clauses.push(Clause::greater_than_or_equal(feature, lo));
                }
                if let Some(hi) = upper {
                    clauses.push(Clause::lower_than(feature, hi));
                }
                QueryBasedSliceFunction::new(Query::and(clauses))
            })
            .collect();

        debug!("'{feature}': {} splits -> {} slices", splits.len(), slices.len());
        Ok(slices)
    }

    /// Like [`generate`](Self::generate), for a feature list that must hold
    /// exactly one feature; joint partitioning is not implemented.
    pub fn generate_for<S: AsRef<str>>(
        &self,
        features: &[S],
        splits: &[f64],
    ) -> Result<Vec<QueryBasedSliceFunction>> {
        match features {
            [feature] => self.generate(feature.as_ref(), splits),
            _ => Err(SliceError::UnsupportedDimensionality {
                features: features.len(),
            }),
        }
    }
}

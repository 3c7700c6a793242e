use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::slicing::binning::BinningConfig;

/// Settings for slice-candidate generation. Every field has a default, so a
/// config file only needs to name what it changes:
///
/// ```json
/// { "binning": { "max_bins": 5 }, "min_slice_size": 20 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SlicerConfig {
    pub binning: BinningConfig,
    /// Skip datasets with fewer rows than this.
    pub min_slice_size: Option<usize>,
    /// Let low-cardinality columns be inferred as categories.
    pub infer_column_types: bool,
}

impl SlicerConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

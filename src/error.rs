use thiserror::Error;

use crate::data::model::{ColumnType, Value};
use crate::slicing::binning::BinningError;

// ---------------------------------------------------------------------------
// Library error type
// ---------------------------------------------------------------------------

/// Errors raised by the table layer, the query algebra and the pipeline.
///
/// Every variant names the column, value, step or query rendering involved so
/// callers can tell which clause or slice triggered it.
#[derive(Error, Debug)]
pub enum SliceError {
    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("cannot compare {column} ({kind}) {operator} {value}")]
    TypeMismatch {
        column: String,
        kind: ColumnType,
        operator: String,
        value: Value,
    },

    #[error("processing pipeline produced an empty dataset (steps applied: {})", steps.join(", "))]
    EmptyResult { steps: Vec<String> },

    #[error("only single-feature slicing is implemented, got {features} features")]
    UnsupportedDimensionality { features: usize },

    #[error("binning failed: {0}")]
    Binning(#[from] BinningError),

    #[error("invalid query mode '{0}', expected AND or OR")]
    InvalidMode(String),

    #[error("split points for '{feature}' must be finite and strictly ascending: {splits:?}")]
    InvalidSplits { feature: String, splits: Vec<f64> },

    #[error("cannot construct a dataset from an empty table")]
    EmptyDataset,

    #[error("length mismatch: {what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("a target column must be specified")]
    MissingTarget,

    #[error("transformation '{name}' failed: {reason}")]
    Transformation { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SliceError>;

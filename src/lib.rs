//! Query-based data slicing for model quality testing.
//!
//! Slices are subsets of a dataset selected by a boolean [`Query`] over typed
//! columns (e.g. `age >= 60 & income < 20000`). This crate provides the
//! query algebra, slice and transformation functions with structural
//! equality, the per-dataset [`DataProcessor`] pipeline, and the generation
//! of candidate slices from binning splits or category values.
//!
//! ```no_run
//! use slice_finder::{Clause, Dataset, DatasetOptions, Query};
//!
//! # fn main() -> anyhow::Result<()> {
//! let table = slice_finder::data::loader::load_file("people.csv".as_ref())?;
//! let mut dataset = Dataset::new(table, DatasetOptions::default().target("default"))?;
//! let seniors = dataset.slice(Query::and([Clause::greater_than_or_equal("age", 60)]))?;
//! println!("{} seniors", seniors.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod slicing;

pub use config::SlicerConfig;
pub use data::dataset::{Dataset, DatasetOptions};
pub use data::model::{Column, ColumnType, RowMask, Table, Value};
pub use error::{Result, SliceError};
pub use slicing::binning::{Binner, BinningConfig, BinningError, QuantileBinner};
pub use slicing::clause::{Clause, Operand, Operator};
pub use slicing::finder::{CategorySlicer, NumericSlicer, SliceFinder};
pub use slicing::function::{
    PredicateSliceFunction, QueryBasedSliceFunction, SliceFunction, Step, TableFunction,
    TransformationFunction,
};
pub use slicing::partition::PartitionGenerator;
pub use slicing::pipeline::DataProcessor;
pub use slicing::query::{Mode, Query, QueryItem};

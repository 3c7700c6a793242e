/// Slicing engine: query algebra, slice functions, pipeline, and candidate
/// generation.
///
/// ```text
///   binning splits ──► partition ──► QueryBasedSliceFunction ──┐
///                                                              ▼
///   Clause ──► Query ──► SliceFunction / TransformationFunction ──► DataProcessor
///                                                              │
///                                            Dataset ◄─────────┘  apply
/// ```

pub mod binning;
pub mod clause;
pub mod finder;
pub mod function;
pub mod partition;
pub mod pipeline;
pub mod query;

/// Data layer: typed tables, loading, and datasets.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  typed columns, row masks, filtering
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  dataset  │  Table + target/name/id + its own DataProcessor
///   └──────────┘
/// ```

pub mod dataset;
pub mod loader;
pub mod model;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use slice_finder::data::loader::load_file;
use slice_finder::{
    ColumnType, Dataset, DatasetOptions, SliceError, SliceFinder, SlicerConfig, TableFunction,
};

/// Generate candidate data slices for each feature of a dataset and report
/// how many rows each one selects.
#[derive(Parser, Debug)]
#[command(name = "slice-finder", version)]
struct Args {
    /// Data file (.csv, .json or .parquet)
    path: PathBuf,

    /// Target (ground truth) column
    #[arg(long)]
    target: Option<String>,

    /// Features to slice, comma separated (default: every non-target column)
    #[arg(long, value_delimiter = ',')]
    features: Vec<String>,

    /// Columns to treat as categories, comma separated
    #[arg(long, value_delimiter = ',')]
    cat_columns: Vec<String>,

    /// Infer low-cardinality columns as categories
    #[arg(long)]
    infer_types: bool,

    /// JSON config file (see `SlicerConfig`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured maximum number of bins
    #[arg(long)]
    max_bins: Option<usize>,

    /// Override the configured minimum dataset size
    #[arg(long)]
    min_slice_size: Option<usize>,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SliceReport {
    feature: String,
    slice: String,
    rows: usize,
    fraction: f64,
}

#[derive(Serialize)]
struct Report {
    dataset: String,
    rows: usize,
    target: Option<String>,
    column_types: BTreeMap<String, ColumnType>,
    slices: Vec<SliceReport>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SlicerConfig::from_json_file(path)?,
        None => SlicerConfig::default(),
    };
    if let Some(max_bins) = args.max_bins {
        config.binning.max_bins = max_bins;
    }
    if args.min_slice_size.is_some() {
        config.min_slice_size = args.min_slice_size;
    }
    config.infer_column_types |= args.infer_types;

    let table = load_file(&args.path)
        .with_context(|| format!("loading {}", args.path.display()))?;

    let mut options = DatasetOptions::default()
        .name(args.path.display().to_string())
        .infer_column_types(config.infer_column_types);
    if let Some(target) = &args.target {
        options = options.target(target.clone());
    }
    if !args.cat_columns.is_empty() {
        options = options.cat_columns(args.cat_columns.clone());
    }
    let mut dataset = Dataset::new(table, options)?;

    let features: Vec<String> = if args.features.is_empty() {
        dataset
            .table()
            .column_names()
            .into_iter()
            .filter(|name| Some(*name) != dataset.target())
            .map(str::to_string)
            .collect()
    } else {
        args.features.clone()
    };

    let finder = SliceFinder::from_config(&config);
    let candidates = finder.run(&dataset, &features, None, config.min_slice_size)?;

    let total = dataset.len();
    let mut slices = Vec::new();
    for (feature, candidates) in candidates {
        for candidate in candidates {
            let name = candidate.name();
            let rows = match dataset.slice(candidate) {
                Ok(sliced) => sliced.len(),
                Err(SliceError::EmptyResult { .. }) => 0,
                Err(err) => return Err(err).with_context(|| format!("applying slice '{name}'")),
            };
            slices.push(SliceReport {
                feature: feature.clone(),
                slice: name,
                rows,
                fraction: rows as f64 / total as f64,
            });
        }
    }

    if args.json {
        let report = Report {
            dataset: dataset.id().to_string(),
            rows: total,
            target: dataset.target().map(str::to_string),
            column_types: dataset.column_types(),
            slices,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} rows, {} candidate slices", total, slices.len());
        for s in &slices {
            println!("{:<16} {:>8} {:>7.1}%  {}", s.feature, s.rows, s.fraction * 100.0, s.slice);
        }
    }
    Ok(())
}

use std::collections::{BTreeMap, HashMap};

use log::{debug, info};

use crate::config::SlicerConfig;
use crate::data::dataset::Dataset;
use crate::data::model::{ColumnType, Table, Value};
use crate::error::{Result, SliceError};

use super::binning::{Binner, QuantileBinner};
use super::clause::Clause;
use super::function::SliceFunction;
use super::partition::PartitionGenerator;
use super::query::Query;

fn single_feature<S: AsRef<str>>(features: &[S]) -> Result<&str> {
    match features {
        [feature] => Ok(feature.as_ref()),
        _ => Err(SliceError::UnsupportedDimensionality {
            features: features.len(),
        }),
    }
}

/// Numeric view of a target column. Non-numeric targets are encoded by the
/// rank of each value among the column's sorted distinct values.
fn target_codes(table: &Table, target: &str) -> Result<Vec<Option<f64>>> {
    let column = table.column(target)?;
    if column.kind == ColumnType::Numeric {
        return Ok(column.values.iter().map(Value::as_f64).collect());
    }
    let ranks: HashMap<Value, f64> = table
        .unique_values(target)?
        .into_iter()
        .enumerate()
        .map(|(rank, v)| (v, rank as f64))
        .collect();
    Ok(column.values.iter().map(|v| ranks.get(v).copied()).collect())
}

// ---------------------------------------------------------------------------
// NumericSlicer – binning + partition generation
// ---------------------------------------------------------------------------

/// Range slices for one numeric feature, cut where the binner splits it.
#[derive(Debug, Clone)]
pub struct NumericSlicer<B> {
    binner: B,
    generator: PartitionGenerator,
}

impl<B: Binner> NumericSlicer<B> {
    pub fn new(binner: B) -> Self {
        Self {
            binner,
            generator: PartitionGenerator::new(),
        }
    }

    /// Rows whose feature (or target, when given) is missing are left out
    /// of the binning. A binning failure is returned as is.
    pub fn find_slices<S: AsRef<str>>(
        &self,
        dataset: &Dataset,
        features: &[S],
        target: Option<&str>,
    ) -> Result<Vec<SliceFunction>> {
        let feature = single_feature(features)?;
        let table = dataset.table();
        let values: Vec<Option<f64>> = table
            .column(feature)?
            .values
            .iter()
            .map(Value::as_f64)
            .collect();

        let splits = match target.or(dataset.target()) {
            Some(target) => {
                let codes = target_codes(table, target)?;
                let (xs, ys): (Vec<f64>, Vec<f64>) = values
                    .iter()
                    .zip(&codes)
                    .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                    .unzip();
                self.binner.fit_and_split(&xs, Some(&ys))?
            }
            None => {
                let xs: Vec<f64> = values.into_iter().flatten().collect();
                self.binner.fit_and_split(&xs, None)?
            }
        };
        debug!("'{feature}' split at {splits:?}");

        Ok(self
            .generator
            .generate(feature, &splits)?
            .into_iter()
            .map(SliceFunction::from)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// CategorySlicer
// ---------------------------------------------------------------------------

/// One equality slice per distinct non-null value of a category column.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategorySlicer;

impl CategorySlicer {
    pub fn find_slices<S: AsRef<str>>(
        &self,
        dataset: &Dataset,
        features: &[S],
    ) -> Result<Vec<SliceFunction>> {
        let feature = single_feature(features)?;
        Ok(dataset
            .table()
            .unique_values(feature)?
            .into_iter()
            .map(|value| Query::and([Clause::equal(feature, value)]).into())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// SliceFinder – per-feature candidate generation
// ---------------------------------------------------------------------------

/// Generates slice candidates for each requested feature according to its
/// column type. Ranking and significance filtering happen elsewhere.
#[derive(Debug, Clone)]
pub struct SliceFinder<B> {
    numeric: NumericSlicer<B>,
    category: CategorySlicer,
}

impl SliceFinder<QuantileBinner> {
    pub fn from_config(config: &SlicerConfig) -> Self {
        Self::new(QuantileBinner::new(config.binning.clone()))
    }
}

impl<B: Binner> SliceFinder<B> {
    pub fn new(binner: B) -> Self {
        Self {
            numeric: NumericSlicer::new(binner),
            category: CategorySlicer,
        }
    }

    /// Candidates keyed by feature. Returns nothing when the dataset is
    /// smaller than `min_slice_size`. The target defaults to the dataset's
    /// own and must be set one way or the other.
    pub fn run<S: AsRef<str>>(
        &self,
        dataset: &Dataset,
        features: &[S],
        target: Option<&str>,
        min_slice_size: Option<usize>,
    ) -> Result<BTreeMap<String, Vec<SliceFunction>>> {
        if min_slice_size.is_some_and(|min| dataset.len() < min) {
            return Ok(BTreeMap::new());
        }
        let target = target.or(dataset.target()).ok_or(SliceError::MissingTarget)?;

        let mut sliced = BTreeMap::new();
        for feature in features {
            let feature = feature.as_ref();
            let kind = dataset.table().column(feature)?.kind;
            let slices = match kind {
                ColumnType::Numeric => self.numeric.find_slices(dataset, &[feature], Some(target))?,
                ColumnType::Category => self.category.find_slices(dataset, &[feature])?,
                ColumnType::Text => {
                    debug!("skipping text feature '{feature}'");
                    continue;
                }
            };
            info!("{} candidate slices for {kind} feature '{feature}'", slices.len());
            sliced.insert(feature.to_string(), slices);
        }
        Ok(sliced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::DatasetOptions;
    use crate::data::model::Column;
    use crate::slicing::binning::{BinningConfig, BinningError};
    use crate::slicing::function::TableFunction;

    type Splits = std::result::Result<Vec<f64>, BinningError>;

    struct FixedBinner(Splits);

    impl Binner for FixedBinner {
        fn fit_and_split(&self, _: &[f64], _: Option<&[f64]>) -> Splits {
            self.0.clone()
        }
    }

    /// Records what it was asked to bin.
    struct SpyBinner(std::sync::Mutex<Vec<(Vec<f64>, Option<Vec<f64>>)>>);

    impl Binner for SpyBinner {
        fn fit_and_split(&self, feature: &[f64], target: Option<&[f64]>) -> Splits {
            self.0
                .lock()
                .unwrap()
                .push((feature.to_vec(), target.map(<[f64]>::to_vec)));
            Ok(Vec::new())
        }
    }

    fn dataset() -> Dataset {
        let table = Table::new(vec![
            Column::inferred(
                "age",
                [5, 15, 25, 35, 45, 55, 65, 75, 85, 95].into_iter().map(Value::from).collect(),
            ),
            Column::inferred(
                "plan",
                ["a", "b"].into_iter().cycle().take(10).map(Value::from).collect(),
            ),
            Column::inferred(
                "comment",
                ["x", "y", "z", "w", "v", "u", "t", "s", "r", "q"]
                    .into_iter()
                    .map(Value::from)
                    .collect(),
            ),
            Column::inferred(
                "label",
                ["no", "no", "yes", "no", "yes", "yes", "no", "no", "yes", "no"]
                    .into_iter()
                    .map(Value::from)
                    .collect(),
            ),
        ])
        .unwrap();
        let options = DatasetOptions::default()
            .target("label")
            .cat_columns(["plan", "label"]);
        Dataset::new(table, options).unwrap()
    }

    #[test]
    fn numeric_slicer_partitions_at_binner_splits() {
        let slicer = NumericSlicer::new(FixedBinner(Ok(vec![30.0, 60.0])));
        let ds = dataset();
        let slices = slicer.find_slices(&ds, &["age"], None).unwrap();
        let rows: usize = slices.iter().map(|s| s.apply(ds.table()).unwrap().row_count()).sum();
        assert_eq!(slices.len(), 3);
        assert_eq!(rows, ds.len());
    }

    #[test]
    fn numeric_slicer_passes_binning_errors_through() {
        let timeout = BinningError::Timeout(std::time::Duration::from_secs(3));
        let slicer = NumericSlicer::new(FixedBinner(Err(timeout)));
        let err = slicer.find_slices(&dataset(), &["age"], None).unwrap_err();
        assert!(matches!(err, SliceError::Binning(BinningError::Timeout(_))));
    }

    #[test]
    fn numeric_slicer_rejects_multiple_features() {
        let slicer = NumericSlicer::new(FixedBinner(Ok(vec![])));
        let err = slicer.find_slices(&dataset(), &["age", "plan"], None).unwrap_err();
        assert!(matches!(err, SliceError::UnsupportedDimensionality { features: 2 }));
    }

    #[test]
    fn categorical_target_is_rank_encoded() {
        let spy = SpyBinner(Default::default());
        let slicer = NumericSlicer::new(spy);
        slicer.find_slices(&dataset(), &["age"], None).unwrap();
        let calls = slicer.binner.0.lock().unwrap();
        let (feature, target) = &calls[0];
        assert_eq!(feature.len(), 10);
        assert_eq!(
            target.as_deref(),
            Some(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0][..])
        );
    }

    #[test]
    fn category_slicer_makes_equality_slices() {
        let slices = CategorySlicer.find_slices(&dataset(), &["plan"]).unwrap();
        let names: Vec<String> = slices.iter().map(TableFunction::name).collect();
        assert_eq!(names, vec!["plan == a", "plan == b"]);
    }

    #[test]
    fn finder_dispatches_by_column_type() {
        let finder = SliceFinder::new(FixedBinner(Ok(vec![50.0])));
        let found = finder.run(&dataset(), &["age", "plan", "comment"], None, None).unwrap();
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["age", "plan"]);
        assert_eq!(found["age"].len(), 2);
        assert_eq!(found["plan"].len(), 2);
    }

    #[test]
    fn finder_respects_min_slice_size_and_target() {
        let finder = SliceFinder::from_config(&SlicerConfig {
            binning: BinningConfig { max_bins: 3, ..BinningConfig::default() },
            ..SlicerConfig::default()
        });
        let ds = dataset();
        assert!(finder.run(&ds, &["age"], None, Some(11)).unwrap().is_empty());
        assert_eq!(finder.run(&ds, &["age"], None, Some(10)).unwrap()["age"].len(), 3);

        let table = ds.table().clone();
        let untargeted = Dataset::new(table, DatasetOptions::default()).unwrap();
        assert!(matches!(
            finder.run(&untargeted, &["age"], None, None),
            Err(SliceError::MissingTarget)
        ));
        assert!(finder.run(&untargeted, &["age"], Some("label"), None).is_ok());
        assert!(matches!(
            finder.run(&ds, &["height"], None, None),
            Err(SliceError::UnknownColumn { .. })
        ));
    }
}

use std::collections::VecDeque;
use std::fmt;

use log::debug;

use crate::data::dataset::Dataset;
use crate::error::{Result, SliceError};

use super::function::{Step, TableFunction};

// ---------------------------------------------------------------------------
// DataProcessor – ordered queue of slicing / transformation steps
// ---------------------------------------------------------------------------

/// An ordered queue of steps attached to exactly one [`Dataset`].
///
/// `add_step` skips a step equal to the current last one (adjacent repeats
/// only; an equal step further back is still appended). `apply` drains the
/// queue: everything in insertion order, or only the most recent step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataProcessor {
    steps: VecDeque<Step>,
}

impl DataProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `step` unless it equals the last queued step.
    pub fn add_step(&mut self, step: impl Into<Step>) -> &mut Self {
        let step = step.into();
        if self.steps.back() == Some(&step) {
            debug!("skipping repeated step '{}'", step.name());
        } else {
            self.steps.push_back(step);
        }
        self
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Detach the most recently added step into a processor of its own,
    /// leaving the earlier steps queued here.
    pub(crate) fn split_last(&mut self) -> DataProcessor {
        DataProcessor {
            steps: self.steps.pop_back().into_iter().collect(),
        }
    }

    /// Run the queued steps against a copy of `dataset`'s table.
    ///
    /// With `apply_only_last` only the most recently added step runs and the
    /// earlier ones move, still queued, into the returned dataset's
    /// processor. Otherwise every step runs first-in first-out. Intermediate
    /// steps may select nothing; an empty final table is an
    /// [`SliceError::EmptyResult`]. Steps popped before a failing step are
    /// consumed either way.
    pub fn apply(mut self, dataset: &Dataset, apply_only_last: bool) -> Result<Dataset> {
        let mut table = dataset.table().clone();
        let mut applied = Vec::new();

        loop {
            let step = if apply_only_last {
                self.steps.pop_back()
            } else {
                self.steps.pop_front()
            };
            let Some(step) = step else { break };

            let name = step.name();
            table = step.apply(&table)?;
            debug!("step '{name}' left {} rows", table.row_count());
            applied.push(name);

            if apply_only_last {
                break;
            }
        }

        if table.is_empty() {
            return Err(SliceError::EmptyResult { steps: applied });
        }

        let mut ret = dataset.with_table(table);
        if !self.steps.is_empty() {
            debug!("carrying {} queued steps forward", self.steps.len());
            ret.set_processor(self);
        }
        Ok(ret)
    }
}

impl fmt::Display for DataProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataProcessor: {} steps", self.steps.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::DatasetOptions;
    use crate::data::model::{Column, Table, Value};
    use crate::slicing::clause::Clause;
    use crate::slicing::function::{QueryBasedSliceFunction, TransformationFunction};
    use crate::slicing::query::Query;

    fn dataset() -> Dataset {
        let ages: Vec<Value> = (0..10).map(|i| Value::Integer(i * 10 + 5)).collect();
        let table = Table::new(vec![Column::inferred("age", ages)]).unwrap();
        Dataset::new(table, DatasetOptions::default().target("age")).unwrap()
    }

    fn slice(clause: Clause) -> QueryBasedSliceFunction {
        QueryBasedSliceFunction::new(Query::and([clause]))
    }

    fn ages(ds: &Dataset) -> Vec<Value> {
        ds.table().column("age").unwrap().values.clone()
    }

    #[test]
    fn adjacent_duplicates_are_skipped() {
        let x = slice(Clause::greater_than("age", 10));
        let y = slice(Clause::lower_than("age", 80));

        let mut p = DataProcessor::new();
        p.add_step(x.clone()).add_step(x.clone());
        assert_eq!(p.len(), 1);

        p.add_step(y).add_step(x);
        assert_eq!(p.len(), 3);
        assert_eq!(p.to_string(), "DataProcessor: 3 steps");
    }

    #[test]
    fn full_apply_runs_in_insertion_order() {
        let ds = dataset();
        let keep_first_two = TransformationFunction::new("head(2)", |t: &Table| {
            let mask: Vec<bool> = (0..t.row_count()).map(|i| i < 2).collect();
            t.filter(&mask)
        });

        let mut p = DataProcessor::new();
        p.add_step(slice(Clause::greater_than("age", 40)))
            .add_step(keep_first_two);
        let out = p.apply(&ds, false).unwrap();
        assert_eq!(ages(&out), vec![Value::Integer(45), Value::Integer(55)]);
        assert!(out.processor().is_empty());
        assert_eq!(out.id(), ds.id());
    }

    #[test]
    fn only_last_leaves_earlier_steps_queued() {
        let ds = dataset();
        let mut p = DataProcessor::new();
        p.add_step(slice(Clause::greater_than("age", 40)))
            .add_step(slice(Clause::lower_than("age", 30)));

        let out = p.apply(&ds, true).unwrap();
        assert_eq!(ages(&out), vec![Value::Integer(5), 15.into(), 25.into()]);
        assert_eq!(out.processor().len(), 1);
    }

    #[test]
    fn only_last_identity_returns_table_unchanged() {
        let ds = dataset();
        let mut p = DataProcessor::new();
        p.add_step(QueryBasedSliceFunction::new(Query::all()));
        let out = p.apply(&ds, true).unwrap();
        assert_eq!(out.table(), ds.table());
    }

    #[test]
    fn empty_final_table_is_an_error() {
        let ds = dataset();
        let mut p = DataProcessor::new();
        p.add_step(slice(Clause::greater_than("age", 40)))
            .add_step(slice(Clause::lower_than("age", 30)));

        let err = p.apply(&ds, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "processing pipeline produced an empty dataset (steps applied: age > 40, age < 30)"
        );
        match err {
            SliceError::EmptyResult { steps } => {
                assert_eq!(steps, vec!["age > 40", "age < 30"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_intermediate_result_is_allowed() {
        let ds = dataset();
        let restore = TransformationFunction::new("restore", |_: &Table| {
            Table::new(vec![Column::inferred("age", vec![1.into()])])
        });
        let mut p = DataProcessor::new();
        p.add_step(slice(Clause::greater_than("age", 1000)))
            .add_step(restore);
        assert_eq!(p.apply(&ds, false).unwrap().len(), 1);
    }

    #[test]
    fn step_errors_propagate() {
        let ds = dataset();
        let mut p = DataProcessor::new();
        p.add_step(slice(Clause::equal("height", 1)));
        assert!(matches!(p.apply(&ds, false), Err(SliceError::UnknownColumn { .. })));
    }
}

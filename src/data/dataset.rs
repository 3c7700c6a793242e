use std::collections::BTreeMap;

use log::warn;
use uuid::Uuid;

use crate::error::{Result, SliceError};
use crate::slicing::function::{SliceFunction, TransformationFunction};
use crate::slicing::pipeline::DataProcessor;

use super::model::{ColumnType, Table};

// ---------------------------------------------------------------------------
// Construction options
// ---------------------------------------------------------------------------

/// How to build a [`Dataset`]. Column typing precedence: explicit
/// `column_types`, then `cat_columns`, then content inference.
#[derive(Debug, Clone, Default)]
pub struct DatasetOptions {
    pub name: Option<String>,
    pub target: Option<String>,
    pub column_types: Option<BTreeMap<String, ColumnType>>,
    pub cat_columns: Option<Vec<String>>,
    pub infer_column_types: bool,
    pub id: Option<Uuid>,
}

impl DatasetOptions {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn column_types(mut self, types: BTreeMap<String, ColumnType>) -> Self {
        self.column_types = Some(types);
        self
    }

    pub fn cat_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.cat_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn infer_column_types(mut self, infer: bool) -> Self {
        self.infer_column_types = infer;
        self
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// A typed table plus identity metadata and its own processing pipeline.
///
/// The pipeline is never shared: each dataset is built with a fresh
/// [`DataProcessor`], and draining one cannot affect another.
#[derive(Debug, Clone)]
pub struct Dataset {
    id: Uuid,
    name: Option<String>,
    target: Option<String>,
    table: Table,
    processor: DataProcessor,
}

impl Dataset {
    pub fn new(mut table: Table, options: DatasetOptions) -> Result<Self> {
        if table.is_empty() {
            return Err(SliceError::EmptyDataset);
        }

        match &options.target {
            Some(target) if !table.contains_column(target) => {
                return Err(SliceError::UnknownColumn {
                    column: target.clone(),
                });
            }
            Some(_) => {}
            None => warn!(
                "no target given; the target is the column holding the ground truth"
            ),
        }

        if let Some(types) = &options.column_types {
            for (column, kind) in types {
                table.set_column_type(column, *kind)?;
            }
        } else if let Some(cat_columns) = &options.cat_columns {
            table.infer_column_types(false);
            for column in cat_columns {
                table.set_column_type(column, ColumnType::Category)?;
            }
        } else {
            table.infer_column_types(options.infer_column_types);
            if !options.infer_column_types {
                warn!(
                    "no column types, cat_columns or inference requested; \
                     assuming no categorical columns"
                );
            }
        }

        Ok(Self {
            id: options.id.unwrap_or_else(Uuid::new_v4),
            name: options.name,
            target: options.target,
            table,
            processor: DataProcessor::new(),
        })
    }

    /// A dataset with the same identity and metadata around another table,
    /// with an empty pipeline.
    pub fn with_table(&self, table: Table) -> Dataset {
        Dataset {
            id: self.id,
            name: self.name.clone(),
            target: self.target.clone(),
            table,
            processor: DataProcessor::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.table.row_count()
    }

    /// Always false for a constructed dataset; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn column_types(&self) -> BTreeMap<String, ColumnType> {
        self.table
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.kind))
            .collect()
    }

    pub fn cat_columns(&self) -> Vec<&str> {
        self.table
            .columns()
            .iter()
            .filter(|c| c.kind == ColumnType::Category)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn processor(&self) -> &DataProcessor {
        &self.processor
    }

    pub(crate) fn set_processor(&mut self, processor: DataProcessor) {
        self.processor = processor;
    }

    pub fn add_slicing_function(
        &mut self,
        slicing_function: impl Into<SliceFunction>,
    ) -> &mut Self {
        self.processor.add_step(slicing_function.into());
        self
    }

    pub fn add_transformation_function(
        &mut self,
        transformation_function: TransformationFunction,
    ) -> &mut Self {
        self.processor.add_step(transformation_function);
        self
    }

    /// Queue `slicing_function` and apply it alone. On success the steps
    /// queued earlier move to the returned dataset; on failure they stay
    /// queued here.
    pub fn slice(&mut self, slicing_function: impl Into<SliceFunction>) -> Result<Dataset> {
        self.processor.add_step(slicing_function.into());
        self.apply_last()
    }

    /// Queue `transformation_function` and apply it alone, like
    /// [`slice`](Self::slice).
    pub fn transform(
        &mut self,
        transformation_function: TransformationFunction,
    ) -> Result<Dataset> {
        self.processor.add_step(transformation_function);
        self.apply_last()
    }

    fn apply_last(&mut self) -> Result<Dataset> {
        let last = self.processor.split_last();
        let mut ret = last.apply(self, true)?;
        ret.set_processor(std::mem::take(&mut self.processor));
        Ok(ret)
    }

    /// Apply every queued step in insertion order.
    pub fn process(&mut self) -> Result<Dataset> {
        std::mem::take(&mut self.processor).apply(self, false)
    }
}

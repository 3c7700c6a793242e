use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::data::model::Table;
use crate::error::Result;

use super::query::Query;

/// A named, callable transformation of a table.
///
/// Implementors also provide structural `Eq + Hash` so pipelines and
/// candidate sets can tell logically equivalent steps apart from distinct
/// ones.
pub trait TableFunction {
    fn name(&self) -> String;

    fn apply(&self, table: &Table) -> Result<Table>;
}

// ---------------------------------------------------------------------------
// Query-backed slice
// ---------------------------------------------------------------------------

/// Slice function that keeps the rows matched by a [`Query`].
///
/// Equality and hashing delegate entirely to the query; the display name is
/// not part of identity.
#[derive(Debug, Clone)]
pub struct QueryBasedSliceFunction {
    name: Option<String>,
    query: Query,
}

impl QueryBasedSliceFunction {
    pub fn new(query: Query) -> Self {
        Self { name: None, query }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

impl TableFunction for QueryBasedSliceFunction {
    fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.query.to_string())
    }

    fn apply(&self, table: &Table) -> Result<Table> {
        let mask = self.query.evaluate(table)?;
        table.filter(&mask)
    }
}

impl PartialEq for QueryBasedSliceFunction {
    fn eq(&self, other: &Self) -> bool {
        self.query == other.query
    }
}

impl Eq for QueryBasedSliceFunction {}

impl Hash for QueryBasedSliceFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.query.hash(state);
    }
}

impl From<Query> for QueryBasedSliceFunction {
    fn from(query: Query) -> Self {
        Self::new(query)
    }
}

// ---------------------------------------------------------------------------
// Custom-predicate slice
// ---------------------------------------------------------------------------

pub type RowPredicate = dyn Fn(&Table, usize) -> bool + Send + Sync;

/// Slice function backed by an arbitrary row predicate `(table, row) -> keep`.
///
/// Closures have no structural identity, so two instances are equal only
/// when they share the same predicate allocation (clones of one another).
#[derive(Clone)]
pub struct PredicateSliceFunction {
    name: String,
    predicate: Arc<RowPredicate>,
}

impl PredicateSliceFunction {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Table, usize) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }
}

impl TableFunction for PredicateSliceFunction {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn apply(&self, table: &Table) -> Result<Table> {
        let mask: Vec<bool> = (0..table.row_count())
            .map(|row| (self.predicate)(table, row))
            .collect();
        table.filter(&mask)
    }
}

impl PartialEq for PredicateSliceFunction {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

impl Eq for PredicateSliceFunction {}

impl Hash for PredicateSliceFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.predicate) as *const () as usize).hash(state);
    }
}

impl fmt::Debug for PredicateSliceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateSliceFunction")
            .field("name", &self.name)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SliceFunction – closed set of slice variants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SliceFunction {
    Query(QueryBasedSliceFunction),
    Predicate(PredicateSliceFunction),
}

impl SliceFunction {
    /// The backing query, for query-based slices.
    pub fn query(&self) -> Option<&Query> {
        match self {
            SliceFunction::Query(sf) => Some(sf.query()),
            SliceFunction::Predicate(_) => None,
        }
    }
}

impl TableFunction for SliceFunction {
    fn name(&self) -> String {
        match self {
            SliceFunction::Query(sf) => sf.name(),
            SliceFunction::Predicate(sf) => sf.name(),
        }
    }

    fn apply(&self, table: &Table) -> Result<Table> {
        match self {
            SliceFunction::Query(sf) => sf.apply(table),
            SliceFunction::Predicate(sf) => sf.apply(table),
        }
    }
}

impl From<QueryBasedSliceFunction> for SliceFunction {
    fn from(sf: QueryBasedSliceFunction) -> Self {
        SliceFunction::Query(sf)
    }
}

impl From<PredicateSliceFunction> for SliceFunction {
    fn from(sf: PredicateSliceFunction) -> Self {
        SliceFunction::Predicate(sf)
    }
}

impl From<Query> for SliceFunction {
    fn from(query: Query) -> Self {
        SliceFunction::Query(query.into())
    }
}

// ---------------------------------------------------------------------------
// TransformationFunction
// ---------------------------------------------------------------------------

pub type TableTransform = dyn Fn(&Table) -> Result<Table> + Send + Sync;

/// A named table-to-table transformation (e.g. perturbing a column).
/// Identity follows the shared function, as for [`PredicateSliceFunction`].
#[derive(Clone)]
pub struct TransformationFunction {
    name: String,
    func: Arc<TableTransform>,
}

impl TransformationFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Table) -> Result<Table> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl TableFunction for TransformationFunction {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn apply(&self, table: &Table) -> Result<Table> {
        (self.func)(table)
    }
}

impl PartialEq for TransformationFunction {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl Eq for TransformationFunction {}

impl Hash for TransformationFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.func) as *const () as usize).hash(state);
    }
}

impl fmt::Debug for TransformationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformationFunction")
            .field("name", &self.name)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Step – pipeline element
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    Slice(SliceFunction),
    Transform(TransformationFunction),
}

impl TableFunction for Step {
    fn name(&self) -> String {
        match self {
            Step::Slice(sf) => sf.name(),
            Step::Transform(tf) => tf.name(),
        }
    }

    fn apply(&self, table: &Table) -> Result<Table> {
        match self {
            Step::Slice(sf) => sf.apply(table),
            Step::Transform(tf) => tf.apply(table),
        }
    }
}

impl From<SliceFunction> for Step {
    fn from(sf: SliceFunction) -> Self {
        Step::Slice(sf)
    }
}

impl From<QueryBasedSliceFunction> for Step {
    fn from(sf: QueryBasedSliceFunction) -> Self {
        Step::Slice(sf.into())
    }
}

impl From<TransformationFunction> for Step {
    fn from(tf: TransformationFunction) -> Self {
        Step::Transform(tf)
    }
}

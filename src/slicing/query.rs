use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::data::model::{RowMask, Table};
use crate::error::{Result, SliceError};

use super::clause::Clause;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// How a query reduces the masks of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Mode {
    #[default]
    And,
    Or,
}

impl FromStr for Mode {
    type Err = SliceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(Mode::And),
            "or" => Ok(Mode::Or),
            _ => Err(SliceError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::And => write!(f, "AND"),
            Mode::Or => write!(f, "OR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Query tree
// ---------------------------------------------------------------------------

/// A child of a query: a leaf clause or a nested query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryItem {
    Clause(Clause),
    Query(Query),
}

impl QueryItem {
    fn evaluate(&self, table: &Table) -> Result<RowMask> {
        match self {
            QueryItem::Clause(c) => c.evaluate(table),
            QueryItem::Query(q) => q.evaluate(table),
        }
    }
}

impl From<Clause> for QueryItem {
    fn from(c: Clause) -> Self {
        QueryItem::Clause(c)
    }
}

impl From<Query> for QueryItem {
    fn from(q: Query) -> Self {
        QueryItem::Query(q)
    }
}

impl fmt::Display for QueryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryItem::Clause(c) => write!(f, "{c}"),
            QueryItem::Query(q) => write!(f, "({q})"),
        }
    }
}

/// A boolean combination of clauses and nested queries.
///
/// Children keep their construction order for evaluation and rendering, but
/// equality, ordering and hashing see them as a multiset: two queries with
/// the same mode and the same children in any order are equal. Slice
/// candidate dedup relies on this.
#[derive(Debug, Clone, Default)]
pub struct Query {
    items: Vec<QueryItem>,
    mode: Mode,
}

impl Query {
    pub fn new<I: Into<QueryItem>>(items: impl IntoIterator<Item = I>, mode: Mode) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    /// Conjunction of `items`.
    pub fn and<I: Into<QueryItem>>(items: impl IntoIterator<Item = I>) -> Self {
        Self::new(items, Mode::And)
    }

    /// Disjunction of `items`.
    pub fn or<I: Into<QueryItem>>(items: impl IntoIterator<Item = I>) -> Self {
        Self::new(items, Mode::Or)
    }

    /// The identity query: selects every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[QueryItem] {
        &self.items
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_identity(&self) -> bool {
        self.items.is_empty()
    }

    /// Evaluate to a row mask. An empty query selects every row whatever its
    /// mode.
    pub fn evaluate(&self, table: &Table) -> Result<RowMask> {
        let rows = table.row_count();
        if self.items.is_empty() {
            return Ok(vec![true; rows]);
        }
        let init = self.mode == Mode::And;
        let mut mask = vec![init; rows];
        for item in &self.items {
            let child = item.evaluate(table)?;
            for (acc, hit) in mask.iter_mut().zip(child) {
                *acc = match self.mode {
                    Mode::And => *acc && hit,
                    Mode::Or => *acc || hit,
                };
            }
        }
        Ok(mask)
    }

    /// Children in canonical (sorted) order.
    fn canonical(&self) -> Vec<&QueryItem> {
        let mut items: Vec<&QueryItem> = self.items.iter().collect();
        items.sort();
        items
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Query {}

impl PartialOrd for Query {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Query {
    fn cmp(&self, other: &Self) -> Ordering {
        self.mode
            .cmp(&other.mode)
            .then_with(|| self.canonical().cmp(&other.canonical()))
    }
}

impl Hash for Query {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mode.hash(state);
        self.canonical().hash(state);
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return write!(f, "all rows");
        }
        let sep = match self.mode {
            Mode::And => " & ",
            Mode::Or => " | ",
        };
        let parts: Vec<String> = self.items.iter().map(QueryItem::to_string).collect();
        write!(f, "{}", parts.join(sep))
    }
}

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SliceError};

// ---------------------------------------------------------------------------
// Value – a single cell in a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Clauses, queries and category sets all key on `Value`, so it must be
/// `Ord + Hash` with `Eq` agreeing with the ordering.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so Value can live in BTreeSet and sort canonically --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) | Value::Date(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            // total_cmp equality is bitwise, so hashing the bits agrees with Eq
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl Value {
    /// Numeric view of the value, if it has one. Booleans count as 0 / 1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_) | Value::Bool(_))
    }
}

// ---------------------------------------------------------------------------
// ColumnType – declared semantic type of a column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Category,
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Numeric => write!(f, "numeric"),
            ColumnType::Category => write!(f, "category"),
            ColumnType::Text => write!(f, "text"),
        }
    }
}

/// Columns with at most this many distinct values are inferred as categories.
pub const CATEGORY_MAX_UNIQUES: usize = 2;

// ---------------------------------------------------------------------------
// Column / Table
// ---------------------------------------------------------------------------

/// One boolean per row; `true` keeps the row.
pub type RowMask = Vec<bool>;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    /// Build a column typed from its contents (no category inference).
    pub fn inferred(name: impl Into<String>, values: Vec<Value>) -> Self {
        let kind = infer_type(&values, false);
        Self::new(name, kind, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn infer_type(values: &[Value], allow_category: bool) -> ColumnType {
    if allow_category {
        let uniques: HashSet<&Value> = values.iter().filter(|v| !v.is_null()).collect();
        if uniques.len() <= CATEGORY_MAX_UNIQUES {
            return ColumnType::Category;
        }
    }
    if values.iter().filter(|v| !v.is_null()).all(Value::is_numeric) {
        ColumnType::Numeric
    } else {
        ColumnType::Text
    }
}

/// A row-addressable, column-typed table. Column order is preserved by
/// every operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(SliceError::DuplicateColumn(col.name.clone()));
            }
        }
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(SliceError::LengthMismatch {
                    what: format!("column '{}'", bad.name),
                    expected,
                    actual: bad.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SliceError::UnknownColumn {
                column: name.to_string(),
            })
    }

    fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| SliceError::UnknownColumn {
                column: name.to_string(),
            })
    }

    /// Keep the rows whose mask entry is `true`, in their original order.
    pub fn filter(&self, mask: &[bool]) -> Result<Table> {
        if mask.len() != self.row_count() {
            return Err(SliceError::LengthMismatch {
                what: "row mask".to_string(),
                expected: self.row_count(),
                actual: mask.len(),
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|col| Column {
                name: col.name.clone(),
                kind: col.kind,
                values: col
                    .values
                    .iter()
                    .zip(mask)
                    .filter(|(_, keep)| **keep)
                    .map(|(v, _)| v.clone())
                    .collect(),
            })
            .collect();
        Ok(Table { columns })
    }

    /// Project onto the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|name| self.column(name).cloned())
            .collect::<Result<Vec<_>>>()?;
        Table::new(columns)
    }

    /// Sorted distinct non-null values of a column.
    pub fn unique_values(&self, name: &str) -> Result<BTreeSet<Value>> {
        Ok(self
            .column(name)?
            .values
            .iter()
            .filter(|v| !v.is_null())
            .cloned()
            .collect())
    }

    pub fn set_column_type(&mut self, name: &str, kind: ColumnType) -> Result<()> {
        self.column_mut(name)?.kind = kind;
        Ok(())
    }

    /// Re-derive every column's type from its contents.
    pub fn infer_column_types(&mut self, allow_category: bool) {
        for col in &mut self.columns {
            col.kind = infer_type(&col.values, allow_category);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::inferred("age", vec![5.into(), 15.into(), 25.into(), Value::Null]),
            Column::inferred("city", vec!["a".into(), "b".into(), "a".into(), "c".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn float_equality_agrees_with_hash() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let hash = |v: &Value| {
            let mut h = DefaultHasher::new();
            v.hash(&mut h);
            h.finish()
        };
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(hash(&nan), hash(&nan.clone()));
        assert_ne!(Value::Integer(30), Value::Float(30.0));
    }

    #[test]
    fn rejects_ragged_and_duplicate_columns() {
        let ragged = Table::new(vec![
            Column::inferred("a", vec![1.into()]),
            Column::inferred("b", vec![1.into(), 2.into()]),
        ]);
        assert!(matches!(ragged, Err(SliceError::LengthMismatch { .. })));

        let dup = Table::new(vec![
            Column::inferred("a", vec![1.into()]),
            Column::inferred("a", vec![2.into()]),
        ]);
        assert!(matches!(dup, Err(SliceError::DuplicateColumn(name)) if name == "a"));
    }

    #[test]
    fn filter_preserves_order_and_columns() {
        let table = sample();
        let out = table.filter(&[true, false, true, true]).unwrap();
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.column_names(), vec!["age", "city"]);
        let city = &out.column("city").unwrap().values;
        assert_eq!(city, &vec![Value::from("a"), "a".into(), "c".into()]);
        assert!(table.filter(&[true]).is_err());
    }

    #[test]
    fn infers_column_types() {
        let mut table = sample();
        assert_eq!(table.column("age").unwrap().kind, ColumnType::Numeric);
        assert_eq!(table.column("city").unwrap().kind, ColumnType::Text);

        let mut two = Table::new(vec![Column::inferred(
            "flag",
            vec![1.into(), 0.into(), 1.into()],
        )])
        .unwrap();
        two.infer_column_types(true);
        assert_eq!(two.column("flag").unwrap().kind, ColumnType::Category);

        table.infer_column_types(true);
        assert_eq!(table.column("city").unwrap().kind, ColumnType::Text);
    }

    #[test]
    fn boolean_columns_are_numeric() {
        let churn = Column::inferred("churn", vec![true.into(), false.into(), Value::Null]);
        assert_eq!(churn.kind, ColumnType::Numeric);
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Value::Bool(false).as_f64(), Some(0.0));
    }

    #[test]
    fn unknown_column_is_reported_by_name() {
        let err = sample().column("salary").unwrap_err();
        assert_eq!(err.to_string(), "unknown column 'salary'");
    }

    #[test]
    fn select_projects_in_requested_order() {
        let out = sample().select(&["city", "age"]).unwrap();
        assert_eq!(out.column_names(), vec!["city", "age"]);
        assert_eq!(out.row_count(), 4);
    }
}

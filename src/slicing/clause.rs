use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use crate::data::model::{ColumnType, RowMask, Table, Value};
use crate::error::{Result, SliceError};

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    GreaterThan,
    LowerThan,
    GreaterThanOrEqual,
    LowerThanOrEqual,
    Equal,
    In,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::GreaterThan => ">",
            Operator::LowerThan => "<",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LowerThanOrEqual => "<=",
            Operator::Equal => "==",
            Operator::In => "in",
        }
    }

    /// Whether the operator needs an ordering on the column's values.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Operator::Equal | Operator::In)
    }

    fn accepts(&self, ord: Ordering) -> bool {
        match self {
            Operator::GreaterThan => ord == Ordering::Greater,
            Operator::LowerThan => ord == Ordering::Less,
            Operator::GreaterThanOrEqual => ord != Ordering::Less,
            Operator::LowerThanOrEqual => ord != Ordering::Greater,
            Operator::Equal | Operator::In => ord == Ordering::Equal,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ---------------------------------------------------------------------------
// Operand
// ---------------------------------------------------------------------------

/// Right-hand side of a clause: a scalar for comparisons and equality, a
/// value set for membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operand {
    Scalar(Value),
    Set(BTreeSet<Value>),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Scalar(v) => write!(f, "{v}"),
            Operand::Set(values) => {
                let items: Vec<String> = values.iter().map(Value::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Clause
// ---------------------------------------------------------------------------

/// An atomic predicate over one column.
///
/// Clauses are immutable; equality, ordering and hashing are by value so
/// separately built clauses with the same column, operator and operand are
/// interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Clause {
    column: String,
    operator: Operator,
    operand: Operand,
}

impl Clause {
    fn scalar(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator,
            operand: Operand::Scalar(value.into()),
        }
    }

    /// `column > value`
    pub fn greater_than(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::scalar(column, Operator::GreaterThan, value)
    }

    /// `column < value`
    pub fn lower_than(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::scalar(column, Operator::LowerThan, value)
    }

    /// `column >= value`
    pub fn greater_than_or_equal(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::scalar(column, Operator::GreaterThanOrEqual, value)
    }

    /// `column <= value`
    pub fn lower_than_or_equal(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::scalar(column, Operator::LowerThanOrEqual, value)
    }

    /// `column == value`
    pub fn equal(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::scalar(column, Operator::Equal, value)
    }

    /// `column in [values...]`
    pub fn is_in<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            column: column.into(),
            operator: Operator::In,
            operand: Operand::Set(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    fn operand_values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match &self.operand {
            Operand::Scalar(v) => Box::new(std::iter::once(v)),
            Operand::Set(values) => Box::new(values.iter()),
        }
    }

    /// Evaluate the clause on every row of `table`.
    pub fn evaluate(&self, table: &Table) -> Result<RowMask> {
        let column = table.column(&self.column)?;
        self.check_type(column.kind)?;
        Ok(column.values.iter().map(|cell| self.matches(cell)).collect())
    }

    fn check_type(&self, kind: ColumnType) -> Result<()> {
        let mismatch = |value: &Value| SliceError::TypeMismatch {
            column: self.column.clone(),
            kind,
            operator: self.operator.symbol().to_string(),
            value: value.clone(),
        };
        let compatible = |value: &Value| match kind {
            ColumnType::Numeric => value.is_numeric(),
            ColumnType::Text => matches!(value, Value::String(_) | Value::Date(_)),
            ColumnType::Category => !value.is_null(),
        };

        if kind == ColumnType::Category && self.operator.is_ordering() {
            let first = self.operand_values().next().cloned().unwrap_or(Value::Null);
            return Err(mismatch(&first));
        }
        match self.operand_values().find(|v| !compatible(v)) {
            Some(bad) => Err(mismatch(bad)),
            None => Ok(()),
        }
    }

    fn matches(&self, cell: &Value) -> bool {
        if cell.is_null() {
            return false;
        }
        match &self.operand {
            Operand::Set(values) => values
                .iter()
                .any(|v| compare(cell, v) == Some(Ordering::Equal)),
            Operand::Scalar(v) => {
                compare(cell, v).is_some_and(|ord| self.operator.accepts(ord))
            }
        }
    }
}

/// Compare a cell against an operand value. Numbers compare numerically
/// whatever their storage width. Strings and ISO dates compare as text,
/// with each other too. Anything else compares only by identity.
fn compare(cell: &Value, operand: &Value) -> Option<Ordering> {
    match (cell.as_f64(), operand.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => match (cell, operand) {
            (
                Value::String(a) | Value::Date(a),
                Value::String(b) | Value::Date(b),
            ) => Some(a.cmp(b)),
            _ if cell == operand => Some(Ordering::Equal),
            _ => None,
        },
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.operator, self.operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn table() -> Table {
        let mut t = Table::new(vec![
            Column::inferred("age", vec![10.into(), 20.into(), 30.into(), Value::Null]),
            Column::inferred(
                "city",
                vec!["paris".into(), "rome".into(), "oslo".into(), "rome".into()],
            ),
            Column::inferred("churn", vec![true.into(), false.into(), false.into(), true.into()]),
        ])
        .unwrap();
        t.set_column_type("churn", ColumnType::Category).unwrap();
        t
    }

    #[test]
    fn comparison_operators_on_numeric_column() {
        let t = table();
        let eval = |c: Clause| c.evaluate(&t).unwrap();
        assert_eq!(eval(Clause::greater_than("age", 20)), vec![false, false, true, false]);
        assert_eq!(
            eval(Clause::greater_than_or_equal("age", 20.0)),
            vec![false, true, true, false]
        );
        assert_eq!(eval(Clause::lower_than("age", 20)), vec![true, false, false, false]);
        assert_eq!(eval(Clause::lower_than_or_equal("age", 20)), vec![true, true, false, false]);
        assert_eq!(eval(Clause::equal("age", 30.0)), vec![false, false, true, false]);
        assert_eq!(eval(Clause::is_in("age", [10, 30])), vec![true, false, true, false]);
    }

    #[test]
    fn text_and_category_columns() {
        let t = table();
        assert_eq!(
            Clause::equal("city", "rome").evaluate(&t).unwrap(),
            vec![false, true, false, true]
        );
        assert_eq!(
            Clause::lower_than("city", "p").evaluate(&t).unwrap(),
            vec![false, false, true, false]
        );
        assert_eq!(
            Clause::is_in("churn", [true]).evaluate(&t).unwrap(),
            vec![true, false, false, true]
        );
    }

    #[test]
    fn inferred_boolean_column_compares_as_numbers() {
        let t = Table::new(vec![Column::inferred(
            "default",
            vec![true.into(), false.into(), Value::Null, true.into()],
        )])
        .unwrap();
        assert_eq!(t.column("default").unwrap().kind, ColumnType::Numeric);
        assert_eq!(
            Clause::equal("default", true).evaluate(&t).unwrap(),
            vec![true, false, false, true]
        );
        assert_eq!(
            Clause::is_in("default", [false]).evaluate(&t).unwrap(),
            vec![false, true, false, false]
        );
        assert_eq!(
            Clause::greater_than("default", 0).evaluate(&t).unwrap(),
            vec![true, false, false, true]
        );
    }

    #[test]
    fn date_column_compares_iso_text() {
        let opened = ["2021-12-31", "2022-01-01", "2022-03-15"];
        let t = Table::new(vec![Column::inferred(
            "opened",
            opened.iter().map(|d| Value::Date(d.to_string())).collect(),
        )])
        .unwrap();
        assert_eq!(
            Clause::greater_than_or_equal("opened", "2022-01-01").evaluate(&t).unwrap(),
            vec![false, true, true]
        );
        assert_eq!(
            Clause::equal("opened", Value::Date("2022-03-15".into())).evaluate(&t).unwrap(),
            vec![false, false, true]
        );
        assert!(Clause::lower_than("opened", 2022).evaluate(&t).is_err());
    }

    #[test]
    fn unknown_column() {
        let err = Clause::equal("salary", 1).evaluate(&table()).unwrap_err();
        assert!(matches!(err, SliceError::UnknownColumn { column } if column == "salary"));
    }

    #[test]
    fn type_mismatches() {
        let t = table();
        let err = Clause::greater_than("age", "old").evaluate(&t).unwrap_err();
        assert!(matches!(err, SliceError::TypeMismatch { ref column, .. } if column == "age"));
        assert_eq!(err.to_string(), "cannot compare age (numeric) > old");

        assert!(Clause::equal("city", 3).evaluate(&t).is_err());
        assert!(Clause::greater_than("churn", true).evaluate(&t).is_err());
        assert!(Clause::equal("churn", Value::Null).evaluate(&t).is_err());
    }

    #[test]
    fn rendering() {
        assert_eq!(Clause::greater_than_or_equal("age", 30.0).to_string(), "age >= 30");
        assert_eq!(Clause::lower_than("income", 20000).to_string(), "income < 20000");
        assert_eq!(Clause::is_in("city", ["rome", "oslo"]).to_string(), "city in [oslo, rome]");
    }

    #[test]
    fn value_equality() {
        assert_eq!(Clause::equal("a", 1), Clause::equal("a", 1));
        assert_ne!(Clause::equal("a", 1), Clause::equal("a", 2));
        assert_ne!(Clause::greater_than("a", 1), Clause::greater_than_or_equal("a", 1));
        assert_eq!(Clause::is_in("a", [2, 1]), Clause::is_in("a", [1, 2]));
    }
}

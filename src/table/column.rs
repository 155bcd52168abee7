use crate::grid::Value;
use std::fmt::Display;

/// A named column of a table.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn kind(&self) -> ColumnKind {
        ColumnKind::detect(&self.values)
    }
}

/// The common kind of a column's non-empty values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// No value at all
    Empty,
    Numeric,
    DateTime,
    Time,
    Text,
    /// Non-empty values of more than one kind
    Mixed,
}

impl ColumnKind {
    fn of(value: &Value) -> Option<ColumnKind> {
        match value {
            Value::Empty => None,
            Value::Number(_) => Some(ColumnKind::Numeric),
            Value::DateTime(_) => Some(ColumnKind::DateTime),
            Value::Time(_) => Some(ColumnKind::Time),
            Value::Text(_) => Some(ColumnKind::Text),
        }
    }

    /// Detects the single kind shared by every non-empty value.
    pub fn detect(values: &[Value]) -> ColumnKind {
        let kinds: Vec<ColumnKind> = values.iter().filter_map(Self::of).collect();
        match kinds.first() {
            None => ColumnKind::Empty,
            Some(first) if kinds.iter().all(|kind| kind == first) => *first,
            Some(_) => ColumnKind::Mixed,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Numeric)
    }

    pub fn is_datetime(&self) -> bool {
        matches!(self, ColumnKind::DateTime)
    }

    /// Kinds that hold at least some text worth parsing.
    pub fn is_textual(&self) -> bool {
        matches!(self, ColumnKind::Text | ColumnKind::Mixed)
    }
}

impl Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnKind::Empty => "empty",
            ColumnKind::Numeric => "numeric",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Time => "time",
            ColumnKind::Text => "text",
            ColumnKind::Mixed => "mixed",
        };
        write!(f, "{}", name)
    }
}

/// Coerces every value to a number; anything not convertible is `None`.
pub fn coerce_numeric(values: &[Value]) -> Vec<Option<f64>> {
    values.iter().map(Value::to_number).collect()
}

/// Fraction of values that coerce to a number, over all rows. Zero for no rows.
pub fn numeric_fraction(values: &[Value]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let numeric = values.iter().filter(|value| value.to_number().is_some()).count();
    numeric as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_uniform_kinds() {
        assert_eq!(ColumnKind::detect(&[]), ColumnKind::Empty);
        assert_eq!(ColumnKind::detect(&[Value::Empty, Value::Empty]), ColumnKind::Empty);
        assert_eq!(ColumnKind::detect(&[1.0.into(), Value::Empty, 2.0.into()]), ColumnKind::Numeric);
        assert_eq!(ColumnKind::detect(&["1".into(), "x".into()]), ColumnKind::Text);
        assert_eq!(ColumnKind::detect(&["1".into(), 2.0.into()]), ColumnKind::Mixed);
    }

    #[test]
    fn empty_columns_are_not_textual() {
        assert!(ColumnKind::Text.is_textual());
        assert!(ColumnKind::Mixed.is_textual());
        assert!(!ColumnKind::Empty.is_textual());
        assert!(!ColumnKind::Numeric.is_textual());
    }

    #[test]
    fn numeric_fraction_counts_all_rows() {
        let values = vec!["1,5".into(), "2".into(), Value::Empty, 4.0.into(), " 5 ".into()];
        assert_eq!(numeric_fraction(&values), 0.6);
        assert_eq!(numeric_fraction(&[]), 0.0);
        assert_eq!(coerce_numeric(&values), vec![None, Some(2.0), None, Some(4.0), Some(5.0)]);
    }
}

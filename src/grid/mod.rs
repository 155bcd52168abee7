//! # Grid
//!
//! The headerless, rectangular matrix of cell values produced by the loader and
//! consumed by the structural cleaner and the header locator.
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use std::fmt::Display;

pub mod clean;
pub mod delimited;
pub mod loader;

/// A single cell value.
///
/// The variant is decided once, when the cell is loaded: spreadsheet number
/// formats distinguish dates and times from plain numbers, while delimited text
/// only ever yields `Text` and `Empty`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Numeric coercion: numbers pass through, text is parsed after trimming,
    /// everything else (and NaN) is missing.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) if !value.is_nan() => Some(*value),
            Value::Text(text) => text.trim().parse::<f64>().ok().filter(|value| !value.is_nan()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Text(text) => write!(f, "{}", text),
            Value::Number(number) => write!(f, "{}", number),
            Value::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
            Value::Time(time) => write!(f, "{}", time.format("%H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Number(number)
    }
}

/// Headerless rectangular matrix of values. Every row has `width` cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Value>>,
    width: usize,
}

impl Grid {
    /// Builds a grid, padding short rows with empty cells.
    pub fn new(rows: Vec<Vec<Value>>) -> Grid {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self::with_width(rows, width)
    }

    /// Builds a grid of a fixed width; longer rows are truncated, shorter padded.
    pub fn with_width(mut rows: Vec<Vec<Value>>, width: usize) -> Grid {
        for row in &mut rows {
            row.resize(width, Value::Empty);
        }
        Grid { rows, width }
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    /// True when the grid holds no rows or only empty cells.
    pub fn is_blank(&self) -> bool {
        self.rows.iter().flatten().all(Value::is_empty)
    }
}

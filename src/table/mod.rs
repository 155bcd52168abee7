//! # Table
//!
//! Named columns over a common row count, produced from a grid by header promotion.
//! Every operation returns a new owned table; nothing is shared with the input.
use crate::grid::Value;
use crate::inference::InferenceError;
use std::collections::HashSet;

pub mod column;

pub use column::Column;
pub use column::ColumnKind;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    /// Builds a table from column names and row-major values.
    ///
    /// Names are made unique: an empty name becomes `column{n}` (1-based position)
    /// and repeats get ` 2`, ` 3`, ... appended. Rows are padded or cut to the name count.
    pub fn new(names: Vec<String>, rows: Vec<Vec<Value>>) -> Table {
        let height = rows.len();
        let names = unique_names(names);
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column { name, values: Vec::with_capacity(height) })
            .collect();
        for mut row in rows {
            row.resize(columns.len(), Value::Empty);
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }
        Table { columns, height }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_values(&self, name: &str) -> Result<&[Value], InferenceError> {
        self.column(name)
            .map(|column| column.values.as_slice())
            .ok_or_else(|| InferenceError::ColumnNotFound(name.to_owned()))
    }

    /// Values of one row in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.height {
            return None;
        }
        Some(self.columns.iter().map(|column| &column.values[index]).collect())
    }

    /// Replaces the named column's values, or appends a new column.
    /// Values are padded or cut to the table height.
    pub fn set_column(mut self, name: &str, mut values: Vec<Value>) -> Table {
        values.resize(self.height, Value::Empty);
        match self.columns.iter_mut().find(|column| column.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column { name: name.to_owned(), values }),
        }
        self
    }

    pub fn rename_column(mut self, from: &str, to: &str) -> Result<Table, InferenceError> {
        if from != to && self.column(to).is_some() {
            self.columns.retain(|column| column.name != to);
        }
        let column = self
            .columns
            .iter_mut()
            .find(|column| column.name == from)
            .ok_or_else(|| InferenceError::ColumnNotFound(from.to_owned()))?;
        column.name = to.to_owned();
        Ok(self)
    }

    /// Keeps exactly the named columns, in the given order.
    pub fn select(mut self, names: &[&str]) -> Result<Table, InferenceError> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| self.column(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(InferenceError::MissingRequiredColumns(missing));
        }
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            if let Some(index) = self.columns.iter().position(|column| column.name == *name) {
                columns.push(self.columns.remove(index));
            }
        }
        Ok(Table { columns, height: self.height })
    }

    /// Drops the run of all-empty rows at the bottom; interior empty rows stay.
    pub fn trim_trailing_empty_rows(mut self) -> Table {
        let height = (0..self.height)
            .rposition(|index| self.columns.iter().any(|column| !column.values[index].is_empty()))
            .map_or(0, |index| index + 1);
        for column in &mut self.columns {
            column.values.truncate(height);
        }
        self.height = height;
        self
    }
}

fn unique_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let base = if name.is_empty() { format!("column{}", index + 1) } else { name };
            let mut candidate = base.clone();
            let mut suffix = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{} {}", base, suffix);
                suffix += 1;
            }
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            vec!["date".to_owned(), "kwh".to_owned(), "note".to_owned()],
            vec![
                vec!["2024-01-01".into(), "1".into()],
                vec![Value::Empty, Value::Empty, Value::Empty],
                vec!["2024-01-02".into(), "2".into(), "x".into()],
                vec![Value::Empty, Value::Empty, Value::Empty],
            ],
        )
    }

    #[test]
    fn makes_names_unique() {
        let table = Table::new(vec!["kwh".to_owned(), String::new(), "kwh".to_owned(), "kwh".to_owned()], Vec::new());
        assert_eq!(table.column_names(), vec!["kwh", "column2", "kwh 2", "kwh 3"]);
    }

    #[test]
    fn pads_short_rows() {
        let table = table();
        assert_eq!(table.height(), 4);
        assert_eq!(table.column_values("note").unwrap()[0], Value::Empty);
        assert_eq!(table.row(2).unwrap(), vec![&Value::from("2024-01-02"), &Value::from("2"), &Value::from("x")]);
        assert!(table.row(4).is_none());
    }

    #[test]
    fn selects_columns_in_order() {
        let selected = table().select(&["kwh", "date"]).unwrap();
        assert_eq!(selected.column_names(), vec!["kwh", "date"]);
        assert_eq!(selected.height(), 4);
    }

    #[test]
    fn select_reports_missing_columns() {
        let error = table().select(&["date", "moment", "power"]).unwrap_err();
        assert!(matches!(error, InferenceError::MissingRequiredColumns(missing) if missing == vec!["moment", "power"]));
    }

    #[test]
    fn sets_and_renames_columns() {
        let table = table()
            .set_column("kwh", vec![1.0.into()])
            .set_column("moment", vec!["a".into(), "b".into(), "c".into(), "d".into()])
            .rename_column("moment", "date")
            .unwrap();
        assert_eq!(table.column_names(), vec!["kwh", "note", "date"]);
        assert_eq!(table.column_values("kwh").unwrap()[1], Value::Empty);
        assert!(matches!(table.rename_column("gone", "x"), Err(InferenceError::ColumnNotFound(_))));
    }

    #[test]
    fn trims_trailing_empty_rows() {
        let trimmed = table().trim_trailing_empty_rows();
        assert_eq!(trimmed.height(), 3);
        assert_eq!(trimmed.width(), 3);
        assert_eq!(trimmed.column_values("kwh").unwrap().len(), 3);
        // the interior empty row survives
        assert_eq!(trimmed.row(1).unwrap(), vec![&Value::Empty; 3]);
    }

    #[test]
    fn trimming_an_all_empty_table_keeps_columns() {
        let table = Table::new(vec!["date".to_owned(), "kwh".to_owned()], vec![vec![Value::Empty, Value::Empty]; 3]);
        let trimmed = table.trim_trailing_empty_rows();
        assert_eq!(trimmed.height(), 0);
        assert_eq!(trimmed.column_names(), vec!["date", "kwh"]);
        assert!(trimmed.column_values("kwh").unwrap().is_empty());
    }
}

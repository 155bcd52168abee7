//! Header Locator: finds the row holding column names and promotes it.
use crate::grid::Grid;
use crate::grid::Value;
use crate::inference::keywords::has_consumption_keyword;
use crate::inference::keywords::has_time_keyword;
use crate::inference::keywords::normalize;
use crate::inference::InferenceError;
use crate::table::Table;
use tracing::debug;

/// One point for any time keyword in the row, one for any consumption keyword.
pub fn header_score(row: &[Value]) -> u8 {
    let cells: Vec<String> = row.iter().map(|value| normalize(&value.to_string())).collect();
    let time = cells.iter().any(|cell| has_time_keyword(cell));
    let consumption = cells.iter().any(|cell| has_consumption_keyword(cell));
    time as u8 + consumption as u8
}

/// Index of the first row with the highest score; later rows must score strictly higher to win.
pub fn find_header_row(grid: &Grid) -> Result<usize, InferenceError> {
    let (index, score) = grid
        .rows()
        .iter()
        .enumerate()
        .fold((0, 0), |best, (index, row)| {
            let score = header_score(row);
            if score > best.1 {
                (index, score)
            } else {
                best
            }
        });
    if score == 0 {
        return Err(InferenceError::HeaderNotFound);
    }
    debug!(row = index, score, "located header row");
    Ok(index)
}

/// Promotes row `index` to column names (normalized) and keeps only the rows below it.
pub fn apply_header(grid: Grid, index: usize) -> Table {
    let mut rows = grid.into_rows();
    let body = rows.split_off((index + 1).min(rows.len()));
    let names = rows
        .pop()
        .map(|header| header.iter().map(|value| normalize(&value.to_string())).collect())
        .unwrap_or_default();
    Table::new(names, body)
}

pub fn locate_and_apply(grid: Grid) -> Result<Table, InferenceError> {
    let index = find_header_row(&grid)?;
    Ok(apply_header(grid, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| if cell.is_empty() { Value::Empty } else { Value::from(*cell) }).collect())
                .collect(),
        )
    }

    #[test]
    fn scores_rows() {
        assert_eq!(header_score(&[Value::from("Datum"), Value::from("Verbrauch")]), 2);
        assert_eq!(header_score(&[Value::from("Zeitraum"), Value::Empty]), 1);
        assert_eq!(header_score(&[Value::from("Meter"), Value::Number(12.5)]), 0);
    }

    #[test]
    fn picks_first_best_row() {
        let grid = grid(&[
            &["Export", ""],
            &["Zeit", ""],
            &["Zeit", "kWh"],
            &["Datum", "Verbrauch"],
            &["01.01.2024", "1"],
        ]);
        assert_eq!(find_header_row(&grid), Ok(2));
        let table = locate_and_apply(grid).unwrap();
        assert_eq!(table.column_names(), vec!["zeit", "kwh"]);
        assert_eq!(table.height(), 2);
    }

    #[test]
    fn keeps_only_rows_below_header() {
        let grid = grid(&[&["title", ""], &["Date", "kWh"], &["2024-01-01", "1"], &["2024-01-02", "2"]]);
        let height = grid.height();
        let table = locate_and_apply(grid).unwrap();
        assert_eq!(table.height(), height - 2);
        assert_eq!(table.column_values("date").unwrap()[0], Value::from("2024-01-01"));
    }

    #[test]
    fn header_on_last_row_gives_empty_table() {
        let table = locate_and_apply(grid(&[&["Date", "kWh"]])).unwrap();
        assert_eq!(table.height(), 0);
        assert_eq!(table.column_names(), vec!["date", "kwh"]);
    }

    #[test]
    fn fails_without_keywords() {
        assert_eq!(find_header_row(&grid(&[&["a", "b"], &["1", "2"]])), Err(InferenceError::HeaderNotFound));
        assert_eq!(find_header_row(&Grid::default()), Err(InferenceError::HeaderNotFound));
    }
}

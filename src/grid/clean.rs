//! Structural cleanup that only looks at emptiness, never at meaning.
use crate::grid::Grid;
use crate::grid::Value;

/// Drops every all-empty column, then every all-empty row (interior rows included).
///
/// An all-empty grid collapses to zero rows and zero columns.
pub fn clean(grid: Grid) -> Grid {
    let keep: Vec<usize> = (0..grid.width())
        .filter(|col| grid.rows().iter().any(|row| !row[*col].is_empty()))
        .collect();
    let width = keep.len();
    let rows: Vec<Vec<Value>> = grid
        .into_rows()
        .into_iter()
        .map(|mut row| keep.iter().map(|col| std::mem::take(&mut row[*col])).collect::<Vec<Value>>())
        .filter(|row| !is_empty_row(row))
        .collect();
    Grid::with_width(rows, width)
}

/// Removes the contiguous run of all-empty rows at the bottom, leaving interior
/// empty rows and the column count untouched.
pub fn trim_trailing_empty_rows(grid: Grid) -> Grid {
    let width = grid.width();
    let mut rows = grid.into_rows();
    rows.truncate(trailing_content_len(&rows));
    Grid::with_width(rows, width)
}

/// Number of leading rows that survive trailing-row trimming.
fn trailing_content_len(rows: &[Vec<Value>]) -> usize {
    rows.iter().rposition(|row| !is_empty_row(row)).map_or(0, |index| index + 1)
}

fn is_empty_row(row: &[Value]) -> bool {
    row.iter().all(Value::is_empty)
}

use crate::grid::Grid;
use crate::grid::Value;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::MAX_GRID_CELLS;
use std::collections::HashMap;
use std::collections::HashSet;

/// Cells of one worksheet in reading order, plus the observed extent.
#[derive(Default)]
pub(crate) struct Sheet {
    pub(crate) name: String,
    pub(crate) cells: Vec<Cell>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(super) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    pub(super) fn push(&mut self, cell: Cell) {
        self.row_upper_bound = self.row_upper_bound.max(Some(cell.row));
        self.col_upper_bound = self.col_upper_bound.max(Some(cell.col));
        self.cells.push(cell);
    }

    /// Shared string ids referenced by this sheet.
    pub(super) fn shared_string_indexes(&self) -> HashSet<usize> {
        self.cells
            .iter()
            .filter(|cell| cell.kind == CellType::SharedString)
            .filter_map(|cell| cell.value.parse::<usize>().ok())
            .collect()
    }

    /// Lays the cells out as a dense grid anchored at A1.
    /// Extents beyond `MAX_GRID_CELLS` are refused rather than allocated.
    pub(super) fn into_grid(self, shared_strings: &[String], mappings: &HashMap<usize, usize>) -> Result<Grid, SpreadsheetError> {
        let (Some(row_upper_bound), Some(col_upper_bound)) = (self.row_upper_bound, self.col_upper_bound) else {
            return Ok(Grid::default());
        };
        let height = row_upper_bound + 1;
        let width = col_upper_bound + 1;
        if height.checked_mul(width).map_or(true, |cells| cells > MAX_GRID_CELLS) {
            return Err(SpreadsheetError::SheetTooLargeError(height, width));
        }
        let mut rows = vec![vec![Value::Empty; width]; height];
        for cell in &self.cells {
            rows[cell.row][cell.col] = cell.to_value(shared_strings, mappings);
        }
        Ok(Grid::with_width(rows, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lays_out_sparse_cells() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.push(Cell { row: 1, col: 2, kind: CellType::Number, value: "3".to_owned() });
        sheet.push(Cell { row: 0, col: 0, kind: CellType::SharedString, value: "4".to_owned() });
        assert_eq!(sheet.shared_string_indexes(), HashSet::from([4]));

        let grid = sheet.into_grid(&["kWh".to_owned()], &HashMap::from([(4, 0)])).unwrap();
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.get(0, 0), Some(&Value::from("kWh")));
        assert_eq!(grid.get(1, 2), Some(&Value::Number(3.0)));
        assert_eq!(grid.get(1, 0), Some(&Value::Empty));
    }

    #[test]
    fn empty_sheet_gives_empty_grid() {
        let sheet = Sheet::new("Sheet1");
        assert_eq!(sheet.into_grid(&[], &HashMap::new()).unwrap(), Grid::default());
    }

    #[test]
    fn refuses_stray_cell_far_out() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.push(Cell { row: 0, col: 0, kind: CellType::InlineString, value: "Datum".to_owned() });
        sheet.push(Cell { row: 1_048_575, col: 16_383, kind: CellType::Number, value: "1".to_owned() });
        let error = sheet.into_grid(&[], &HashMap::new()).unwrap_err();
        assert!(matches!(error, SpreadsheetError::SheetTooLargeError(1_048_576, 16_384)));
    }
}

//! # Spreadsheet Module
//!
//! Pure-Rust readers for Excel workbooks (.xlsx via ZIP + XML, .xls via
//! CFB + BIFF8). Only the first worksheet is read; its cells are typed from
//! their number formats and laid out as a dense [`Grid`].
use crate::error::MeterSheetError;
use crate::grid::Grid;
use crate::helpers::cfb::CFB_SIGNATURE;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xls::XlsSpreadsheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::collections::HashMap;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

pub(crate) mod cell;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xls;
pub(crate) mod xlsx;

const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Upper bound on the dense grid laid out from a worksheet's extent.
pub(crate) const MAX_GRID_CELLS: usize = 1 << 24;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Missing '{0}' in workbook")]
    FileError(String),

    #[error("Workbook contains no worksheet")]
    SpreadsheetEmptyError,

    #[error("Workbook is password protected")]
    SpreadsheetPasswordProtectedError,

    #[error("Unknown spreadsheet signature")]
    UnknownSignature,

    #[error("Worksheet extent of {0} rows by {1} columns is too large to lay out")]
    SheetTooLargeError(usize, usize),
}

pub(crate) trait Spreadsheet {
    /// Loads the shared strings whose ids are in `indexes`.
    fn load_shared_strings(&mut self, indexes: HashSet<usize>) -> Result<(Vec<String>, HashMap<usize, usize>), MeterSheetError>;

    /// Reads every non-empty cell of the first worksheet.
    fn read_first_sheet(&mut self) -> Result<Sheet, MeterSheetError>;
}

/// Picks a reader from the leading magic bytes.
pub(crate) fn open_spreadsheet(data: Vec<u8>) -> Result<Box<dyn Spreadsheet>, MeterSheetError> {
    if data.starts_with(&ZIP_SIGNATURE) {
        Ok(Box::new(XlsxSpreadsheet::open(data)?))
    } else if data.starts_with(&CFB_SIGNATURE) {
        if excel::is_password_protected(&data) {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError)?
        }
        Ok(Box::new(XlsSpreadsheet::open(data)?))
    } else {
        Err(SpreadsheetError::UnknownSignature)?
    }
}

/// Reads the first worksheet of an in-memory workbook into a grid.
pub fn read_grid(data: Vec<u8>) -> Result<Grid, MeterSheetError> {
    let mut spreadsheet = open_spreadsheet(data)?;
    let sheet = spreadsheet.read_first_sheet()?;
    let (shared_strings, mappings) = spreadsheet.load_shared_strings(sheet.shared_string_indexes())?;
    debug!(
        sheet = %sheet.name,
        cells = sheet.cells.len(),
        extent = %sheet.row_upper_bound.zip(sheet.col_upper_bound)
            .map(|(row, col)| index_to_reference(row, col))
            .unwrap_or_default(),
        "read first worksheet"
    );
    Ok(sheet.into_grid(&shared_strings, &mappings)?)
}

//! Grid Loader: turns raw bytes of a declared kind into a headerless grid.
use crate::error::MeterSheetError;
use crate::grid::delimited::read_delimited;
use crate::grid::Grid;
use crate::options::Options;
use crate::spreadsheet::read_grid;
use crate::spreadsheet::SpreadsheetError;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unsupported file format '{0}'")]
    UnsupportedFormat(String),

    #[error("No usable rows or cells in the input")]
    EmptyData,
}

/// The two input kinds the engine understands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// Excel workbook (.xlsx, .xls)
    SpreadsheetBinary,
    /// Delimited text (.csv)
    DelimitedText,
}

impl FileKind {
    /// Derives the kind from a file name or bare extension, case-insensitively.
    pub fn from_extension(name: &str) -> Result<FileKind, LoadError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|extension| extension.to_str())
            .unwrap_or(name)
            .to_ascii_lowercase();
        match extension.as_str() {
            "xlsx" | "xls" => Ok(FileKind::SpreadsheetBinary),
            "csv" => Ok(FileKind::DelimitedText),
            _ => Err(LoadError::UnsupportedFormat(name.to_owned())),
        }
    }
}

/// A loaded grid plus where it came from.
#[derive(Clone, Debug)]
pub struct LoadedGrid {
    pub grid: Grid,
    pub kind: FileKind,
    /// Text encoding label, for delimited text
    pub encoding: Option<&'static str>,
    /// Detected delimiter, for delimited text
    pub delimiter: Option<char>,
}

/// Loads bytes of the declared kind. Fails with `EmptyData` when no cell carries a value.
pub fn load(data: Vec<u8>, kind: FileKind, options: &Options) -> Result<LoadedGrid, MeterSheetError> {
    let loaded = match kind {
        FileKind::SpreadsheetBinary => LoadedGrid {
            grid: read_grid(data).map_err(|e| match e {
                MeterSheetError::SpreadsheetError(SpreadsheetError::UnknownSignature) => {
                    MeterSheetError::from(LoadError::UnsupportedFormat("unrecognized spreadsheet signature".to_owned()))
                }
                e => e,
            })?,
            kind,
            encoding: None,
            delimiter: None,
        },
        FileKind::DelimitedText => {
            let delimited = read_delimited(&data, options)?;
            LoadedGrid {
                grid: delimited.grid,
                kind,
                encoding: Some(delimited.encoding),
                delimiter: Some(delimited.delimiter as char),
            }
        }
    };
    if loaded.grid.is_blank() {
        Err(LoadError::EmptyData)?
    }
    debug!(
        kind = ?loaded.kind,
        rows = loaded.grid.height(),
        cols = loaded.grid.width(),
        "loaded grid"
    );
    Ok(loaded)
}

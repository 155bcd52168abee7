//! # Meter Sheet
//!
//! Tabular inference and normalization for energy-meter exports.
//!
//! Meter exports arrive as Excel workbooks or delimited text with unknown layout:
//! preamble rows above the header, blank columns, vendor-specific column names, power
//! readings instead of energy. This crate turns such a file into a canonical two-column
//! table of `moment` and `consumption_kwh`.
//!
//! ## Pipeline
//!
//! - **Grid Loader** (`grid::loader`): bytes of a declared kind into a headerless grid.
//!   Workbooks (`.xlsx`, `.xls`) are read natively; delimited text gets its
//!   encoding and delimiter sniffed.
//! - **Structural Cleaner** (`grid::clean`): drops all-empty columns and rows.
//! - **Header Locator** (`inference::header`): scores rows by time and consumption
//!   keywords and promotes the first best row to column names.
//! - **Column Classifier** (`inference::columns`): picks the consumption column and the
//!   date and time-of-day columns.
//! - **Unit Normalizer** (`inference::unit`): kW readings to kWh.
//! - **Timestamp Normalizer** (`inference::timestamp`): dates to `YYYY-MM-DD`, or
//!   `YYYY-MM-DD HH:MM:SS` when a time-of-day column is merged in.
//!
//! ```no_run
//! use meter_sheet::{normalize_file, Options};
//!
//! let normalized = normalize_file("export.csv", &Options::default())?;
//! for warning in &normalized.warnings {
//!     eprintln!("{}", warning);
//! }
//! # Ok::<(), meter_sheet::MeterSheetError>(())
//! ```
mod helpers;
mod spreadsheet;

pub mod error;
pub mod grid;
pub mod inference;
pub mod options;
pub mod pipeline;
pub mod table;

pub use error::MeterSheetError;
pub use grid::loader::FileKind;
pub use grid::loader::LoadError;
pub use grid::Grid;
pub use grid::Value;
pub use inference::unit::Unit;
pub use inference::InferenceError;
pub use options::Options;
pub use pipeline::normalize;
pub use pipeline::normalize_file;
pub use pipeline::InferenceReport;
pub use pipeline::Normalized;
pub use spreadsheet::read_grid;
pub use spreadsheet::SpreadsheetError;
pub use table::Table;

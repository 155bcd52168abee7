//! # Inference
//!
//! Header location, column classification and the unit and timestamp normalizers.
//! Every step is a pure transformation over an owned table.
use crate::table::ColumnKind;
use thiserror::Error;

pub mod columns;
pub mod header;
pub mod keywords;
pub mod timestamp;
pub mod unit;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("No header row found: no row mentions a time or consumption keyword")]
    HeaderNotFound,

    #[error("No consumption column found among {0:?}: no column name carries a consumption keyword or a kW/kWh unit")]
    NoConsumptionColumn(Vec<String>),

    #[error("Column '{0}' cannot be converted to numeric values")]
    NonNumericColumn(String),

    #[error("Could not parse any values in date column '{0}' as datetime")]
    UnparsableDateColumn(String),

    #[error("Date column '{column}' holds {kind} values, expected datetime or text")]
    UnsupportedColumnType { column: String, kind: ColumnKind },

    #[error("Missing required columns: {0:?}")]
    MissingRequiredColumns(Vec<String>),

    #[error("No date column found among time columns {0:?}")]
    NoTimestampColumn(Vec<String>),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
}

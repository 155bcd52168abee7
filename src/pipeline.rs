//! End-to-end orchestration: bytes in, canonical `moment` + `consumption_kwh` table out.
use crate::error::MeterSheetError;
use crate::error::ResultMessage;
use crate::grid::clean::clean;
use crate::grid::loader::load;
use crate::grid::loader::FileKind;
use crate::inference::columns::classify_time_columns;
use crate::inference::columns::detect_consumption_column;
use crate::inference::columns::detect_time_columns;
use crate::inference::header::apply_header;
use crate::inference::header::find_header_row;
use crate::inference::timestamp::combine_date_and_time;
use crate::inference::timestamp::normalize_date_column;
use crate::inference::unit::to_energy_kwh;
use crate::inference::unit::Unit;
use crate::inference::InferenceError;
use crate::options::Options;
use crate::table::Table;
use std::path::Path;
use tracing::debug;
use tracing::info;

/// What the engine decided on the way to the canonical table.
#[derive(Clone, Debug, PartialEq)]
pub struct InferenceReport {
    pub encoding: Option<&'static str>,
    pub delimiter: Option<char>,
    /// Row index of the header within the cleaned grid
    pub header_row: usize,
    pub time_columns: Vec<String>,
    pub date_column: String,
    pub time_column: Option<String>,
    pub consumption_column: String,
    pub unit: Unit,
}

/// The canonical table plus non-fatal warnings.
#[derive(Clone, Debug)]
pub struct Normalized {
    pub table: Table,
    pub warnings: Vec<String>,
    pub report: InferenceReport,
}

/// Runs every stage over `data`. Each stage owns its input; a failure aborts the whole run.
pub fn normalize(data: Vec<u8>, kind: FileKind, options: &Options) -> Result<Normalized, MeterSheetError> {
    let loaded = load(data, kind, options)?;
    let grid = clean(loaded.grid);

    let header_row = find_header_row(&grid)?;
    let table = apply_header(grid, header_row).trim_trailing_empty_rows();

    let consumption = detect_consumption_column(&table, options.numeric_threshold)?;
    let time_columns: Vec<String> = detect_time_columns(&table)
        .into_iter()
        .filter(|name| *name != consumption.name)
        .collect();
    let roles = classify_time_columns(&table, &time_columns);
    let date_column = roles
        .date
        .ok_or_else(|| InferenceError::NoTimestampColumn(time_columns.clone()))?;
    let time_column = roles.time.filter(|_| options.combine_time_of_day);

    let conversion = to_energy_kwh(table, &consumption.name, consumption.unit, options)?;
    let table = match &time_column {
        Some(time_column) => combine_date_and_time(conversion.table, &date_column, time_column, &options.moment_column)?,
        None => normalize_date_column(conversion.table, &date_column)?.rename_column(&date_column, &options.moment_column)?,
    };
    let table = keep_only_moment_and_consumption(table, options)?;

    info!(
        rows = table.height(),
        date = %date_column,
        consumption = %consumption.name,
        unit = %consumption.unit,
        "normalized meter export"
    );
    Ok(Normalized {
        table,
        warnings: conversion.warning.into_iter().collect(),
        report: InferenceReport {
            encoding: loaded.encoding,
            delimiter: loaded.delimiter,
            header_row,
            time_columns,
            date_column,
            time_column,
            consumption_column: consumption.name,
            unit: consumption.unit,
        },
    })
}

/// Reduces a table to the canonical moment and consumption columns, in that order.
pub fn keep_only_moment_and_consumption(table: Table, options: &Options) -> Result<Table, InferenceError> {
    table.select(&[options.moment_column.as_str(), options.consumption_column.as_str()])
}

/// Reads a file, derives its kind from the extension and normalizes it.
/// Plumbing errors are prefixed with the path.
pub fn normalize_file<P: AsRef<Path>>(path: P, options: &Options) -> Result<Normalized, MeterSheetError> {
    let path = path.as_ref();
    let name = path.to_string_lossy();
    let kind = FileKind::from_extension(&name)?;
    debug!(path = %name, ?kind, "reading file");
    let data = std::fs::read(path).map_err(MeterSheetError::from);
    normalize(data.with_prefix(&name)?, kind, options).with_prefix(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Value;

    fn run(csv: &str) -> Result<Normalized, MeterSheetError> {
        normalize(csv.as_bytes().to_vec(), FileKind::DelimitedText, &Options::default())
    }

    #[test]
    fn skips_preamble_and_footer() {
        let normalized = run("Export;;\n;;\nDatum;Zeit;Verbrauch kWh\n01.01.2024;00:15;1,5\n01.01.2024;00:30;2\n;;\n").unwrap();
        assert_eq!(normalized.report.header_row, 1);
        assert_eq!(normalized.report.delimiter, Some(';'));
        assert_eq!(normalized.report.date_column, "datum");
        assert_eq!(normalized.report.time_column.as_deref(), Some("zeit"));
        assert_eq!(normalized.table.column_names(), vec!["moment", "consumption_kwh"]);
        assert_eq!(
            normalized.table.column_values("moment").unwrap(),
            &[Value::from("2024-01-01 00:15:00"), Value::from("2024-01-01 00:30:00")]
        );
        // "1,5" is not a number without locale handling
        assert_eq!(normalized.table.column_values("consumption_kwh").unwrap(), &[Value::Empty, Value::Number(2.0)]);
    }

    #[test]
    fn date_only_without_combining() {
        let options = Options { combine_time_of_day: false, ..Options::default() };
        let data = b"date,time,kwh\n2024-01-01,00:15,1\n".to_vec();
        let normalized = normalize(data, FileKind::DelimitedText, &options).unwrap();
        assert_eq!(normalized.report.time_column, None);
        assert_eq!(normalized.table.column_values("moment").unwrap(), &[Value::from("2024-01-01")]);
    }

    #[test]
    fn consumption_column_is_not_a_time_column() {
        // "zeitraum kwh" carries both keywords
        let normalized = run("datum,zeitraum kwh\n2024-01-01,3\n").unwrap();
        assert_eq!(normalized.report.consumption_column, "zeitraum kwh");
        assert_eq!(normalized.report.time_columns, vec!["datum"]);
    }

    #[test]
    fn fails_without_date_column() {
        let error = run("meter,kwh\nx,1\n").unwrap_err();
        assert!(matches!(error.as_inference(), Some(InferenceError::NoTimestampColumn(columns)) if columns.is_empty()));
    }

    #[test]
    fn unknown_unit_is_a_warning() {
        let normalized = run("date,verbrauch\n2024-01-01,7\n").unwrap();
        assert_eq!(normalized.report.unit, Unit::Unknown);
        assert_eq!(normalized.warnings.len(), 1);
        assert_eq!(normalized.table.column_values("consumption_kwh").unwrap(), &[Value::Number(7.0)]);
    }

    #[test]
    fn rejects_unknown_extensions_before_reading() {
        let error = normalize_file("/nonexistent/report.pdf", &Options::default()).unwrap_err();
        assert!(error.as_load().is_some());
    }

    #[test]
    fn prefixes_io_errors_with_the_path() {
        let error = normalize_file("/nonexistent/meter.csv", &Options::default()).unwrap_err();
        assert!(error.to_string().starts_with("/nonexistent/meter.csv: "));
    }
}

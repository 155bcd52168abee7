//! Timestamp Normalizer: renders the date column (and an optional time of day) as canonical text.
use crate::grid::Value;
use crate::inference::InferenceError;
use crate::spreadsheet::cell::from_day_fraction;
use crate::table::ColumnKind;
use crate::table::Table;
use chrono::DateTime;
use chrono::Datelike;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use tracing::debug;

const DATETIME_FORMATS: [&str; 16] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d.%m.%y %H:%M:%S",
    "%d.%m.%y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: [&str; 7] = ["%Y-%m-%d", "%d.%m.%Y", "%d.%m.%y", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Best-effort, locale-agnostic date/time parsing.
///
/// Tries RFC 3339, then common date-time layouts, then date-only layouts (at midnight).
/// Slash dates read month first, like most spreadsheet tools; a day above 12 falls
/// through to the day-first layout. Four-digit year layouts reject years below 100
/// so that `01.01.24` reaches the two-digit year layout.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .filter_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .find(|datetime| datetime.year() >= 100)
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .filter_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .find(|date| date.year() >= 100)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parses a time of day such as `00:15` or `00:15:00`.
/// An interval such as `00:00 - 00:15` yields its start.
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    let start = text.split(" - ").next().unwrap_or(text).trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(start, format).ok())
}

/// Calendar date of a value, for date columns.
fn to_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::DateTime(datetime) => Some(datetime.date()),
        Value::Text(text) => parse_datetime(text).map(|datetime| datetime.date()),
        _ => None,
    }
}

/// Time of day of a value, for time columns. Bare numbers are read as day fractions.
fn to_time(value: &Value) -> Option<NaiveTime> {
    match value {
        Value::Time(time) => Some(*time),
        Value::DateTime(datetime) => Some(datetime.time()),
        Value::Text(text) => parse_time_of_day(text),
        Value::Number(number) if (0.0..1.0).contains(number) => from_day_fraction(*number),
        _ => None,
    }
}

fn date_values(table: &Table, column: &str) -> Result<Vec<Option<NaiveDate>>, InferenceError> {
    let values = table.column_values(column)?;
    let kind = ColumnKind::detect(values);
    if !kind.is_datetime() && !kind.is_textual() {
        return Err(InferenceError::UnsupportedColumnType { column: column.to_owned(), kind });
    }
    let dates: Vec<Option<NaiveDate>> = values.iter().map(to_date).collect();
    if dates.iter().all(Option::is_none) {
        return Err(InferenceError::UnparsableDateColumn(column.to_owned()));
    }
    debug!(column, %kind, parsed = dates.iter().flatten().count(), rows = dates.len(), "parsed date column");
    Ok(dates)
}

/// Rewrites `column` in place as `YYYY-MM-DD` text; values that do not parse become empty.
/// Columns holding numbers, bare times or nothing at all are refused.
pub fn normalize_date_column(table: Table, column: &str) -> Result<Table, InferenceError> {
    let values = date_values(&table, column)?
        .into_iter()
        .map(|date| date.map(|date| Value::Text(date.format("%Y-%m-%d").to_string())).unwrap_or_default())
        .collect();
    Ok(table.set_column(column, values))
}

/// Writes `output` as `YYYY-MM-DD HH:MM:SS` text built from a date column and a
/// time-of-day column; rows missing either part become empty.
pub fn combine_date_and_time(table: Table, date_column: &str, time_column: &str, output: &str) -> Result<Table, InferenceError> {
    let dates = date_values(&table, date_column)?;
    let times: Vec<Option<NaiveTime>> = table.column_values(time_column)?.iter().map(to_time).collect();
    let values = dates
        .into_iter()
        .zip(times)
        .map(|(date, time)| match (date, time) {
            (Some(date), Some(time)) => Value::Text(date.and_time(time).format("%Y-%m-%d %H:%M:%S").to_string()),
            _ => Value::Empty,
        })
        .collect();
    Ok(table.set_column(output, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(hh, mm, 0).unwrap()
    }

    fn table(names: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table::new(names.iter().map(|name| name.to_string()).collect(), rows)
    }

    #[test]
    fn parses_common_layouts() {
        assert_eq!(parse_datetime("2024-01-02"), Some(datetime(2024, 1, 2, 0, 0)));
        assert_eq!(parse_datetime(" 2024-01-02 00:15:00 "), Some(datetime(2024, 1, 2, 0, 15)));
        assert_eq!(parse_datetime("2024-01-02T00:15:00+01:00"), Some(datetime(2024, 1, 2, 0, 15)));
        assert_eq!(parse_datetime("02.01.2024 00:15"), Some(datetime(2024, 1, 2, 0, 15)));
        assert_eq!(parse_datetime("02.01.24"), Some(datetime(2024, 1, 2, 0, 0)));
        assert_eq!(parse_datetime("01/02/2024"), Some(datetime(2024, 1, 2, 0, 0)));
        assert_eq!(parse_datetime("13/02/2024"), Some(datetime(2024, 2, 13, 0, 0)));
        assert_eq!(parse_datetime("X1"), None);
        assert_eq!(parse_datetime(""), None);
    }

    #[test]
    fn parses_times_of_day() {
        assert_eq!(parse_time_of_day("00:15"), NaiveTime::from_hms_opt(0, 15, 0));
        assert_eq!(parse_time_of_day("23:45:30"), NaiveTime::from_hms_opt(23, 45, 30));
        assert_eq!(parse_time_of_day("00:00 - 00:15"), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_time_of_day("01.01.2024"), None);
        assert_eq!(parse_time_of_day("2024-01-01 00:15"), None);
    }

    #[test]
    fn truncates_datetime_values_to_dates() {
        let table = table(&["date"], vec![vec![Value::DateTime(datetime(2024, 3, 1, 12, 30))], vec![Value::Empty]]);
        let table = normalize_date_column(table, "date").unwrap();
        assert_eq!(table.column_values("date").unwrap(), &[Value::from("2024-03-01"), Value::Empty]);
    }

    #[test]
    fn parses_text_and_blanks_failures() {
        let table = table(&["datum"], vec![vec!["01.01.2024 00:15".into()], vec!["Summe".into()]]);
        let table = normalize_date_column(table, "datum").unwrap();
        assert_eq!(table.column_values("datum").unwrap(), &[Value::from("2024-01-01"), Value::Empty]);
    }

    #[test]
    fn rejects_unparsable_and_numeric_columns() {
        let text = table(&["date"], vec![vec!["abc".into()], vec!["def".into()]]);
        assert_eq!(normalize_date_column(text, "date").unwrap_err(), InferenceError::UnparsableDateColumn("date".to_owned()));

        let numeric = table(&["date"], vec![vec![45292.0.into()]]);
        assert_eq!(
            normalize_date_column(numeric, "date").unwrap_err(),
            InferenceError::UnsupportedColumnType { column: "date".to_owned(), kind: ColumnKind::Numeric }
        );
    }

    #[test]
    fn rejects_all_empty_columns() {
        let table = table(&["date"], vec![vec![Value::Empty], vec![Value::Empty]]);
        assert_eq!(
            normalize_date_column(table, "date").unwrap_err(),
            InferenceError::UnsupportedColumnType { column: "date".to_owned(), kind: ColumnKind::Empty }
        );
    }

    #[test]
    fn combines_date_and_time_columns() {
        let table = table(
            &["datum", "zeit"],
            vec![
                vec!["01.01.2024".into(), "00:15".into()],
                vec![Value::DateTime(datetime(2024, 1, 1, 0, 0)), Value::Time(NaiveTime::from_hms_opt(0, 30, 0).unwrap())],
                vec!["01.01.2024".into(), Value::Empty],
            ],
        );
        let table = combine_date_and_time(table, "datum", "zeit", "moment").unwrap();
        assert_eq!(
            table.column_values("moment").unwrap(),
            &[Value::from("2024-01-01 00:15:00"), Value::from("2024-01-01 00:30:00"), Value::Empty]
        );
    }
}

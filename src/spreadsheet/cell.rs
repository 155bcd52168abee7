use crate::grid::Value;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::TimeDelta;
use std::collections::HashMap;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as `1`/`0`
    Boolean,
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings (`t="d"` cells)
    IsoDateTime,
    InlineString,
    /// Shared string table references
    SharedString,
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses a custom number format code; `y`/`d` mark a date, `h`/`s` a time.
    /// Escaped characters, quoted literals and bracketed sections are ignored.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_bracket = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// A single raw cell as read from the sheet, before typing.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    pub(crate) value: String,
}

impl Cell {
    /// Converts the raw cell into a typed value.
    ///
    /// `mappings` translates a shared string id into its position in `shared_strings`.
    /// Numbers that fail to parse stay as text; error cells become empty.
    pub(crate) fn to_value(&self, shared_strings: &[String], mappings: &HashMap<usize, usize>) -> Value {
        match self.kind {
            CellType::Empty | CellType::Error => Value::Empty,
            CellType::Boolean => Value::Text(if self.value == "1" { "true" } else { "false" }.to_owned()),
            CellType::InlineString => to_text(&self.value),
            CellType::SharedString => self
                .value
                .parse::<usize>()
                .ok()
                .and_then(|id| mappings.get(&id))
                .and_then(|index| shared_strings.get(*index))
                .map(|string| to_text(string))
                .unwrap_or_default(),
            CellType::IsoDateTime => parse_iso_datetime(&self.value)
                .map(Value::DateTime)
                .unwrap_or_else(|| to_text(&self.value)),
            kind => match self.value.trim().parse::<f64>() {
                Ok(number) => to_typed_number(kind, number).unwrap_or(Value::Number(number)),
                Err(_) => to_text(&self.value),
            },
        }
    }
}

fn to_text(value: &str) -> Value {
    if value.is_empty() {
        Value::Empty
    } else {
        Value::Text(value.to_owned())
    }
}

fn to_typed_number(kind: CellType, number: f64) -> Option<Value> {
    match kind {
        CellType::NumberDateTime1900 | CellType::NumberDate1900 => from_serial(number, false).map(Value::DateTime),
        CellType::NumberDateTime1904 | CellType::NumberDate1904 => from_serial(number, true).map(Value::DateTime),
        CellType::NumberTime1900 | CellType::NumberTime1904 => from_day_fraction(number).map(Value::Time),
        _ => None,
    }
}

/// Converts an Excel serial day number into a date-time.
/// Serials below 60 in the 1900 system are shifted by one day for the Lotus 1-2-3 leap year bug.
pub(crate) fn from_serial(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let milliseconds = (serial.fract() * 86_400_000f64).round() as i64;
    base.checked_add_signed(TimeDelta::try_days(days + offset)?)?
        .checked_add_signed(TimeDelta::try_milliseconds(milliseconds)?)
}

/// Converts the fractional part of a serial into a time of day.
pub(crate) fn from_day_fraction(serial: f64) -> Option<NaiveTime> {
    if !serial.is_finite() {
        return None;
    }
    let milliseconds = ((serial.fract().abs() * 86_400_000f64).round() as u32) % 86_400_000;
    NaiveTime::from_num_seconds_from_midnight_opt(milliseconds / 1000, (milliseconds % 1000) * 1_000_000)
}

fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    if value.contains('T') {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().and_then(|date| date.and_hms_opt(0, 0, 0))
    }
}

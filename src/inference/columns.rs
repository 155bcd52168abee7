//! Column Classifier: time columns by name, the consumption column by score.
use crate::grid::Value;
use crate::inference::keywords::has_consumption_keyword;
use crate::inference::keywords::has_time_keyword;
use crate::inference::keywords::normalize;
use crate::inference::timestamp::parse_datetime;
use crate::inference::timestamp::parse_time_of_day;
use crate::inference::unit::Unit;
use crate::inference::InferenceError;
use crate::table::column::numeric_fraction;
use crate::table::Column;
use crate::table::Table;
use tracing::debug;

/// Names of all columns whose normalized name contains a time keyword, in table order.
pub fn detect_time_columns(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|column| has_time_keyword(&normalize(&column.name)))
        .map(|column| column.name.to_owned())
        .collect()
}

/// Lexicographic score of a consumption candidate; field order is significance order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConsumptionScore {
    /// 1 when the name carries a consumption keyword
    pub has_keyword: u8,
    /// 2 for a kWh name, 1 for a kW name
    pub unit_score: u8,
    /// 2 when already numeric, 1 when mostly coercible
    pub numeric_score: u8,
}

impl ConsumptionScore {
    pub fn of(column: &Column, numeric_threshold: f64) -> ConsumptionScore {
        let name = normalize(&column.name);
        let unit_score = match Unit::from_column_name(&name) {
            Unit::EnergyKwh => 2,
            Unit::PowerKw => 1,
            Unit::Unknown => 0,
        };
        let numeric_score = if column.kind().is_numeric() {
            2
        } else if numeric_fraction(&column.values) >= numeric_threshold {
            1
        } else {
            0
        };
        ConsumptionScore {
            has_keyword: has_consumption_keyword(&name) as u8,
            unit_score,
            numeric_score,
        }
    }

    /// A keyword or a unit in the name; numbers alone do not count.
    pub fn has_lexical_signal(&self) -> bool {
        self.has_keyword > 0 || self.unit_score > 0
    }
}

/// The chosen consumption column and the unit read from its name.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsumptionColumn {
    pub name: String,
    pub unit: Unit,
    pub score: ConsumptionScore,
}

/// Picks the column with the greatest score; ties keep the earliest column.
pub fn detect_consumption_column(table: &Table, numeric_threshold: f64) -> Result<ConsumptionColumn, InferenceError> {
    let best = table
        .columns()
        .iter()
        .map(|column| (column, ConsumptionScore::of(column, numeric_threshold)))
        .fold(None::<(&Column, ConsumptionScore)>, |best, (column, score)| match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((column, score)),
        });
    match best {
        Some((column, score)) if score.has_lexical_signal() => {
            let unit = Unit::from_column_name(&column.name);
            debug!(column = %column.name, ?score, %unit, "detected consumption column");
            Ok(ConsumptionColumn {
                name: column.name.to_owned(),
                unit,
                score,
            })
        }
        _ => Err(InferenceError::NoConsumptionColumn(
            table.column_names().into_iter().map(String::from).collect(),
        )),
    }
}

/// Roles of the time columns: the calendar date and, optionally, a separate time of day.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeRoles {
    pub date: Option<String>,
    pub time: Option<String>,
}

/// The first candidate holding only times of day becomes the time column.
///
/// The date column is the first remaining candidate holding at least one date.
/// Keywords match inside longer names (`bis` in "OBIS-Kennzahl", `ab` in "Label"),
/// so a candidate without dates is passed over. When no candidate holds a date,
/// the first remaining one is used and fails later with a parse error.
pub fn classify_time_columns(table: &Table, time_columns: &[String]) -> TimeRoles {
    let time = time_columns
        .iter()
        .find(|name| table.column(name).is_some_and(|column| is_time_of_day_column(&column.values)))
        .cloned();
    let remaining: Vec<&Column> = time_columns
        .iter()
        .filter(|name| Some(*name) != time.as_ref())
        .filter_map(|name| table.column(name))
        .collect();
    let date = remaining
        .iter()
        .find(|column| has_dates(&column.values))
        .or_else(|| remaining.first())
        .map(|column| column.name.to_owned());
    debug!(?date, ?time, "classified time columns");
    TimeRoles { date, time }
}

fn has_dates(values: &[Value]) -> bool {
    values.iter().any(|value| match value {
        Value::DateTime(_) => true,
        Value::Text(text) => parse_datetime(text).is_some(),
        _ => false,
    })
}

fn is_time_of_day_column(values: &[Value]) -> bool {
    let mut present = values.iter().filter(|value| !value.is_empty()).peekable();
    present.peek().is_some()
        && present.all(|value| match value {
            Value::Time(_) => true,
            Value::Text(text) => parse_time_of_day(text).is_some(),
            _ => false,
        })
}

//! Unit Normalizer: turns the consumption column into kWh.
use crate::grid::Value;
use crate::inference::keywords::normalize;
use crate::inference::InferenceError;
use crate::options::Options;
use crate::table::column::coerce_numeric;
use crate::table::Table;
use std::fmt::Display;
use tracing::debug;
use tracing::warn;

/// Unit of a consumption column, read from its name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Unit {
    /// Energy per interval, already kWh
    EnergyKwh,
    /// Average power over the interval, kW
    PowerKw,
    Unknown,
}

impl Unit {
    /// `kwh` wins over `kw`, which it contains.
    pub fn from_column_name(name: &str) -> Unit {
        let name = normalize(name);
        if name.contains("kwh") {
            Unit::EnergyKwh
        } else if name.contains("kw") {
            Unit::PowerKw
        } else {
            Unit::Unknown
        }
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unit::EnergyKwh => write!(f, "kWh"),
            Unit::PowerKw => write!(f, "kW"),
            Unit::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of converting a column to kWh.
#[derive(Clone, Debug)]
pub struct EnergyConversion {
    /// Input table with the converted column added (or replaced)
    pub table: Table,
    /// Converted values; rows that did not coerce stay `None`
    pub series: Vec<Option<f64>>,
    /// Non-fatal warning, set when the unit had to be assumed
    pub warning: Option<String>,
}

/// Coerces `column` to numbers and converts them to kWh.
///
/// Power readings are divided by `options.power_divisor`; an unknown unit passes
/// through unchanged with a warning. The result is written to `options.consumption_column`.
pub fn to_energy_kwh(table: Table, column: &str, unit: Unit, options: &Options) -> Result<EnergyConversion, InferenceError> {
    let mut series = coerce_numeric(table.column_values(column)?);
    if series.iter().all(Option::is_none) {
        return Err(InferenceError::NonNumericColumn(column.to_owned()));
    }

    let warning = match unit {
        Unit::PowerKw => {
            for value in series.iter_mut().flatten() {
                *value /= options.power_divisor;
            }
            None
        }
        Unit::EnergyKwh => None,
        Unit::Unknown => {
            let message = format!(
                "No explicit unit found for column '{}'. Assuming values are already in kWh; \
                 if this export reports power (kW) the results are off by the sampling interval.",
                column
            );
            warn!("{}", message);
            Some(message)
        }
    };
    debug!(column, %unit, divisor = options.power_divisor, "converted consumption to kWh");

    let values = series
        .iter()
        .map(|value| value.map(Value::Number).unwrap_or_default())
        .collect();
    Ok(EnergyConversion {
        table: table.set_column(&options.consumption_column, values),
        series,
        warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, values: &[&str]) -> Table {
        Table::new(
            vec![name.to_owned()],
            values.iter().map(|value| vec![if value.is_empty() { Value::Empty } else { Value::from(*value) }]).collect(),
        )
    }

    #[test]
    fn reads_unit_from_name() {
        assert_eq!(Unit::from_column_name("Verbrauch [kWh]"), Unit::EnergyKwh);
        assert_eq!(Unit::from_column_name("Leistung kW"), Unit::PowerKw);
        assert_eq!(Unit::from_column_name("Wirkleistung"), Unit::Unknown);
    }

    #[test]
    fn divides_power_by_quarter_hours() {
        let conversion = to_energy_kwh(table("leistung kw", &["4.0", "8.0"]), "leistung kw", Unit::PowerKw, &Options::default()).unwrap();
        assert_eq!(conversion.series, vec![Some(1.0), Some(2.0)]);
        assert_eq!(conversion.table.column_values("consumption_kwh").unwrap(), &[Value::Number(1.0), Value::Number(2.0)]);
        assert!(conversion.warning.is_none());
    }

    #[test]
    fn constant_power_becomes_constant_energy() {
        let conversion = to_energy_kwh(table("kw", &["3", "3", "3"]), "kw", Unit::PowerKw, &Options::default()).unwrap();
        assert!(conversion.series.iter().all(|value| *value == Some(0.75)));
    }

    #[test]
    fn keeps_partial_missing_values() {
        let conversion = to_energy_kwh(table("kwh", &["1.5", "n/a", ""]), "kwh", Unit::EnergyKwh, &Options::default()).unwrap();
        assert_eq!(conversion.series, vec![Some(1.5), None, None]);
        assert_eq!(conversion.table.height(), 3);
    }

    #[test]
    fn unknown_unit_warns() {
        let conversion = to_energy_kwh(table("verbrauch", &["2"]), "verbrauch", Unit::Unknown, &Options::default()).unwrap();
        assert_eq!(conversion.series, vec![Some(2.0)]);
        assert!(conversion.warning.unwrap().contains("'verbrauch'"));
    }

    #[test]
    fn rejects_non_numeric_columns() {
        let error = to_energy_kwh(table("kwh", &["a", "b"]), "kwh", Unit::EnergyKwh, &Options::default()).unwrap_err();
        assert_eq!(error, InferenceError::NonNumericColumn("kwh".to_owned()));
        let error = to_energy_kwh(table("kwh", &[]), "kwh", Unit::EnergyKwh, &Options::default()).unwrap_err();
        assert_eq!(error, InferenceError::NonNumericColumn("kwh".to_owned()));
    }

    #[test]
    fn missing_column_is_reported() {
        let error = to_energy_kwh(table("kwh", &["1"]), "power", Unit::PowerKw, &Options::default()).unwrap_err();
        assert_eq!(error, InferenceError::ColumnNotFound("power".to_owned()));
    }
}

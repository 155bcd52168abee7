/// Tuning knobs for loading and normalization.
#[derive(Clone, Debug)]
pub struct Options {
    /// Bytes of decoded text inspected when sniffing the delimiter
    pub sample_bytes: usize,
    /// Literals read as absent cells in delimited text (matched after trimming)
    pub nulls: Vec<String>,
    /// Minimum coercible fraction for a text column to count as numeric
    pub numeric_threshold: f64,
    /// Divisor turning average kW over a sampling interval into kWh (4 = quarter-hour)
    pub power_divisor: f64,
    /// Name of the canonical timestamp column
    pub moment_column: String,
    /// Name of the canonical consumption column
    pub consumption_column: String,
    /// Merge a separate time-of-day column into the moment
    pub combine_time_of_day: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sample_bytes: 64 * 1024,
            nulls: ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "#N/A"]
                .into_iter()
                .map(String::from)
                .collect(),
            numeric_threshold: 0.8,
            power_divisor: 4.0,
            moment_column: "moment".to_owned(),
            consumption_column: "consumption_kwh".to_owned(),
            combine_time_of_day: true,
        }
    }
}

impl Options {
    pub(crate) fn is_null(&self, field: &str) -> bool {
        let field = field.trim();
        self.nulls.iter().any(|null| null == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_null_literals_after_trimming() {
        let options = Options::default();
        assert!(options.is_null(""));
        assert!(options.is_null("  "));
        assert!(options.is_null(" N/A "));
        assert!(!options.is_null("n/a"));
        assert!(!options.is_null("0"));
    }
}

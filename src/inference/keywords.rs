//! Text normalization and the keyword vocabularies shared by header and column detection.
use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s/\-_.,|\\]+").expect("Hardcode regex pattern"));

/// Column-name fragments that mark a timestamp (English and German).
pub const TIME_KEYWORDS: [&str; 12] = [
    "time", "date", "datum", "timestamp", "zeit", "uhrzeit", "datetime", "from", "to", "von", "bis", "ab",
];

/// Column-name fragments that mark a consumption or power reading.
pub const CONSUMPTION_KEYWORDS: [&str; 7] = ["consumption", "energy", "verbrauch", "power", "wirkleistung", "kw", "kwh"];

/// Lowercases, maps `/ - _ . , | \` to spaces, collapses whitespace and trims.
pub fn normalize(text: &str) -> String {
    SEPARATORS.replace_all(&text.to_lowercase(), " ").trim().to_owned()
}

pub fn has_time_keyword(normalized: &str) -> bool {
    TIME_KEYWORDS.iter().any(|keyword| normalized.contains(keyword))
}

pub fn has_consumption_keyword(normalized: &str) -> bool {
    CONSUMPTION_KEYWORDS.iter().any(|keyword| normalized.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(normalize("  Verbrauch_(kWh) / 15-min. "), "verbrauch (kwh) 15 min");
        assert_eq!(normalize("Datum\\Zeit|Von"), "datum zeit von");
        assert_eq!(normalize("\tA \n  B"), "a b");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn matches_keywords_as_substrings() {
        assert!(has_time_keyword("zeitstempel"));
        assert!(has_time_keyword("total"));
        assert!(!has_time_keyword("meter id"));
        assert!(has_consumption_keyword("leistung kw"));
        assert!(has_consumption_keyword("wirkleistung bezug"));
        assert!(!has_consumption_keyword("meter id"));
    }
}

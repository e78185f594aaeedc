use serde::Serialize;
use serde_json;

/// JSON formatter for evaluations and herd rankings
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format as pretty-printed JSON
    pub fn format<T: Serialize>(report: &T) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(report)
    }

    /// Format as compact JSON (no whitespace)
    pub fn format_compact<T: Serialize>(report: &T) -> Result<String, serde_json::Error> {
        serde_json::to_string(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranker::SireRanker;
    use crate::record::TraitRecord;

    fn evaluation() -> crate::ranker::MatingEvaluation {
        let dam = TraitRecord::new("cow-7").with_value("milk", 500.0);
        let sire = TraitRecord::new("7HO123")
            .with_text("name", "Jet")
            .with_value("milk", 1500.0);
        SireRanker::default().evaluate(&dam, &sire)
    }

    #[test]
    fn test_format_json() {
        let json = JsonFormatter::format(&evaluation()).unwrap();

        assert!(json.contains("\"id\": \"cow-7\""));
        assert!(json.contains("\"name\": \"Jet\""));
        assert!(json.contains("\"method\": \"estimated\""));
        // milk PPPV ≈ 1077 lifts the score just above 50
        assert!(json.contains("\"status\": \"acceptable\""));
    }

    #[test]
    fn test_format_compact() {
        let json = JsonFormatter::format_compact(&evaluation()).unwrap();

        // Compact format should have no newlines (except potentially in strings)
        assert!(!json.contains("\n  "));
    }
}

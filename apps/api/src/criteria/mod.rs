//! Criteria Model — a job's evaluation rubric.
//!
//! Pure data plus parsing. Must-haves gate the tier (enforced by the scoring
//! engine, not here), nice-to-haves carry integer weights, red flags are
//! free-text warnings. All three lists may be empty.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub mod extraction;
pub mod prompts;

pub const DEFAULT_WEIGHT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NiceToHave {
    pub text: String,
    #[serde(default = "default_weight", deserialize_with = "weight_or_default")]
    pub weight: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCriteria {
    #[serde(default)]
    pub must_have: Vec<String>,
    #[serde(default)]
    pub nice_to_have: Vec<NiceToHave>,
    #[serde(default)]
    pub red_flags: Vec<String>,
}

impl JobCriteria {
    pub fn is_empty(&self) -> bool {
        self.must_have.is_empty() && self.nice_to_have.is_empty() && self.red_flags.is_empty()
    }
}

/// Newline-delimited form of the rubric, as submitted by form wizards.
/// Each field is one textarea; nice-to-have lines use `text | weight`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CriteriaText {
    #[serde(default)]
    pub must_have: String,
    #[serde(default)]
    pub nice_to_have: String,
    #[serde(default)]
    pub red_flags: String,
}

impl CriteriaText {
    pub fn into_criteria(self) -> JobCriteria {
        JobCriteria {
            must_have: parse_must_have(&self.must_have),
            nice_to_have: parse_nice_to_have(&self.nice_to_have),
            red_flags: parse_red_flags(&self.red_flags),
        }
    }
}

fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}

/// Tolerant weight deserializer. Accepts an integer, a numeric string, or the
/// importance words the extraction provider sometimes emits. Malformed input
/// falls back to the default instead of erroring; numeric fallback is the
/// contract.
fn weight_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_weight_value(&value))
}

fn parse_weight_value(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .filter(|w| *w > 0)
            .map(|w| w as u32)
            .unwrap_or(DEFAULT_WEIGHT),
        Value::String(s) => parse_weight_str(s),
        _ => DEFAULT_WEIGHT,
    }
}

fn parse_weight_str(s: &str) -> u32 {
    let s = s.trim();
    if let Ok(weight) = s.parse::<u32>() {
        if weight > 0 {
            return weight;
        }
    }
    match s.to_ascii_lowercase().as_str() {
        "high" => 20,
        "medium" => 10,
        "low" => 5,
        _ => DEFAULT_WEIGHT,
    }
}

/// Parses newline-delimited must-have requirements, dropping blank lines.
pub fn parse_must_have(lines: &str) -> Vec<String> {
    non_blank_lines(lines)
}

/// Parses newline-delimited red flags, dropping blank lines.
pub fn parse_red_flags(lines: &str) -> Vec<String> {
    non_blank_lines(lines)
}

/// Parses newline-delimited nice-to-have lines of the form `text | weight`.
/// A missing or unparseable weight defaults to 10; no error is raised.
pub fn parse_nice_to_have(lines: &str) -> Vec<NiceToHave> {
    lines
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('|') {
            Some((text, weight)) => NiceToHave {
                text: text.trim().to_string(),
                weight: parse_weight_str(weight),
            },
            None => NiceToHave {
                text: line.to_string(),
                weight: DEFAULT_WEIGHT,
            },
        })
        .collect()
}

fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nice_to_have_with_weight() {
        let parsed = parse_nice_to_have("API experience | 20");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].text, "API experience");
        assert_eq!(parsed[0].weight, 20);
    }

    #[test]
    fn test_nice_to_have_without_delimiter_defaults() {
        let parsed = parse_nice_to_have("Top Rated");
        assert_eq!(parsed[0].text, "Top Rated");
        assert_eq!(parsed[0].weight, DEFAULT_WEIGHT);
    }

    #[test]
    fn test_nice_to_have_malformed_weight_defaults() {
        let parsed = parse_nice_to_have("Kubernetes | lots");
        assert_eq!(parsed[0].text, "Kubernetes");
        assert_eq!(parsed[0].weight, DEFAULT_WEIGHT);
    }

    #[test]
    fn test_nice_to_have_importance_words() {
        let parsed = parse_nice_to_have("Startup experience | High\nRemote work | low");
        assert_eq!(parsed[0].weight, 20);
        assert_eq!(parsed[1].weight, 5);
    }

    #[test]
    fn test_blank_lines_dropped() {
        let parsed = parse_must_have("5+ years Rust\n\n   \nPostgres experience\n");
        assert_eq!(parsed, vec!["5+ years Rust", "Postgres experience"]);
    }

    #[test]
    fn test_empty_input_gives_empty_lists() {
        assert!(parse_must_have("").is_empty());
        assert!(parse_nice_to_have("\n\n").is_empty());
        assert!(parse_red_flags("   ").is_empty());
    }

    #[test]
    fn test_weight_deserializes_from_number() {
        let nth: NiceToHave = serde_json::from_str(r#"{"text": "x", "weight": 15}"#).unwrap();
        assert_eq!(nth.weight, 15);
    }

    #[test]
    fn test_weight_deserializes_from_word() {
        let nth: NiceToHave = serde_json::from_str(r#"{"text": "x", "weight": "High"}"#).unwrap();
        assert_eq!(nth.weight, 20);
    }

    #[test]
    fn test_weight_missing_defaults() {
        let nth: NiceToHave = serde_json::from_str(r#"{"text": "x"}"#).unwrap();
        assert_eq!(nth.weight, DEFAULT_WEIGHT);
    }

    #[test]
    fn test_weight_zero_or_negative_defaults() {
        let zero: NiceToHave = serde_json::from_str(r#"{"text": "x", "weight": 0}"#).unwrap();
        assert_eq!(zero.weight, DEFAULT_WEIGHT);
        let negative: NiceToHave = serde_json::from_str(r#"{"text": "x", "weight": -5}"#).unwrap();
        assert_eq!(negative.weight, DEFAULT_WEIGHT);
    }

    #[test]
    fn test_all_lists_may_be_empty() {
        let criteria: JobCriteria = serde_json::from_str("{}").unwrap();
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_criteria_text_conversion() {
        let text = CriteriaText {
            must_have: "5+ years Rust\nPostgres".to_string(),
            nice_to_have: "API experience | 20\nTop Rated".to_string(),
            red_flags: "Generic cover letter".to_string(),
        };
        let criteria = text.into_criteria();
        assert_eq!(criteria.must_have.len(), 2);
        assert_eq!(criteria.nice_to_have[0].weight, 20);
        assert_eq!(criteria.nice_to_have[1].weight, DEFAULT_WEIGHT);
        assert_eq!(criteria.red_flags, vec!["Generic cover letter"]);
    }
}

//! Analysis result domain model.
//!
//! Mirrors the JSON object the model is asked to produce. Parsing is lenient:
//! a missing or malformed field falls back to a placeholder instead of
//! failing the whole report.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub const UNKNOWN_VERDICT: &str = "Unknown";
pub const MISSING_INDICATOR: &str = "N/A";
pub const MISSING_EXPLANATION: &str = "No details provided.";

/// Verdict reached by the analyst model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    ConfirmedPhish,
    Suspicious,
    Safe,
    /// Any label outside the closed set, kept verbatim.
    Other(String),
}

impl Verdict {
    /// The three labels the response schema allows.
    pub const LABELS: [&'static str; 3] = ["Confirmed Phish", "Suspicious", "Safe"];

    pub fn label(&self) -> &str {
        match self {
            Self::ConfirmedPhish => "Confirmed Phish",
            Self::Suspicious => "Suspicious",
            Self::Safe => "Safe",
            Self::Other(s) => s,
        }
    }
}

impl Default for Verdict {
    fn default() -> Self {
        Self::Other(UNKNOWN_VERDICT.to_string())
    }
}

impl From<&str> for Verdict {
    fn from(s: &str) -> Self {
        match s {
            "Confirmed Phish" => Self::ConfirmedPhish,
            "Suspicious" => Self::Suspicious,
            "Safe" => Self::Safe,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Severity attached to a single indicator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
    Other(String),
}

impl Severity {
    pub fn label(&self) -> &str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s {
            "Low" => Self::Low,
            "Medium" => Self::Medium,
            "High" => Self::High,
            "Critical" => Self::Critical,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One observed phishing signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    #[serde(rename = "Indicator", default = "missing_indicator", deserialize_with = "indicator_text")]
    pub indicator: String,
    #[serde(rename = "Severity", default, deserialize_with = "severity")]
    pub severity: Severity,
}

/// Structured verdict returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "Final_Verdict", default, deserialize_with = "verdict")]
    pub verdict: Verdict,
    #[serde(rename = "Phishing_Confidence_Score", default, deserialize_with = "score")]
    pub confidence_score: i64,
    #[serde(rename = "Key_Indicators", default, deserialize_with = "indicators")]
    pub indicators: Vec<Indicator>,
    #[serde(rename = "Explanation", default = "missing_explanation", deserialize_with = "explanation_text")]
    pub explanation: String,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            verdict: Verdict::default(),
            confidence_score: 0,
            indicators: Vec::new(),
            explanation: missing_explanation(),
        }
    }
}

fn missing_indicator() -> String {
    MISSING_INDICATOR.to_string()
}

fn missing_explanation() -> String {
    MISSING_EXPLANATION.to_string()
}

/// Render a JSON value as display text, or `None` for null.
fn value_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn indicator_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value_text(value).unwrap_or_else(missing_indicator))
}

fn explanation_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value_text(value).unwrap_or_else(missing_explanation))
}

fn severity<'de, D: Deserializer<'de>>(d: D) -> Result<Severity, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value_text(value)
        .map(|s| Severity::from(s.as_str()))
        .unwrap_or_default())
}

fn verdict<'de, D: Deserializer<'de>>(d: D) -> Result<Verdict, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value_text(value)
        .map(|s| Verdict::from(s.as_str()))
        .unwrap_or_default())
}

fn score<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    };
    Ok(parsed.unwrap_or(0))
}

fn indicators<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Indicator>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    let items = match value {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };

    // Entries that are not objects carry nothing to show.
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

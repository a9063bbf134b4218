//! Fixed prompt material sent with every screenshot.

use serde_json::{json, Value};

use super::model::Verdict;

/// User-turn instruction placed before the image.
pub const TRIAGE_INSTRUCTION: &str = "Analyze this email screenshot. Check the sender domain against the brand logo. Look for urgent language. Extract any visible URLs.";

/// System instruction framing the model as an analyst.
pub const ANALYST_PERSONA: &str = "You are a Tier 3 SOC Analyst. Analyze the provided email screenshot for phishing indicators. Output your findings in strict JSON format.";

pub const RESPONSE_MIME_TYPE: &str = "application/json";

/// Response schema constraining the model's answer, in the OpenAPI subset
/// the `generateContent` endpoint accepts.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "Final_Verdict": { "type": "STRING", "format": "enum", "enum": Verdict::LABELS },
            "Phishing_Confidence_Score": { "type": "INTEGER" },
            "Key_Indicators": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "Indicator": { "type": "STRING" },
                        "Severity": { "type": "STRING" }
                    },
                    "propertyOrdering": ["Indicator", "Severity"]
                }
            },
            "Explanation": { "type": "STRING" }
        },
        "propertyOrdering": [
            "Final_Verdict",
            "Phishing_Confidence_Score",
            "Key_Indicators",
            "Explanation"
        ]
    })
}

//! Shared types for email analysis: the parsed email, the normalized verdict,
//! and the success/error envelope every analysis path returns.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use super::verdict;

/// Confidence reported when the provider leaves it out.
pub const DEFAULT_CONFIDENCE: u8 = 75;

/// Structured fields pulled out of a pasted email.
///
/// Built once per request by [`super::parser::parse`] and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailData {
    /// Text exactly as the user submitted it.
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl EmailData {
    /// Email data with only a body, used for connectivity probes.
    pub fn from_body(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw_text: text.clone(),
            body: Some(text),
            ..Default::default()
        }
    }
}

/// Discrete risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictLevel {
    Danger,
    Suspicious,
    Risky,
    Safe,
}

impl VerdictLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLevel::Danger => "DANGER",
            VerdictLevel::Suspicious => "SUSPICIOUS",
            VerdictLevel::Risky => "RISKY",
            VerdictLevel::Safe => "SAFE",
        }
    }
}

impl std::fmt::Display for VerdictLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UI color paired with a verdict level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictColor {
    Red,
    Orange,
    Yellow,
    Green,
}

/// A recommended next step for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictAction {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_specific: Option<String>,
}

/// Normalized analysis of one email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub verdict: VerdictLevel,
    pub color: VerdictColor,
    /// 0-100.
    pub confidence: u8,
    pub explanation: String,
    pub actions: Vec<VerdictAction>,
    pub risk_factors: Vec<String>,
    pub is_scam: bool,
}

/// The JSON object the model is asked to produce.
///
/// Every field is optional; gaps are filled in by [`AnalysisResult::from_raw`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnalysis {
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub risk_factors: Option<Vec<String>>,
    #[serde(default)]
    pub is_scam: Option<bool>,
    /// Accepted in any shape and replaced by table-driven actions.
    #[serde(default)]
    pub actions: Option<IgnoredAny>,
}

/// A JSON number or a numeric string. Anything else reads as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl AnalysisResult {
    /// Normalize a provider payload through the verdict table.
    ///
    /// The verdict and color always come from the table entry, never from the
    /// raw string, so an unknown verdict degrades to SAFE.
    pub fn from_raw(raw: RawAnalysis) -> Self {
        let config = verdict::lookup(raw.verdict.as_deref().unwrap_or("SAFE"));

        let confidence = raw
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(DEFAULT_CONFIDENCE);

        let explanation = raw
            .explanation
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "Analysis completed".to_string());

        Self {
            verdict: config.level,
            color: config.color,
            confidence,
            explanation,
            actions: vec![config.primary_action()],
            risk_factors: raw.risk_factors.unwrap_or_default(),
            is_scam: raw.is_scam.unwrap_or(false),
        }
    }
}

/// Uniform envelope returned by providers and the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds spent in the provider call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<u64>,
}

impl AnalysisResponse {
    pub fn success(result: AnalysisResult, processing_time: u64) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            processing_time: Some(processing_time),
        }
    }

    /// Failure caught before any timed work started.
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.to_string()),
            processing_time: None,
        }
    }

    /// Failure after the clock started.
    pub fn failure_after(error: impl std::fmt::Display, processing_time: u64) -> Self {
        Self {
            processing_time: Some(processing_time),
            ..Self::failure(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: serde_json::Value) -> RawAnalysis {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn from_raw_uses_table_color() {
        let result = AnalysisResult::from_raw(raw(serde_json::json!({
            "verdict": "DANGER",
            "confidence": 92,
            "explanation": "Asks for gift cards",
            "riskFactors": ["gift card request"],
            "isScam": true,
            "actions": [{"description": "model-invented step"}]
        })));

        assert_eq!(result.verdict, VerdictLevel::Danger);
        assert_eq!(result.color, VerdictColor::Red);
        assert_eq!(result.confidence, 92);
        assert!(result.is_scam);
        assert_eq!(result.risk_factors, vec!["gift card request".to_string()]);
        assert_eq!(result.actions.len(), 1);
        assert_eq!(
            result.actions[0].description,
            "Delete and ignore. This appears to be a scam."
        );
    }

    #[test]
    fn from_raw_fills_defaults() {
        let result = AnalysisResult::from_raw(RawAnalysis::default());
        assert_eq!(result.verdict, VerdictLevel::Safe);
        assert_eq!(result.color, VerdictColor::Green);
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(result.explanation, "Analysis completed");
        assert!(result.risk_factors.is_empty());
        assert!(!result.is_scam);
    }

    #[test]
    fn from_raw_unknown_verdict_is_safe() {
        let result = AnalysisResult::from_raw(raw(serde_json::json!({
            "verdict": "CATASTROPHIC",
            "isScam": true
        })));
        assert_eq!(result.verdict, VerdictLevel::Safe);
        assert_eq!(result.color, VerdictColor::Green);
    }

    #[test]
    fn from_raw_clamps_confidence() {
        let high = AnalysisResult::from_raw(raw(serde_json::json!({"confidence": 140})));
        assert_eq!(high.confidence, 100);
        let fractional = AnalysisResult::from_raw(raw(serde_json::json!({"confidence": 66.6})));
        assert_eq!(fractional.confidence, 67);
    }

    #[test]
    fn free_text_actions_are_ignored() {
        let raw: RawAnalysis = serde_json::from_str(
            r#"{"verdict":"SUSPICIOUS","actions":["Delete it", "Call the bank"]}"#,
        )
        .unwrap();
        let result = AnalysisResult::from_raw(raw);
        assert_eq!(result.verdict, VerdictLevel::Suspicious);
        assert_eq!(result.actions.len(), 1);
    }

    #[test]
    fn confidence_accepts_numeric_strings() {
        let result = AnalysisResult::from_raw(raw(serde_json::json!({"confidence": "90"})));
        assert_eq!(result.confidence, 90);
        let padded = AnalysisResult::from_raw(raw(serde_json::json!({"confidence": " 42.4 "})));
        assert_eq!(padded.confidence, 42);
        let junk = AnalysisResult::from_raw(raw(serde_json::json!({"confidence": "very"})));
        assert_eq!(junk.confidence, DEFAULT_CONFIDENCE);
        let null = AnalysisResult::from_raw(raw(serde_json::json!({"confidence": null})));
        assert_eq!(null.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn envelope_serializes_camel_case() {
        let response = AnalysisResponse::failure_after("boom", 12);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert_eq!(json["processingTime"], 12);
        assert!(json.get("result").is_none());
    }
}

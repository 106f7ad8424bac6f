//! The strict typed contract every agent produces.
//!
//! `AnalysisOutput::from_raw` is the single entry point through which raw
//! model JSON becomes trusted data. Each enum documents its own fallback
//! value; the cross-field score cap is enforced here, not requested of the
//! model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{array_of, clamp_score, field, string_array, string_or_empty};

/// Severity of a finding or red flag.
///
/// Unknown values fall back to `Low`: an unrecognized severity label must
/// not manufacture an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Low
    }
}

impl Severity {
    fn from_raw(raw: Option<&Value>) -> Self {
        match raw.and_then(Value::as_str).map(str::to_ascii_lowercase) {
            Some(s) if s == "low" => Severity::Low,
            Some(s) if s == "medium" => Severity::Medium,
            Some(s) if s == "high" => Severity::High,
            _ => Severity::default(),
        }
    }
}

/// How complete the underlying data was for this analysis.
///
/// Unknown values fall back to `Minimal`: an agent that cannot say what it
/// worked from is treated as having worked from almost nothing, which also
/// triggers the score cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCompleteness {
    Comprehensive,
    Adequate,
    Partial,
    Minimal,
}

impl Default for DataCompleteness {
    fn default() -> Self {
        DataCompleteness::Minimal
    }
}

impl DataCompleteness {
    fn from_raw(raw: Option<&Value>) -> Self {
        match raw.and_then(Value::as_str).map(str::to_ascii_lowercase) {
            Some(s) if s == "comprehensive" => DataCompleteness::Comprehensive,
            Some(s) if s == "adequate" => DataCompleteness::Adequate,
            Some(s) if s == "partial" => DataCompleteness::Partial,
            Some(s) if s == "minimal" => DataCompleteness::Minimal,
            _ => DataCompleteness::default(),
        }
    }

    /// Hard ceiling on the overall score given this completeness rank.
    ///
    /// An overconfident score can never coexist with an admission of
    /// insufficient data.
    pub fn score_ceiling(&self) -> u8 {
        match self {
            DataCompleteness::Comprehensive | DataCompleteness::Adequate => 100,
            DataCompleteness::Partial => 70,
            DataCompleteness::Minimal => 40,
        }
    }
}

/// Agent's own confidence in its conclusions. Unknown values fall back to `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Moderate,
    High,
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence::Low
    }
}

impl Confidence {
    fn from_raw(raw: Option<&Value>) -> Self {
        match raw.and_then(Value::as_str).map(str::to_ascii_lowercase) {
            Some(s) if s == "low" => Confidence::Low,
            Some(s) if s == "moderate" || s == "medium" => Confidence::Moderate,
            Some(s) if s == "high" => Confidence::High,
            _ => Confidence::default(),
        }
    }
}

/// Whether this agent wants to escalate its findings to the deal team.
///
/// Unknown values fall back to `None`; escalation must be earned by a
/// recognized signal, not by a typo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    None,
    Advisory,
    Elevated,
    Critical,
}

impl Default for AlertLevel {
    fn default() -> Self {
        AlertLevel::None
    }
}

impl AlertLevel {
    fn from_raw(raw: Option<&Value>) -> Self {
        match raw.and_then(Value::as_str).map(str::to_ascii_lowercase) {
            Some(s) if s == "none" => AlertLevel::None,
            Some(s) if s == "advisory" => AlertLevel::Advisory,
            Some(s) if s == "elevated" => AlertLevel::Elevated,
            Some(s) if s == "critical" => AlertLevel::Critical,
            _ => AlertLevel::default(),
        }
    }
}

/// Analysis metadata: what the agent worked from and how sure it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub data_completeness: DataCompleteness,
    pub confidence: Confidence,
    /// Known gaps and caveats, surfaced rather than hidden.
    pub limitations: Vec<String>,
}

impl Meta {
    /// Sentinel for a missing meta block: minimal completeness, low
    /// confidence, and an explicit limitation so consumers can see the block
    /// was defaulted rather than evaluated.
    pub fn not_evaluated() -> Self {
        Self {
            data_completeness: DataCompleteness::Minimal,
            confidence: Confidence::Low,
            limitations: vec!["metadata not provided by the analysis".to_string()],
        }
    }

    fn from_raw(raw: Option<&Value>) -> Self {
        let Some(raw) = raw.filter(|v| v.is_object()) else {
            return Self::not_evaluated();
        };
        Self {
            data_completeness: DataCompleteness::from_raw(field(
                raw,
                &["data_completeness", "dataCompleteness"],
            )),
            confidence: Confidence::from_raw(field(
                raw,
                &["confidence", "confidence_level", "confidenceLevel"],
            )),
            limitations: string_array(field(raw, &["limitations"])),
        }
    }
}

/// Overall score for this analysis dimension, always in [0, 100].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub value: u8,
    pub rationale: String,
}

impl Score {
    /// Sentinel for a missing score block.
    pub fn not_evaluated() -> Self {
        Self {
            value: 0,
            rationale: "not evaluated".to_string(),
        }
    }

    fn from_raw(raw: Option<&Value>) -> Self {
        match raw {
            // Bare number accepted as shorthand
            Some(v @ Value::Number(_)) => Self {
                value: clamp_score(Some(v)),
                rationale: String::new(),
            },
            Some(v) if v.is_object() => Self {
                value: clamp_score(field(v, &["value", "score"])),
                rationale: string_or_empty(field(v, &["rationale", "reasoning"])),
            },
            _ => Self::not_evaluated(),
        }
    }
}

/// One observation from an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub title: String,
    pub detail: String,
    pub severity: Severity,
}

impl Finding {
    fn from_raw(raw: &Value) -> Option<Self> {
        match raw {
            // Bare string accepted as a title-only finding
            Value::String(s) if !s.trim().is_empty() => Some(Self {
                title: s.trim().to_string(),
                detail: String::new(),
                severity: Severity::default(),
            }),
            Value::Object(_) => {
                let title = string_or_empty(field(raw, &["title", "summary"]));
                if title.is_empty() {
                    return None;
                }
                Some(Self {
                    title,
                    detail: string_or_empty(field(raw, &["detail", "description"])),
                    severity: Severity::from_raw(field(raw, &["severity"])),
                })
            }
            _ => None,
        }
    }
}

/// A concern serious enough to surface to the deal team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedFlag {
    pub description: String,
    pub severity: Severity,
}

impl RedFlag {
    fn from_raw(raw: &Value) -> Option<Self> {
        match raw {
            Value::String(s) if !s.trim().is_empty() => Some(Self {
                description: s.trim().to_string(),
                severity: Severity::default(),
            }),
            Value::Object(_) => {
                let description = string_or_empty(field(raw, &["description", "text", "title"]));
                if description.is_empty() {
                    return None;
                }
                Some(Self {
                    description,
                    severity: Severity::from_raw(field(raw, &["severity"])),
                })
            }
            _ => None,
        }
    }
}

/// The normalized output contract shared by every agent.
///
/// Downstream consumers (later tiers, the final report) rely on every
/// invariant here: scores in range, enums in their closed sets, arrays never
/// null, and the completeness-vs-score cap already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub meta: Meta,
    pub score: Score,
    pub findings: Vec<Finding>,
    pub red_flags: Vec<RedFlag>,
    pub open_questions: Vec<String>,
    pub alert_level: AlertLevel,
    pub narrative: String,
}

impl AnalysisOutput {
    /// Normalize raw, untrusted model output into the strict contract.
    pub fn from_raw(raw: &Value) -> Self {
        let meta = Meta::from_raw(field(raw, &["meta", "metadata"]));
        let mut score = Score::from_raw(field(raw, &["score"]));

        // Cross-field coherence: admitted data gaps cap the score in code.
        let ceiling = meta.data_completeness.score_ceiling();
        if score.value > ceiling {
            tracing::debug!(
                raw_score = score.value,
                ceiling,
                completeness = ?meta.data_completeness,
                "Score capped by data completeness"
            );
            score.value = ceiling;
        }

        Self {
            meta,
            score,
            findings: array_of(field(raw, &["findings"]), Finding::from_raw),
            red_flags: array_of(field(raw, &["red_flags", "redFlags"]), RedFlag::from_raw),
            open_questions: string_array(field(
                raw,
                &["open_questions", "openQuestions", "questions"],
            )),
            alert_level: AlertLevel::from_raw(field(
                raw,
                &["alert_level", "alertLevel", "alert_signal", "alertSignal"],
            )),
            narrative: string_or_empty(field(raw, &["narrative", "summary"])),
        }
    }

    /// An output representing "no analysis happened", used when a synthesis
    /// agent must still emit its contract despite missing upstream data.
    pub fn insufficient_data(reason: impl Into<String>) -> Self {
        Self {
            meta: Meta {
                data_completeness: DataCompleteness::Minimal,
                confidence: Confidence::Low,
                limitations: vec![reason.into()],
            },
            score: Score::not_evaluated(),
            findings: Vec::new(),
            red_flags: Vec::new(),
            open_questions: Vec::new(),
            alert_level: AlertLevel::None,
            narrative: "Insufficient data to produce an assessment.".to_string(),
        }
    }
}

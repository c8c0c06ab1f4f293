//! Core data model types for adaptdx.
//!
//! These are the fundamental types the entire adaptdx system uses to
//! represent clinical cases, reference differentials, and submissions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calibrated clinical case presented to an examinee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalCase {
    /// Unique identifier for this case.
    pub id: String,
    /// Presentation content shown to the examinee.
    pub content: CaseContent,
    /// Expert consensus differential, ordered most likely first.
    pub reference: Vec<ReferenceDiagnosis>,
    /// IRT calibration parameters.
    pub parameters: IrtParameters,
}

/// Presentation content of a case. Opaque to the engine: it is carried
/// through to the caller verbatim and never interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseContent {
    /// Free-text clinical vignette.
    pub presentation: String,
    /// Relevant past history.
    #[serde(default)]
    pub history: String,
    /// Structured vital signs, if any.
    #[serde(default)]
    pub vitals: Option<serde_json::Value>,
    /// Structured lab results, if any.
    #[serde(default)]
    pub labs: Option<serde_json::Value>,
    /// Patient demographics, if any.
    #[serde(default)]
    pub demographics: Option<serde_json::Value>,
}

/// One entry of a case's expert reference differential.
///
/// Rank is encoded by position in the containing vector: index 0 is the
/// most likely diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceDiagnosis {
    /// Diagnosis name (matched against submissions after normalization).
    pub name: String,
    /// Expert-assigned likelihood in [0, 1].
    pub likelihood: f64,
    /// Whether omission of this diagnosis carries disproportionate risk.
    #[serde(default)]
    pub critical: bool,
}

/// Two-parameter-logistic calibration of a case, plus its per-domain
/// relevance weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrtParameters {
    /// Ability level at which the expected score is 0.5.
    pub difficulty: f64,
    /// How sharply the expected score changes with ability. Must be > 0.
    pub discrimination: f64,
    /// Relevance weight per competence domain; one slot per domain of the
    /// owning case bank.
    pub skill_vector: Vec<f64>,
}

/// A pool of calibrated cases sharing one competence-domain layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseBank {
    /// Unique identifier for this bank.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of the bank.
    #[serde(default)]
    pub description: String,
    /// Competence domain labels. Every case's `skill_vector` must have
    /// exactly this length.
    pub domains: Vec<String>,
    /// The cases in this bank.
    #[serde(default)]
    pub cases: Vec<ClinicalCase>,
}

/// One entry of a submitted differential. Position in the containing
/// vector encodes the examinee's believed likelihood ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifferentialEntry {
    /// Diagnosis name as typed by the examinee.
    pub name: String,
    /// Examinee's stated confidence.
    #[serde(default)]
    pub confidence: Confidence,
    /// Examinee flagged this as a not-to-miss diagnosis.
    #[serde(default)]
    pub not_to_miss: bool,
}

impl DifferentialEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            confidence: Confidence::Medium,
            not_to_miss: false,
        }
    }

    pub fn critical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            confidence: Confidence::High,
            not_to_miss: true,
        }
    }
}

/// Examinee confidence in a submitted diagnosis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Confidence::High),
            "medium" | "med" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            other => Err(format!("unknown confidence level: {other}")),
        }
    }
}

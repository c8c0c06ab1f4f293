//! Per-domain competence tracking and the final competence profile.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domains with competence above this are reported as strengths.
const STRENGTH_THRESHOLD: f64 = 0.5;
/// Domains with competence below this are reported as areas for growth.
const GROWTH_THRESHOLD: f64 = -0.2;

/// Fallback strength label when no domain crosses the threshold.
pub const DEFAULT_STRENGTH: &str = "Clinical Reasoning";
/// Fallback growth label when no domain crosses the threshold.
pub const DEFAULT_GROWTH_AREA: &str = "Differential Prioritization";

/// Apply one response to the competence vector.
///
/// Domains the case is relevant to (`skill_vector[i] > 0`) move by
/// `learning_rate * skill_vector[i] * (score - 0.5) * 2`: scores above the
/// midpoint push competence up, below push it down, scaled by relevance.
/// Irrelevant domains are untouched. The vector is a signed, unbounded
/// running estimate and is never re-normalized.
pub fn update_competence(
    competence: &mut [f64],
    skill_vector: &[f64],
    score: f64,
    learning_rate: f64,
) {
    debug_assert_eq!(competence.len(), skill_vector.len());
    for (slot, &relevance) in competence.iter_mut().zip(skill_vector) {
        if relevance > 0.0 {
            *slot += learning_rate * relevance * (score - 0.5) * 2.0;
        }
    }
}

/// Coarse skill label derived from the final ability estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Novice,
    Developing,
    Proficient,
    Expert,
}

impl SkillLevel {
    pub fn from_theta(theta: f64) -> Self {
        if theta >= 1.0 {
            SkillLevel::Expert
        } else if theta >= 0.0 {
            SkillLevel::Proficient
        } else if theta >= -1.0 {
            SkillLevel::Developing
        } else {
            SkillLevel::Novice
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillLevel::Novice => write!(f, "Novice"),
            SkillLevel::Developing => write!(f, "Developing"),
            SkillLevel::Proficient => write!(f, "Proficient"),
            SkillLevel::Expert => write!(f, "Expert"),
        }
    }
}

/// Split domains into strengths and growth areas by threshold, with fixed
/// fallback labels when a list would be empty.
pub fn classify_domains(domains: &[String], competence: &[f64]) -> (Vec<String>, Vec<String>) {
    let mut strengths = Vec::new();
    let mut growth_areas = Vec::new();

    for (domain, &value) in domains.iter().zip(competence) {
        if value > STRENGTH_THRESHOLD {
            strengths.push(domain.clone());
        } else if value < GROWTH_THRESHOLD {
            growth_areas.push(domain.clone());
        }
    }

    if strengths.is_empty() {
        strengths.push(DEFAULT_STRENGTH.to_string());
    }
    if growth_areas.is_empty() {
        growth_areas.push(DEFAULT_GROWTH_AREA.to_string());
    }
    (strengths, growth_areas)
}

/// Derived diagnostic-accuracy metrics, on a 0-100 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticAccuracy {
    /// Percentage of responses that included the single top-ranked
    /// reference diagnosis anywhere in the submission.
    pub top_diagnosis_accuracy: f64,
    /// Percentage of all critical reference diagnoses across the session
    /// that were both included and flagged not-to-miss. 100 by convention
    /// when the session contained no critical diagnoses.
    pub critical_diagnosis_capture: f64,
}

/// Final competence profile of a completed (or abandoned) session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetenceProfile {
    /// Session this profile was derived from.
    pub session_id: Uuid,
    /// When the profile was derived.
    pub created_at: DateTime<Utc>,
    /// Final ability estimate (theta).
    pub overall_ability: f64,
    /// Coarse label derived from theta.
    pub skill_level: SkillLevel,
    /// Standard error of the ability estimate.
    pub standard_error: f64,
    /// Competence domain labels, parallel to `competence_vector`.
    pub domains: Vec<String>,
    /// Signed per-domain competence estimates.
    pub competence_vector: Vec<f64>,
    /// Number of cases answered.
    pub cases_completed: usize,
    /// Mean differential score across the session, on a 0-100 scale.
    pub accuracy: f64,
    /// Wall-clock duration of the session in seconds.
    pub assessment_duration_secs: u64,
    /// Theta after each update, starting at the initial estimate.
    pub adaptive_path: Vec<f64>,
    /// Domains above the strength threshold (or the fallback label).
    pub strengths: Vec<String>,
    /// Domains below the growth threshold (or the fallback label).
    pub areas_for_growth: Vec<String>,
    /// Derived diagnostic metrics.
    pub diagnostic_accuracy: DiagnosticAccuracy,
}

impl CompetenceProfile {
    /// Save the profile as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize profile")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write profile to {}", path.display()))?;
        Ok(())
    }

    /// Load a profile from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile from {}", path.display()))?;
        let profile: CompetenceProfile =
            serde_json::from_str(&content).context("failed to parse profile JSON")?;
        Ok(profile)
    }
}

//! Differential diagnosis scoring.
//!
//! Compares a submitted ranked differential against a case's expert
//! reference differential and produces a scalar score in [0, 1], weighting
//! omission of not-to-miss diagnoses more heavily than omission of benign
//! ones.

use serde::{Deserialize, Serialize};

use crate::model::{DifferentialEntry, ReferenceDiagnosis};

/// Credit fraction for including a reference diagnosis at all.
const INCLUSION_CREDIT: f64 = 0.5;
/// Credit fraction for ranking it near its reference position.
const RANKING_CREDIT: f64 = 0.3;
/// Credit fraction for flagging a critical diagnosis as not-to-miss.
const CRITICAL_CREDIT: f64 = 0.2;
/// Penalty fraction for omitting a critical diagnosis entirely.
const CRITICAL_OMISSION_PENALTY: f64 = 0.3;

/// Scalar score plus its per-component breakdown, each normalized by the
/// maximum attainable weight so components are comparable across cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifferentialScore {
    /// Overall score in [0, 1].
    pub value: f64,
    /// Credit earned for including reference diagnoses.
    pub inclusion: f64,
    /// Credit earned for ranking them close to the reference order.
    pub ranking: f64,
    /// Credit earned for flagging critical diagnoses.
    pub critical_identified: f64,
    /// Penalty incurred for omitting critical diagnoses (non-positive).
    pub critical_missed: f64,
}

/// Normalize a diagnosis name for matching: case-fold, trim, and strip
/// everything outside `[a-z0-9]`. Matching is exact equality on the
/// normalized form; there is no fuzzy matching.
pub fn normalize_diagnosis(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Score a submitted differential against a reference differential.
///
/// Each reference entry at rank `r` (0-indexed) carries weight `1/(r+1)`,
/// so the top of the reference differential dominates. A matched entry
/// earns inclusion credit, rank-proximity credit, and critical-flag credit;
/// an omitted critical entry incurs a penalty that can drive the running
/// total negative. The final score is clamped at zero from below.
pub fn score_differential(
    submitted: &[DifferentialEntry],
    reference: &[ReferenceDiagnosis],
) -> DifferentialScore {
    let mut max_score = 0.0;
    let mut inclusion = 0.0;
    let mut ranking = 0.0;
    let mut critical_identified = 0.0;
    let mut critical_missed = 0.0;

    let normalized_submission: Vec<String> = submitted
        .iter()
        .map(|entry| normalize_diagnosis(&entry.name))
        .collect();

    for (ref_index, ref_dx) in reference.iter().enumerate() {
        let weight = 1.0 / (ref_index as f64 + 1.0);
        max_score += weight;

        let key = normalize_diagnosis(&ref_dx.name);
        let submitted_index = normalized_submission.iter().position(|n| *n == key);

        match submitted_index {
            Some(sub_index) => {
                inclusion += weight * INCLUSION_CREDIT;

                let rank_difference = sub_index.abs_diff(ref_index) as f64;
                let rank_score = (1.0 - rank_difference / reference.len() as f64).max(0.0);
                ranking += weight * RANKING_CREDIT * rank_score;

                if ref_dx.critical && submitted[sub_index].not_to_miss {
                    critical_identified += weight * CRITICAL_CREDIT;
                }
            }
            None if ref_dx.critical => {
                critical_missed -= weight * CRITICAL_OMISSION_PENALTY;
            }
            None => {}
        }
    }

    if max_score == 0.0 {
        // Empty reference differential: nothing to score against.
        return DifferentialScore {
            value: 0.0,
            inclusion: 0.0,
            ranking: 0.0,
            critical_identified: 0.0,
            critical_missed: 0.0,
        };
    }

    let total = inclusion + ranking + critical_identified + critical_missed;
    DifferentialScore {
        value: (total / max_score).max(0.0),
        inclusion: inclusion / max_score,
        ranking: ranking / max_score,
        critical_identified: critical_identified / max_score,
        critical_missed: critical_missed / max_score,
    }
}

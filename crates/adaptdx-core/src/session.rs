//! Per-examinee assessment session: adaptive case selection, the stopping
//! rule, and the request/response state machine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::competence::{
    classify_domains, update_competence, CompetenceProfile, DiagnosticAccuracy, SkillLevel,
};
use crate::error::EngineError;
use crate::irt::{item_information, AbilityState};
use crate::model::{CaseBank, ClinicalCase, DifferentialEntry, IrtParameters};
use crate::scoring::{normalize_diagnosis, score_differential, DifferentialScore};

/// Engine tuning knobs. Defaults reproduce the calibrated constants of the
/// production assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Step size of the ability-estimate gradient sweep.
    #[serde(default = "default_ability_learning_rate")]
    pub ability_learning_rate: f64,
    /// Step size of per-domain competence updates.
    #[serde(default = "default_competence_learning_rate")]
    pub competence_learning_rate: f64,
    /// When to terminate the session.
    #[serde(default)]
    pub stopping: StoppingConfig,
}

fn default_ability_learning_rate() -> f64 {
    0.3
}

fn default_competence_learning_rate() -> f64 {
    0.15
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ability_learning_rate: default_ability_learning_rate(),
            competence_learning_rate: default_competence_learning_rate(),
            stopping: StoppingConfig::default(),
        }
    }
}

/// Session termination thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoppingConfig {
    /// Never stop before this many responses.
    #[serde(default = "default_min_items")]
    pub min_items: usize,
    /// Always stop at this many responses.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Stop once the ability standard error drops to this precision.
    #[serde(default = "default_target_se")]
    pub target_se: f64,
}

fn default_min_items() -> usize {
    3
}

fn default_max_items() -> usize {
    10
}

fn default_target_se() -> f64 {
    0.35
}

impl Default for StoppingConfig {
    fn default() -> Self {
        Self {
            min_items: default_min_items(),
            max_items: default_max_items(),
            target_se: default_target_se(),
        }
    }
}

impl StoppingConfig {
    /// Evaluate the guards in order: minimum floor, hard ceiling, then the
    /// precision criterion. An infinite standard error (degenerate
    /// information) never satisfies the precision criterion.
    pub fn should_stop(&self, responses: usize, standard_error: f64) -> bool {
        if responses < self.min_items {
            return false;
        }
        if responses >= self.max_items {
            return true;
        }
        standard_error <= self.target_se
    }
}

/// Pick the case with the greatest Fisher information at the current
/// ability estimate, consuming it from the pool. Ties break to the first
/// case encountered in pool order. Returns `None` when the pool is
/// exhausted, which callers treat as a terminal signal.
pub fn select_next(pool: &mut Vec<Arc<ClinicalCase>>, theta: f64) -> Option<Arc<ClinicalCase>> {
    let mut best: Option<(usize, f64)> = None;
    for (index, case) in pool.iter().enumerate() {
        let info = item_information(theta, &case.parameters);
        match best {
            Some((_, best_info)) if info <= best_info => {}
            _ => best = Some((index, info)),
        }
    }
    best.map(|(index, _)| pool.remove(index))
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Ready to select the next case.
    AwaitingCase,
    /// A case is presented and awaiting a submission.
    CasePresented,
    /// The latest submission has been scored but the next transition has
    /// not happened yet. Transient; external callers observe it only
    /// through feedback.
    Scored,
    /// The session is over. No further submissions are accepted.
    Terminated,
}

/// One scored submission. Created once, never mutated, appended to the
/// session's response log.
#[derive(Debug, Clone)]
pub struct Response {
    pub id: Uuid,
    pub case: Arc<ClinicalCase>,
    pub differential: Vec<DifferentialEntry>,
    pub score: f64,
    pub theta_estimate: f64,
    pub is_correct: bool,
    pub time_spent_secs: u64,
    pub created_at: DateTime<Utc>,
}

/// A submission from the examinee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub case_id: String,
    pub differential: Vec<DifferentialEntry>,
    pub time_spent_secs: u64,
}

/// Serializable view of a recorded response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSummary {
    pub id: Uuid,
    pub case_id: String,
    pub differential: Vec<DifferentialEntry>,
    pub score: f64,
    pub theta_estimate: f64,
    pub is_correct: bool,
    pub time_spent_secs: u64,
}

/// One reference-differential row surfaced in feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceFeedbackEntry {
    pub diagnosis_name: String,
    /// 1 = most likely.
    pub rank: usize,
    pub is_critical: bool,
}

/// How the examinee's score compares to peers on the same case. Supplied
/// by an external collaborator; the engine never computes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerComparison {
    pub percentile: f64,
    pub avg_score: f64,
    pub your_score: f64,
}

/// Seam for the external peer-statistics subsystem.
pub trait PeerStatsProvider: Send + Sync {
    fn compare(&self, case_id: &str, score: f64) -> Option<PeerComparison>;
}

/// Ability-estimate movement caused by one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetenceUpdate {
    pub previous_theta: f64,
    pub new_theta: f64,
    pub standard_error: f64,
}

/// Feedback returned with every scored submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub score: f64,
    pub breakdown: DifferentialScore,
    pub reference_differential: Vec<ReferenceFeedbackEntry>,
    pub peer_comparison: Option<PeerComparison>,
    pub competence_update: CompetenceUpdate,
}

/// The id and difficulty of the next case, when the session continues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextCaseInfo {
    pub id: String,
    pub difficulty: f64,
}

/// Everything returned from a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub response: ResponseSummary,
    pub feedback: Feedback,
    pub next_case: Option<NextCaseInfo>,
}

/// One examinee's assessment session.
///
/// Owns the ability state, competence vector, response log, and the
/// remaining (not-yet-presented) case pool. Cases are sampled without
/// replacement: each is presented at most once per session.
pub struct Session {
    id: Uuid,
    domains: Vec<String>,
    remaining: Vec<Arc<ClinicalCase>>,
    current: Option<Arc<ClinicalCase>>,
    phase: SessionPhase,
    responses: Vec<Response>,
    ability: AbilityState,
    competence: Vec<f64>,
    config: EngineConfig,
    peer_stats: Option<Arc<dyn PeerStatsProvider>>,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(bank: &CaseBank, config: EngineConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            domains: bank.domains.clone(),
            remaining: bank.cases.iter().cloned().map(Arc::new).collect(),
            current: None,
            phase: SessionPhase::AwaitingCase,
            responses: Vec::new(),
            ability: AbilityState::new(),
            competence: vec![0.0; bank.domains.len()],
            config,
            peer_stats: None,
            started_at: Utc::now(),
        }
    }

    /// Attach the external peer-statistics collaborator.
    pub fn with_peer_stats(mut self, provider: Arc<dyn PeerStatsProvider>) -> Self {
        self.peer_stats = Some(provider);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == SessionPhase::Terminated
    }

    pub fn current_case(&self) -> Option<&Arc<ClinicalCase>> {
        self.current.as_ref()
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn ability(&self) -> &AbilityState {
        &self.ability
    }

    pub fn competence(&self) -> &[f64] {
        &self.competence
    }

    /// Select and present the first case. Terminates immediately when the
    /// pool is empty.
    pub fn begin(&mut self) -> Result<Option<Arc<ClinicalCase>>, EngineError> {
        match self.phase {
            SessionPhase::AwaitingCase => Ok(self.present_next()),
            SessionPhase::Terminated => Err(EngineError::SessionTerminated),
            // begin() twice in a row just re-reports the presented case
            SessionPhase::CasePresented | SessionPhase::Scored => Ok(self.current.clone()),
        }
    }

    fn present_next(&mut self) -> Option<Arc<ClinicalCase>> {
        match select_next(&mut self.remaining, self.ability.theta) {
            Some(case) => {
                tracing::debug!(
                    session = %self.id,
                    case = %case.id,
                    theta = self.ability.theta,
                    "presenting case"
                );
                self.current = Some(Arc::clone(&case));
                self.phase = SessionPhase::CasePresented;
                Some(case)
            }
            None => {
                tracing::debug!(session = %self.id, "case pool exhausted, terminating");
                self.current = None;
                self.phase = SessionPhase::Terminated;
                None
            }
        }
    }

    /// Score a submission for the currently presented case, update the
    /// ability estimate and competence vector, and either present the next
    /// case or terminate per the stopping rule.
    ///
    /// Invalid submissions are rejected before any state is mutated; the
    /// caller may resubmit.
    pub fn submit(&mut self, request: &SubmitRequest) -> Result<SubmitOutcome, EngineError> {
        match self.phase {
            SessionPhase::Terminated => return Err(EngineError::SessionTerminated),
            SessionPhase::CasePresented => {}
            SessionPhase::AwaitingCase | SessionPhase::Scored => {
                return Err(EngineError::NoCasePresented)
            }
        }

        let case = Arc::clone(self.current.as_ref().expect("CasePresented holds a case"));
        if case.id != request.case_id {
            return Err(EngineError::UnexpectedCase {
                expected: case.id.clone(),
                got: request.case_id.clone(),
            });
        }

        if !request
            .differential
            .iter()
            .any(|entry| !entry.name.trim().is_empty())
        {
            return Err(EngineError::InvalidSubmission(
                "differential contains no named diagnoses".into(),
            ));
        }

        let breakdown = score_differential(&request.differential, &case.reference);
        let score = breakdown.value;
        let previous_theta = self.ability.theta;

        // Full-history gradient sweep, oldest response first, new one last.
        let mut history: Vec<(&IrtParameters, f64)> = self
            .responses
            .iter()
            .map(|r| (&r.case.parameters, r.score))
            .collect();
        history.push((&case.parameters, score));
        self.ability
            .update(&history, self.config.ability_learning_rate);

        update_competence(
            &mut self.competence,
            &case.parameters.skill_vector,
            score,
            self.config.competence_learning_rate,
        );

        let response = Response {
            id: Uuid::new_v4(),
            case: Arc::clone(&case),
            differential: request.differential.clone(),
            score,
            theta_estimate: self.ability.theta,
            is_correct: score >= 0.5,
            time_spent_secs: request.time_spent_secs,
            created_at: Utc::now(),
        };
        let summary = ResponseSummary {
            id: response.id,
            case_id: case.id.clone(),
            differential: response.differential.clone(),
            score,
            theta_estimate: response.theta_estimate,
            is_correct: response.is_correct,
            time_spent_secs: response.time_spent_secs,
        };
        self.responses.push(response);
        self.current = None;
        self.phase = SessionPhase::Scored;

        tracing::debug!(
            session = %self.id,
            case = %case.id,
            score,
            theta = self.ability.theta,
            se = self.ability.standard_error,
            "submission scored"
        );

        let next_case = if self
            .config
            .stopping
            .should_stop(self.responses.len(), self.ability.standard_error)
        {
            self.phase = SessionPhase::Terminated;
            None
        } else {
            self.phase = SessionPhase::AwaitingCase;
            self.present_next().map(|next| NextCaseInfo {
                id: next.id.clone(),
                difficulty: next.parameters.difficulty,
            })
        };

        let feedback = Feedback {
            score,
            breakdown,
            reference_differential: case
                .reference
                .iter()
                .enumerate()
                .map(|(index, dx)| ReferenceFeedbackEntry {
                    diagnosis_name: dx.name.clone(),
                    rank: index + 1,
                    is_critical: dx.critical,
                })
                .collect(),
            peer_comparison: self
                .peer_stats
                .as_ref()
                .and_then(|provider| provider.compare(&case.id, score)),
            competence_update: CompetenceUpdate {
                previous_theta,
                new_theta: self.ability.theta,
                standard_error: self.ability.standard_error,
            },
        };

        Ok(SubmitOutcome {
            response: summary,
            feedback,
            next_case,
        })
    }

    /// Early termination: valid from any non-terminal state, keeps whatever
    /// responses were already recorded. Also the path taken when a
    /// session-level timeout expires in the caller.
    pub fn abandon(&mut self) {
        if self.phase != SessionPhase::Terminated {
            tracing::debug!(session = %self.id, responses = self.responses.len(), "session abandoned");
            self.current = None;
            self.phase = SessionPhase::Terminated;
        }
    }

    /// Derive the final competence profile from the recorded responses.
    /// Pure with respect to session state; callable at any point.
    pub fn profile(&self) -> CompetenceProfile {
        let cases_completed = self.responses.len();
        let accuracy = if cases_completed == 0 {
            0.0
        } else {
            self.responses.iter().map(|r| r.score).sum::<f64>() / cases_completed as f64 * 100.0
        };

        let (strengths, areas_for_growth) = classify_domains(&self.domains, &self.competence);
        let duration = (Utc::now() - self.started_at).num_seconds().max(0) as u64;

        CompetenceProfile {
            session_id: self.id,
            created_at: Utc::now(),
            overall_ability: self.ability.theta,
            skill_level: SkillLevel::from_theta(self.ability.theta),
            standard_error: self.ability.standard_error,
            domains: self.domains.clone(),
            competence_vector: self.competence.clone(),
            cases_completed,
            accuracy,
            assessment_duration_secs: duration,
            adaptive_path: self.ability.history.clone(),
            strengths,
            areas_for_growth,
            diagnostic_accuracy: self.diagnostic_accuracy(),
        }
    }

    /// Top-diagnosis and critical-capture rates across the response log,
    /// on a 0-100 scale.
    fn diagnostic_accuracy(&self) -> DiagnosticAccuracy {
        let mut top_included = 0usize;
        let mut criticals_total = 0usize;
        let mut criticals_captured = 0usize;

        for response in &self.responses {
            let submitted: Vec<(String, bool)> = response
                .differential
                .iter()
                .map(|entry| (normalize_diagnosis(&entry.name), entry.not_to_miss))
                .collect();

            if let Some(top) = response.case.reference.first() {
                let key = normalize_diagnosis(&top.name);
                if submitted.iter().any(|(name, _)| *name == key) {
                    top_included += 1;
                }
            }

            for critical in response.case.reference.iter().filter(|dx| dx.critical) {
                criticals_total += 1;
                let key = normalize_diagnosis(&critical.name);
                if submitted
                    .iter()
                    .any(|(name, flagged)| *name == key && *flagged)
                {
                    criticals_captured += 1;
                }
            }
        }

        DiagnosticAccuracy {
            top_diagnosis_accuracy: if self.responses.is_empty() {
                0.0
            } else {
                top_included as f64 / self.responses.len() as f64 * 100.0
            },
            critical_diagnosis_capture: if criticals_total == 0 {
                100.0
            } else {
                criticals_captured as f64 / criticals_total as f64 * 100.0
            },
        }
    }
}

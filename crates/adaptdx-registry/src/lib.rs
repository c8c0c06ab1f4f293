//! adaptdx-registry — Concurrent session management.
//!
//! Holds one isolated [`Session`] per active examinee over a shared,
//! read-only case bank. The engine itself is synchronous; the registry's
//! only job is isolation: no session can observe or mutate another's state,
//! and the bank is shared without locking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;
use uuid::Uuid;

use adaptdx_core::competence::CompetenceProfile;
use adaptdx_core::error::EngineError;
use adaptdx_core::model::{CaseBank, ClinicalCase};
use adaptdx_core::session::{
    EngineConfig, PeerStatsProvider, Session, SubmitOutcome, SubmitRequest,
};

/// Registry-level errors. Like engine errors, all are session-scoped.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no session with id {0}")]
    SessionNotFound(Uuid),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// One examinee session per entry, each independently lockable so that
/// concurrent submissions to different sessions never contend.
pub struct SessionRegistry {
    bank: Arc<CaseBank>,
    config: EngineConfig,
    peer_stats: Option<Arc<dyn PeerStatsProvider>>,
    sessions: RwLock<HashMap<Uuid, Mutex<Session>>>,
}

impl SessionRegistry {
    pub fn new(bank: Arc<CaseBank>, config: EngineConfig) -> Self {
        Self {
            bank,
            config,
            peer_stats: None,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Attach the external peer-statistics collaborator; every new session
    /// inherits it.
    pub fn with_peer_stats(mut self, provider: Arc<dyn PeerStatsProvider>) -> Self {
        self.peer_stats = Some(provider);
        self
    }

    /// Start a new session and present its first case. Returns `None` for
    /// the case when the bank is empty (the session is created terminated).
    pub fn start(&self) -> Result<(Uuid, Option<Arc<ClinicalCase>>), RegistryError> {
        let mut session = Session::new(&self.bank, self.config.clone());
        if let Some(provider) = &self.peer_stats {
            session = session.with_peer_stats(Arc::clone(provider));
        }
        let id = session.id();
        let first = session.begin()?;

        self.sessions
            .write()
            .expect("session map poisoned")
            .insert(id, Mutex::new(session));
        tracing::info!(session = %id, bank = %self.bank.id, "session started");
        Ok((id, first))
    }

    /// Submit a differential for a session's currently presented case.
    pub fn submit(
        &self,
        session_id: Uuid,
        request: &SubmitRequest,
    ) -> Result<SubmitOutcome, RegistryError> {
        self.with_session(session_id, |session| {
            session.submit(request).map_err(RegistryError::from)
        })?
    }

    /// The case a session is currently waiting on, if any.
    pub fn current_case(&self, session_id: Uuid) -> Result<Option<Arc<ClinicalCase>>, RegistryError> {
        self.with_session(session_id, |session| session.current_case().cloned())
    }

    /// Early termination. Same path as a session-level timeout expiring.
    pub fn abandon(&self, session_id: Uuid) -> Result<(), RegistryError> {
        self.with_session(session_id, |session| {
            session.abandon();
            tracing::info!(session = %session_id, "session abandoned");
        })
    }

    /// Derive the competence profile from whatever the session has recorded
    /// so far, without removing it.
    pub fn profile(&self, session_id: Uuid) -> Result<CompetenceProfile, RegistryError> {
        self.with_session(session_id, |session| session.profile())
    }

    /// Remove a session from the registry and return its final profile.
    /// Terminates it first if it is still live.
    pub fn finish(&self, session_id: Uuid) -> Result<CompetenceProfile, RegistryError> {
        let mut sessions = self.sessions.write().expect("session map poisoned");
        let session = sessions
            .remove(&session_id)
            .ok_or(RegistryError::SessionNotFound(session_id))?;
        let mut session = session.into_inner().expect("session lock poisoned");
        session.abandon();
        let profile = session.profile();
        tracing::info!(
            session = %session_id,
            cases = profile.cases_completed,
            theta = profile.overall_ability,
            "session finished"
        );
        Ok(profile)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.read().expect("session map poisoned").len()
    }

    fn with_session<T>(
        &self,
        session_id: Uuid,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<T, RegistryError> {
        let sessions = self.sessions.read().expect("session map poisoned");
        let session = sessions
            .get(&session_id)
            .ok_or(RegistryError::SessionNotFound(session_id))?;
        let mut session = session.lock().expect("session lock poisoned");
        Ok(f(&mut session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptdx_core::model::{
        CaseContent, Confidence, DifferentialEntry, IrtParameters, ReferenceDiagnosis,
    };

    fn make_bank(n: usize) -> Arc<CaseBank> {
        let cases = (0..n)
            .map(|i| ClinicalCase {
                id: format!("case-{i}"),
                content: CaseContent {
                    presentation: format!("presentation {i}"),
                    history: String::new(),
                    vitals: None,
                    labs: None,
                    demographics: None,
                },
                reference: vec![ReferenceDiagnosis {
                    name: format!("diagnosis {i}"),
                    likelihood: 1.0,
                    critical: true,
                }],
                parameters: IrtParameters {
                    difficulty: (i as f64 - n as f64 / 2.0) / 2.0,
                    discrimination: 1.2,
                    skill_vector: vec![1.0],
                },
            })
            .collect();

        Arc::new(CaseBank {
            id: "registry-test".into(),
            name: "Registry Test".into(),
            description: String::new(),
            domains: vec!["General".into()],
            cases,
        })
    }

    fn answer_for(case: &ClinicalCase, time_spent: u64) -> SubmitRequest {
        SubmitRequest {
            case_id: case.id.clone(),
            differential: case
                .reference
                .iter()
                .map(|dx| DifferentialEntry {
                    name: dx.name.clone(),
                    confidence: Confidence::High,
                    not_to_miss: dx.critical,
                })
                .collect(),
            time_spent_secs: time_spent,
        }
    }

    #[test]
    fn start_submit_finish_roundtrip() {
        let registry = SessionRegistry::new(make_bank(12), EngineConfig::default());

        let (id, first) = registry.start().unwrap();
        assert_eq!(registry.active_sessions(), 1);

        let mut case = first;
        while let Some(current) = case {
            let outcome = registry.submit(id, &answer_for(&current, 30)).unwrap();
            case = match outcome.next_case {
                Some(_) => registry.current_case(id).unwrap(),
                None => None,
            };
        }

        let profile = registry.finish(id).unwrap();
        assert!(profile.cases_completed >= 3);
        assert_eq!(registry.active_sessions(), 0);
        assert!(matches!(
            registry.profile(id),
            Err(RegistryError::SessionNotFound(_))
        ));
    }

    #[test]
    fn unknown_session_is_rejected() {
        let registry = SessionRegistry::new(make_bank(3), EngineConfig::default());
        let missing = Uuid::new_v4();
        assert!(matches!(
            registry.abandon(missing),
            Err(RegistryError::SessionNotFound(_))
        ));
    }

    #[test]
    fn abandon_keeps_recorded_responses() {
        let registry = SessionRegistry::new(make_bank(6), EngineConfig::default());
        let (id, first) = registry.start().unwrap();
        let case = first.unwrap();
        registry.submit(id, &answer_for(&case, 10)).unwrap();

        registry.abandon(id).unwrap();
        let profile = registry.profile(id).unwrap();
        assert_eq!(profile.cases_completed, 1);

        let next = registry.current_case(id).unwrap();
        assert!(next.is_none());
    }

    #[test]
    fn sessions_are_isolated_across_threads() {
        let registry = Arc::new(SessionRegistry::new(make_bank(12), EngineConfig::default()));

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let (id, first) = registry.start().unwrap();
                    let mut case = first;
                    let mut answered = 0usize;
                    while let Some(current) = case {
                        // Alternate perfect and empty-scoring submissions so
                        // different workers walk different theta paths.
                        let request = if worker % 2 == 0 {
                            answer_for(&current, 10)
                        } else {
                            SubmitRequest {
                                case_id: current.id.clone(),
                                differential: vec![DifferentialEntry::new("wrong diagnosis")],
                                time_spent_secs: 10,
                            }
                        };
                        let outcome = registry.submit(id, &request).unwrap();
                        answered += 1;
                        case = match outcome.next_case {
                            Some(_) => registry.current_case(id).unwrap(),
                            None => None,
                        };
                    }
                    (id, worker, answered)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(registry.active_sessions(), 8);

        for (id, worker, answered) in results {
            let profile = registry.finish(id).unwrap();
            assert_eq!(profile.cases_completed, answered);
            // Perfect-scoring workers end above zero, zero-scoring below:
            // sessions never bled into one another.
            if worker % 2 == 0 {
                assert!(profile.overall_ability > 0.0);
            } else {
                assert!(profile.overall_ability < 0.0);
            }
        }
        assert_eq!(registry.active_sessions(), 0);
    }
}

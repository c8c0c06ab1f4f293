//! The `adaptdx simulate` command.
//!
//! Drives a complete adaptive session with a deterministic simulated
//! examinee of a given true ability, useful for checking how a case bank
//! behaves across the ability range before putting it in front of people.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use serde::Deserialize;

use adaptdx_core::irt::expected_score;
use adaptdx_core::model::{ClinicalCase, Confidence, DifferentialEntry};
use adaptdx_core::parser;
use adaptdx_core::session::{EngineConfig, SubmitRequest};
use adaptdx_registry::SessionRegistry;

/// Engine section of an `adaptdx.toml` config file.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,
}

fn load_engine_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let parsed: ConfigFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            Ok(parsed.engine)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Build the simulated examinee's differential for one case: a prefix of
/// the reference differential whose length tracks the expected score at the
/// true ability, with critical flags copied over. Fully deterministic, so
/// repeated runs over the same bank produce the same trajectory.
fn simulated_differential(case: &ClinicalCase, true_ability: f64) -> Vec<DifferentialEntry> {
    let expected = expected_score(true_ability, &case.parameters);
    let n = case.reference.len();
    let included = ((expected * n as f64).round() as usize).clamp(1, n.max(1));

    case.reference
        .iter()
        .take(included)
        .enumerate()
        .map(|(index, dx)| DifferentialEntry {
            name: dx.name.clone(),
            confidence: if index == 0 {
                Confidence::High
            } else if index < included / 2 + 1 {
                Confidence::Medium
            } else {
                Confidence::Low
            },
            not_to_miss: dx.critical,
        })
        .collect()
}

pub fn execute(
    case_bank: PathBuf,
    ability: f64,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut bank = parser::parse_case_bank(&case_bank)?;
    let warnings = parser::validate_case_bank(&bank);
    for w in &warnings {
        tracing::warn!(case = ?w.case_id, "{}", w.message);
    }

    // A case with no reference differential cannot be answered, so it would
    // dead-end the session on submission. Drop such cases up front.
    bank.cases.retain(|case| {
        if case.reference.is_empty() {
            tracing::warn!(case = %case.id, "skipping case with empty reference differential");
            false
        } else {
            true
        }
    });
    if bank.cases.is_empty() {
        anyhow::bail!("no scorable cases in {}", case_bank.display());
    }

    let engine_config = load_engine_config(config.as_ref())?;
    let registry = SessionRegistry::new(Arc::new(bank), engine_config);
    let (session_id, first) = registry.start()?;

    println!("Simulating examinee with true ability {ability:+.2}\n");

    let mut trajectory = Table::new();
    trajectory.set_header(vec!["#", "Case", "Difficulty", "Score", "Theta", "SE"]);

    let mut presented = first;
    let mut item = 0usize;
    while let Some(case) = presented {
        item += 1;
        let request = SubmitRequest {
            case_id: case.id.clone(),
            differential: simulated_differential(&case, ability),
            time_spent_secs: 30 + 10 * case.reference.len() as u64,
        };
        let outcome = registry.submit(session_id, &request)?;

        trajectory.add_row(vec![
            Cell::new(item),
            Cell::new(&case.id),
            Cell::new(format!("{:+.2}", case.parameters.difficulty)),
            Cell::new(format!("{:.2}", outcome.response.score)),
            Cell::new(format!("{:+.2}", outcome.response.theta_estimate)),
            Cell::new(format!(
                "{:.2}",
                outcome.feedback.competence_update.standard_error
            )),
        ]);

        presented = match outcome.next_case {
            Some(_) => registry.current_case(session_id)?,
            None => None,
        };
    }

    println!("{trajectory}\n");

    let profile = registry.finish(session_id)?;
    super::report::print_profile(&profile);

    if let Some(path) = output {
        profile.save_json(&path)?;
        println!("\nProfile saved to: {}", path.display());
    }

    Ok(())
}

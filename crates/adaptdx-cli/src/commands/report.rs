//! The `adaptdx report` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use adaptdx_core::competence::CompetenceProfile;

pub fn execute(profile_path: PathBuf) -> Result<()> {
    let profile = CompetenceProfile::load_json(&profile_path)?;
    print_profile(&profile);
    Ok(())
}

/// Render a competence profile as tables. Shared with `simulate`.
pub fn print_profile(profile: &CompetenceProfile) {
    let mut summary = Table::new();
    summary.set_header(vec!["Metric", "Value"]);
    summary.add_row(vec![
        Cell::new("Skill level"),
        Cell::new(profile.skill_level.to_string()),
    ]);
    summary.add_row(vec![
        Cell::new("Overall ability (theta)"),
        Cell::new(format!("{:+.2}", profile.overall_ability)),
    ]);
    summary.add_row(vec![
        Cell::new("Standard error"),
        Cell::new(format!("{:.2}", profile.standard_error)),
    ]);
    summary.add_row(vec![
        Cell::new("Cases completed"),
        Cell::new(profile.cases_completed),
    ]);
    summary.add_row(vec![
        Cell::new("Accuracy"),
        Cell::new(format!("{:.1}%", profile.accuracy)),
    ]);
    summary.add_row(vec![
        Cell::new("Top-diagnosis accuracy"),
        Cell::new(format!(
            "{:.1}%",
            profile.diagnostic_accuracy.top_diagnosis_accuracy
        )),
    ]);
    summary.add_row(vec![
        Cell::new("Critical-diagnosis capture"),
        Cell::new(format!(
            "{:.1}%",
            profile.diagnostic_accuracy.critical_diagnosis_capture
        )),
    ]);
    summary.add_row(vec![
        Cell::new("Duration"),
        Cell::new(format!("{}s", profile.assessment_duration_secs)),
    ]);

    println!("{summary}\n");

    let mut domains = Table::new();
    domains.set_header(vec!["Domain", "Competence"]);
    for (domain, value) in profile.domains.iter().zip(&profile.competence_vector) {
        domains.add_row(vec![Cell::new(domain), Cell::new(format!("{value:+.2}"))]);
    }
    println!("{domains}\n");

    println!("Strengths: {}", profile.strengths.join(", "));
    println!("Areas for growth: {}", profile.areas_for_growth.join(", "));

    let path: Vec<String> = profile
        .adaptive_path
        .iter()
        .map(|theta| format!("{theta:+.2}"))
        .collect();
    println!("Adaptive path: {}", path.join(" -> "));
}

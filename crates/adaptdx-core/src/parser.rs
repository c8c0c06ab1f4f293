//! TOML case-bank parser.
//!
//! Loads case banks from TOML files and directories, and validates them at
//! the boundary where external case data enters the engine.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{CaseBank, CaseContent, ClinicalCase, IrtParameters, ReferenceDiagnosis};

/// Intermediate TOML structure for parsing case-bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    case_bank: TomlBankHeader,
    #[serde(default)]
    cases: Vec<TomlCase>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TomlCase {
    id: String,
    presentation: String,
    #[serde(default)]
    history: String,
    #[serde(default)]
    vitals: Option<toml::Value>,
    #[serde(default)]
    labs: Option<toml::Value>,
    #[serde(default)]
    demographics: Option<toml::Value>,
    #[serde(default)]
    differential: Vec<TomlReferenceDiagnosis>,
    parameters: TomlParameters,
}

#[derive(Debug, Deserialize)]
struct TomlReferenceDiagnosis {
    name: String,
    likelihood: f64,
    #[serde(default)]
    critical: bool,
}

#[derive(Debug, Deserialize)]
struct TomlParameters {
    difficulty: f64,
    discrimination: f64,
    skill_vector: Vec<f64>,
}

fn opaque(value: Option<toml::Value>) -> Result<Option<serde_json::Value>> {
    value
        .map(|v| serde_json::to_value(v).context("failed to convert structured case field"))
        .transpose()
}

/// Parse a single TOML file into a `CaseBank`.
pub fn parse_case_bank(path: &Path) -> Result<CaseBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read case bank file: {}", path.display()))?;

    parse_case_bank_str(&content, path)
}

/// Parse a TOML string into a `CaseBank` (useful for testing).
pub fn parse_case_bank_str(content: &str, source_path: &Path) -> Result<CaseBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let cases = parsed
        .cases
        .into_iter()
        .map(|c| {
            Ok(ClinicalCase {
                id: c.id,
                content: CaseContent {
                    presentation: c.presentation,
                    history: c.history,
                    vitals: opaque(c.vitals)?,
                    labs: opaque(c.labs)?,
                    demographics: opaque(c.demographics)?,
                },
                reference: c
                    .differential
                    .into_iter()
                    .map(|d| ReferenceDiagnosis {
                        name: d.name,
                        likelihood: d.likelihood,
                        critical: d.critical,
                    })
                    .collect(),
                parameters: IrtParameters {
                    difficulty: c.parameters.difficulty,
                    discrimination: c.parameters.discrimination,
                    skill_vector: c.parameters.skill_vector,
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CaseBank {
        id: parsed.case_bank.id,
        name: parsed.case_bank.name,
        description: parsed.case_bank.description,
        domains: parsed.case_bank.domains,
        cases,
    })
}

/// Recursively load all `.toml` case-bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<CaseBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_case_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from case-bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The case ID (if applicable).
    pub case_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a case bank for issues that would break or degrade a session.
pub fn validate_case_bank(bank: &CaseBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.domains.is_empty() {
        warnings.push(ValidationWarning {
            case_id: None,
            message: "bank declares no competence domains".into(),
        });
    }

    let mut seen_ids = std::collections::HashSet::new();
    for case in &bank.cases {
        if !seen_ids.insert(&case.id) {
            warnings.push(ValidationWarning {
                case_id: Some(case.id.clone()),
                message: format!("duplicate case ID: {}", case.id),
            });
        }
    }

    for case in &bank.cases {
        if case.content.presentation.trim().is_empty() {
            warnings.push(ValidationWarning {
                case_id: Some(case.id.clone()),
                message: "presentation is empty".into(),
            });
        }

        if case.reference.is_empty() {
            warnings.push(ValidationWarning {
                case_id: Some(case.id.clone()),
                message: "reference differential is empty".into(),
            });
        }

        if case.parameters.discrimination <= 0.0 {
            warnings.push(ValidationWarning {
                case_id: Some(case.id.clone()),
                message: format!(
                    "discrimination must be positive, got {}",
                    case.parameters.discrimination
                ),
            });
        }

        if case.parameters.skill_vector.len() != bank.domains.len() {
            warnings.push(ValidationWarning {
                case_id: Some(case.id.clone()),
                message: format!(
                    "skill_vector has {} entries but the bank declares {} domains",
                    case.parameters.skill_vector.len(),
                    bank.domains.len()
                ),
            });
        }

        for dx in &case.reference {
            if !(0.0..=1.0).contains(&dx.likelihood) {
                warnings.push(ValidationWarning {
                    case_id: Some(case.id.clone()),
                    message: format!("likelihood {} for '{}' outside [0, 1]", dx.likelihood, dx.name),
                });
            }
        }

        // Rank is positional; likelihoods out of descending order usually
        // mean the author listed the differential in the wrong order.
        let descending = case
            .reference
            .windows(2)
            .all(|pair| pair[0].likelihood >= pair[1].likelihood);
        if !descending {
            warnings.push(ValidationWarning {
                case_id: Some(case.id.clone()),
                message: "reference likelihoods are not in descending rank order".into(),
            });
        }
    }

    let any_critical = bank
        .cases
        .iter()
        .any(|case| case.reference.iter().any(|dx| dx.critical));
    if !bank.cases.is_empty() && !any_critical {
        warnings.push(ValidationWarning {
            case_id: None,
            message: "no case carries a critical (not-to-miss) diagnosis".into(),
        });
    }

    warnings
}

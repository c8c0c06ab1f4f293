//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn adaptdx() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("adaptdx").unwrap()
}

#[test]
fn validate_acute_care_bank() {
    adaptdx()
        .arg("validate")
        .arg("--case-bank")
        .arg("../../case-banks/acute-care.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("6 cases"))
        .stdout(predicate::str::contains("All case banks valid"));
}

#[test]
fn validate_directory() {
    adaptdx()
        .arg("validate")
        .arg("--case-bank")
        .arg("../../case-banks")
        .assert()
        .success()
        .stdout(predicate::str::contains("Acute Care"));
}

#[test]
fn validate_nonexistent_file() {
    adaptdx()
        .arg("validate")
        .arg("--case-bank")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[case_bank]
id = "broken"
name = "Broken"
domains = ["General", "Other"]

[[cases]]
id = "bad"
presentation = "A case"
[cases.parameters]
difficulty = 0.0
discrimination = -1.0
skill_vector = [1.0]
"#,
    )
    .unwrap();

    adaptdx()
        .arg("validate")
        .arg("--case-bank")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("WARNING"))
        .stdout(predicate::str::contains("discrimination"))
        .stdout(predicate::str::contains("skill_vector"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    adaptdx()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created adaptdx.toml"))
        .stdout(predicate::str::contains("Created case-banks/example.toml"));

    assert!(dir.path().join("adaptdx.toml").exists());
    assert!(dir.path().join("case-banks/example.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    adaptdx()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    adaptdx()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn init_output_validates_cleanly() {
    let dir = TempDir::new().unwrap();

    adaptdx()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    adaptdx()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--case-bank")
        .arg("case-banks/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All case banks valid"));
}

#[test]
fn simulate_produces_profile() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("profile.json");

    adaptdx()
        .arg("simulate")
        .arg("--case-bank")
        .arg("../../case-banks/acute-care.toml")
        .arg("--ability")
        .arg("1.5")
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("true ability +1.50"))
        .stdout(predicate::str::contains("Skill level"))
        .stdout(predicate::str::contains("Adaptive path"));

    assert!(output.exists());
}

#[test]
fn simulate_respects_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("adaptdx.toml");
    // A two-item ceiling cuts the session short.
    std::fs::write(
        &config,
        "[engine.stopping]\nmin_items = 1\nmax_items = 2\ntarget_se = 0.05\n",
    )
    .unwrap();
    let output = dir.path().join("profile.json");

    adaptdx()
        .arg("simulate")
        .arg("--case-bank")
        .arg("../../case-banks/acute-care.toml")
        .arg("--ability")
        .arg("0.0")
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let profile: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(profile["cases_completed"], 2);
}

#[test]
fn simulate_skips_cases_without_reference_differential() {
    let dir = TempDir::new().unwrap();
    let bank = dir.path().join("sparse.toml");
    // One answerable case plus one with no differential at all.
    std::fs::write(
        &bank,
        r#"
[case_bank]
id = "sparse"
name = "Sparse"
domains = ["General"]

[[cases]]
id = "answerable"
presentation = "A case"
[[cases.differential]]
name = "Sepsis"
likelihood = 1.0
critical = true
[cases.parameters]
difficulty = 0.0
discrimination = 1.2
skill_vector = [1.0]

[[cases]]
id = "unanswerable"
presentation = "Another case"
[cases.parameters]
difficulty = 0.5
discrimination = 1.2
skill_vector = [1.0]
"#,
    )
    .unwrap();
    let output = dir.path().join("profile.json");

    adaptdx()
        .arg("simulate")
        .arg("--case-bank")
        .arg(&bank)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let profile: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(profile["cases_completed"], 1);
}

#[test]
fn simulate_fails_when_no_case_is_scorable() {
    let dir = TempDir::new().unwrap();
    let bank = dir.path().join("empty.toml");
    std::fs::write(
        &bank,
        r#"
[case_bank]
id = "empty"
name = "Empty"
domains = ["General"]

[[cases]]
id = "unanswerable"
presentation = "A case"
[cases.parameters]
difficulty = 0.0
discrimination = 1.2
skill_vector = [1.0]
"#,
    )
    .unwrap();

    adaptdx()
        .arg("simulate")
        .arg("--case-bank")
        .arg(&bank)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scorable cases"));
}

#[test]
fn report_prints_saved_profile() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("profile.json");

    adaptdx()
        .arg("simulate")
        .arg("--case-bank")
        .arg("../../case-banks/acute-care.toml")
        .arg("--ability")
        .arg("-1.0")
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    adaptdx()
        .arg("report")
        .arg("--profile")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall ability"))
        .stdout(predicate::str::contains("Areas for growth"));
}

#[test]
fn report_nonexistent_profile() {
    adaptdx()
        .arg("report")
        .arg("--profile")
        .arg("no_such_profile.json")
        .assert()
        .failure();
}

#[test]
fn help_output() {
    adaptdx()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Adaptive clinical-competence assessment engine",
        ));
}

#[test]
fn version_output() {
    adaptdx()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("adaptdx"));
}

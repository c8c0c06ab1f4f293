//! The `adaptdx init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("adaptdx.toml").exists() {
        println!("adaptdx.toml already exists, skipping.");
    } else {
        std::fs::write("adaptdx.toml", SAMPLE_CONFIG)?;
        println!("Created adaptdx.toml");
    }

    std::fs::create_dir_all("case-banks")?;
    let example_path = std::path::Path::new("case-banks/example.toml");
    if example_path.exists() {
        println!("case-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_CASE_BANK)?;
        println!("Created case-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit case-banks/example.toml with your calibrated cases");
    println!("  2. Run: adaptdx validate --case-bank case-banks/example.toml");
    println!("  3. Run: adaptdx simulate --case-bank case-banks/example.toml --ability 0.5");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptdx engine configuration

[engine]
ability_learning_rate = 0.3
competence_learning_rate = 0.15

[engine.stopping]
min_items = 3
max_items = 10
target_se = 0.35
"#;

const EXAMPLE_CASE_BANK: &str = r#"[case_bank]
id = "example"
name = "Example Case Bank"
description = "A starter bank with two calibrated cases"
domains = ["Emergency Medicine", "Cardiology"]

[[cases]]
id = "chest-pain-45m"
presentation = """
A 45-year-old male presents with chest pain, shortness of breath, and
diaphoresis for 2 hours. The pain is substernal, crushing in quality, and
radiates to the left arm. BP: 150/90, HR: 110, O2 sat: 94% on room air.
"""
history = "10 pack-year smoking history, family history of CAD"

[cases.vitals]
bp = "150/90"
hr = 110
o2sat = 94

[[cases.differential]]
name = "Acute Myocardial Infarction"
likelihood = 0.35
critical = true

[[cases.differential]]
name = "Unstable Angina"
likelihood = 0.25
critical = true

[[cases.differential]]
name = "Panic Attack"
likelihood = 0.10

[cases.parameters]
difficulty = -0.5
discrimination = 1.2
skill_vector = [1.0, 0.8]

[[cases]]
id = "syncope-70f"
presentation = """
A 70-year-old female presents after a sudden loss of consciousness while
standing in church. No prodrome, rapid recovery. ECG shows a narrow-complex
rhythm with occasional pauses up to 2.8 seconds.
"""
history = "Hypertension on amlodipine"

[[cases.differential]]
name = "Sick Sinus Syndrome"
likelihood = 0.40
critical = true

[[cases.differential]]
name = "Orthostatic Hypotension"
likelihood = 0.30

[[cases.differential]]
name = "Vasovagal Syncope"
likelihood = 0.20

[cases.parameters]
difficulty = 0.2
discrimination = 1.4
skill_vector = [0.7, 1.0]
"#;

//! The `adaptdx validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(case_bank_path: PathBuf) -> Result<()> {
    let banks = if case_bank_path.is_dir() {
        adaptdx_core::parser::load_bank_directory(&case_bank_path)?
    } else {
        vec![adaptdx_core::parser::parse_case_bank(&case_bank_path)?]
    };

    let mut total_warnings = 0;

    for bank in &banks {
        println!(
            "Case bank: {} ({} cases, {} domains)",
            bank.name,
            bank.cases.len(),
            bank.domains.len()
        );

        let warnings = adaptdx_core::parser::validate_case_bank(bank);
        for w in &warnings {
            let prefix = w
                .case_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All case banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

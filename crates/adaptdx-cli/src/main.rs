//! adaptdx CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adaptdx", version, about = "Adaptive clinical-competence assessment engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate case-bank TOML files
    Validate {
        /// Path to a .toml case bank or a directory of them
        #[arg(long)]
        case_bank: PathBuf,
    },

    /// Run a full session with a simulated examinee
    Simulate {
        /// Path to the .toml case bank
        #[arg(long)]
        case_bank: PathBuf,

        /// True ability (theta) of the simulated examinee
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        ability: f64,

        /// Engine config file (adaptdx.toml); defaults are used when absent
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the final profile JSON here
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Pretty-print a saved competence profile
    Report {
        /// Path to a profile JSON written by `simulate`
        #[arg(long)]
        profile: PathBuf,
    },

    /// Create a starter config and example case bank
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adaptdx=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { case_bank } => commands::validate::execute(case_bank),
        Commands::Simulate {
            case_bank,
            ability,
            config,
            output,
        } => commands::simulate::execute(case_bank, ability, config, output),
        Commands::Report { profile } => commands::report::execute(profile),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

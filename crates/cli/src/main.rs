use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "casewire", about = "Run API test cases against a live backend", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a case file and print the run report as JSON
    Run {
        /// Path to the case file (YAML or JSON)
        #[arg(long, short = 'f')]
        file: PathBuf,
        /// Base URL the step paths are resolved against
        #[arg(long)]
        base_url: String,
    },
    /// Parse and validate a case file without executing it
    Check {
        /// Path to the case file (YAML or JSON)
        #[arg(long, short = 'f')]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run { file, base_url } => run_case_cmd(&file, &base_url).await,
        Command::Check { file } => check_case_cmd(&file),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn run_case_cmd(file: &PathBuf, base_url: &str) -> Result<ExitCode> {
    let case = load_case(file)?;
    if !case.enabled {
        bail!("case '{}' is disabled", case.name);
    }

    let report = casewire_engine::run_case_against(base_url, &case.steps).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn check_case_cmd(file: &PathBuf) -> Result<ExitCode> {
    let case = load_case(file)?;
    let state = if case.enabled { "enabled" } else { "disabled" };
    println!("case '{}': {} steps, {state}", case.name, case.steps.len());
    Ok(ExitCode::SUCCESS)
}

fn load_case(file: &PathBuf) -> Result<casewire_types::TestCase> {
    let case = casewire_engine::parse_case_file(file).with_context(|| format!("failed to load case from {}", file.display()))?;
    casewire_engine::validate_steps(&case.steps)?;
    Ok(case)
}

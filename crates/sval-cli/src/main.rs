//! sval CLI - validate JSON/YAML documents against a rule config
//!
//! Usage:
//!   sval check data.json other.yaml           Validate documents (config discovered in cwd)
//!   sval check --config rules.yaml data.json  Validate with an explicit config
//!   sval rules                                List registered rule paths
//!   sval --log-level debug check data.json    Verbose logging on stderr

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value as JsonValue};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use sval::{ConfigFormat, FileConfigLoader, Validator};

#[derive(Parser)]
#[command(name = "sval")]
#[command(about = "Configuration-driven validation of JSON and YAML documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate documents and print a JSON violation report per file
    Check {
        /// Rule config (defaults to sval.yaml, sval.yml or sval.json in the working directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Documents to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List registered rule paths and their types
    Rules {
        /// Rule config (defaults to sval.yaml, sval.yml or sval.json in the working directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Check { config, files } => {
            let validator = load_validator(config.as_deref())?;
            let exit_code = run_check(&validator, &files)?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Commands::Rules { config } => {
            let validator = load_validator(config.as_deref())?;
            print!("{}", validator);
        }
    }

    Ok(())
}

/// Build the validator from an explicit config or the discovered one
fn load_validator(config: Option<&Path>) -> Result<Validator> {
    let validator = match config {
        Some(path) => Validator::from_loader(&FileConfigLoader::new(path))
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Validator::from_default_config().context("Failed to load default config")?,
    };
    info!(rules = validator.len(), "Validator ready");
    Ok(validator)
}

/// Read a JSON or YAML document; unknown extensions are read as JSON
fn load_document(path: &Path) -> Result<JsonValue> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = match ConfigFormat::from_path(path) {
        Some(ConfigFormat::Yaml) => serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse YAML {}", path.display()))?,
        _ => serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON {}", path.display()))?,
    };
    Ok(doc)
}

/// Validate every file, returning the report and whether anything failed
fn check_files(validator: &Validator, files: &[PathBuf]) -> Result<(Vec<JsonValue>, bool)> {
    let mut reports = Vec::with_capacity(files.len());
    let mut failed = false;

    for file in files {
        let doc = load_document(file)?;
        let errors = match validator.validate(&doc) {
            Ok(()) => JsonValue::Array(Vec::new()),
            Err(errors) => {
                failed = true;
                debug!(file = %file.display(), violations = errors.len(), "Validation failed");
                let mut report = errors.to_json();
                report["errors"].take()
            }
        };
        reports.push(json!({
            "file": file.display().to_string(),
            "errors": errors,
        }));
    }

    Ok((reports, failed))
}

fn run_check(validator: &Validator, files: &[PathBuf]) -> Result<i32> {
    let (reports, failed) = check_files(validator, files)?;
    for report in &reports {
        let text = serde_json::to_string_pretty(report).context("Failed to encode report")?;
        println!("{}", text);
    }
    Ok(if failed { 1 } else { 0 })
}

/// Initialize logging based on log level
fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized

    Ok(())
}

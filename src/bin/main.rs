use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Error};
use tracing_subscriber::EnvFilter;

/// Compare an old and a new OpenAPI document, and report changes that are unsafe for existing
/// clients
#[derive(Parser)]
#[clap(about, version)]
struct Args {
    /// The published document
    old_spec: PathBuf,
    /// The candidate document
    new_spec: PathBuf,
    /// How to print the report
    #[clap(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Log filter used when RUST_LOG is not set
    #[clap(long, default_value = "warn")]
    log_level: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<ExitCode, Error> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .with_context(|| format!("invalid log level {:?}", args.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let old = openapi_safety::load(&args.old_spec)
        .with_context(|| format!("failed to load {}", args.old_spec.display()))?;
    let new = openapi_safety::load(&args.new_spec)
        .with_context(|| format!("failed to load {}", args.new_spec.display()))?;

    let report = openapi_safety::check(old, new)?;

    match args.format {
        Format::Text => println!("{report}"),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(ExitCode::from(report.verdict().exit_code()))
}

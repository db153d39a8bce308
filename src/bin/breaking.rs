//! Schema Breaking-Change CLI
//!
//! Validates that a schema change is backward compatible.
//!
//! Usage:
//!   schema-breaking check --old old.json --new new.json [--override overrides.json]
//!   schema-breaking config show
//!   schema-breaking --help

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use schema_compat::{
    BreakingCheck, CompatConfig, MessageFormatter, OutputFormat, Path, Report, ReportedFinding,
    StaleOverridePolicy,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-breaking")]
#[command(about = "Validate if a schema change is backwards-compatible")]
#[command(version)]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a new schema revision against the old one
    Check {
        /// Old schema documents (files or directories)
        #[arg(long, required = true, num_args = 1..)]
        old: Vec<PathBuf>,

        /// New schema documents (files or directories)
        #[arg(long, required = true, num_args = 1..)]
        new: Vec<PathBuf>,

        /// Override documents marking sanctioned breaking changes
        #[arg(long = "override", num_args = 1..)]
        overrides: Vec<PathBuf>,

        /// Path that contains the schema inside each document
        #[arg(long)]
        path: Option<String>,

        /// Maximum number of findings to report (0 = all)
        #[arg(long)]
        max_errors: Option<usize>,

        /// Suppress findings whose message is longer than this (0 = never)
        #[arg(long)]
        suppress_errors_longer_than: Option<usize>,

        /// What to do with overrides that match nothing (ignore, warn, error)
        #[arg(long)]
        stale_overrides: Option<StaleOverridePolicy>,

        /// Check top-level sections in parallel
        #[arg(long)]
        parallel: bool,

        /// Output format (text, json)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// View and manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration as TOML
    Show,

    /// Write a default config file
    Init {
        /// Output path
        #[arg(short, long, default_value = "compat.toml")]
        output: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the invocation passed
fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config =
        CompatConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Check {
            old,
            new,
            overrides,
            path,
            max_errors,
            suppress_errors_longer_than,
            stale_overrides,
            parallel,
            format,
        } => {
            if let Some(path) = path {
                config.check.path = Some(path);
            }
            if let Some(n) = max_errors {
                config.check.max_count = n;
            }
            if let Some(n) = suppress_errors_longer_than {
                config.check.max_detail_length = n;
            }
            if let Some(policy) = stale_overrides {
                config.check.stale_overrides = policy;
            }
            config.check.parallel |= parallel;
            let format = match format.as_deref() {
                Some("json") => OutputFormat::Json,
                Some("text") => OutputFormat::Text,
                Some(other) => anyhow::bail!("unknown output format '{}'", other),
                None => config.output.format,
            };

            let check = BreakingCheck::new(config.check_options());
            let report = check.run_files(&old, &new, &overrides)?;

            match format {
                OutputFormat::Json => print_json_report(&report)?,
                OutputFormat::Text => print_text_report(&report, &check),
            }
            Ok(report.pass)
        }

        Commands::Config { command } => {
            match command {
                ConfigCommands::Show => print!("{}", toml::to_string_pretty(&config)?),
                ConfigCommands::Init { output } => {
                    CompatConfig::default()
                        .save(&output)
                        .with_context(|| format!("failed to write {}", output))?;
                    println!("✅ Config written to {}", output);
                }
            }
            Ok(true)
        }
    }
}

fn print_json_report(report: &Report) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text_report(report: &Report, check: &BreakingCheck) {
    let formatter: &dyn MessageFormatter = check.formatter();
    let max_detail_length = check.options().max_detail_length;

    for finding in &report.findings {
        match finding {
            ReportedFinding::Full(f) => println!("  └─ {}", formatter.format(f)),
            ReportedFinding::Redacted(r) => {
                println!("  └─ {}", formatter.format_redacted(r, max_detail_length))
            }
        }
    }

    if report.is_truncated() {
        println!(
            "  ... {} more finding(s) not shown",
            report.total_count - report.findings.len()
        );
    }

    let scope = check
        .options()
        .path
        .as_ref()
        .filter(|p| !p.is_root())
        .map(Path::to_string)
        .unwrap_or_else(|| "schema".to_string());

    if report.pass {
        println!("✅ {} is backward compatible", scope);
    } else {
        println!(
            "❌ {} has {} breaking change(s)",
            scope, report.total_count
        );
    }
}

//! Command-line interface for graphcheck.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cancel::CancellationToken;
use crate::diagnostics::Severity;
use crate::report;
use crate::rules;
use crate::settings::AnalysisSettings;
use crate::symbols::Compilation;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Framework contract analyzer for record and business-graph code.
///
/// Graphcheck consumes a compilation snapshot exported by the compiler
/// front end and reports semantic violations of the platform's contracts:
/// mistyped field attributes, broken key declarations, persistence calls
/// and throws inside disallowed lifecycle events, banned API usage, and
/// undocumented public entity members.
#[derive(Parser)]
#[command(name = "graphcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a compilation snapshot
    #[command(visible_alias = "check")]
    Analyze(AnalyzeArgs),
    /// List the rules this build knows about
    Rules(RulesArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Path to the compilation snapshot JSON
    pub snapshot: PathBuf,

    /// Path to an analysis settings YAML file
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Severity that makes the run fail: error, warning, or never
    #[arg(long, default_value = "error")]
    pub fail_on: String,

    /// Show suppressed findings in output
    #[arg(long)]
    pub show_suppressed: bool,
}

/// Arguments for the rules command.
#[derive(Parser)]
pub struct RulesArgs {
    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Run the analyze command. Returns the process exit code.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let json = fs::read_to_string(&args.snapshot)?;
    let compilation = Compilation::from_json(&json)?;

    let settings = match &args.settings {
        Some(path) => AnalysisSettings::parse_file(path)?,
        None => AnalysisSettings::default(),
    };

    let outcome = rules::run_analysis(&compilation, &settings, &CancellationToken::new())
        .map_err(|cancelled| anyhow::anyhow!(cancelled))?;

    match args.format.as_str() {
        "json" => println!("{}", report::write_json(&outcome)?),
        "pretty" => print!("{}", report::write_pretty(&outcome, args.show_suppressed)),
        other => anyhow::bail!("unknown format: {:?} (expected pretty or json)", other),
    }

    let failed = match args.fail_on.as_str() {
        "never" => false,
        "warning" => outcome.has_errors() || outcome.has_warnings(),
        "error" => outcome.has_errors(),
        other => anyhow::bail!(
            "unknown fail-on threshold: {:?} (expected error, warning, or never)",
            other
        ),
    };

    Ok(if failed { EXIT_FAILED } else { EXIT_SUCCESS })
}

/// Run the rules command. Returns the process exit code.
pub fn run_rules(args: &RulesArgs) -> anyhow::Result<i32> {
    let descriptors = rules::all_descriptors();

    match args.format.as_str() {
        "json" => {
            let entries: Vec<serde_json::Value> = descriptors
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "id": d.id,
                        "title": d.title,
                        "severity": d.severity.to_string(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        "pretty" => {
            for descriptor in &descriptors {
                let severity = match descriptor.severity {
                    Severity::Error => "error  ",
                    Severity::Warning => "warning",
                    Severity::Info => "info   ",
                };
                println!("{}  {}  {}", descriptor.id, severity, descriptor.title);
            }
        }
        other => anyhow::bail!("unknown format: {:?} (expected pretty or json)", other),
    }

    Ok(EXIT_SUCCESS)
}

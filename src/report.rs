//! Output formatting for analysis results.
//!
//! Two formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{AnalysisOutcome, Diagnostic, Severity};

/// JSON report envelope.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub tool: String,
    pub version: String,
    pub analyzed_types: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub suppressed_count: usize,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<Diagnostic>,
}

impl JsonReport {
    pub fn from_outcome(outcome: &AnalysisOutcome) -> Self {
        let count = |severity: Severity| {
            outcome
                .diagnostics
                .iter()
                .filter(|d| d.severity == severity)
                .count()
        };

        Self {
            tool: "graphcheck".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            analyzed_types: outcome.analyzed_types,
            error_count: count(Severity::Error),
            warning_count: count(Severity::Warning),
            info_count: count(Severity::Info),
            suppressed_count: outcome.suppressed.len(),
            diagnostics: outcome.diagnostics.clone(),
            suppressed: outcome.suppressed.clone(),
        }
    }
}

/// Render the outcome as JSON.
pub fn write_json(outcome: &AnalysisOutcome) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport::from_outcome(
        outcome,
    ))?)
}

/// Render the outcome for terminal display.
pub fn write_pretty(outcome: &AnalysisOutcome, show_suppressed: bool) -> String {
    let mut out = String::new();

    for diagnostic in &outcome.diagnostics {
        out.push_str(&format_diagnostic(diagnostic));
        out.push('\n');
    }

    if show_suppressed && !outcome.suppressed.is_empty() {
        out.push_str(&format!(
            "\n{}\n",
            "Suppressed findings:".bold().underline()
        ));
        for diagnostic in &outcome.suppressed {
            out.push_str(&format_diagnostic(diagnostic));
            out.push('\n');
        }
    }

    let report = JsonReport::from_outcome(outcome);
    out.push_str(&format!(
        "\n{} type(s) analyzed: {} error(s), {} warning(s), {} info, {} suppressed\n",
        outcome.analyzed_types,
        colorize_count(report.error_count, Color::Red),
        colorize_count(report.warning_count, Color::Yellow),
        report.info_count,
        report.suppressed_count,
    ));

    out
}

fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".cyan(),
    };

    let mut line = format!(
        "{}: {} [{}] {}",
        diagnostic.location, severity, diagnostic.rule, diagnostic.message
    );

    for extra in &diagnostic.extra_locations {
        line.push_str(&format!("\n    see also: {}", extra));
    }

    line
}

fn colorize_count(count: usize, color: Color) -> String {
    if count > 0 {
        count.to_string().color(color).bold().to_string()
    } else {
        count.to_string()
    }
}

//! Diagnostic types produced by rule analyzers.
//!
//! A [`Descriptor`] is the static identity of a rule finding (stable id,
//! title, default severity). A [`Diagnostic`] is one concrete finding with
//! a primary location, optional extra locations, and a string-keyed
//! property bag. The property bag is the only data channel from analyzers
//! to downstream fix providers, so analyzers should stash any semantic
//! facts a fix would otherwise have to re-derive.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Severity levels for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Static identity of a rule finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Stable identifier, e.g. `"GC0101"`.
    pub id: &'static str,
    /// Short human-readable title.
    pub title: &'static str,
    /// Default severity for findings of this descriptor.
    pub severity: Severity,
}

/// A source position in the analyzed compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column.
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A single reported finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
    /// Secondary locations, e.g. every duplicate key declaration.
    #[serde(default)]
    pub extra_locations: Vec<Location>,
    /// String-keyed facts for fix providers.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Diagnostic {
    /// Create a diagnostic from a descriptor with its default severity.
    pub fn new(descriptor: &Descriptor, location: Location, message: impl Into<String>) -> Self {
        Self {
            rule: descriptor.id.to_string(),
            severity: descriptor.severity,
            message: message.into(),
            location,
            extra_locations: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_extra_location(mut self, location: Location) -> Self {
        self.extra_locations.push(location);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Results of one analysis pass over a compilation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub diagnostics: Vec<Diagnostic>,
    /// Findings dropped by suppression annotations.
    #[serde(default)]
    pub suppressed: Vec<Diagnostic>,
    /// Number of top-level types examined.
    pub analyzed_types: usize,
}

impl AnalysisOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }
}

/// Thread-safe collector for diagnostics.
///
/// Rule analyzers may run in parallel under the aggregator; the sink is
/// the only shared mutable state they write.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    collected: Mutex<Vec<Diagnostic>>,
    suppressed: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        self.collected.lock().unwrap().push(diagnostic);
    }

    pub fn push_suppressed(&self, diagnostic: Diagnostic) {
        self.suppressed.lock().unwrap().push(diagnostic);
    }

    /// Drain the sink into an outcome, sorted by location for
    /// deterministic output.
    pub fn into_outcome(self, analyzed_types: usize) -> AnalysisOutcome {
        let mut diagnostics = self.collected.into_inner().unwrap();
        let mut suppressed = self.suppressed.into_inner().unwrap();
        sort_diagnostics(&mut diagnostics);
        sort_diagnostics(&mut suppressed);

        AnalysisOutcome {
            diagnostics,
            suppressed,
            analyzed_types,
        }
    }
}

fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        (&a.location.file, a.location.line, a.location.column, &a.rule).cmp(&(
            &b.location.file,
            b.location.line,
            b.location.column,
            &b.rule,
        ))
    });
}

//! Analysis settings schema.
//!
//! Settings are loaded once from a YAML file (or defaulted) and passed as
//! an immutable value down through every analysis entry point. No analysis
//! code reads ambient/global configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Feature toggles and tuning knobs consumed by the analysis core.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisSettings {
    /// Master switch; when off no analyzers run at all.
    #[serde(default = "default_true")]
    pub static_analysis_enabled: bool,
    /// Whether deep analyzers may follow invocations into other method
    /// bodies. When off, walkers inspect only the root body.
    #[serde(default = "default_true")]
    pub recursive_analysis_enabled: bool,
    /// Whether suppression annotations in the snapshot are honored.
    #[serde(default = "default_true")]
    pub suppression_mechanism_enabled: bool,
    /// Override for the interprocedural walk depth ceiling.
    #[serde(default)]
    pub max_walk_depth: Option<usize>,
    /// Whether public entity members must carry documentation.
    #[serde(default = "default_true")]
    pub document_public_members: bool,
    /// APIs that must not be referenced from analyzed code.
    #[serde(default)]
    pub banned_apis: Vec<BannedApi>,
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            static_analysis_enabled: true,
            recursive_analysis_enabled: true,
            suppression_mechanism_enabled: true,
            max_walk_depth: None,
            document_public_members: true,
            banned_apis: Vec::new(),
        }
    }
}

impl AnalysisSettings {
    /// Parse settings from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let settings: AnalysisSettings = serde_yaml::from_str(&content)?;
        validate(&settings)?;
        Ok(settings)
    }

    /// The effective interprocedural walk depth ceiling.
    pub fn effective_walk_depth(&self) -> usize {
        self.max_walk_depth
            .unwrap_or(crate::walker::DEFAULT_MAX_WALK_DEPTH)
    }
}

/// A banned API entry: a full-name glob plus an optional reason shown in
/// the diagnostic message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BannedApi {
    /// Full symbol name or glob, e.g. `Summit.Data.DataGraph.Clear` or
    /// `System.Reflection.*`.
    pub path: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Validate settings for correctness.
pub fn validate(settings: &AnalysisSettings) -> anyhow::Result<()> {
    for banned in &settings.banned_apis {
        globset::Glob::new(&banned.path)
            .map_err(|e| anyhow::anyhow!("invalid banned API pattern {:?}: {}", banned.path, e))?;
    }

    if let Some(depth) = settings.max_walk_depth {
        if depth == 0 {
            anyhow::bail!("max_walk_depth must be at least 1");
        }
    }

    Ok(())
}

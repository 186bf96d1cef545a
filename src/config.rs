//! Pipeline configuration (optional TOML file).
//!
//! ```toml
//! merge_policy = "pass_through"       # or "drop_incomplete"
//! extra_excluded_prefixes = ["Homing", "Setting up"]
//! ```

use crate::Result;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// What the merger does with transfer records lacking sources or targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Discard them (module-tagged records still pass).
    DropIncomplete,
    /// Keep them in place, unmerged.
    #[default]
    PassThrough,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub merge_policy: MergePolicy,
    /// Added to the normalizer's built-in exclusion prefixes.
    pub extra_excluded_prefixes: Vec<String>,
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("parse pipeline config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("bad config file {}", path.display()))?;
        info!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }
}

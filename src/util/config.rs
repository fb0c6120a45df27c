//! Configuration for adapter synthesis.
//!
//! The engine needs no configuration to run; `Config::default()` is what the
//! process-wide synthesizer uses. Hosts that want stricter matching or a
//! different adapter naming scheme can load a TOML file:
//!
//! ```toml
//! [synthesis]
//! strict_returns = true
//! adapter_suffix = "Proxy"
//! report_all_missing = false
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Synthesis settings
    pub synthesis: SynthesisConfig,
}

/// Settings consumed by [`crate::synth::Synthesizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Also require equal return shapes when matching members
    pub strict_returns: bool,

    /// Suffix of generated adapter type names (`{Contract}_{Source}_{suffix}`)
    pub adapter_suffix: String,

    /// Report every unmatched member of a contract, not only the first
    #[serde(default = "default_true")]
    pub report_all_missing: bool,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        SynthesisConfig {
            strict_returns: false,
            adapter_suffix: default_suffix(),
            report_all_missing: true,
        }
    }
}

fn default_suffix() -> String {
    "Adapter".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse synthesis config")?;

        if config.synthesis.adapter_suffix.trim().is_empty() {
            anyhow::bail!("`synthesis.adapter_suffix` must not be empty");
        }

        Ok(config)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("failed to load config file: {}", path.display()))
    }

    /// Load configuration, falling back to defaults if the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence where it
    /// differs from the defaults).
    pub fn merge(&mut self, other: Config) {
        let defaults = SynthesisConfig::default();

        if other.synthesis.strict_returns != defaults.strict_returns {
            self.synthesis.strict_returns = other.synthesis.strict_returns;
        }
        if other.synthesis.adapter_suffix != defaults.adapter_suffix {
            self.synthesis.adapter_suffix = other.synthesis.adapter_suffix;
        }
        if other.synthesis.report_all_missing != defaults.report_all_missing {
            self.synthesis.report_all_missing = other.synthesis.report_all_missing;
        }
    }
}

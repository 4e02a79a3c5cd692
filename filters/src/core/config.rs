use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::constants::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_JSON_BYTES, DEFAULT_MAX_RULES, ENV_MAX_DEPTH,
    ENV_MAX_JSON_BYTES, ENV_MAX_RULES,
};

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Limits applied while parsing untrusted rule trees
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterConfig {
    pub max_rules: usize,
    pub max_depth: usize,
    pub max_json_bytes: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_rules: DEFAULT_MAX_RULES,
            max_depth: DEFAULT_MAX_DEPTH,
            max_json_bytes: DEFAULT_MAX_JSON_BYTES,
        }
    }
}

// =============================================================================
// File Configuration
// =============================================================================

/// On-disk configuration, every field optional
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub max_rules: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_json_bytes: Option<usize>,
}

impl FileConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading filter config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed filter config file");
        Ok(config)
    }
}

impl FilterConfig {
    /// Layer configs: defaults -> file config -> environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_config = match path {
            Some(path) => FileConfig::load_from_file(path)?,
            None => FileConfig::default(),
        };

        let config = Self::from_file_config(file_config)
            .with_overrides(|key| std::env::var(key).ok())?;
        tracing::debug!(
            max_rules = config.max_rules,
            max_depth = config.max_depth,
            max_json_bytes = config.max_json_bytes,
            "Filter config loaded"
        );
        Ok(config)
    }

    pub fn from_file_config(file: FileConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_rules: file.max_rules.unwrap_or(defaults.max_rules),
            max_depth: file.max_depth.unwrap_or(defaults.max_depth),
            max_json_bytes: file.max_json_bytes.unwrap_or(defaults.max_json_bytes),
        }
    }

    /// Apply overrides from a variable source (the process environment in `load`)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| -> Result<Option<usize>> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<usize>()
                    .map(Some)
                    .with_context(|| format!("Invalid value for {}: {}", key, raw)),
                None => Ok(None),
            }
        };

        if let Some(v) = read(ENV_MAX_RULES)? {
            self.max_rules = v;
        }
        if let Some(v) = read(ENV_MAX_DEPTH)? {
            self.max_depth = v;
        }
        if let Some(v) = read(ENV_MAX_JSON_BYTES)? {
            self.max_json_bytes = v;
        }
        Ok(self)
    }
}

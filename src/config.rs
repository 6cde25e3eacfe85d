// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Evaluation configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file looked up by [`EvalConfig::load`]
pub const CONFIG_FILE: &str = "polyframe-csg.toml";

/// Evaluation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Maximum total weight (vertex count) held by the geometry cache
    pub cache_capacity: usize,
    /// Re-emit stored diagnostics through the log on cache hits
    pub replay_warnings: bool,
    /// Remaining stack below which recursion switches to a fresh segment
    pub stack_red_zone: usize,
    /// Size of each additional stack segment
    pub stack_growth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 100_000,
            replay_warnings: true,
            stack_red_zone: 64 * 1024,
            stack_growth: 1024 * 1024,
        }
    }
}

impl EvalConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: EvalConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `polyframe-csg.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply `POLYFRAME_*` overrides from a variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(capacity) = lookup("POLYFRAME_CACHE_CAPACITY").and_then(|v| v.parse().ok()) {
            self.cache_capacity = capacity;
        }

        if let Some(replay) = lookup("POLYFRAME_REPLAY_WARNINGS") {
            self.replay_warnings = replay.parse().unwrap_or(self.replay_warnings);
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}

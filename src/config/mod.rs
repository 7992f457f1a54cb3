// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration for compliancebot

use crate::catalog::{BrandConfiguration, Catalog};
use crate::error::{EngineError, Result};
use crate::orchestrator::SweepControl;
use crate::performance::{EnvironmentInfo, PerformanceOptions, SyntheticMetrics, DEFAULT_SEED};
use crate::theme::ThemeOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub orchestrator: OrchestratorConfig,
    /// Merged into the built-in catalog; same identifier replaces
    pub brands: Vec<BrandConfiguration>,
    pub environment: EnvironmentInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the synthetic metrics source
    pub seed: u64,
    pub measurement_runs: usize,
    pub warmup_runs: usize,
    pub test_cross_theme: bool,
    pub test_cross_environment: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Wall-clock budget for a sweep; unset means unbounded
    pub wall_clock_budget_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let performance = PerformanceOptions::default();
        Self {
            seed: DEFAULT_SEED,
            measurement_runs: performance.measurement_runs,
            warmup_runs: performance.warmup_runs,
            test_cross_theme: false,
            test_cross_environment: performance.test_cross_environment,
        }
    }
}

impl Config {
    /// Built-in catalog plus configured brands
    pub fn catalog(&self) -> Catalog {
        Catalog::builtin().with_brands(self.brands.iter().cloned())
    }

    pub fn theme_options(&self) -> ThemeOptions {
        ThemeOptions {
            test_cross_theme: self.engine.test_cross_theme,
        }
    }

    pub fn performance_options(&self) -> PerformanceOptions {
        PerformanceOptions {
            measurement_runs: self.engine.measurement_runs,
            warmup_runs: self.engine.warmup_runs,
            test_cross_environment: self.engine.test_cross_environment,
        }
    }

    pub fn metrics(&self) -> SyntheticMetrics {
        SyntheticMetrics::seeded(self.engine.seed)
    }

    pub fn sweep_control(&self) -> SweepControl {
        match self.orchestrator.wall_clock_budget_secs {
            Some(secs) => SweepControl::new().with_budget(Duration::from_secs(secs)),
            None => SweepControl::new(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("compliancebot")
        .join("config.yml")
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    if path.extension().and_then(|s| s.to_str()) == Some("toml") {
        toml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("TOML parse error: {}", e)))
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("YAML parse error: {}", e)))
    }
}

pub fn write_default_config(path: &Path) -> Result<()> {
    let config = Config::default();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, render_config(&config, path)?)?;
    Ok(())
}

/// Serialize in the format implied by the file extension
pub fn render_config(config: &Config, path: &Path) -> Result<String> {
    if path.extension().and_then(|s| s.to_str()) == Some("toml") {
        toml::to_string_pretty(config)
            .map_err(|e| EngineError::Config(format!("TOML serialize error: {}", e)))
    } else {
        Ok(serde_yaml::to_string(config)?)
    }
}

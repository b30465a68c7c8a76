//! Analytics configuration
//!
//! Every threshold, window and limit the engines use lives here with the
//! default values they ship with. Overrides are read from a TOML file:
//!
//! ```toml
//! [anomaly]
//! low_z = 2.2
//!
//! [forecast]
//! window_months = 12
//! trend_deadband = 5.0
//! ```
//!
//! Sections and keys that are omitted keep their defaults.
//! Default location: `~/.config/spendwise/analytics.toml` (platform config dir).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Z-score anomaly detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Trailing window of transactions to inspect
    pub window_months: u32,
    /// Minimum transactions overall before detection runs
    pub min_transactions: usize,
    /// Income/expense partitions smaller than this are skipped
    pub min_cohort_size: usize,
    /// |z| strictly above this is High
    pub high_z: f64,
    /// |z| strictly above this is Medium
    pub medium_z: f64,
    /// |z| strictly above this is Low; anything else is not reported
    pub low_z: f64,
    /// Findings returned after sorting
    pub max_results: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window_months: 3,
            min_transactions: 5,
            min_cohort_size: 3,
            high_z: 3.0,
            medium_z: 2.5,
            low_z: 2.0,
            max_results: 10,
        }
    }
}

/// Health score settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Months of expenses used for the stability sub-score
    pub stability_window_months: u32,
    /// Savings rate (percent) that earns the full 25 points
    pub target_savings_rate: f64,
    /// CV (percent) at or below which stability is perfect
    pub cv_baseline: f64,
    /// Points lost per CV percentage point above the baseline
    pub cv_penalty: f64,
    /// Distinct expense categories that earn the full 25 points
    pub diversification_target: usize,
    /// Sub-scores below this get an improvement suggestion
    pub improvement_threshold: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            stability_window_months: 3,
            target_savings_rate: 20.0,
            cv_baseline: 20.0,
            cv_penalty: 0.5,
            diversification_target: 5,
            improvement_threshold: 20.0,
        }
    }
}

/// Forecast settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Trailing window of monthly aggregates
    pub window_months: u32,
    /// Distinct months required before forecasting
    pub min_months: usize,
    /// Months projected when the caller does not ask for a horizon
    pub default_horizon: u32,
    /// Largest horizon accepted
    pub max_horizon: u32,
    /// |slope| at or below this is reported as "stable"
    pub trend_deadband: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window_months: 6,
            min_months: 3,
            default_horizon: 3,
            max_horizon: 12,
            trend_deadband: 0.0,
        }
    }
}

/// Smart budget advisor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub window_months: u32,
    /// Suggestions returned after sorting
    pub max_suggestions: usize,
    /// Essential categories under this share of income may be under-budgeted
    pub increase_below_percent: f64,
    /// ...but only when they have fewer transactions than this
    pub increase_max_count: usize,
    /// "Maintain" suggestions are dropped at or below this share of income
    pub maintain_min_percent: f64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            window_months: 3,
            max_suggestions: 8,
            increase_below_percent: 2.0,
            increase_max_count: 3,
            maintain_min_percent: 5.0,
        }
    }
}

/// Spending pattern detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub window_months: u32,
    pub min_transactions: usize,
    pub top_categories: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            window_months: 3,
            min_transactions: 10,
            top_categories: 5,
        }
    }
}

/// Savings recommender settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavingsConfig {
    pub window_months: u32,
    pub min_transactions: usize,
}

impl Default for SavingsConfig {
    fn default() -> Self {
        Self {
            window_months: 3,
            min_transactions: 5,
        }
    }
}

/// All analytics settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub anomaly: AnomalyConfig,
    pub health: HealthConfig,
    pub forecast: ForecastConfig,
    pub advisor: AdvisorConfig,
    pub patterns: PatternConfig,
    pub savings: SavingsConfig,
}

impl AnalyticsConfig {
    /// Load from an explicit path, else the default location, else built-in defaults
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        match path {
            Some(path) => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                let config = Self::parse(&content)?;
                tracing::debug!(path = %path.display(), "Loaded analytics config");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse TOML content, filling omitted keys with defaults
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid analytics config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let a = &self.anomaly;
        if !(a.high_z >= a.medium_z && a.medium_z >= a.low_z && a.low_z > 0.0) {
            return Err(Error::Config(
                "anomaly thresholds must satisfy high_z >= medium_z >= low_z > 0".into(),
            ));
        }
        if self.forecast.min_months < 2 {
            return Err(Error::Config("forecast.min_months must be at least 2".into()));
        }
        if self.forecast.max_horizon == 0 {
            return Err(Error::Config("forecast.max_horizon must be at least 1".into()));
        }
        if self.forecast.trend_deadband < 0.0 {
            return Err(Error::Config("forecast.trend_deadband cannot be negative".into()));
        }
        if self.health.target_savings_rate <= 0.0 || self.health.diversification_target == 0 {
            return Err(Error::Config(
                "health targets must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Get the default config file path (platform config dir)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("spendwise").join("analytics.toml"))
}

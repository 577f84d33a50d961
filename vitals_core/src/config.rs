//! Configuration file support for Vitals.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/vitals/config.toml`.

use crate::{AuthorizationState, Error, MetricKind, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub trends: TrendConfig,

    #[serde(default)]
    pub fitness: FitnessConfig,

    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Trend window sizes and the metrics a report watches
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrendConfig {
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,

    #[serde(default = "default_baseline_window")]
    pub baseline_window: usize,

    /// How many days of series a report reads for trend analysis
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,

    #[serde(default = "default_watched_metrics")]
    pub watched: Vec<MetricKind>,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            recent_window: default_recent_window(),
            baseline_window: default_baseline_window(),
            lookback_days: default_lookback_days(),
            watched: default_watched_metrics(),
        }
    }
}

/// Longest trailing window, in days, any lookback may span
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Index values at which a capability reaches each level above Beginner
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LevelThresholds {
    pub intermediate: f64,
    pub advanced: f64,
    pub elite: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            intermediate: 30.0,
            advanced: 60.0,
            elite: 100.0,
        }
    }
}

/// Fitness assessment parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FitnessConfig {
    #[serde(default = "default_window_days")]
    pub window_days: i64,

    #[serde(default = "default_expected_days_per_week")]
    pub expected_days_per_week: u32,

    /// Index points per session per week
    #[serde(default = "default_frequency_weight")]
    pub frequency_weight: f64,

    /// Index points per RPE point of each session, per week
    #[serde(default = "default_intensity_weight")]
    pub intensity_weight: f64,

    /// Strength index points per weekly personal record
    #[serde(default = "default_pr_weight")]
    pub pr_weight: f64,

    /// Strength index points per tonne lifted per week
    #[serde(default = "default_volume_weight")]
    pub volume_weight: f64,

    /// VO2 max below which the cardio index gets no bonus
    #[serde(default = "default_vo2_baseline")]
    pub vo2_baseline: f64,

    #[serde(default)]
    pub cardio: LevelThresholds,

    #[serde(default)]
    pub strength: LevelThresholds,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            expected_days_per_week: default_expected_days_per_week(),
            frequency_weight: default_frequency_weight(),
            intensity_weight: default_intensity_weight(),
            pr_weight: default_pr_weight(),
            volume_weight: default_volume_weight(),
            vo2_baseline: default_vo2_baseline(),
            cardio: LevelThresholds::default(),
            strength: LevelThresholds::default(),
        }
    }
}

/// Settings for the file-backed health data provider
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_authorization")]
    pub authorization: AuthorizationState,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            authorization: default_authorization(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("vitals")
}

fn default_recent_window() -> usize {
    3
}

fn default_baseline_window() -> usize {
    4
}

fn default_lookback_days() -> i64 {
    14
}

fn default_watched_metrics() -> Vec<MetricKind> {
    vec![
        MetricKind::Steps,
        MetricKind::ActiveCalories,
        MetricKind::RestingHeartRate,
        MetricKind::SleepDuration,
        MetricKind::WorkoutLoad,
        MetricKind::Weight,
    ]
}

fn default_window_days() -> i64 {
    28
}

fn default_expected_days_per_week() -> u32 {
    4
}

fn default_frequency_weight() -> f64 {
    6.0
}

fn default_intensity_weight() -> f64 {
    2.0
}

fn default_pr_weight() -> f64 {
    5.0
}

fn default_volume_weight() -> f64 {
    0.5
}

fn default_vo2_baseline() -> f64 {
    35.0
}

fn default_authorization() -> AuthorizationState {
    AuthorizationState::Granted
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("vitals").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject settings the engine cannot use
    ///
    /// Level thresholds must ascend so that more training never maps to a
    /// lower level.
    pub fn validate(&self) -> Result<()> {
        if self.trends.recent_window == 0 || self.trends.baseline_window == 0 {
            return Err(Error::Config("trend windows must be at least 1".into()));
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.trends.lookback_days) {
            return Err(Error::Config(format!(
                "trends.lookback_days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }
        if !(7..=MAX_WINDOW_DAYS).contains(&self.fitness.window_days) {
            return Err(Error::Config(format!(
                "fitness.window_days must be between 7 and {}",
                MAX_WINDOW_DAYS
            )));
        }
        if self.fitness.expected_days_per_week == 0 || self.fitness.expected_days_per_week > 7 {
            return Err(Error::Config(
                "fitness.expected_days_per_week must be between 1 and 7".into(),
            ));
        }
        for weight in [
            self.fitness.frequency_weight,
            self.fitness.intensity_weight,
            self.fitness.pr_weight,
            self.fitness.volume_weight,
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::Config("fitness weights must be non-negative".into()));
            }
        }
        for (name, t) in [("cardio", &self.fitness.cardio), ("strength", &self.fitness.strength)] {
            if !(t.intermediate <= t.advanced && t.advanced <= t.elite) {
                return Err(Error::Config(format!(
                    "fitness.{} thresholds must ascend (intermediate <= advanced <= elite)",
                    name
                )));
            }
        }
        Ok(())
    }
}

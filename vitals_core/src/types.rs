//! Core domain types for the health intelligence engine.
//!
//! This module defines the fundamental types shared by every component:
//! - Metric kinds and the samples the provider hands us
//! - Daily metric bundles and short histories used by scoring
//! - Workout records used by the fitness assessor
//! - Coarse classifications (trend direction, fitness level, authorization)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Metric Types
// ============================================================================

/// Category of biometric or activity measurement
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Steps,
    ActiveCalories,
    RestingHeartRate,
    /// Hours asleep
    SleepDuration,
    WorkoutLoad,
    /// Body weight in kilograms
    Weight,
    /// Estimated VO2 max (ml/kg/min)
    Vo2Max,
}

/// How a metric's trend is judged significant
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrendThreshold {
    /// Fraction of the baseline average (0.10 = ±10%)
    Relative(f64),
    /// Absolute units above or below the baseline average
    Absolute(f64),
}

/// How intraday samples collapse into a single daily value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DailyAggregation {
    Sum,
    Average,
}

impl MetricKind {
    /// Every known metric kind, in declaration order
    pub const ALL: [MetricKind; 7] = [
        MetricKind::Steps,
        MetricKind::ActiveCalories,
        MetricKind::RestingHeartRate,
        MetricKind::SleepDuration,
        MetricKind::WorkoutLoad,
        MetricKind::Weight,
        MetricKind::Vo2Max,
    ];

    /// Stable snake_case identifier used in CSV, TOML and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Steps => "steps",
            MetricKind::ActiveCalories => "active_calories",
            MetricKind::RestingHeartRate => "resting_heart_rate",
            MetricKind::SleepDuration => "sleep_duration",
            MetricKind::WorkoutLoad => "workout_load",
            MetricKind::Weight => "weight",
            MetricKind::Vo2Max => "vo2_max",
        }
    }

    /// Plausible range of a single daily value (inclusive)
    ///
    /// Readings outside this range are treated as sensor noise and ignored
    /// when daily values are built.
    pub fn normal_range(&self) -> (f64, f64) {
        match self {
            MetricKind::Steps => (0.0, 100_000.0),
            MetricKind::ActiveCalories => (0.0, 10_000.0),
            MetricKind::RestingHeartRate => (25.0, 220.0),
            MetricKind::SleepDuration => (0.0, 24.0),
            MetricKind::WorkoutLoad => (0.0, 10_000.0),
            MetricKind::Weight => (20.0, 400.0),
            MetricKind::Vo2Max => (10.0, 95.0),
        }
    }

    pub fn is_within_normal_range(&self, value: f64) -> bool {
        let (low, high) = self.normal_range();
        value.is_finite() && value >= low && value <= high
    }

    /// Count-like metrics move by percentage, rate-like metrics by units
    pub fn trend_threshold(&self) -> TrendThreshold {
        match self {
            MetricKind::RestingHeartRate | MetricKind::Weight | MetricKind::Vo2Max => {
                TrendThreshold::Absolute(2.0)
            }
            MetricKind::Steps
            | MetricKind::ActiveCalories
            | MetricKind::SleepDuration
            | MetricKind::WorkoutLoad => TrendThreshold::Relative(0.10),
        }
    }

    pub fn daily_aggregation(&self) -> DailyAggregation {
        match self {
            MetricKind::Steps
            | MetricKind::ActiveCalories
            | MetricKind::SleepDuration
            | MetricKind::WorkoutLoad => DailyAggregation::Sum,
            MetricKind::RestingHeartRate | MetricKind::Weight | MetricKind::Vo2Max => {
                DailyAggregation::Average
            }
        }
    }

    /// Whether a falling value is the good direction for this metric
    pub fn lower_is_better(&self) -> bool {
        matches!(self, MetricKind::RestingHeartRate)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "steps" | "step_count" => Ok(MetricKind::Steps),
            "active_calories" | "calories" => Ok(MetricKind::ActiveCalories),
            "resting_heart_rate" | "resting_hr" | "heart_rate" => {
                Ok(MetricKind::RestingHeartRate)
            }
            "sleep_duration" | "sleep" => Ok(MetricKind::SleepDuration),
            "workout_load" | "load" => Ok(MetricKind::WorkoutLoad),
            "weight" => Ok(MetricKind::Weight),
            "vo2_max" | "vo2max" => Ok(MetricKind::Vo2Max),
            other => Err(crate::Error::Parse(format!("Unknown metric kind: {}", other))),
        }
    }
}

/// A single time-stamped reading supplied by the health-data provider
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MetricSample {
    pub metric: MetricKind,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl MetricSample {
    pub fn new(metric: MetricKind, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            metric,
            timestamp,
            value,
        }
    }
}

// ============================================================================
// Daily Bundles and History
// ============================================================================

/// One day's worth of metric values; any of them may be missing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MetricBundle {
    pub date: NaiveDate,
    pub resting_heart_rate: Option<f64>,
    pub steps: Option<f64>,
    pub active_calories: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub workout_load: Option<f64>,
    pub weight: Option<f64>,
}

impl MetricBundle {
    /// An empty bundle for the given day
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            resting_heart_rate: None,
            steps: None,
            active_calories: None,
            sleep_hours: None,
            workout_load: None,
            weight: None,
        }
    }

    /// Look up the value for a metric kind
    ///
    /// VO2 max is not tracked per day and always reads as absent.
    pub fn value(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::Steps => self.steps,
            MetricKind::ActiveCalories => self.active_calories,
            MetricKind::RestingHeartRate => self.resting_heart_rate,
            MetricKind::SleepDuration => self.sleep_hours,
            MetricKind::WorkoutLoad => self.workout_load,
            MetricKind::Weight => self.weight,
            MetricKind::Vo2Max => None,
        }
    }

    pub fn set(&mut self, metric: MetricKind, value: Option<f64>) {
        match metric {
            MetricKind::Steps => self.steps = value,
            MetricKind::ActiveCalories => self.active_calories = value,
            MetricKind::RestingHeartRate => self.resting_heart_rate = value,
            MetricKind::SleepDuration => self.sleep_hours = value,
            MetricKind::WorkoutLoad => self.workout_load = value,
            MetricKind::Weight => self.weight = value,
            MetricKind::Vo2Max => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        MetricKind::ALL.iter().all(|kind| self.value(*kind).is_none())
    }
}

/// Prior days' bundles, oldest first
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricHistory {
    pub days: Vec<MetricBundle>,
}

impl MetricHistory {
    pub fn new(mut days: Vec<MetricBundle>) -> Self {
        days.sort_by_key(|d| d.date);
        Self { days }
    }

    /// The last `n` days that carry a value for `metric`, oldest first
    pub fn trailing_values(&self, metric: MetricKind, n: usize) -> Vec<f64> {
        let mut values: Vec<f64> = self
            .days
            .iter()
            .rev()
            .filter_map(|d| d.value(metric))
            .take(n)
            .collect();
        values.reverse();
        values
    }
}

// ============================================================================
// Workout Types
// ============================================================================

/// Kind of logged workout
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutKind {
    Cardio,
    Strength,
    /// Counts toward both cardio and strength (circuits, CrossFit-style)
    Mixed,
}

impl WorkoutKind {
    pub fn trains_cardio(&self) -> bool {
        matches!(self, WorkoutKind::Cardio | WorkoutKind::Mixed)
    }

    pub fn trains_strength(&self) -> bool {
        matches!(self, WorkoutKind::Strength | WorkoutKind::Mixed)
    }
}

impl FromStr for WorkoutKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cardio" | "run" | "ride" | "swim" => Ok(WorkoutKind::Cardio),
            "strength" | "lift" | "weights" => Ok(WorkoutKind::Strength),
            "mixed" | "circuit" | "hiit" => Ok(WorkoutKind::Mixed),
            other => Err(crate::Error::Parse(format!("Unknown workout kind: {}", other))),
        }
    }
}

/// A logged workout session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub performed_at: DateTime<Utc>,
    pub kind: WorkoutKind,
    pub duration_minutes: u32,
    /// Session RPE on a 1-10 scale
    pub intensity: f64,
    /// Total lifted volume (kg x reps) for strength work, if recorded
    pub volume: Option<f64>,
    pub personal_record: bool,
}

impl WorkoutRecord {
    /// Session load: minutes x RPE
    pub fn load(&self) -> f64 {
        self.duration_minutes as f64 * self.intensity.clamp(0.0, 10.0)
    }
}

// ============================================================================
// Classifications
// ============================================================================

/// Coarse direction of a metric's recent trajectory
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    /// Whether this direction is good news for the given metric
    ///
    /// A falling resting heart rate is an improvement; for the count-like
    /// metrics a rise is.
    pub fn is_improvement(&self, metric: MetricKind) -> bool {
        match self {
            TrendDirection::Stable => false,
            TrendDirection::Increasing => !metric.lower_is_better(),
            TrendDirection::Decreasing => metric.lower_is_better(),
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// Ordinal fitness level
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FitnessLevel {
    Beginner,
    Intermediate,
    Advanced,
    Elite,
}

impl FitnessLevel {
    pub fn rank(&self) -> u8 {
        match self {
            FitnessLevel::Beginner => 0,
            FitnessLevel::Intermediate => 1,
            FitnessLevel::Advanced => 2,
            FitnessLevel::Elite => 3,
        }
    }

    /// Inverse of `rank`; ranks above 3 saturate at Elite
    pub fn from_rank(rank: u8) -> Self {
        match rank {
            0 => FitnessLevel::Beginner,
            1 => FitnessLevel::Intermediate,
            2 => FitnessLevel::Advanced,
            _ => FitnessLevel::Elite,
        }
    }
}

impl fmt::Display for FitnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitnessLevel::Beginner => write!(f, "Beginner"),
            FitnessLevel::Intermediate => write!(f, "Intermediate"),
            FitnessLevel::Advanced => write!(f, "Advanced"),
            FitnessLevel::Elite => write!(f, "Elite"),
        }
    }
}

/// Whether the platform health store lets us read
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    Granted,
    Denied,
    #[default]
    NotDetermined,
}

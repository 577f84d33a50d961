//! Fitness level assessment from workout history.
//!
//! Cardio and strength capability are each reduced to an index built from
//! the trailing window of workouts:
//! - every session adds `frequency_weight + intensity_weight * RPE`
//!   (normalized per week)
//! - cardio adds a bonus for VO2 max above a baseline
//! - strength adds a bonus per weekly personal record and per tonne lifted
//!
//! Indices map to levels through ascending thresholds. No term can shrink
//! when a session is added or made harder, so more frequent and more intense
//! training never lowers a level.

use crate::config::{FitnessConfig, LevelThresholds};
use crate::trend::{classify_trend, TrendWindows};
use crate::{FitnessLevel, MetricKind, MetricSample, TrendDirection, WorkoutRecord};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Days covered by the consistency score
pub const CONSISTENCY_WINDOW_DAYS: i64 = 28;

/// Workout history as seen at a point in time
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutHistory {
    pub as_of: DateTime<Utc>,
    pub workouts: Vec<WorkoutRecord>,
    /// Latest VO2 max estimate, if the provider has one
    pub vo2_max: Option<f64>,
}

impl WorkoutHistory {
    pub fn new(as_of: DateTime<Utc>, workouts: Vec<WorkoutRecord>) -> Self {
        Self {
            as_of,
            workouts,
            vo2_max: None,
        }
    }

    pub fn with_vo2_max(mut self, vo2_max: Option<f64>) -> Self {
        self.vo2_max = vo2_max;
        self
    }

    /// Workouts in `(as_of - days, as_of]`, oldest first
    ///
    /// A span past chrono's range covers the whole history.
    fn within_days(&self, days: i64) -> Vec<&WorkoutRecord> {
        let start = Duration::try_days(days)
            .and_then(|span| self.as_of.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut recent: Vec<&WorkoutRecord> = self
            .workouts
            .iter()
            .filter(|w| w.performed_at > start && w.performed_at <= self.as_of)
            .collect();
        recent.sort_by_key(|w| w.performed_at);
        recent
    }
}

/// Ordinal cardio/strength classification plus training consistency
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FitnessLevelAssessment {
    pub overall_level: FitnessLevel,
    pub cardio_level: FitnessLevel,
    pub strength_level: FitnessLevel,
    /// Percentage of expected training days logged in the last four weeks
    pub consistency_score: f64,
    pub progress_trend: TrendDirection,
}

/// Assess fitness from the trailing window of workouts
pub fn assess_fitness(
    history: &WorkoutHistory,
    config: &FitnessConfig,
    windows: TrendWindows,
) -> FitnessLevelAssessment {
    let window = history.within_days(config.window_days.max(1));
    let weeks = config.window_days.max(1) as f64 / 7.0;

    let cardio_index = cardio_index(&window, weeks, history.vo2_max, config);
    let strength_index = strength_index(&window, weeks, config);

    let cardio_level = level_for(cardio_index, &config.cardio);
    let strength_level = level_for(strength_index, &config.strength);
    let overall_level = FitnessLevel::from_rank((cardio_level.rank() + strength_level.rank()) / 2);

    let consistency_score = consistency_score(history, config.expected_days_per_week);
    let progress_trend = progress_trend(&window, windows);

    tracing::debug!(
        "Fitness: {} workouts in {} days, cardio index {:.1} ({}), strength index {:.1} ({}), consistency {:.0}%",
        window.len(),
        config.window_days,
        cardio_index,
        cardio_level,
        strength_index,
        strength_level,
        consistency_score
    );

    FitnessLevelAssessment {
        overall_level,
        cardio_level,
        strength_level,
        consistency_score,
        progress_trend,
    }
}

/// Map an index to a level using ascending thresholds
pub fn level_for(index: f64, thresholds: &LevelThresholds) -> FitnessLevel {
    if index >= thresholds.elite {
        FitnessLevel::Elite
    } else if index >= thresholds.advanced {
        FitnessLevel::Advanced
    } else if index >= thresholds.intermediate {
        FitnessLevel::Intermediate
    } else {
        FitnessLevel::Beginner
    }
}

fn session_stimulus<'a>(
    workouts: impl Iterator<Item = &'a WorkoutRecord>,
    weeks: f64,
    config: &FitnessConfig,
) -> f64 {
    let total: f64 = workouts
        .map(|w| config.frequency_weight + config.intensity_weight * sanitize_rpe(w.intensity))
        .sum();
    total / weeks
}

fn cardio_index(
    window: &[&WorkoutRecord],
    weeks: f64,
    vo2_max: Option<f64>,
    config: &FitnessConfig,
) -> f64 {
    let stimulus = session_stimulus(
        window.iter().copied().filter(|w| w.kind.trains_cardio()),
        weeks,
        config,
    );
    let vo2_bonus = vo2_max
        .filter(|v| MetricKind::Vo2Max.is_within_normal_range(*v))
        .map(|v| (v - config.vo2_baseline).max(0.0))
        .unwrap_or(0.0);
    stimulus + vo2_bonus
}

fn strength_index(window: &[&WorkoutRecord], weeks: f64, config: &FitnessConfig) -> f64 {
    let stimulus = session_stimulus(
        window.iter().copied().filter(|w| w.kind.trains_strength()),
        weeks,
        config,
    );
    let records = window
        .iter()
        .filter(|w| w.kind.trains_strength() && w.personal_record)
        .count() as f64;
    let tonnes: f64 = window
        .iter()
        .filter(|w| w.kind.trains_strength())
        .filter_map(|w| w.volume)
        .filter(|v| v.is_finite() && *v > 0.0)
        .sum::<f64>()
        / 1000.0;
    stimulus + records / weeks * config.pr_weight + tonnes / weeks * config.volume_weight
}

/// Percentage of expected training days actually logged over four weeks
fn consistency_score(history: &WorkoutHistory, expected_days_per_week: u32) -> f64 {
    let expected = (expected_days_per_week.max(1) * 4) as f64;
    let days: HashSet<NaiveDate> = history
        .within_days(CONSISTENCY_WINDOW_DAYS)
        .iter()
        .map(|w| w.performed_at.date_naive())
        .collect();

    (days.len() as f64 / expected * 100.0).clamp(0.0, 100.0)
}

/// Trend of per-session load over the window
fn progress_trend(window: &[&WorkoutRecord], windows: TrendWindows) -> TrendDirection {
    let loads: Vec<MetricSample> = window
        .iter()
        .map(|w| MetricSample::new(MetricKind::WorkoutLoad, w.performed_at, w.load()))
        .collect();
    classify_trend(&loads, windows.recent, windows.baseline)
}

fn sanitize_rpe(rpe: f64) -> f64 {
    if rpe.is_finite() {
        rpe.clamp(0.0, 10.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkoutKind;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 29, 20, 0, 0).unwrap()
    }

    fn workout(kind: WorkoutKind, days_ago: i64, minutes: u32, rpe: f64) -> WorkoutRecord {
        WorkoutRecord {
            id: Uuid::new_v4(),
            performed_at: as_of() - Duration::days(days_ago),
            kind,
            duration_minutes: minutes,
            intensity: rpe,
            volume: None,
            personal_record: false,
        }
    }

    /// `per_week` sessions a week across the four-week window
    fn weekly_plan(kind: WorkoutKind, per_week: i64, rpe: f64) -> Vec<WorkoutRecord> {
        (0..4)
            .flat_map(|week| (0..per_week).map(move |d| week * 7 + d))
            .map(|days_ago| workout(kind, days_ago, 45, rpe))
            .collect()
    }

    fn assess(workouts: Vec<WorkoutRecord>) -> FitnessLevelAssessment {
        assess_fitness(
            &WorkoutHistory::new(as_of(), workouts),
            &FitnessConfig::default(),
            TrendWindows::default(),
        )
    }

    #[test]
    fn test_no_workouts_is_beginner() {
        let assessment = assess(vec![]);
        assert_eq!(assessment.overall_level, FitnessLevel::Beginner);
        assert_eq!(assessment.cardio_level, FitnessLevel::Beginner);
        assert_eq!(assessment.strength_level, FitnessLevel::Beginner);
        assert_eq!(assessment.consistency_score, 0.0);
        assert_eq!(assessment.progress_trend, TrendDirection::Stable);
    }

    #[test]
    fn test_cardio_levels_follow_volume() {
        // 2/wk at RPE 5 -> 2 * (6 + 10) = 32
        assert_eq!(
            assess(weekly_plan(WorkoutKind::Cardio, 2, 5.0)).cardio_level,
            FitnessLevel::Intermediate
        );
        // 4/wk at RPE 7 -> 4 * (6 + 14) = 80
        assert_eq!(
            assess(weekly_plan(WorkoutKind::Cardio, 4, 7.0)).cardio_level,
            FitnessLevel::Advanced
        );
        // 5/wk at RPE 8 -> 5 * (6 + 16) = 110
        assert_eq!(
            assess(weekly_plan(WorkoutKind::Cardio, 5, 8.0)).cardio_level,
            FitnessLevel::Elite
        );
    }

    #[test]
    fn test_vo2_max_lifts_cardio() {
        let workouts = weekly_plan(WorkoutKind::Cardio, 2, 5.0);
        let history = WorkoutHistory::new(as_of(), workouts).with_vo2_max(Some(65.0));
        let assessment =
            assess_fitness(&history, &FitnessConfig::default(), TrendWindows::default());
        // 32 + (65 - 35) = 62
        assert_eq!(assessment.cardio_level, FitnessLevel::Advanced);
    }

    #[test]
    fn test_personal_records_lift_strength() {
        // 2/wk at RPE 9.5 -> 2 * (6 + 19) = 50
        let mut workouts = weekly_plan(WorkoutKind::Strength, 2, 9.5);
        assert_eq!(assess(workouts.clone()).strength_level, FitnessLevel::Intermediate);

        // 8 PRs over 4 weeks -> +10
        for w in workouts.iter_mut() {
            w.personal_record = true;
        }
        assert_eq!(assess(workouts).strength_level, FitnessLevel::Advanced);
    }

    #[test]
    fn test_lifted_volume_lifts_strength() {
        // 2/wk at RPE 9.5 -> 50
        let mut workouts = weekly_plan(WorkoutKind::Strength, 2, 9.5);
        for w in workouts.iter_mut() {
            w.volume = Some(12_000.0);
        }
        // 96 t over 4 weeks -> 24 t/wk * 0.5 = +12
        assert_eq!(assess(workouts.clone()).strength_level, FitnessLevel::Advanced);

        // Cardio volume and junk values count for nothing
        for w in workouts.iter_mut() {
            w.volume = Some(f64::NAN);
        }
        workouts.push(WorkoutRecord {
            volume: Some(500_000.0),
            ..workout(WorkoutKind::Cardio, 2, 30, 5.0)
        });
        assert_eq!(assess(workouts).strength_level, FitnessLevel::Intermediate);
    }

    #[test]
    fn test_window_beyond_calendar_range_covers_all() {
        let config = FitnessConfig {
            window_days: i64::MAX,
            ..FitnessConfig::default()
        };
        let history = WorkoutHistory::new(as_of(), weekly_plan(WorkoutKind::Cardio, 4, 7.0));
        let assessment = assess_fitness(&history, &config, TrendWindows::default());
        assert_eq!(assessment.consistency_score, 100.0);
    }

    #[test]
    fn test_mixed_counts_for_both() {
        let assessment = assess(weekly_plan(WorkoutKind::Mixed, 4, 7.0));
        assert_eq!(assessment.cardio_level, FitnessLevel::Advanced);
        assert_eq!(assessment.strength_level, FitnessLevel::Advanced);
        assert_eq!(assessment.overall_level, FitnessLevel::Advanced);
    }

    #[test]
    fn test_overall_rounds_down() {
        let assessment = assess(weekly_plan(WorkoutKind::Cardio, 5, 8.0));
        assert_eq!(assessment.cardio_level, FitnessLevel::Elite);
        assert_eq!(assessment.strength_level, FitnessLevel::Beginner);
        assert_eq!(assessment.overall_level, FitnessLevel::Intermediate);
    }

    #[test]
    fn test_consistency_counts_distinct_days() {
        // Two sessions on the same day count once
        let workouts = vec![
            workout(WorkoutKind::Cardio, 1, 30, 5.0),
            workout(WorkoutKind::Strength, 1, 30, 5.0),
            workout(WorkoutKind::Cardio, 3, 30, 5.0),
            workout(WorkoutKind::Cardio, 5, 30, 5.0),
        ];
        // 3 days of 16 expected
        assert_eq!(assess(workouts).consistency_score, 18.75);
    }

    #[test]
    fn test_consistency_clamped_to_100() {
        let workouts = (0..28).map(|d| workout(WorkoutKind::Cardio, d, 30, 5.0)).collect();
        assert_eq!(assess(workouts).consistency_score, 100.0);
    }

    #[test]
    fn test_old_workouts_ignored() {
        let workouts = vec![
            workout(WorkoutKind::Cardio, 40, 60, 9.0),
            workout(WorkoutKind::Cardio, 45, 60, 9.0),
        ];
        let assessment = assess(workouts);
        assert_eq!(assessment.cardio_level, FitnessLevel::Beginner);
        assert_eq!(assessment.consistency_score, 0.0);
    }

    #[test]
    fn test_progress_trend_follows_load() {
        let mut workouts: Vec<WorkoutRecord> = (0..4)
            .map(|i| workout(WorkoutKind::Cardio, 20 - i, 30, 5.0))
            .collect();
        workouts.extend((0..3).map(|i| workout(WorkoutKind::Cardio, 3 - i, 60, 6.0)));
        assert_eq!(assess(workouts).progress_trend, TrendDirection::Increasing);
    }

    // Property-based tests using proptest
    use proptest::prelude::*;

    fn workout_strategy() -> impl Strategy<Value = WorkoutRecord> {
        (
            prop_oneof![
                Just(WorkoutKind::Cardio),
                Just(WorkoutKind::Strength),
                Just(WorkoutKind::Mixed)
            ],
            0i64..27,
            10u32..120,
            1.0f64..10.0,
            any::<bool>(),
            prop::option::of(0.0f64..20_000.0),
        )
            .prop_map(|(kind, days_ago, minutes, rpe, pr, volume)| {
                let mut w = workout(kind, days_ago, minutes, rpe);
                w.personal_record = pr;
                w.volume = volume;
                w
            })
    }

    proptest! {
        #[test]
        fn test_more_training_never_lowers_level(
            base in prop::collection::vec(workout_strategy(), 0..30),
            extra in workout_strategy(),
            harder_by in 0.0f64..5.0,
        ) {
            let before = assess(base.clone());

            let mut more = base.clone();
            more.push(extra);
            let after_more = assess(more);

            let harder: Vec<WorkoutRecord> = base
                .into_iter()
                .map(|mut w| {
                    w.intensity = (w.intensity + harder_by).min(10.0);
                    w
                })
                .collect();
            let after_harder = assess(harder);

            for after in [after_more, after_harder] {
                prop_assert!(after.cardio_level >= before.cardio_level);
                prop_assert!(after.strength_level >= before.strength_level);
                prop_assert!(after.overall_level >= before.overall_level);
                prop_assert!(after.consistency_score >= before.consistency_score);
                prop_assert!((0.0..=100.0).contains(&after.consistency_score));
            }
        }
    }
}

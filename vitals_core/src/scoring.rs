//! Recovery scoring.
//!
//! The recovery score is a base of 50 plus four banded sub-scores:
//! - Resting heart rate (max 30)
//! - Activity balance between steps and active calories (max 20)
//! - Trailing-week step pattern (max 10)
//! - Day-of-week calendar heuristic (max 10)
//!
//! The total is clamped to [10, 100]. Every input is optional and the
//! function is total: missing or garbage readings fall back to defaults.

use crate::{MetricBundle, MetricHistory, MetricKind};
use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BASE_SCORE: f64 = 50.0;
pub const MIN_SCORE: f64 = 10.0;
pub const MAX_SCORE: f64 = 100.0;

/// Resting heart rate assumed when none was recorded
pub const DEFAULT_RESTING_HEART_RATE: f64 = 70.0;

/// Steps above which a history day counts as active
pub const ACTIVE_DAY_STEPS: f64 = 3000.0;

/// Days of history the weekly pattern looks at
pub const WEEKLY_PATTERN_DAYS: usize = 7;

/// Banded recovery category
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryCategory {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl RecoveryCategory {
    /// Map an overall score to its band
    ///
    /// Lower bounds are inclusive: 80 is Excellent, 79.999 is Good.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RecoveryCategory::Excellent
        } else if score >= 60.0 {
            RecoveryCategory::Good
        } else if score >= 40.0 {
            RecoveryCategory::Fair
        } else {
            RecoveryCategory::Poor
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            RecoveryCategory::Excellent => {
                "You're well recovered. A good day for a hard or long session."
            }
            RecoveryCategory::Good => {
                "Recovery is solid. Train as planned and keep an eye on fatigue."
            }
            RecoveryCategory::Fair => {
                "Recovery is partial. Favor moderate effort or technique work today."
            }
            RecoveryCategory::Poor => {
                "Your body needs rest. Take an easy day and prioritize sleep."
            }
        }
    }
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Poor => write!(f, "Poor"),
            RecoveryCategory::Fair => write!(f, "Fair"),
            RecoveryCategory::Good => write!(f, "Good"),
            RecoveryCategory::Excellent => write!(f, "Excellent"),
        }
    }
}

/// Composite daily readiness score
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RecoveryScore {
    pub overall_score: f64,
    pub heart_rate_score: f64,
    pub activity_balance_score: f64,
    pub weekly_pattern_score: f64,
    pub day_of_week_score: f64,
    pub category: RecoveryCategory,
    pub recommendation: String,
}

impl RecoveryScore {
    /// Build a score from its sub-scores, applying the clamp and banding
    pub fn from_components(
        heart_rate_score: f64,
        activity_balance_score: f64,
        weekly_pattern_score: f64,
        day_of_week_score: f64,
    ) -> Self {
        let raw = BASE_SCORE
            + heart_rate_score
            + activity_balance_score
            + weekly_pattern_score
            + day_of_week_score;
        let overall_score = if raw.is_finite() {
            raw.clamp(MIN_SCORE, MAX_SCORE)
        } else {
            MIN_SCORE
        };
        let category = RecoveryCategory::from_score(overall_score);

        Self {
            overall_score,
            heart_rate_score,
            activity_balance_score,
            weekly_pattern_score,
            day_of_week_score,
            category,
            recommendation: category.recommendation().to_string(),
        }
    }
}

/// Compute today's recovery score
///
/// `recent_history` should hold the days before `today`; only the last
/// seven days with a step reading are used.
pub fn compute_recovery_score(
    today: &MetricBundle,
    recent_history: &MetricHistory,
) -> RecoveryScore {
    let heart_rate = heart_rate_score(today.resting_heart_rate);
    let activity = activity_balance_score(today.steps, today.active_calories);
    let weekly = weekly_pattern_score(recent_history);
    let day_of_week = day_of_week_score(today.date.weekday());

    let score = RecoveryScore::from_components(heart_rate, activity, weekly, day_of_week);

    tracing::debug!(
        "Recovery score for {}: hr={} activity={} weekly={} dow={} -> {} ({})",
        today.date,
        heart_rate,
        activity,
        weekly,
        day_of_week,
        score.overall_score,
        score.category
    );

    score
}

/// Banded resting heart rate score; lower resting HR scores higher
pub fn heart_rate_score(resting_heart_rate: Option<f64>) -> f64 {
    let hr = resting_heart_rate
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(DEFAULT_RESTING_HEART_RATE);

    if hr < 50.0 {
        30.0
    } else if hr < 60.0 {
        25.0
    } else if hr < 70.0 {
        20.0
    } else if hr < 80.0 {
        15.0
    } else if hr < 90.0 {
        10.0
    } else {
        5.0
    }
}

/// Score the balance of steps and active calories
///
/// A complete rest day earns the same 20 points as an optimal active day.
pub fn activity_balance_score(steps: Option<f64>, active_calories: Option<f64>) -> f64 {
    let steps = sanitize_count(steps);
    let calories = sanitize_count(active_calories);

    if steps >= 12_000.0 && calories >= 600.0 {
        20.0
    } else if steps >= 8_000.0 && calories >= 400.0 {
        15.0
    } else if steps >= 5_000.0 && calories >= 200.0 {
        10.0
    } else if steps < 2_000.0 && calories < 100.0 {
        20.0
    } else {
        5.0
    }
}

/// Score the trailing week's step pattern
pub fn weekly_pattern_score(recent_history: &MetricHistory) -> f64 {
    let steps: Vec<f64> = recent_history
        .trailing_values(MetricKind::Steps, WEEKLY_PATTERN_DAYS)
        .into_iter()
        .filter(|v| v.is_finite())
        .collect();

    if steps.is_empty() {
        return 3.0;
    }

    let days = steps.len() as f64;
    let average = steps.iter().sum::<f64>() / days;
    let active_fraction = steps.iter().filter(|s| **s > ACTIVE_DAY_STEPS).count() as f64 / days;

    if average >= 8_000.0 && active_fraction >= 0.6 {
        10.0
    } else if average >= 5_000.0 && active_fraction >= 0.4 {
        7.0
    } else {
        3.0
    }
}

/// Calendar heuristic: weekends recover best, midweek least
pub fn day_of_week_score(weekday: Weekday) -> f64 {
    match weekday {
        Weekday::Sat | Weekday::Sun => 8.0,
        Weekday::Mon | Weekday::Fri => 6.0,
        Weekday::Tue | Weekday::Wed | Weekday::Thu => 5.0,
    }
}

fn sanitize_count(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    // 2024-03-06 was a Wednesday, 2024-03-04 a Monday
    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn history_with_steps(today: NaiveDate, steps: &[f64]) -> MetricHistory {
        let n = steps.len() as i64;
        let days = steps
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut bundle = MetricBundle::new(today - Duration::days(n - i as i64));
                bundle.steps = Some(*s);
                bundle
            })
            .collect();
        MetricHistory::new(days)
    }

    #[test]
    fn test_well_recovered_day_clamps_to_100() {
        let mut today = MetricBundle::new(wednesday());
        today.resting_heart_rate = Some(55.0);
        today.steps = Some(9000.0);
        today.active_calories = Some(450.0);

        // avg 8500, 5 of 7 days above 3000
        let history = history_with_steps(
            wednesday(),
            &[12000.0, 11500.0, 2000.0, 12000.0, 11000.0, 1000.0, 10000.0],
        );

        let score = compute_recovery_score(&today, &history);

        assert_eq!(score.heart_rate_score, 25.0);
        assert_eq!(score.activity_balance_score, 15.0);
        assert_eq!(score.weekly_pattern_score, 10.0);
        assert_eq!(score.day_of_week_score, 5.0);
        assert_eq!(score.overall_score, 100.0);
        assert_eq!(score.category, RecoveryCategory::Excellent);
    }

    #[test]
    fn test_empty_monday_credits_rest() {
        let today = MetricBundle::new(monday());
        let score = compute_recovery_score(&today, &MetricHistory::default());

        assert_eq!(score.heart_rate_score, 15.0);
        assert_eq!(score.activity_balance_score, 20.0);
        assert_eq!(score.weekly_pattern_score, 3.0);
        assert_eq!(score.day_of_week_score, 6.0);
        assert_eq!(score.overall_score, 94.0);
        assert_eq!(score.category, RecoveryCategory::Excellent);
    }

    #[test]
    fn test_category_boundaries_are_exact() {
        assert_eq!(RecoveryCategory::from_score(80.0), RecoveryCategory::Excellent);
        assert_eq!(RecoveryCategory::from_score(79.999), RecoveryCategory::Good);
        assert_eq!(RecoveryCategory::from_score(60.0), RecoveryCategory::Good);
        assert_eq!(RecoveryCategory::from_score(59.999), RecoveryCategory::Fair);
        assert_eq!(RecoveryCategory::from_score(40.0), RecoveryCategory::Fair);
        assert_eq!(RecoveryCategory::from_score(39.999), RecoveryCategory::Poor);
        assert_eq!(RecoveryCategory::from_score(f64::NAN), RecoveryCategory::Poor);
    }

    #[test]
    fn test_heart_rate_bands() {
        assert_eq!(heart_rate_score(Some(45.0)), 30.0);
        assert_eq!(heart_rate_score(Some(50.0)), 25.0);
        assert_eq!(heart_rate_score(Some(59.9)), 25.0);
        assert_eq!(heart_rate_score(Some(60.0)), 20.0);
        assert_eq!(heart_rate_score(Some(75.0)), 15.0);
        assert_eq!(heart_rate_score(Some(85.0)), 10.0);
        assert_eq!(heart_rate_score(Some(90.0)), 5.0);
        assert_eq!(heart_rate_score(None), 15.0);
        assert_eq!(heart_rate_score(Some(f64::NAN)), 15.0);
        assert_eq!(heart_rate_score(Some(-4.0)), 15.0);
    }

    #[test]
    fn test_activity_bands() {
        assert_eq!(activity_balance_score(Some(12000.0), Some(600.0)), 20.0);
        assert_eq!(activity_balance_score(Some(8000.0), Some(400.0)), 15.0);
        assert_eq!(activity_balance_score(Some(5000.0), Some(200.0)), 10.0);
        assert_eq!(activity_balance_score(Some(1500.0), Some(50.0)), 20.0);
        assert_eq!(activity_balance_score(None, None), 20.0);
        // Lots of steps but no calories recorded falls through to the low band
        assert_eq!(activity_balance_score(Some(15000.0), None), 5.0);
        assert_eq!(activity_balance_score(Some(3000.0), Some(150.0)), 5.0);
    }

    #[test]
    fn test_weekly_pattern_bands() {
        let today = wednesday();
        assert_eq!(
            weekly_pattern_score(&history_with_steps(today, &[6000.0; 7])),
            7.0
        );
        assert_eq!(
            weekly_pattern_score(&history_with_steps(today, &[2500.0; 7])),
            3.0
        );
        // only the last seven readings count
        let mut steps = vec![0.0; 10];
        steps.extend([9000.0; 7]);
        assert_eq!(weekly_pattern_score(&history_with_steps(today, &steps)), 10.0);
    }

    #[test]
    fn test_day_of_week_table() {
        assert_eq!(day_of_week_score(Weekday::Sun), 8.0);
        assert_eq!(day_of_week_score(Weekday::Sat), 8.0);
        assert_eq!(day_of_week_score(Weekday::Mon), 6.0);
        assert_eq!(day_of_week_score(Weekday::Fri), 6.0);
        assert_eq!(day_of_week_score(Weekday::Thu), 5.0);
    }

    #[test]
    fn test_recommendation_follows_category() {
        let score = RecoveryScore::from_components(5.0, 5.0, 3.0, 5.0);
        assert_eq!(score.overall_score, 68.0);
        assert_eq!(score.category, RecoveryCategory::Good);
        assert_eq!(score.recommendation, RecoveryCategory::Good.recommendation());
    }

    // Property-based tests using proptest
    use proptest::prelude::*;

    fn any_reading() -> impl Strategy<Value = Option<f64>> {
        prop::option::of(prop_oneof![
            -1_000.0f64..200_000.0,
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(0.0),
        ])
    }

    proptest! {
        #[test]
        fn test_overall_score_always_in_range(
            hr in any_reading(),
            steps in any_reading(),
            calories in any_reading(),
            history_steps in prop::collection::vec(any_reading(), 0..14),
            day_offset in 0i64..7,
        ) {
            let date = monday() + Duration::days(day_offset);
            let mut today = MetricBundle::new(date);
            today.resting_heart_rate = hr;
            today.steps = steps;
            today.active_calories = calories;

            let days = history_steps
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    let mut b = MetricBundle::new(date - Duration::days(i as i64 + 1));
                    b.steps = *s;
                    b
                })
                .collect();

            let score = compute_recovery_score(&today, &MetricHistory::new(days));

            prop_assert!(score.overall_score >= MIN_SCORE);
            prop_assert!(score.overall_score <= MAX_SCORE);
            prop_assert!(score.heart_rate_score <= 30.0);
            prop_assert!(score.activity_balance_score <= 20.0);
            prop_assert!(score.weekly_pattern_score <= 10.0);
            prop_assert!(score.day_of_week_score <= 10.0);
            prop_assert_eq!(score.category, RecoveryCategory::from_score(score.overall_score));
        }
    }
}

//! Rule-based insight generation.
//!
//! A fixed, ordered table of rules inspects the recovery score, the metric
//! trends and the fitness assessment. Every rule that matches contributes one
//! insight; rules are independent, so one report can carry several insights
//! about the same subject. The result is ranked by priority (High first)
//! with a stable sort, so rule order breaks ties.

use crate::fitness::FitnessLevelAssessment;
use crate::scoring::RecoveryScore;
use crate::{MetricKind, TrendDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Subject area of an insight
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Recovery,
    Activity,
    Sleep,
    HeartHealth,
    Fitness,
    Consistency,
    BodyComposition,
}

impl std::str::FromStr for InsightCategory {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "recovery" => Ok(InsightCategory::Recovery),
            "activity" => Ok(InsightCategory::Activity),
            "sleep" => Ok(InsightCategory::Sleep),
            "heart_health" | "heart" => Ok(InsightCategory::HeartHealth),
            "fitness" => Ok(InsightCategory::Fitness),
            "consistency" => Ok(InsightCategory::Consistency),
            "body_composition" | "weight" => Ok(InsightCategory::BodyComposition),
            other => Err(crate::Error::Parse(format!(
                "Unknown insight category: {}",
                other
            ))),
        }
    }
}

/// Ranking of an insight; orders Low < Medium < High
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum InsightPriority {
    Low,
    Medium,
    High,
}

/// How much the underlying data supports an insight
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum InsightConfidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for InsightPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightPriority::Low => write!(f, "low"),
            InsightPriority::Medium => write!(f, "medium"),
            InsightPriority::High => write!(f, "high"),
        }
    }
}

/// A short, prioritized observation about the user's data
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthInsight {
    pub id: Uuid,
    pub category: InsightCategory,
    pub priority: InsightPriority,
    pub confidence: InsightConfidence,
    pub title: String,
    pub message: String,
    pub action: Option<String>,
}

impl HealthInsight {
    fn new(
        category: InsightCategory,
        priority: InsightPriority,
        confidence: InsightConfidence,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            priority,
            confidence,
            title: title.into(),
            message: message.into(),
            action: None,
        }
    }

    fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

/// Everything the rules may look at
struct RuleInputs<'a> {
    score: &'a RecoveryScore,
    trends: &'a BTreeMap<MetricKind, TrendDirection>,
    fitness: &'a FitnessLevelAssessment,
}

impl RuleInputs<'_> {
    fn trend(&self, metric: MetricKind) -> TrendDirection {
        self.trends
            .get(&metric)
            .copied()
            .unwrap_or(TrendDirection::Stable)
    }
}

type Rule = fn(&RuleInputs<'_>) -> Option<HealthInsight>;

/// Evaluated in order; order also breaks priority ties
const RULES: &[(&str, Rule)] = &[
    ("low_recovery", low_recovery),
    ("partial_recovery", partial_recovery),
    ("ready_to_train", ready_to_train),
    ("resting_hr_rising", resting_hr_rising),
    ("resting_hr_falling", resting_hr_falling),
    ("elevated_resting_hr", elevated_resting_hr),
    ("load_outpacing_recovery", load_outpacing_recovery),
    ("steps_declining", steps_declining),
    ("steps_improving", steps_improving),
    ("inactive_week", inactive_week),
    ("sleep_declining", sleep_declining),
    ("inconsistent_training", inconsistent_training),
    ("consistent_training", consistent_training),
    ("progress_improving", progress_improving),
    ("progress_declining", progress_declining),
    ("weight_shifting", weight_shifting),
];

/// Run every rule and rank the matches by priority
pub fn generate_insights(
    score: &RecoveryScore,
    trends: &BTreeMap<MetricKind, TrendDirection>,
    fitness: &FitnessLevelAssessment,
) -> Vec<HealthInsight> {
    let inputs = RuleInputs {
        score,
        trends,
        fitness,
    };

    let mut insights: Vec<HealthInsight> = RULES
        .iter()
        .filter_map(|(name, rule)| {
            let insight = rule(&inputs)?;
            tracing::debug!("Insight rule {} fired ({})", name, insight.priority);
            Some(insight)
        })
        .collect();

    // stable: equal priorities keep rule order
    insights.sort_by(|a, b| b.priority.cmp(&a.priority));
    insights
}

/// Insights in one category, in their existing order
pub fn insights_of_type(
    insights: &[HealthInsight],
    category: InsightCategory,
) -> Vec<&HealthInsight> {
    insights.iter().filter(|i| i.category == category).collect()
}

/// The `n` highest-priority insights; ties keep their existing order
pub fn top_priority(insights: &[HealthInsight], n: usize) -> Vec<&HealthInsight> {
    let mut ranked: Vec<&HealthInsight> = insights.iter().collect();
    ranked.sort_by(|a, b| b.priority.cmp(&a.priority));
    ranked.truncate(n);
    ranked
}

// ============================================================================
// Rules
// ============================================================================

fn low_recovery(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    (inputs.score.overall_score < 40.0).then(|| {
        HealthInsight::new(
            InsightCategory::Recovery,
            InsightPriority::High,
            InsightConfidence::High,
            "Recovery is low",
            format!(
                "Your recovery score is {:.0}/100. Hard training today is likely to dig a deeper hole.",
                inputs.score.overall_score
            ),
        )
        .with_action("Take a rest day or keep movement very light, and aim for an early night.")
    })
}

fn partial_recovery(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    let score = inputs.score.overall_score;
    (40.0..60.0).contains(&score).then(|| {
        HealthInsight::new(
            InsightCategory::Recovery,
            InsightPriority::Medium,
            InsightConfidence::Medium,
            "Recovery is partial",
            format!(
                "Your recovery score is {:.0}/100. You can train, but keep intensity moderate.",
                score
            ),
        )
        .with_action("Swap intervals for an easy aerobic session or mobility work.")
    })
}

fn ready_to_train(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    (inputs.score.overall_score >= 80.0).then(|| {
        HealthInsight::new(
            InsightCategory::Recovery,
            InsightPriority::Low,
            InsightConfidence::High,
            "Ready for a hard session",
            format!(
                "Your recovery score is {:.0}/100. Today is a good day to push.",
                inputs.score.overall_score
            ),
        )
    })
}

fn resting_hr_rising(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    (inputs.trend(MetricKind::RestingHeartRate) == TrendDirection::Increasing).then(|| {
        HealthInsight::new(
            InsightCategory::HeartHealth,
            InsightPriority::High,
            InsightConfidence::Medium,
            "Resting heart rate is climbing",
            "Your resting heart rate has risen over recent days. This often follows accumulated fatigue, stress, poor sleep or oncoming illness.",
        )
        .with_action("Ease off training until it settles back toward your usual range.")
    })
}

fn resting_hr_falling(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    (inputs.trend(MetricKind::RestingHeartRate) == TrendDirection::Decreasing).then(|| {
        HealthInsight::new(
            InsightCategory::HeartHealth,
            InsightPriority::Low,
            InsightConfidence::Medium,
            "Resting heart rate is improving",
            "Your resting heart rate has dropped over recent days, a sign that your aerobic fitness is building.",
        )
    })
}

fn elevated_resting_hr(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    (inputs.score.heart_rate_score <= 10.0).then(|| {
        HealthInsight::new(
            InsightCategory::HeartHealth,
            InsightPriority::Medium,
            InsightConfidence::Medium,
            "Resting heart rate is high",
            format!(
                "Today's resting heart rate earned {:.0} of 30 heart rate points, which points to a body under load.",
                inputs.score.heart_rate_score
            ),
        )
        .with_action("Hydrate, skip caffeine late in the day and check in again tomorrow.")
    })
}

fn load_outpacing_recovery(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    let rising_load = inputs.trend(MetricKind::WorkoutLoad) == TrendDirection::Increasing;
    (rising_load && inputs.score.overall_score < 60.0).then(|| {
        HealthInsight::new(
            InsightCategory::Recovery,
            InsightPriority::High,
            InsightConfidence::Medium,
            "Training load is outpacing recovery",
            format!(
                "Your workout load is rising while recovery sits at {:.0}/100.",
                inputs.score.overall_score
            ),
        )
        .with_action("Plan a deload: cut volume by a third for the next few days.")
    })
}

fn steps_declining(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    (inputs.trend(MetricKind::Steps) == TrendDirection::Decreasing).then(|| {
        HealthInsight::new(
            InsightCategory::Activity,
            InsightPriority::Medium,
            InsightConfidence::Medium,
            "Daily steps are dropping",
            "Your recent step counts are more than 10% below where they started this period.",
        )
        .with_action("Add a short walk after meals to get back on track.")
    })
}

fn steps_improving(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    (inputs.trend(MetricKind::Steps) == TrendDirection::Increasing).then(|| {
        HealthInsight::new(
            InsightCategory::Activity,
            InsightPriority::Low,
            InsightConfidence::Medium,
            "More steps lately",
            "Your recent step counts are more than 10% above where they started this period. Keep it up.",
        )
    })
}

fn inactive_week(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    (inputs.score.weekly_pattern_score <= 3.0).then(|| {
        HealthInsight::new(
            InsightCategory::Activity,
            InsightPriority::Medium,
            InsightConfidence::High,
            "Quiet week",
            "Fewer than 40% of your recent days were active, or there isn't enough step data to tell.",
        )
        .with_action("Aim for at least 5,000 steps on four days this week.")
    })
}

fn sleep_declining(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    (inputs.trend(MetricKind::SleepDuration) == TrendDirection::Decreasing).then(|| {
        HealthInsight::new(
            InsightCategory::Sleep,
            InsightPriority::Medium,
            InsightConfidence::Medium,
            "Sleep is slipping",
            "You've been sleeping noticeably less over the last few nights.",
        )
        .with_action("Set a consistent bedtime and keep screens out of the last hour.")
    })
}

fn inconsistent_training(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    let consistency = inputs.fitness.consistency_score;
    (consistency < 50.0).then(|| {
        HealthInsight::new(
            InsightCategory::Consistency,
            InsightPriority::Medium,
            InsightConfidence::High,
            "Training is irregular",
            format!(
                "You logged {:.0}% of your expected training days over the last four weeks.",
                consistency
            ),
        )
        .with_action("Schedule your sessions in advance; short workouts still count.")
    })
}

fn consistent_training(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    let consistency = inputs.fitness.consistency_score;
    (consistency >= 80.0).then(|| {
        HealthInsight::new(
            InsightCategory::Consistency,
            InsightPriority::Low,
            InsightConfidence::High,
            "Great consistency",
            format!(
                "You logged {:.0}% of your expected training days over the last four weeks.",
                consistency
            ),
        )
    })
}

fn progress_improving(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    (inputs.fitness.progress_trend == TrendDirection::Increasing).then(|| {
        HealthInsight::new(
            InsightCategory::Fitness,
            InsightPriority::Low,
            InsightConfidence::Medium,
            "Training is progressing",
            format!(
                "Your session load is trending up. Overall level: {} (cardio {}, strength {}).",
                inputs.fitness.overall_level,
                inputs.fitness.cardio_level,
                inputs.fitness.strength_level
            ),
        )
    })
}

fn progress_declining(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    (inputs.fitness.progress_trend == TrendDirection::Decreasing).then(|| {
        HealthInsight::new(
            InsightCategory::Fitness,
            InsightPriority::Medium,
            InsightConfidence::Low,
            "Training load is tapering",
            "Your recent sessions carry less load than at the start of the period.",
        )
        .with_action("If this isn't a planned deload, add one progressive session this week.")
    })
}

fn weight_shifting(inputs: &RuleInputs<'_>) -> Option<HealthInsight> {
    let trend = inputs.trend(MetricKind::Weight);
    (trend != TrendDirection::Stable).then(|| {
        HealthInsight::new(
            InsightCategory::BodyComposition,
            InsightPriority::Low,
            InsightConfidence::Low,
            "Weight is changing",
            format!(
                "Your weight has been {} by more than 2 kg over the period.",
                trend
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FitnessLevel;

    fn score(overall: f64) -> RecoveryScore {
        let mut score = RecoveryScore::from_components(20.0, 20.0, 7.0, 5.0);
        score.overall_score = overall;
        score.category = crate::scoring::RecoveryCategory::from_score(overall);
        score
    }

    fn fitness(consistency: f64, progress: TrendDirection) -> FitnessLevelAssessment {
        FitnessLevelAssessment {
            overall_level: FitnessLevel::Intermediate,
            cardio_level: FitnessLevel::Intermediate,
            strength_level: FitnessLevel::Beginner,
            consistency_score: consistency,
            progress_trend: progress,
        }
    }

    fn no_trends() -> BTreeMap<MetricKind, TrendDirection> {
        BTreeMap::new()
    }

    #[test]
    fn test_low_score_yields_high_recovery_insight() {
        let insights = generate_insights(
            &score(35.0),
            &no_trends(),
            &fitness(60.0, TrendDirection::Stable),
        );

        assert!(insights.iter().any(|i| {
            i.category == InsightCategory::Recovery && i.priority == InsightPriority::High
        }));
        assert_eq!(insights[0].priority, InsightPriority::High);
    }

    #[test]
    fn test_sorted_by_priority_descending() {
        let mut trends = no_trends();
        trends.insert(MetricKind::Steps, TrendDirection::Increasing);
        trends.insert(MetricKind::RestingHeartRate, TrendDirection::Increasing);
        trends.insert(MetricKind::SleepDuration, TrendDirection::Decreasing);

        let insights = generate_insights(
            &score(85.0),
            &trends,
            &fitness(20.0, TrendDirection::Increasing),
        );

        let priorities: Vec<InsightPriority> = insights.iter().map(|i| i.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
        assert_eq!(insights[0].title, "Resting heart rate is climbing");
    }

    #[test]
    fn test_ties_keep_rule_order() {
        let mut trends = no_trends();
        trends.insert(MetricKind::Steps, TrendDirection::Increasing);

        let insights = generate_insights(
            &score(85.0),
            &trends,
            &fitness(90.0, TrendDirection::Increasing),
        );

        // All Low; rules fire as ready_to_train, steps_improving,
        // consistent_training, progress_improving
        let titles: Vec<&str> = insights.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Ready for a hard session",
                "More steps lately",
                "Great consistency",
                "Training is progressing",
            ]
        );
    }

    #[test]
    fn test_load_outpacing_recovery_needs_both() {
        let mut trends = no_trends();
        trends.insert(MetricKind::WorkoutLoad, TrendDirection::Increasing);

        let good = generate_insights(&score(75.0), &trends, &fitness(60.0, TrendDirection::Stable));
        assert!(!good
            .iter()
            .any(|i| i.title == "Training load is outpacing recovery"));

        let tired = generate_insights(
            &score(55.0),
            &trends,
            &fitness(60.0, TrendDirection::Stable),
        );
        assert!(tired
            .iter()
            .any(|i| i.title == "Training load is outpacing recovery"));
    }

    #[test]
    fn test_message_interpolates_values() {
        let insights = generate_insights(
            &score(45.0),
            &no_trends(),
            &fitness(25.0, TrendDirection::Stable),
        );
        let recovery = insights_of_type(&insights, InsightCategory::Recovery);
        assert_eq!(recovery.len(), 1);
        assert!(recovery[0].message.contains("45/100"));

        let consistency = insights_of_type(&insights, InsightCategory::Consistency);
        assert!(consistency[0].message.contains("25%"));
    }

    #[test]
    fn test_top_priority_limits_and_ranks() {
        let mut trends = no_trends();
        trends.insert(MetricKind::Weight, TrendDirection::Decreasing);
        trends.insert(MetricKind::Steps, TrendDirection::Decreasing);

        let insights = generate_insights(
            &score(35.0),
            &trends,
            &fitness(60.0, TrendDirection::Stable),
        );

        let top = top_priority(&insights, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].priority, InsightPriority::High);
        assert!(top[1].priority >= InsightPriority::Medium);

        assert_eq!(top_priority(&insights, 100).len(), insights.len());
        assert!(top_priority(&insights, 0).is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let insights = generate_insights(
            &score(35.0),
            &no_trends(),
            &fitness(10.0, TrendDirection::Decreasing),
        );
        let ids: std::collections::HashSet<Uuid> = insights.iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), insights.len());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(
            "heart-health".parse::<InsightCategory>().unwrap(),
            InsightCategory::HeartHealth
        );
        assert!("mood".parse::<InsightCategory>().is_err());
    }
}

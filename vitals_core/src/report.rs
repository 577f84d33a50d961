//! Health report generation.
//!
//! [`HealthReportGenerator`] is the only place a [`HealthReport`] is built.
//! One call reads everything it needs from the injected provider, runs the
//! pure scoring/trend/fitness/insight components and freezes the result.
//! The generator keeps no mutable state, so overlapping calls each return an
//! independent report.
//!
//! [`ReportState`] is the one-way state handed to a presentation layer:
//! `Idle -> Loading -> Loaded | Empty | Failed`, carrying the previous report
//! through loading and failures for display continuity.

use crate::config::{Config, FitnessConfig, TrendConfig};
use crate::fitness::{
    assess_fitness, FitnessLevelAssessment, WorkoutHistory, CONSISTENCY_WINDOW_DAYS,
};
use crate::insights::{self, generate_insights, HealthInsight, InsightCategory};
use crate::provider::{aggregate_daily, HealthDataProvider};
use crate::scoring::{compute_recovery_score, RecoveryScore, WEEKLY_PATTERN_DAYS};
use crate::trend::{classify_trend, TrendWindows};
use crate::{
    AuthorizationState, Error, MetricBundle, MetricHistory, MetricKind, MetricSample, Result,
    TrendDirection, WorkoutRecord,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Metrics read for today's bundle
const TODAY_METRICS: [MetricKind; 6] = [
    MetricKind::RestingHeartRate,
    MetricKind::Steps,
    MetricKind::ActiveCalories,
    MetricKind::SleepDuration,
    MetricKind::WorkoutLoad,
    MetricKind::Weight,
];

/// Metrics read for each prior day
const HISTORY_METRICS: [MetricKind; 2] = [MetricKind::Steps, MetricKind::ActiveCalories];

/// Immutable result of one report generation
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct HealthReport {
    generated_date: DateTime<Utc>,
    recovery_score: RecoveryScore,
    fitness_assessment: FitnessLevelAssessment,
    trends: BTreeMap<MetricKind, TrendDirection>,
    insights: Vec<HealthInsight>,
}

impl HealthReport {
    pub(crate) fn new(
        generated_date: DateTime<Utc>,
        recovery_score: RecoveryScore,
        fitness_assessment: FitnessLevelAssessment,
        trends: BTreeMap<MetricKind, TrendDirection>,
        insights: Vec<HealthInsight>,
    ) -> Self {
        Self {
            generated_date,
            recovery_score,
            fitness_assessment,
            trends,
            insights,
        }
    }

    pub fn generated_date(&self) -> DateTime<Utc> {
        self.generated_date
    }

    pub fn recovery_score(&self) -> &RecoveryScore {
        &self.recovery_score
    }

    pub fn fitness_assessment(&self) -> &FitnessLevelAssessment {
        &self.fitness_assessment
    }

    pub fn trends(&self) -> &BTreeMap<MetricKind, TrendDirection> {
        &self.trends
    }

    /// Trend for a metric; unwatched metrics read as stable
    pub fn trend(&self, metric: MetricKind) -> TrendDirection {
        self.trends
            .get(&metric)
            .copied()
            .unwrap_or(TrendDirection::Stable)
    }

    /// All insights, highest priority first
    pub fn insights(&self) -> &[HealthInsight] {
        &self.insights
    }

    pub fn insights_of_type(&self, category: InsightCategory) -> Vec<&HealthInsight> {
        insights::insights_of_type(&self.insights, category)
    }

    pub fn top_priority(&self, n: usize) -> Vec<&HealthInsight> {
        insights::top_priority(&self.insights, n)
    }
}

/// Builds health reports from an injected provider
pub struct HealthReportGenerator<P> {
    provider: P,
    trends: TrendConfig,
    fitness: FitnessConfig,
}

impl<P: HealthDataProvider> HealthReportGenerator<P> {
    /// Generator with default configuration
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, &Config::default())
    }

    pub fn with_config(provider: P, config: &Config) -> Self {
        Self {
            provider,
            trends: config.trends.clone(),
            fitness: config.fitness.clone(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Generate a report stamped with the current time
    ///
    /// Returns `Ok(None)` when the provider is not authorized or holds no
    /// data at all. A provider read failure is an `Err`: no report this
    /// cycle, and the caller decides whether to try again.
    pub async fn generate_report(&self) -> Result<Option<HealthReport>> {
        self.generate_report_at(Utc::now()).await
    }

    /// Generate a report as of `now`
    ///
    /// Any failed read comes back as [`Error::Provider`]. A lookback that
    /// cannot be placed on the calendar is an [`Error::Config`].
    pub async fn generate_report_at(&self, now: DateTime<Utc>) -> Result<Option<HealthReport>> {
        self.build_report(now).await.map_err(|e| match e {
            Error::Provider(_) | Error::Config(_) => e,
            other => Error::Provider(other.to_string()),
        })
    }

    async fn build_report(&self, now: DateTime<Utc>) -> Result<Option<HealthReport>> {
        let authorization = self.provider.authorization_state().await;
        if authorization != AuthorizationState::Granted {
            tracing::info!(
                "Health data access is {:?}; no report generated",
                authorization
            );
            return Ok(None);
        }

        let today = now.date_naive();
        let windows = TrendWindows::from(&self.trends);

        let today_bundle = self.read_bundle(today, &TODAY_METRICS).await?;
        let history = self.read_history(today).await?;

        let fitness_days = self.fitness.window_days.max(CONSISTENCY_WINDOW_DAYS);
        let fitness_from = window_start(now, fitness_days)?;
        let workouts = self.provider.workouts(fitness_from, now).await?;
        let vo2_max = self.latest_vo2_max(fitness_from, now).await?;

        let (trends, sample_count) = self.read_trends(now, &workouts, windows).await?;

        let has_daily_values =
            !today_bundle.is_empty() || history.days.iter().any(|d| !d.is_empty());
        if !has_daily_values && sample_count == 0 && workouts.is_empty() && vo2_max.is_none() {
            tracing::info!("Provider has no health data; no report generated");
            return Ok(None);
        }

        let recovery_score = compute_recovery_score(&today_bundle, &history);
        let fitness_assessment = assess_fitness(
            &WorkoutHistory::new(now, workouts).with_vo2_max(vo2_max),
            &self.fitness,
            windows,
        );
        let insights = generate_insights(&recovery_score, &trends, &fitness_assessment);

        tracing::info!(
            "Generated health report: recovery {:.0} ({}), fitness {}, {} insights",
            recovery_score.overall_score,
            recovery_score.category,
            fitness_assessment.overall_level,
            insights.len()
        );

        Ok(Some(HealthReport::new(
            now,
            recovery_score,
            fitness_assessment,
            trends,
            insights,
        )))
    }

    async fn read_bundle(&self, date: NaiveDate, metrics: &[MetricKind]) -> Result<MetricBundle> {
        let mut bundle = MetricBundle::new(date);
        for metric in metrics {
            let value = self.provider.sample(*metric, date).await?;
            bundle.set(*metric, value);
        }
        Ok(bundle)
    }

    /// The seven days before `today`, oldest first
    async fn read_history(&self, today: NaiveDate) -> Result<MetricHistory> {
        let mut days = Vec::with_capacity(WEEKLY_PATTERN_DAYS);
        for offset in (1..=WEEKLY_PATTERN_DAYS as i64).rev() {
            days.push(
                self.read_bundle(today - Duration::days(offset), &HISTORY_METRICS)
                    .await?,
            );
        }
        Ok(MetricHistory::new(days))
    }

    async fn latest_vo2_max(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<f64>> {
        let series = self.provider.series(MetricKind::Vo2Max, from, to).await?;
        Ok(series
            .iter()
            .filter(|s| MetricKind::Vo2Max.is_within_normal_range(s.value))
            .max_by_key(|s| s.timestamp)
            .map(|s| s.value))
    }

    /// Classify every watched metric over the lookback period
    ///
    /// Series are collapsed to one value per day first. Workout load falls
    /// back to the logged workouts when the store has no load samples.
    async fn read_trends(
        &self,
        now: DateTime<Utc>,
        workouts: &[WorkoutRecord],
        windows: TrendWindows,
    ) -> Result<(BTreeMap<MetricKind, TrendDirection>, usize)> {
        let from = window_start(now, self.trends.lookback_days.max(1))?;
        let mut trends = BTreeMap::new();
        let mut sample_count = 0;

        for metric in &self.trends.watched {
            let mut series = self.provider.series(*metric, from, now).await?;
            sample_count += series.len();

            if *metric == MetricKind::WorkoutLoad && series.is_empty() {
                series = workouts
                    .iter()
                    .filter(|w| w.performed_at >= from)
                    .map(|w| MetricSample::new(MetricKind::WorkoutLoad, w.performed_at, w.load()))
                    .collect();
            }

            let daily: Vec<MetricSample> = aggregate_daily(*metric, &series)
                .into_iter()
                .filter_map(|(date, value)| {
                    let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
                    Some(MetricSample::new(*metric, midnight, value))
                })
                .collect();

            trends.insert(
                *metric,
                classify_trend(&daily, windows.recent, windows.baseline),
            );
        }

        Ok((trends, sample_count))
    }
}

/// Start of a trailing window of `days` ending at `now`
fn window_start(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| Error::Config(format!("a {} day window is out of range", days)))
}

/// Report lifecycle as seen by a presentation layer
#[derive(Clone, Debug, Default)]
pub enum ReportState {
    #[default]
    Idle,
    Loading {
        previous: Option<Arc<HealthReport>>,
    },
    Loaded(Arc<HealthReport>),
    /// Not authorized, or no data to report on
    Empty,
    Failed {
        message: String,
        previous: Option<Arc<HealthReport>>,
    },
}

impl ReportState {
    /// Enter `Loading`, keeping whatever report is on screen
    pub fn begin_loading(self) -> Self {
        let previous = self.latest();
        ReportState::Loading { previous }
    }

    /// Apply the outcome of a generation request
    ///
    /// `Empty` deliberately drops the previous report: once access is gone
    /// nothing stale is shown. Failures keep it.
    pub fn resolve(self, outcome: Result<Option<HealthReport>>) -> Self {
        match outcome {
            Ok(Some(report)) => ReportState::Loaded(Arc::new(report)),
            Ok(None) => ReportState::Empty,
            Err(e) => {
                tracing::warn!("Health report generation failed: {}", e);
                ReportState::Failed {
                    message: e.to_string(),
                    previous: self.latest(),
                }
            }
        }
    }

    /// The report to display, if any
    pub fn current_report(&self) -> Option<&HealthReport> {
        match self {
            ReportState::Loaded(report) => Some(report),
            ReportState::Loading { previous } | ReportState::Failed { previous, .. } => {
                previous.as_deref()
            }
            ReportState::Idle | ReportState::Empty => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ReportState::Loading { .. })
    }

    fn latest(&self) -> Option<Arc<HealthReport>> {
        match self {
            ReportState::Loaded(report) => Some(Arc::clone(report)),
            ReportState::Loading { previous } | ReportState::Failed { previous, .. } => {
                previous.clone()
            }
            ReportState::Idle | ReportState::Empty => None,
        }
    }
}

//! Read-only access to the platform health store.
//!
//! The engine never talks to a global health store; callers hand a
//! [`HealthDataProvider`] to the report generator. [`InMemoryProvider`]
//! backs tests and embedding hosts that already hold their samples.

use crate::{
    AuthorizationState, DailyAggregation, MetricKind, MetricSample, Result, WorkoutRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Query interface over the platform's biometric store
///
/// Implementations must be `Send + Sync`; reads may suspend on I/O or an
/// authorization prompt. A failed read is an `Err`, while "no data" is an
/// empty answer.
#[async_trait]
pub trait HealthDataProvider: Send + Sync {
    /// Whether the user has granted read access
    async fn authorization_state(&self) -> AuthorizationState;

    /// The day's value for a metric (summed or averaged per metric kind)
    async fn sample(&self, metric: MetricKind, date: NaiveDate) -> Result<Option<f64>>;

    /// Raw samples with `from <= timestamp <= to`, oldest first
    async fn series(
        &self,
        metric: MetricKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MetricSample>>;

    /// Logged workouts with `from <= performed_at <= to`
    ///
    /// Stores without workout data keep the default.
    async fn workouts(
        &self,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<WorkoutRecord>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl<P: HealthDataProvider + ?Sized> HealthDataProvider for Arc<P> {
    async fn authorization_state(&self) -> AuthorizationState {
        (**self).authorization_state().await
    }

    async fn sample(&self, metric: MetricKind, date: NaiveDate) -> Result<Option<f64>> {
        (**self).sample(metric, date).await
    }

    async fn series(
        &self,
        metric: MetricKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MetricSample>> {
        (**self).series(metric, from, to).await
    }

    async fn workouts(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<WorkoutRecord>> {
        (**self).workouts(from, to).await
    }
}

/// Collapse samples of one metric into one value per calendar day (UTC)
///
/// Readings outside the metric's normal range are dropped. Days with no
/// remaining readings are absent from the result.
pub fn aggregate_daily(metric: MetricKind, samples: &[MetricSample]) -> BTreeMap<NaiveDate, f64> {
    let mut buckets: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for sample in samples {
        if sample.metric != metric {
            continue;
        }
        if !metric.is_within_normal_range(sample.value) {
            tracing::debug!(
                "Dropping out-of-range {} reading {} at {}",
                metric,
                sample.value,
                sample.timestamp
            );
            continue;
        }
        buckets
            .entry(sample.timestamp.date_naive())
            .or_default()
            .push(sample.value);
    }

    buckets
        .into_iter()
        .map(|(date, values)| {
            let total: f64 = values.iter().sum();
            let value = match metric.daily_aggregation() {
                DailyAggregation::Sum => total,
                DailyAggregation::Average => total / values.len() as f64,
            };
            (date, value)
        })
        .collect()
}

/// Provider over samples and workouts held in memory
#[derive(Clone, Debug, Default)]
pub struct InMemoryProvider {
    authorization: AuthorizationState,
    samples: Vec<MetricSample>,
    workouts: Vec<WorkoutRecord>,
}

impl InMemoryProvider {
    pub fn new(authorization: AuthorizationState) -> Self {
        Self {
            authorization,
            samples: Vec::new(),
            workouts: Vec::new(),
        }
    }

    pub fn with_samples(mut self, samples: impl IntoIterator<Item = MetricSample>) -> Self {
        self.samples.extend(samples);
        self.samples.sort_by_key(|s| s.timestamp);
        self
    }

    pub fn with_workouts(mut self, workouts: impl IntoIterator<Item = WorkoutRecord>) -> Self {
        self.workouts.extend(workouts);
        self.workouts.sort_by_key(|w| w.performed_at);
        self
    }

    pub fn set_authorization(&mut self, authorization: AuthorizationState) {
        self.authorization = authorization;
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn workout_count(&self) -> usize {
        self.workouts.len()
    }

    fn samples_between(
        &self,
        metric: MetricKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<MetricSample> {
        self.samples
            .iter()
            .filter(|s| s.metric == metric && s.timestamp >= from && s.timestamp <= to)
            .copied()
            .collect()
    }

    fn daily_value(&self, metric: MetricKind, date: NaiveDate) -> Option<f64> {
        let day: Vec<MetricSample> = self
            .samples
            .iter()
            .filter(|s| s.metric == metric && s.timestamp.date_naive() == date)
            .copied()
            .collect();
        aggregate_daily(metric, &day).get(&date).copied()
    }
}

#[async_trait]
impl HealthDataProvider for InMemoryProvider {
    async fn authorization_state(&self) -> AuthorizationState {
        self.authorization
    }

    async fn sample(&self, metric: MetricKind, date: NaiveDate) -> Result<Option<f64>> {
        Ok(self.daily_value(metric, date))
    }

    async fn series(
        &self,
        metric: MetricKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MetricSample>> {
        Ok(self.samples_between(metric, from, to))
    }

    async fn workouts(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<WorkoutRecord>> {
        Ok(self
            .workouts
            .iter()
            .filter(|w| w.performed_at >= from && w.performed_at <= to)
            .cloned()
            .collect())
    }
}

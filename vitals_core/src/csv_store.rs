//! CSV-file backed health data provider.
//!
//! Reads two files from a data directory:
//! - `samples.csv`: `metric,timestamp,value`
//! - `workouts.csv`: `id,performed_at,kind,duration_minutes,intensity,volume,personal_record`
//!
//! Either file may be missing. Rows that fail to parse are skipped with a
//! warning so one bad export line never hides the rest of the data.

use crate::provider::{HealthDataProvider, InMemoryProvider};
use crate::{
    AuthorizationState, Error, MetricKind, MetricSample, Result, WorkoutKind, WorkoutRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const SAMPLES_FILE: &str = "samples.csv";
pub const WORKOUTS_FILE: &str = "workouts.csv";

/// CSV row format for metric samples
#[derive(Debug, Deserialize)]
struct SampleRow {
    metric: String,
    timestamp: String,
    value: f64,
}

impl TryFrom<SampleRow> for MetricSample {
    type Error = Error;

    fn try_from(row: SampleRow) -> Result<Self> {
        let metric = row.metric.parse::<MetricKind>()?;
        let timestamp = parse_timestamp(&row.timestamp)?;
        Ok(MetricSample::new(metric, timestamp, row.value))
    }
}

/// CSV row format for workouts
#[derive(Debug, Deserialize)]
struct WorkoutRow {
    id: Option<String>,
    performed_at: String,
    kind: String,
    duration_minutes: u32,
    intensity: f64,
    volume: Option<f64>,
    personal_record: Option<bool>,
}

impl TryFrom<WorkoutRow> for WorkoutRecord {
    type Error = Error;

    fn try_from(row: WorkoutRow) -> Result<Self> {
        let id = match row.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => {
                Uuid::parse_str(id).map_err(|e| Error::Parse(format!("Invalid UUID: {}", e)))?
            }
            None => Uuid::new_v4(),
        };

        Ok(WorkoutRecord {
            id,
            performed_at: parse_timestamp(&row.performed_at)?,
            kind: row.kind.parse::<WorkoutKind>()?,
            duration_minutes: row.duration_minutes,
            intensity: row.intensity,
            volume: row.volume,
            personal_record: row.personal_record.unwrap_or(false),
        })
    }
}

/// Accept RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC)
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::Parse(format!("Invalid date: {}", raw)))
}

/// Load samples from a CSV file, skipping bad rows
pub fn load_samples(path: &Path) -> Result<Vec<MetricSample>> {
    load_rows::<SampleRow, MetricSample>(path)
}

/// Load workouts from a CSV file, skipping bad rows
pub fn load_workouts(path: &Path) -> Result<Vec<WorkoutRecord>> {
    load_rows::<WorkoutRow, WorkoutRecord>(path)
}

fn load_rows<R, T>(path: &Path) -> Result<Vec<T>>
where
    R: for<'de> Deserialize<'de>,
    T: TryFrom<R, Error = Error>,
{
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut items = Vec::new();
    for (line, result) in reader.deserialize::<R>().enumerate() {
        match result {
            Ok(row) => match T::try_from(row) {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!("Skipping row {} of {:?}: {}", line + 2, path, e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize row {} of {:?}: {}", line + 2, path, e);
            }
        }
    }

    Ok(items)
}

/// Provider reading `samples.csv` and `workouts.csv` from a data directory
#[derive(Clone, Debug)]
pub struct CsvProvider {
    data_dir: PathBuf,
    inner: InMemoryProvider,
}

impl CsvProvider {
    /// Load the data directory's files up front
    pub fn open(data_dir: impl Into<PathBuf>, authorization: AuthorizationState) -> Result<Self> {
        let data_dir = data_dir.into();
        let samples_path = data_dir.join(SAMPLES_FILE);
        let workouts_path = data_dir.join(WORKOUTS_FILE);

        let samples = if samples_path.exists() {
            load_samples(&samples_path)?
        } else {
            tracing::debug!("No samples file at {:?}", samples_path);
            Vec::new()
        };

        let workouts = if workouts_path.exists() {
            load_workouts(&workouts_path)?
        } else {
            tracing::debug!("No workouts file at {:?}", workouts_path);
            Vec::new()
        };

        tracing::info!(
            "Loaded {} samples and {} workouts from {:?}",
            samples.len(),
            workouts.len(),
            data_dir
        );

        let inner = InMemoryProvider::new(authorization)
            .with_samples(samples)
            .with_workouts(workouts);

        Ok(Self { data_dir, inner })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn sample_count(&self) -> usize {
        self.inner.sample_count()
    }

    pub fn workout_count(&self) -> usize {
        self.inner.workout_count()
    }
}

#[async_trait]
impl HealthDataProvider for CsvProvider {
    async fn authorization_state(&self) -> AuthorizationState {
        self.inner.authorization_state().await
    }

    async fn sample(&self, metric: MetricKind, date: NaiveDate) -> Result<Option<f64>> {
        self.inner.sample(metric, date).await
    }

    async fn series(
        &self,
        metric: MetricKind,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MetricSample>> {
        self.inner.series(metric, from, to).await
    }

    async fn workouts(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<WorkoutRecord>> {
        self.inner.workouts(from, to).await
    }
}

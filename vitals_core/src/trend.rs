//! Trend classification for a single metric series.
//!
//! A trend compares the average of the most recent samples against the
//! average of a baseline window. The baseline is taken from the front of the
//! series (the earliest samples), so with a long series the two windows are
//! not adjacent: this is a "recent vs. start of period" comparison.

use crate::config::TrendConfig;
use crate::{MetricKind, MetricSample, TrendDirection, TrendThreshold};

/// Window sizes for trend classification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrendWindows {
    pub recent: usize,
    pub baseline: usize,
}

impl Default for TrendWindows {
    fn default() -> Self {
        Self {
            recent: 3,
            baseline: 4,
        }
    }
}

impl From<&TrendConfig> for TrendWindows {
    fn from(config: &TrendConfig) -> Self {
        Self {
            recent: config.recent_window,
            baseline: config.baseline_window,
        }
    }
}

/// Classify a series of samples
///
/// The metric kind (and so the threshold) is taken from the samples. Samples
/// are ordered by timestamp first; fewer than two samples is always `Stable`.
pub fn classify_trend(
    series: &[MetricSample],
    recent_window: usize,
    baseline_window: usize,
) -> TrendDirection {
    let Some(first) = series.first() else {
        return TrendDirection::Stable;
    };

    let mut ordered: Vec<&MetricSample> = series.iter().collect();
    ordered.sort_by_key(|s| s.timestamp);
    let values: Vec<f64> = ordered.iter().map(|s| s.value).collect();

    classify_values(
        first.metric,
        &values,
        TrendWindows {
            recent: recent_window,
            baseline: baseline_window,
        },
    )
}

/// Classify an already-ordered series of plain values for `metric`
pub fn classify_values(
    metric: MetricKind,
    values: &[f64],
    windows: TrendWindows,
) -> TrendDirection {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.len() < 2 {
        return TrendDirection::Stable;
    }

    // Keep at least one sample for the baseline so short series never compare
    // a window against itself.
    let recent_len = windows.recent.max(1).min(values.len() - 1);
    let baseline_len = windows.baseline.max(1).min(values.len() - recent_len);

    let recent = mean(&values[values.len() - recent_len..]);
    let baseline = mean(&values[..baseline_len]);

    let direction = compare(recent, baseline, metric.trend_threshold());

    tracing::debug!(
        "Trend for {}: recent avg {:.2} over {} vs baseline avg {:.2} over {} -> {}",
        metric,
        recent,
        recent_len,
        baseline,
        baseline_len,
        direction
    );

    direction
}

fn compare(recent: f64, baseline: f64, threshold: TrendThreshold) -> TrendDirection {
    let (upper, lower) = match threshold {
        TrendThreshold::Relative(fraction) => {
            (baseline * (1.0 + fraction), baseline * (1.0 - fraction))
        }
        TrendThreshold::Absolute(units) => (baseline + units, baseline - units),
    };

    if recent > upper {
        TrendDirection::Increasing
    } else if recent < lower {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

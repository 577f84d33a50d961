#![forbid(unsafe_code)]

//! Core domain model and analytics for the Vitals health intelligence engine.
//!
//! This crate provides:
//! - Domain types (metric samples, daily bundles, workouts)
//! - Recovery scoring, trend classification and fitness assessment
//! - Rule-based insight generation
//! - Provider abstraction over the health store (in-memory and CSV)
//! - Report generation and the report lifecycle state

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod scoring;
pub mod trend;
pub mod fitness;
pub mod insights;
pub mod provider;
pub mod csv_store;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use scoring::{compute_recovery_score, RecoveryCategory, RecoveryScore};
pub use trend::{classify_trend, TrendWindows};
pub use fitness::{assess_fitness, FitnessLevelAssessment, WorkoutHistory};
pub use insights::{generate_insights, HealthInsight, InsightCategory, InsightPriority};
pub use provider::{HealthDataProvider, InMemoryProvider};
pub use csv_store::CsvProvider;
pub use report::{HealthReport, HealthReportGenerator, ReportState};

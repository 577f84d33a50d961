use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vitals_core::config::MAX_WINDOW_DAYS;
use vitals_core::provider::aggregate_daily;
use vitals_core::trend::classify_values;
use vitals_core::*;

#[derive(Parser)]
#[command(name = "vitals")]
#[command(about = "Recovery, trends and insights from your health data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a full health report (default)
    Report {
        /// Report as of the end of this day (YYYY-MM-DD) instead of now
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Only show insights in this category (recovery, activity, sleep, ...)
        #[arg(long)]
        category: Option<InsightCategory>,

        /// Only show the N highest-priority insights
        #[arg(long)]
        top: Option<usize>,
    },

    /// Score a single day without history
    Score {
        /// Day to score (YYYY-MM-DD); drives the day-of-week component
        #[arg(long)]
        date: NaiveDate,

        /// Resting heart rate in bpm
        #[arg(long)]
        resting_hr: Option<f64>,

        /// Step count
        #[arg(long)]
        steps: Option<f64>,

        /// Active calories in kcal
        #[arg(long)]
        calories: Option<f64>,
    },

    /// Show daily values and the trend for one metric
    Trend {
        /// Metric name (steps, resting_heart_rate, weight, ...)
        #[arg(long)]
        metric: MetricKind,

        /// Days to look back (at most ten years)
        #[arg(
            long,
            default_value_t = 14,
            value_parser = clap::value_parser!(i64).range(1..=MAX_WINDOW_DAYS)
        )]
        days: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    vitals_core::logging::init_with_level(vitals_core::logging::level_for_verbosity(cli.verbose));

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    match cli.command {
        Some(Commands::Report {
            date,
            json,
            category,
            top,
        }) => cmd_report(data_dir, &config, date, json, category, top).await,
        Some(Commands::Score {
            date,
            resting_hr,
            steps,
            calories,
        }) => cmd_score(date, resting_hr, steps, calories),
        Some(Commands::Trend { metric, days }) => {
            cmd_trend(data_dir, &config, metric, days).await
        }
        None => cmd_report(data_dir, &config, None, false, None, None).await,
    }
}

async fn cmd_report(
    data_dir: PathBuf,
    config: &Config,
    date: Option<NaiveDate>,
    json: bool,
    category: Option<InsightCategory>,
    top: Option<usize>,
) -> Result<()> {
    let provider = CsvProvider::open(&data_dir, config.provider.authorization)?;
    let generator = HealthReportGenerator::with_config(provider, config);

    let now = match date {
        Some(date) => end_of_day(date)?,
        None => Utc::now(),
    };

    let Some(report) = generator.generate_report_at(now).await? else {
        print_no_report(config.provider.authorization, &data_dir);
        return Ok(());
    };

    let mut insights: Vec<&HealthInsight> = match category {
        Some(category) => report.insights_of_type(category),
        None => report.insights().iter().collect(),
    };
    if let Some(n) = top {
        insights.truncate(n);
    }

    if json {
        let mut value = serde_json::to_value(&report)?;
        value["insights"] = serde_json::to_value(&insights)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    display_report(&report, &insights);
    Ok(())
}

fn cmd_score(
    date: NaiveDate,
    resting_hr: Option<f64>,
    steps: Option<f64>,
    calories: Option<f64>,
) -> Result<()> {
    let mut today = MetricBundle::new(date);
    today.resting_heart_rate = resting_hr;
    today.steps = steps;
    today.active_calories = calories;

    let score = compute_recovery_score(&today, &MetricHistory::default());
    display_score(&score);
    Ok(())
}

async fn cmd_trend(
    data_dir: PathBuf,
    config: &Config,
    metric: MetricKind,
    days: i64,
) -> Result<()> {
    let provider = CsvProvider::open(&data_dir, config.provider.authorization)?;
    let authorization = provider.authorization_state().await;
    if authorization != AuthorizationState::Granted {
        print_no_report(authorization, &data_dir);
        return Ok(());
    }

    let now = Utc::now();
    let series = provider
        .series(metric, now - Duration::days(days.clamp(1, MAX_WINDOW_DAYS)), now)
        .await?;
    let daily = aggregate_daily(metric, &series);

    if daily.is_empty() {
        println!("No {} readings in the last {} days.", metric, days);
        return Ok(());
    }

    println!("\n  {} (last {} days)", metric, days);
    println!();
    for (date, value) in &daily {
        println!("  {}  {:>10.1}", date, value);
    }

    let values: Vec<f64> = daily.values().copied().collect();
    let direction = classify_values(metric, &values, TrendWindows::from(&config.trends));
    println!();
    println!("  Trend: {}", direction);
    println!();
    Ok(())
}

fn end_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.and_hms_opt(23, 59, 59)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::Parse(format!("Invalid date: {}", date)))
}

fn print_no_report(authorization: AuthorizationState, data_dir: &std::path::Path) {
    match authorization {
        AuthorizationState::Granted => {
            println!("No health data found in {}.", data_dir.display());
            println!("  Add readings to samples.csv or workouts.csv to get a report.");
        }
        AuthorizationState::Denied | AuthorizationState::NotDetermined => {
            println!("Health data access has not been granted.");
            println!("  Set `authorization = \"granted\"` under [provider] in your config.");
        }
    }
}

fn display_score(score: &RecoveryScore) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  RECOVERY {:>3.0}/100  {}", score.overall_score, score.category);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Heart rate       {:>4.0}/30", score.heart_rate_score);
    println!("  Activity balance {:>4.0}/20", score.activity_balance_score);
    println!("  Weekly pattern   {:>4.0}/10", score.weekly_pattern_score);
    println!("  Day of week      {:>4.0}/10", score.day_of_week_score);
    println!();
    println!("  {}", score.recommendation);
    println!();
}

fn display_report(report: &HealthReport, insights: &[&HealthInsight]) {
    display_score(report.recovery_score());

    let fitness = report.fitness_assessment();
    println!("  Fitness: {}", fitness.overall_level);
    println!(
        "    cardio {}, strength {}, consistency {:.0}%, progress {}",
        fitness.cardio_level,
        fitness.strength_level,
        fitness.consistency_score,
        fitness.progress_trend
    );
    println!();

    println!("  Trends:");
    for (metric, direction) in report.trends() {
        println!("    {:<20} {}", metric.as_str(), direction);
    }
    println!();

    if insights.is_empty() {
        println!("  No insights today.");
        println!();
        return;
    }

    println!("─────────────────────────────────────────");
    for insight in insights {
        println!("  [{}] {}", insight.priority, insight.title);
        println!("    {}", insight.message);
        if let Some(ref action) = insight.action {
            println!("    → {}", action);
        }
        println!();
    }
}

//! Habitlens CLI
//!
//! Command-line interface for habit pattern analytics:
//! - Import completion history and run analysis
//! - Browse ranked insights, correlations, and predictions
//! - Dismiss insights and clear stale state

use anyhow::Result;
use clap::{Parser, Subcommand};
use habitlens::analyzer::PatternAnalyzer;
use habitlens::config::Config;
use habitlens::store::{FileBlobStore, InsightStore};
use habitlens::{import, HabitHistory};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "habitlens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Habit pattern analytics from completion history")]
#[command(
    long_about = "Habitlens analyzes habit completion history to surface behavioral insights,\nhabit-pair correlations, and near-term success predictions."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a config file (default: standard config locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a history file, run analysis, and refresh the weekly report
    Analyze {
        /// Path to a .json or .csv history file
        path: PathBuf,
    },

    /// List ranked insights
    Insights {
        /// Only insights that reference this habit
        #[arg(long)]
        habit: Option<String>,
    },

    /// List correlations by strength
    Correlations,

    /// List upcoming predictions
    Predictions,

    /// Show the most recent weekly report
    Report,

    /// Dismiss an insight by id
    Dismiss {
        /// Insight id (as shown by `insights`)
        id: String,
    },

    /// Clear stored insights
    Clear {
        /// Only remove expired insights
        #[arg(long)]
        expired: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.to_string_lossy().to_string();
    }

    init_tracing(&config);

    let blob = Arc::new(FileBlobStore::new(&config.data_dir));
    let store = InsightStore::open(
        blob,
        PatternAnalyzer::new(config.analyzer.clone()),
        config.store.clone(),
    )
    .await;

    match cli.command {
        Commands::Analyze { path } => {
            let history: HabitHistory = import::load_history(&path)?;
            tracing::info!(
                habits = history.len(),
                records = history.values().map(Vec::len).sum::<usize>(),
                "History loaded"
            );

            let outcome = store.analyze_patterns(&history).await?;

            // The weekly report is rebuilt from the same history so the
            // stored aggregate stays self-consistent.
            let analyzer = PatternAnalyzer::new(config.analyzer.clone());
            let insights = store.all_insights().await;
            if let Some(report) = analyzer.weekly_report(&history, &insights) {
                store.update_weekly_report(report).await?;
            }

            println!(
                "Analyzed {} habits: {} new insights, {} correlations, {} predictions",
                history.len(),
                outcome.new_insights,
                outcome.merged_correlations,
                outcome.predictions
            );
        }

        Commands::Insights { habit } => {
            let insights = match habit {
                Some(habit) => store.insights_for_habit(&habit).await,
                None => store.all_insights().await,
            };
            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&insights)?);
            } else if insights.is_empty() {
                println!("No insights yet. Run `habitlens analyze <history-file>` first.");
            } else {
                println!("{:<8} {:<20} {}", "SCORE", "KIND", "INSIGHT");
                for insight in &insights {
                    println!(
                        "{:<8.2} {:<20} {}  [{}]",
                        insight.significance,
                        insight.kind.to_string(),
                        insight.description,
                        insight.id
                    );
                }
            }
        }

        Commands::Correlations => {
            let correlations = store.correlations().await;
            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&correlations)?);
            } else if correlations.is_empty() {
                println!("No correlations yet.");
            } else {
                println!("{:<8} {:<8} {}", "R", "DAYS", "PAIR");
                for corr in &correlations {
                    println!(
                        "{:<+8.2} {:<8} {}",
                        corr.strength, corr.sample_size, corr.description
                    );
                }
            }
        }

        Commands::Predictions => {
            let predictions = store.predictions().await;
            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&predictions)?);
            } else if predictions.is_empty() {
                println!("No predictions yet.");
            } else {
                println!("{:<12} {:<8} {:<20} {}", "DATE", "CHANCE", "HABIT", "BASIS");
                for p in &predictions {
                    println!(
                        "{:<12} {:<8} {:<20} {}",
                        p.predicted_date,
                        format!("{:.0}%", p.predicted_likelihood * 100.0),
                        p.habit_id,
                        p.basis
                    );
                }
            }
        }

        Commands::Report => match store.weekly_report().await {
            Some(report) if cli.format == "json" => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Some(report) => {
                println!("Week {} to {}", report.week_start, report.week_end);
                println!("{}", report.summary_text);
                for insight in &report.top_insights {
                    println!("  - {}", insight.description);
                }
            }
            None => println!("No weekly report yet."),
        },

        Commands::Dismiss { id } => {
            if store.dismiss_insight(&id).await? {
                println!("Dismissed {}", id);
            } else {
                println!("No insight with id {}", id);
            }
        }

        Commands::Clear { expired } => {
            if expired {
                let removed = store.clear_expired_insights().await?;
                println!("Removed {} expired insights", removed);
            } else {
                store.clear_all().await?;
                println!("Cleared all stored analytics");
            }
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone()),
    );

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

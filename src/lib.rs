//! # Habitlens
//!
//! Habit Pattern Intelligence - analyzes a user's habit completion history
//! to surface behavioral insights, pairwise correlations, and near-term
//! success predictions.
//!
//! ## Features
//!
//! - **Pure analysis**: `PatternAnalyzer` is a side-effect-free function
//!   from history to insights, safe to run on any worker
//! - **Deterministic ids**: re-analysis of the same data reproduces the
//!   same insight/correlation ids, so merges never duplicate observations
//! - **Bounded state**: the store caps insights at 50 and correlations at
//!   20, evicting the oldest by insertion order
//! - **Durable dismissals**: dismissed insights stay out of ranked reads
//!   even across repeated analysis runs
//! - **Live updates**: subscribers receive a change event after every
//!   successful mutation
//!
//! ## Modules
//!
//! - [`history`]: completion-history input types
//! - [`types`]: derived artifact types and the persisted aggregate
//! - [`analyzer`]: streak/trend/day-of-week insights, correlations, predictions
//! - [`store`]: stateful merge/dedup/expiry/ranking over a blob store
//! - [`import`]: JSON/CSV history loading
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use habitlens::analyzer::PatternAnalyzer;
//! use habitlens::history::HabitHistory;
//! use habitlens::store::{FileBlobStore, InsightStore, StoreConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let blob = Arc::new(FileBlobStore::new("./habitlens_data"));
//!     let store = InsightStore::open(
//!         blob,
//!         PatternAnalyzer::default(),
//!         StoreConfig::default(),
//!     )
//!     .await;
//!
//!     let history: HabitHistory = habitlens::import::load_history(
//!         std::path::Path::new("history.json"),
//!     )?;
//!
//!     let outcome = store.analyze_patterns(&history).await?;
//!     println!("{} new insights", outcome.new_insights);
//!
//!     for insight in store.all_insights().await {
//!         println!("[{:.2}] {}", insight.significance, insight.description);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod config;
pub mod history;
pub mod import;
pub mod store;
pub mod types;

// Re-export top-level types for convenience
pub use analyzer::{AnalysisResult, AnalyzerConfig, PatternAnalyzer, ReportBuilder};

pub use history::{CompletionRecord, CompletionState, HabitHistory};

pub use types::{
    HabitCorrelation, InsightKind, PatternInsight, PatternInsightsData, SuccessPrediction,
    WeeklyInsightReport,
};

pub use store::{
    AnalyzeOutcome, BlobStore, FileBlobStore, InsightStore, MemoryBlobStore, StoreConfig,
    StoreError, StoreEvent, StoreResult,
};

pub use config::{Config, ConfigError, LoggingConfig};

pub use import::{ImportError, ImportResult};

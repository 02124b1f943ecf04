//! Pattern Analyzer
//!
//! Pure analysis of habit completion history. `analyze` turns a
//! [`HabitHistory`] into candidate insights, pairwise correlations, and
//! near-term success predictions without performing any I/O or touching
//! shared state, so it is safe to invoke concurrently from any task.
//!
//! Output is order-independent: habits are processed in sorted-id order and
//! every collection is sorted deterministically, so permuting the input
//! map's iteration order never changes the result.

mod correlation;
mod prediction;
mod report;
mod streaks;

pub use correlation::pearson_correlation;
pub use report::ReportBuilder;

use crate::history::{day_series, HabitHistory};
use crate::types::{HabitCorrelation, PatternInsight, SuccessPrediction, WeeklyInsightReport};
use chrono::NaiveDate;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Thresholds and windows for pattern analysis
///
/// Defaults match the product behavior; every knob can be overridden from
/// the `[analyzer]` config section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Trailing window for recent-rate statistics, in days
    pub trailing_window_days: u32,
    /// Minimum observed days before trend insights are considered
    pub min_trend_history: usize,
    /// Minimum observations inside the trailing window for a trend
    pub min_trend_samples: usize,
    /// Minimum |recent - overall| completion-rate deviation for a trend insight
    pub trend_deviation_threshold: f64,
    /// Minimum observations of a weekday before it can produce an insight
    pub min_weekday_samples: usize,
    /// Minimum |weekday - overall| completion-rate deviation for a day-of-week insight
    pub weekday_deviation_threshold: f64,
    /// Minimum co-observed days before a pair is correlated
    pub min_correlation_samples: usize,
    /// Minimum |r| for a correlation to be emitted
    pub correlation_threshold: f64,
    /// Minimum |r| for a correlation-derived insight
    pub strong_correlation_threshold: f64,
    /// Minimum observed days before predictions are emitted
    pub min_prediction_history: usize,
    /// How many calendar days past the latest record to predict (1-3)
    pub prediction_horizon_days: u32,
    /// Per-day weight decay for the recent-rate prediction model
    pub recency_decay: f64,
    /// Days until a generated insight goes stale
    pub insight_ttl_days: i64,
    /// How many insights the weekly report surfaces
    pub report_top_insights: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            trailing_window_days: 14,
            min_trend_history: 14,
            min_trend_samples: 5,
            trend_deviation_threshold: 0.2,
            min_weekday_samples: 3,
            weekday_deviation_threshold: 0.25,
            min_correlation_samples: 7,
            correlation_threshold: 0.3,
            strong_correlation_threshold: 0.6,
            min_prediction_history: 7,
            prediction_horizon_days: 3,
            recency_decay: 0.85,
            insight_ttl_days: 14,
            report_top_insights: 5,
        }
    }
}

/// Everything one analysis run produces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    /// Candidate insights, significance-ordered
    pub insights: Vec<PatternInsight>,
    /// Pairwise correlations, |strength|-ordered
    pub correlations: Vec<HabitCorrelation>,
    /// Near-term predictions, ordered by habit then date
    pub predictions: Vec<SuccessPrediction>,
}

/// Pure habit pattern analysis
#[derive(Debug, Clone, Default)]
pub struct PatternAnalyzer {
    config: AnalyzerConfig,
}

impl PatternAnalyzer {
    /// Create an analyzer with the given thresholds
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze the full completion history.
    ///
    /// Habits with no records produce nothing; duplicate dates within one
    /// habit resolve last-write-wins by input order. Never fails.
    pub fn analyze(&self, history: &HabitHistory) -> AnalysisResult {
        let now = chrono::Utc::now();

        // Normalize into sorted per-habit day series so iteration order
        // never depends on the input map's hashing.
        let series: BTreeMap<String, BTreeMap<NaiveDate, f64>> = history
            .iter()
            .filter(|(id, records)| !id.is_empty() && !records.is_empty())
            .map(|(id, records)| (id.clone(), day_series(records)))
            .collect();

        let mut insights = Vec::new();
        let mut predictions = Vec::new();

        for (habit_id, days) in &series {
            if let Some(stats) = streaks::compute_stats(days, self.config.trailing_window_days) {
                insights.extend(streaks::habit_insights(habit_id, &stats, &self.config, now));
                predictions.extend(prediction::habit_predictions(
                    habit_id,
                    days,
                    &stats,
                    &self.config,
                ));
            }
        }

        let (correlations, correlation_insights) =
            correlation::pair_correlations(&series, &self.config, now);
        insights.extend(correlation_insights);

        insights.sort_by(|a, b| {
            b.significance
                .partial_cmp(&a.significance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        predictions.sort_by(|a, b| {
            a.habit_id
                .cmp(&b.habit_id)
                .then(a.predicted_date.cmp(&b.predicted_date))
        });

        tracing::debug!(
            habits = series.len(),
            insights = insights.len(),
            correlations = correlations.len(),
            predictions = predictions.len(),
            "Pattern analysis complete"
        );

        AnalysisResult {
            insights,
            correlations,
            predictions,
        }
    }

    /// Build the weekly report for the week containing the latest record.
    ///
    /// Convenience wrapper around [`ReportBuilder`]; `insights` is normally
    /// the output of [`analyze`](Self::analyze) on the same history.
    pub fn weekly_report(
        &self,
        history: &HabitHistory,
        insights: &[PatternInsight],
    ) -> Option<WeeklyInsightReport> {
        ReportBuilder::new(self.config.clone()).build(history, insights)
    }
}

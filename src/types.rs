//! Derived analytics types
//!
//! This module defines the artifacts the analyzer produces and the
//! aggregate the store persists:
//! - `PatternInsight`: a significance-scored observation about habits
//! - `HabitCorrelation`: symmetric pairwise completion correlation
//! - `SuccessPrediction`: near-term completion likelihood forecast
//! - `WeeklyInsightReport`: one week's summary
//! - `PatternInsightsData`: the single persisted aggregate
//!
//! Ids are deterministic functions of semantic content (never random or
//! sequential), so re-analysis of the same history reproduces the same ids
//! and the store can recognize already-known observations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Category tag for an insight
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum InsightKind {
    /// Streak milestones and completion-rate trends
    StreakTrend,
    /// Time-of-day completion patterns (kept for wire compatibility with
    /// sources that record completion times; date-only history never
    /// produces these)
    TimeOfDay,
    /// Per-weekday completion-rate deviations
    DayOfWeek,
    /// Derived from a strong pairwise correlation
    CorrelationDerived,
}

impl std::fmt::Display for InsightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsightKind::StreakTrend => write!(f, "streak-trend"),
            InsightKind::TimeOfDay => write!(f, "time-of-day"),
            InsightKind::DayOfWeek => write!(f, "day-of-week"),
            InsightKind::CorrelationDerived => write!(f, "correlation-derived"),
        }
    }
}

/// A derived, significance-scored observation about one or more habits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternInsight {
    /// Deterministic content-derived identifier
    pub id: String,
    /// Category tag
    pub kind: InsightKind,
    /// Habits this insight refers to (sorted, no duplicates)
    pub related_habits: Vec<String>,
    /// Ranking score; higher is more noteworthy. Not a probability.
    pub significance: f64,
    /// Human-readable description
    pub description: String,
    /// When this insight was generated
    pub created_at: DateTime<Utc>,
    /// Optional staleness deadline
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Soft-delete flag; dismissed insights are retained but never surfaced
    #[serde(default)]
    pub is_dismissed: bool,
}

impl PatternInsight {
    /// Whether this insight has passed its expiry deadline
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    /// Whether this insight refers to the given habit
    pub fn relates_to(&self, habit_id: &str) -> bool {
        self.related_habits.iter().any(|h| h == habit_id)
    }
}

/// Symmetric completion-pattern correlation between two habits
///
/// `habit_a` is always the lexicographically smaller id, so each unordered
/// pair maps to exactly one canonical entry and one id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HabitCorrelation {
    /// Deterministic id of the unordered pair
    pub id: String,
    /// First habit (lexicographically smaller)
    pub habit_a: String,
    /// Second habit
    pub habit_b: String,
    /// Pearson coefficient in [-1, 1]
    pub strength: f64,
    /// Number of co-observed days
    pub sample_size: usize,
    /// Human-readable description
    pub description: String,
}

impl HabitCorrelation {
    /// Deterministic id for an unordered habit pair
    pub fn pair_id(habit_a: &str, habit_b: &str) -> String {
        let (first, second) = if habit_a <= habit_b {
            (habit_a, habit_b)
        } else {
            (habit_b, habit_a)
        };
        format!("corr:{}+{}", first, second)
    }

    /// Whether this correlation involves the given habit
    pub fn involves(&self, habit_id: &str) -> bool {
        self.habit_a == habit_id || self.habit_b == habit_id
    }
}

/// Forecasted completion likelihood for a habit on a near-future date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuccessPrediction {
    /// Habit being predicted
    pub habit_id: String,
    /// Calendar date the prediction applies to
    pub predicted_date: NaiveDate,
    /// Probability of completion in [0, 1]
    pub predicted_likelihood: f64,
    /// Short rationale for the estimate
    pub basis: String,
}

/// One week's aggregate insight report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyInsightReport {
    /// First day of the week (Monday)
    pub week_start: NaiveDate,
    /// Last day of the week (Sunday)
    pub week_end: NaiveDate,
    /// Top insights for the week, significance-ordered
    pub top_insights: Vec<PatternInsight>,
    /// Natural-language summary of the week versus the prior week
    pub summary_text: String,
}

/// The single persisted analytics aggregate
///
/// Mutated only through the store's read-modify-write operations. Both
/// collections keep insertion order; overflow evicts the oldest entries.
/// Unknown fields from newer schema versions are ignored on read and every
/// field defaults, so older blobs load cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatternInsightsData {
    /// Accumulated insights, insertion-ordered, capped
    #[serde(default)]
    pub insights: Vec<PatternInsight>,
    /// Accumulated correlations, insertion-ordered, capped
    #[serde(default)]
    pub correlations: Vec<HabitCorrelation>,
    /// Current predictions (replaced wholesale on each analysis run)
    #[serde(default)]
    pub predictions: Vec<SuccessPrediction>,
    /// Most recent weekly report, if any
    #[serde(default)]
    pub weekly_report: Option<WeeklyInsightReport>,
    /// When the last analysis run merged into this aggregate
    #[serde(default)]
    pub last_analyzed_at: Option<DateTime<Utc>>,
}

impl PatternInsightsData {
    /// Append an insight unless its id is already known (dismissed entries
    /// count as known, which keeps dismissals durable across re-analysis).
    /// Returns whether the insight was added.
    pub fn merge_insight(&mut self, insight: PatternInsight) -> bool {
        if self.insights.iter().any(|i| i.id == insight.id) {
            return false;
        }
        self.insights.push(insight);
        true
    }

    /// Drop the oldest insights until at most `cap` remain
    pub fn truncate_insights(&mut self, cap: usize) {
        if self.insights.len() > cap {
            let excess = self.insights.len() - cap;
            self.insights.drain(..excess);
        }
    }

    /// Replace the correlation sharing `correlation.id` in place, or append
    /// and evict the oldest past `cap`. Returns true when an existing entry
    /// was replaced.
    pub fn upsert_correlation(&mut self, correlation: HabitCorrelation, cap: usize) -> bool {
        if let Some(existing) = self.correlations.iter_mut().find(|c| c.id == correlation.id) {
            *existing = correlation;
            return true;
        }
        self.correlations.push(correlation);
        if self.correlations.len() > cap {
            let excess = self.correlations.len() - cap;
            self.correlations.drain(..excess);
        }
        false
    }

    /// Soft-delete the insight with the given id. No-op when absent.
    /// Returns whether a matching insight was found.
    pub fn dismiss(&mut self, id: &str) -> bool {
        match self.insights.iter_mut().find(|i| i.id == id) {
            Some(insight) => {
                insight.is_dismissed = true;
                true
            }
            None => false,
        }
    }

    /// Remove every insight whose expiry deadline is at or before `now`.
    /// Returns the number removed.
    pub fn remove_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.insights.len();
        self.insights.retain(|i| !i.is_expired(now));
        before - self.insights.len()
    }
}

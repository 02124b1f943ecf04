//! Completion history input types
//!
//! This module defines the shape of the data the analyzer consumes:
//! - `CompletionState`: per-day tri-state completion marker
//! - `CompletionRecord`: one habit-day observation
//! - `HabitHistory`: the full habit id → records mapping
//!
//! The analyzer never reads these directly; it works on the normalized
//! per-day indicator series produced by [`day_series`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Per-day completion state for a habit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CompletionState {
    /// Habit fully completed that day
    Complete,
    /// Habit partially completed
    Partial,
    /// Habit not completed (serialized as "none" for wire compatibility)
    #[serde(rename = "none")]
    Missed,
}

impl CompletionState {
    /// Numeric completion indicator: complete=1.0, partial=0.5, none=0.0
    pub fn indicator(&self) -> f64 {
        match self {
            CompletionState::Complete => 1.0,
            CompletionState::Partial => 0.5,
            CompletionState::Missed => 0.0,
        }
    }
}

impl std::fmt::Display for CompletionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionState::Complete => write!(f, "complete"),
            CompletionState::Partial => write!(f, "partial"),
            CompletionState::Missed => write!(f, "none"),
        }
    }
}

impl FromStr for CompletionState {
    type Err = String;

    /// Lenient parsing for imports: accepts the canonical names plus
    /// common spellings ("done", "missed", "yes"/"no", 1/0.5/0).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "complete" | "completed" | "done" | "yes" | "true" | "1" => {
                Ok(CompletionState::Complete)
            }
            "partial" | "half" | "0.5" => Ok(CompletionState::Partial),
            "none" | "missed" | "skipped" | "no" | "false" | "0" => Ok(CompletionState::Missed),
            other => Err(format!("unknown completion state: {}", other)),
        }
    }
}

/// One habit-day observation
///
/// At most one record per habit per day; duplicates are a caller contract
/// violation and resolve last-write-wins during normalization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CompletionRecord {
    /// Calendar date of the observation
    pub date: NaiveDate,
    /// Completion state for that day
    pub state: CompletionState,
}

impl CompletionRecord {
    /// Create a new record
    pub fn new(date: NaiveDate, state: CompletionState) -> Self {
        Self { date, state }
    }

    /// Shorthand for a completed day
    pub fn complete(date: NaiveDate) -> Self {
        Self::new(date, CompletionState::Complete)
    }

    /// Shorthand for a partially completed day
    pub fn partial(date: NaiveDate) -> Self {
        Self::new(date, CompletionState::Partial)
    }

    /// Shorthand for a missed day
    pub fn missed(date: NaiveDate) -> Self {
        Self::new(date, CompletionState::Missed)
    }

    /// Numeric completion indicator for this record
    pub fn indicator(&self) -> f64 {
        self.state.indicator()
    }
}

/// Full completion history: habit id → records
///
/// No ordering is assumed on either the map or the record vectors.
pub type HabitHistory = HashMap<String, Vec<CompletionRecord>>;

/// Collapse records into a chronologically ordered per-day indicator series.
///
/// Duplicate dates resolve last-write-wins by input order; the returned
/// map is empty when `records` is empty.
pub fn day_series(records: &[CompletionRecord]) -> BTreeMap<NaiveDate, f64> {
    let mut series = BTreeMap::new();
    for record in records {
        series.insert(record.date, record.indicator());
    }
    series
}

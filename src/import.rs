//! Completion history import
//!
//! Loads a [`HabitHistory`] from the two interchange formats the CLI
//! accepts:
//! - JSON: `{"habit-id": [{"date": "2024-06-01", "state": "complete"}]}`
//! - CSV: `habit,date,state` rows with a header
//!
//! Import is row-tolerant: malformed CSV rows are skipped with a warning
//! rather than failing the whole file, matching how bank/export files tend
//! to arrive with a few bad lines.

use crate::history::{CompletionRecord, CompletionState, HabitHistory};
use chrono::NaiveDate;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while importing history
#[derive(Error, Debug)]
pub enum ImportError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON document malformed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV structurally unreadable
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Unrecognized file extension
    #[error("Unsupported history format: {0} (expected .json or .csv)")]
    UnsupportedFormat(String),
}

/// Result type alias for import operations
pub type ImportResult<T> = Result<T, ImportError>;

/// Load history from a file, dispatching on its extension
pub fn load_history(path: &Path) -> ImportResult<HabitHistory> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => {
            let content = std::fs::read_to_string(path)?;
            history_from_json(&content)
        }
        "csv" => {
            let file = std::fs::File::open(path)?;
            history_from_csv(file)
        }
        other => Err(ImportError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse history from a JSON document
pub fn history_from_json(content: &str) -> ImportResult<HabitHistory> {
    let history: HabitHistory = serde_json::from_str(content)?;
    Ok(history)
}

/// Parse history from CSV with a `habit,date,state` header.
///
/// Rows with an unparsable date or state are skipped with a warning; the
/// count of skipped rows is logged at the end.
pub fn history_from_csv<R: Read>(reader: R) -> ImportResult<HabitHistory> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut history = HabitHistory::new();
    let mut skipped = 0usize;

    for (row_index, row) in csv_reader.records().enumerate() {
        let record = row?;
        let line = row_index + 2; // header is line 1

        let (habit, date_str, state_str) = match (record.get(0), record.get(1), record.get(2)) {
            (Some(h), Some(d), Some(s)) if !h.is_empty() => (h, d, s),
            _ => {
                tracing::warn!(line, "Skipping CSV row with missing fields");
                skipped += 1;
                continue;
            }
        };

        let date = match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!(line, date = %date_str, error = %e, "Skipping CSV row with bad date");
                skipped += 1;
                continue;
            }
        };

        let state: CompletionState = match state_str.parse() {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(line, error = %e, "Skipping CSV row with bad state");
                skipped += 1;
                continue;
            }
        };

        history
            .entry(habit.to_string())
            .or_default()
            .push(CompletionRecord::new(date, state));
    }

    if skipped > 0 {
        tracing::warn!(skipped, "Some CSV rows were skipped during import");
    }
    tracing::debug!(
        habits = history.len(),
        records = history.values().map(Vec::len).sum::<usize>(),
        "History imported"
    );

    Ok(history)
}

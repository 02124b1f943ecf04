//! Success prediction
//!
//! Near-term completion likelihood from a weighted recent-rate model:
//! completion indicators over the trailing window are averaged with
//! exponentially decaying weights (most recent day heaviest), then adjusted
//! by the habit's day-of-week effect, damped so a thin weekday sample never
//! dominates the estimate.

use super::streaks::{weekday_name, HabitStats};
use super::AnalyzerConfig;
use crate::types::SuccessPrediction;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

/// How strongly the day-of-week deviation shifts the base rate
const WEEKDAY_ADJUSTMENT_DAMPING: f64 = 0.5;

/// Predict completion likelihood for the next 1-3 calendar days after the
/// habit's latest record. Habits with insufficient history produce nothing.
pub(super) fn habit_predictions(
    habit_id: &str,
    days: &BTreeMap<NaiveDate, f64>,
    stats: &HabitStats,
    config: &AnalyzerConfig,
) -> Vec<SuccessPrediction> {
    if stats.observed_days < config.min_prediction_history {
        return Vec::new();
    }

    // Weighted recent rate: only observed days contribute, with weight
    // decaying per day of distance from the latest record.
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for offset in 0..config.trailing_window_days as i64 {
        let date = stats.latest - Duration::days(offset);
        if let Some(&value) = days.get(&date) {
            let weight = config.recency_decay.powi(offset as i32);
            weighted_sum += weight * value;
            weight_total += weight;
        }
    }
    if weight_total == 0.0 {
        return Vec::new();
    }
    let base_rate = weighted_sum / weight_total;

    let mut predictions = Vec::new();
    for offset in 1..=config.prediction_horizon_days as i64 {
        let target = stats.latest + Duration::days(offset);
        let weekday_idx = target.weekday().num_days_from_monday() as usize;
        let weekday = stats.weekday_rates[weekday_idx];

        let deviation = if weekday.samples >= config.min_weekday_samples {
            weekday.rate - stats.overall_rate
        } else {
            0.0
        };

        let likelihood = (base_rate + WEEKDAY_ADJUSTMENT_DAMPING * deviation).clamp(0.0, 1.0);
        let rounded = (likelihood * 100.0).round() / 100.0;

        let basis = if deviation.abs() > f64::EPSILON {
            format!(
                "{:.0}% weighted {}-day rate, {}s {:+.0}% vs average",
                base_rate * 100.0,
                config.trailing_window_days,
                weekday_name(target.weekday()),
                deviation * 100.0
            )
        } else {
            format!(
                "{:.0}% weighted {}-day rate",
                base_rate * 100.0,
                config.trailing_window_days
            )
        };

        predictions.push(SuccessPrediction {
            habit_id: habit_id.to_string(),
            predicted_date: target,
            predicted_likelihood: rounded,
            basis,
        });
    }

    predictions
}

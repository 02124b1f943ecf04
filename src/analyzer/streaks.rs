//! Streak and time-pattern statistics
//!
//! Per-habit statistics over the normalized day series: streak lengths,
//! trailing-window trend versus the overall completion rate, and
//! per-weekday rates. Insights are emitted only past the configured
//! deviation thresholds and minimum sample sizes; thin data is suppressed
//! rather than surfaced as noise.

use super::AnalyzerConfig;
use crate::types::{InsightKind, PatternInsight};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use std::collections::BTreeMap;

/// Streak thresholds that count as milestones, largest first
const STREAK_MILESTONES: [u32; 5] = [100, 60, 30, 14, 7];

/// Completion rate and sample count for one weekday
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct WeekdayRate {
    pub samples: usize,
    pub rate: f64,
}

/// Computed statistics for one habit's day series
#[derive(Debug, Clone)]
pub(super) struct HabitStats {
    /// Number of observed days
    pub observed_days: usize,
    /// Date of the latest record
    pub latest: NaiveDate,
    /// Consecutive fully-complete days ending at the latest record
    pub current_streak: u32,
    /// Longest run of consecutive fully-complete days
    pub best_streak: u32,
    /// Mean completion indicator over all observed days
    pub overall_rate: f64,
    /// Mean indicator over the trailing window, if any days fall in it
    pub recent_rate: Option<f64>,
    /// Observed days inside the trailing window
    pub recent_samples: usize,
    /// Per-weekday rates, indexed by days-from-Monday
    pub weekday_rates: [WeekdayRate; 7],
}

/// Compute statistics for one habit. Returns `None` for an empty series.
pub(super) fn compute_stats(
    days: &BTreeMap<NaiveDate, f64>,
    trailing_window_days: u32,
) -> Option<HabitStats> {
    let latest = *days.keys().next_back()?;
    let observed_days = days.len();
    let overall_rate = days.values().sum::<f64>() / observed_days as f64;

    // Current streak: walk back day by day while fully complete.
    let mut current_streak = 0u32;
    let mut cursor = latest;
    while days.get(&cursor).copied() == Some(1.0) {
        current_streak += 1;
        cursor -= Duration::days(1);
    }

    // Best streak: longest run of consecutive complete days.
    let mut best_streak = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for (&date, &value) in days {
        if value == 1.0 {
            let contiguous = prev.map(|p| p + Duration::days(1) == date).unwrap_or(false);
            run = if contiguous { run + 1 } else { 1 };
            best_streak = best_streak.max(run);
            prev = Some(date);
        } else {
            run = 0;
            prev = None;
        }
    }

    // Trailing-window rate.
    let window_start = latest - Duration::days(trailing_window_days as i64 - 1);
    let recent: Vec<f64> = days
        .range(window_start..=latest)
        .map(|(_, &v)| v)
        .collect();
    let recent_samples = recent.len();
    let recent_rate = if recent.is_empty() {
        None
    } else {
        Some(recent.iter().sum::<f64>() / recent.len() as f64)
    };

    // Per-weekday rates.
    let mut sums = [0.0f64; 7];
    let mut counts = [0usize; 7];
    for (&date, &value) in days {
        let idx = date.weekday().num_days_from_monday() as usize;
        sums[idx] += value;
        counts[idx] += 1;
    }
    let mut weekday_rates = [WeekdayRate::default(); 7];
    for idx in 0..7 {
        if counts[idx] > 0 {
            weekday_rates[idx] = WeekdayRate {
                samples: counts[idx],
                rate: sums[idx] / counts[idx] as f64,
            };
        }
    }

    Some(HabitStats {
        observed_days,
        latest,
        current_streak,
        best_streak,
        overall_rate,
        recent_rate,
        recent_samples,
        weekday_rates,
    })
}

/// Significance score: monotonic in deviation magnitude and sample size.
/// `k` controls how quickly sample size saturates.
pub(super) fn significance(deviation: f64, samples: usize, k: f64) -> f64 {
    deviation.abs() * samples as f64 / (samples as f64 + k)
}

/// Full weekday name for descriptions
pub(super) fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Short lowercase weekday tag for ids
fn weekday_tag(index: usize) -> &'static str {
    ["mon", "tue", "wed", "thu", "fri", "sat", "sun"][index]
}

fn weekday_from_index(index: usize) -> Weekday {
    match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

/// Generate streak, trend, and day-of-week insights for one habit
pub(super) fn habit_insights(
    habit_id: &str,
    stats: &HabitStats,
    config: &AnalyzerConfig,
    now: DateTime<Utc>,
) -> Vec<PatternInsight> {
    let mut insights = Vec::new();
    let expires_at = Some(now + Duration::days(config.insight_ttl_days));

    // Streak milestone: the largest threshold the current streak has passed.
    if let Some(&milestone) = STREAK_MILESTONES
        .iter()
        .find(|&&m| stats.current_streak >= m)
    {
        insights.push(PatternInsight {
            id: format!("streak:{}:{}", habit_id, milestone),
            kind: InsightKind::StreakTrend,
            related_habits: vec![habit_id.to_string()],
            significance: milestone as f64 / (milestone as f64 + 14.0),
            description: format!(
                "{} has hit a {}-day streak ({} days running, best: {})",
                habit_id, milestone, stats.current_streak, stats.best_streak
            ),
            created_at: now,
            expires_at,
            is_dismissed: false,
        });
    }

    // Trend: trailing window versus the habit's overall rate.
    if stats.observed_days >= config.min_trend_history
        && stats.recent_samples >= config.min_trend_samples
    {
        if let Some(recent_rate) = stats.recent_rate {
            let deviation = recent_rate - stats.overall_rate;
            if deviation.abs() >= config.trend_deviation_threshold {
                let direction = if deviation > 0.0 { "improving" } else { "declining" };
                let week = stats.latest.iso_week();
                insights.push(PatternInsight {
                    id: format!(
                        "trend:{}:{}:{}-W{:02}",
                        habit_id,
                        direction,
                        week.year(),
                        week.week()
                    ),
                    kind: InsightKind::StreakTrend,
                    related_habits: vec![habit_id.to_string()],
                    significance: significance(deviation, stats.recent_samples, 10.0),
                    description: format!(
                        "{} is {}: {:.0}% over the last {} days vs {:.0}% overall",
                        habit_id,
                        direction,
                        recent_rate * 100.0,
                        config.trailing_window_days,
                        stats.overall_rate * 100.0
                    ),
                    created_at: now,
                    expires_at,
                    is_dismissed: false,
                });
            }
        }
    }

    // Day-of-week: strongest positive and negative deviations past threshold.
    let mut best: Option<(usize, f64)> = None;
    let mut worst: Option<(usize, f64)> = None;
    for (idx, rate) in stats.weekday_rates.iter().enumerate() {
        if rate.samples < config.min_weekday_samples {
            continue;
        }
        let deviation = rate.rate - stats.overall_rate;
        if deviation >= config.weekday_deviation_threshold
            && best.map(|(_, d)| deviation > d).unwrap_or(true)
        {
            best = Some((idx, deviation));
        }
        if deviation <= -config.weekday_deviation_threshold
            && worst.map(|(_, d)| deviation < d).unwrap_or(true)
        {
            worst = Some((idx, deviation));
        }
    }
    if let Some((idx, deviation)) = best {
        let rate = stats.weekday_rates[idx];
        insights.push(PatternInsight {
            id: format!("dow:{}:{}:hi", habit_id, weekday_tag(idx)),
            kind: InsightKind::DayOfWeek,
            related_habits: vec![habit_id.to_string()],
            significance: significance(deviation, rate.samples, 5.0),
            description: format!(
                "{} succeeds most on {}s: {:.0}% vs {:.0}% overall",
                habit_id,
                weekday_name(weekday_from_index(idx)),
                rate.rate * 100.0,
                stats.overall_rate * 100.0
            ),
            created_at: now,
            expires_at,
            is_dismissed: false,
        });
    }
    if let Some((idx, deviation)) = worst {
        let rate = stats.weekday_rates[idx];
        insights.push(PatternInsight {
            id: format!("dow:{}:{}:lo", habit_id, weekday_tag(idx)),
            kind: InsightKind::DayOfWeek,
            related_habits: vec![habit_id.to_string()],
            significance: significance(deviation, rate.samples, 5.0),
            description: format!(
                "{} slips on {}s: {:.0}% vs {:.0}% overall",
                habit_id,
                weekday_name(weekday_from_index(idx)),
                rate.rate * 100.0,
                stats.overall_rate * 100.0
            ),
            created_at: now,
            expires_at,
            is_dismissed: false,
        });
    }

    insights
}

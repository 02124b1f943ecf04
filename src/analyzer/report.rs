//! Weekly report builder
//!
//! Aggregates the week containing the latest record into a single
//! [`WeeklyInsightReport`]: the top insights by significance plus a short
//! summary comparing the week's completion rate to the prior week's.

use super::AnalyzerConfig;
use crate::history::{day_series, HabitHistory};
use crate::types::{PatternInsight, WeeklyInsightReport};
use chrono::{Datelike, Duration, NaiveDate};

/// Builds weekly aggregate reports from history and freshly computed insights
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    config: AnalyzerConfig,
}

impl ReportBuilder {
    /// Create a report builder with the given configuration
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Build the report for the Monday-to-Sunday week containing the latest
    /// record. Returns `None` when the history holds no records at all.
    pub fn build(
        &self,
        history: &HabitHistory,
        insights: &[PatternInsight],
    ) -> Option<WeeklyInsightReport> {
        let latest = history
            .values()
            .flat_map(|records| records.iter().map(|r| r.date))
            .max()?;

        let week_start = latest - Duration::days(latest.weekday().num_days_from_monday() as i64);
        let week_end = week_start + Duration::days(6);
        let prior_start = week_start - Duration::days(7);
        let prior_end = week_start - Duration::days(1);

        let (this_rate, this_samples) = window_rate(history, week_start, week_end);
        let (prior_rate, prior_samples) = window_rate(history, prior_start, prior_end);

        let active_habits = history
            .iter()
            .filter(|(_, records)| {
                records
                    .iter()
                    .any(|r| r.date >= week_start && r.date <= week_end)
            })
            .count();

        let mut top_insights: Vec<PatternInsight> = insights
            .iter()
            .filter(|i| !i.is_dismissed)
            .cloned()
            .collect();
        top_insights.sort_by(|a, b| {
            b.significance
                .partial_cmp(&a.significance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        top_insights.truncate(self.config.report_top_insights);

        let summary_text = compose_summary(
            active_habits,
            this_rate,
            this_samples,
            prior_rate,
            prior_samples,
        );

        Some(WeeklyInsightReport {
            week_start,
            week_end,
            top_insights,
            summary_text,
        })
    }
}

/// Mean completion indicator and sample count over a date window
fn window_rate(history: &HabitHistory, start: NaiveDate, end: NaiveDate) -> (f64, usize) {
    let mut sum = 0.0;
    let mut samples = 0;
    for records in history.values() {
        for (_, value) in day_series(records).range(start..=end) {
            sum += value;
            samples += 1;
        }
    }
    if samples == 0 {
        (0.0, 0)
    } else {
        (sum / samples as f64, samples)
    }
}

fn compose_summary(
    active_habits: usize,
    this_rate: f64,
    this_samples: usize,
    prior_rate: f64,
    prior_samples: usize,
) -> String {
    let habits = if active_habits == 1 {
        "1 habit".to_string()
    } else {
        format!("{} habits", active_habits)
    };

    if this_samples == 0 {
        return format!("No completions logged this week across {}.", habits);
    }

    let comparison = if prior_samples == 0 {
        "with no prior week to compare".to_string()
    } else {
        let delta = this_rate - prior_rate;
        if delta >= 0.05 {
            format!("up from {:.0}% the week before", prior_rate * 100.0)
        } else if delta <= -0.05 {
            format!("down from {:.0}% the week before", prior_rate * 100.0)
        } else {
            format!("about even with last week's {:.0}%", prior_rate * 100.0)
        }
    };

    format!(
        "Tracked {} this week at a {:.0}% completion rate, {}.",
        habits,
        this_rate * 100.0,
        comparison
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::CompletionRecord;
    use crate::types::InsightKind;
    use chrono::Utc;
    use std::collections::HashMap;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn insight(id: &str, significance: f64) -> PatternInsight {
        PatternInsight {
            id: id.to_string(),
            kind: InsightKind::StreakTrend,
            related_habits: vec!["meditation".to_string()],
            significance,
            description: id.to_string(),
            created_at: Utc::now(),
            expires_at: None,
            is_dismissed: false,
        }
    }

    #[test]
    fn test_empty_history_yields_no_report() {
        let builder = ReportBuilder::new(AnalyzerConfig::default());
        assert!(builder.build(&HashMap::new(), &[]).is_none());
    }

    #[test]
    fn test_week_bounds_are_monday_anchored() {
        // June 19, 2024 is a Wednesday; its week runs June 17-23.
        let mut history: HabitHistory = HashMap::new();
        history.insert(
            "meditation".to_string(),
            vec![CompletionRecord::complete(date(19))],
        );

        let report = ReportBuilder::new(AnalyzerConfig::default())
            .build(&history, &[])
            .unwrap();
        assert_eq!(report.week_start, date(17));
        assert_eq!(report.week_end, date(23));
    }

    #[test]
    fn test_summary_compares_to_prior_week() {
        // Prior week (June 10-16): half complete. This week (17-23): all complete.
        let mut records: Vec<CompletionRecord> = (10..=16)
            .map(|d| {
                if d % 2 == 0 {
                    CompletionRecord::complete(date(d))
                } else {
                    CompletionRecord::missed(date(d))
                }
            })
            .collect();
        records.extend((17..=23).map(|d| CompletionRecord::complete(date(d))));

        let mut history: HabitHistory = HashMap::new();
        history.insert("meditation".to_string(), records);

        let report = ReportBuilder::new(AnalyzerConfig::default())
            .build(&history, &[])
            .unwrap();
        assert!(report.summary_text.contains("100% completion rate"));
        assert!(report.summary_text.contains("up from"));
    }

    #[test]
    fn test_summary_without_prior_week() {
        let mut history: HabitHistory = HashMap::new();
        history.insert(
            "meditation".to_string(),
            (17..=20).map(|d| CompletionRecord::complete(date(d))).collect(),
        );

        let report = ReportBuilder::new(AnalyzerConfig::default())
            .build(&history, &[])
            .unwrap();
        assert!(report.summary_text.contains("no prior week"));
    }

    #[test]
    fn test_top_insights_capped_and_ordered() {
        let mut history: HabitHistory = HashMap::new();
        history.insert(
            "meditation".to_string(),
            vec![CompletionRecord::complete(date(19))],
        );

        let insights: Vec<PatternInsight> = (0..8)
            .map(|i| insight(&format!("i{}", i), i as f64 / 10.0))
            .collect();

        let report = ReportBuilder::new(AnalyzerConfig::default())
            .build(&history, &insights)
            .unwrap();
        assert_eq!(report.top_insights.len(), 5);
        assert_eq!(report.top_insights[0].id, "i7");
        for pair in report.top_insights.windows(2) {
            assert!(pair[0].significance >= pair[1].significance);
        }
    }

    #[test]
    fn test_dismissed_insights_excluded_from_report() {
        let mut history: HabitHistory = HashMap::new();
        history.insert(
            "meditation".to_string(),
            vec![CompletionRecord::complete(date(19))],
        );

        let mut dismissed = insight("dismissed", 0.9);
        dismissed.is_dismissed = true;
        let visible = insight("visible", 0.1);

        let report = ReportBuilder::new(AnalyzerConfig::default())
            .build(&history, &[dismissed, visible])
            .unwrap();
        assert_eq!(report.top_insights.len(), 1);
        assert_eq!(report.top_insights[0].id, "visible");
    }
}

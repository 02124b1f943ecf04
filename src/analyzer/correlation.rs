//! Pairwise habit correlation
//!
//! Pearson correlation between per-day completion indicators over the
//! intersection of observed dates for each unordered habit pair. Pairs with
//! too few co-observed days or a coefficient below the threshold are
//! silently skipped. Strong pairs additionally yield a correlation-derived
//! insight.

use super::streaks::significance;
use super::AnalyzerConfig;
use crate::types::{HabitCorrelation, InsightKind, PatternInsight};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Compute correlations (and derived insights) for every unordered pair.
///
/// `series_by_habit` must be sorted by habit id; the nested loop then visits
/// pairs in a deterministic order with `habit_a < habit_b`.
pub(super) fn pair_correlations(
    series_by_habit: &BTreeMap<String, BTreeMap<NaiveDate, f64>>,
    config: &AnalyzerConfig,
    now: DateTime<Utc>,
) -> (Vec<HabitCorrelation>, Vec<PatternInsight>) {
    let mut correlations = Vec::new();
    let mut insights = Vec::new();

    let habits: Vec<(&String, &BTreeMap<NaiveDate, f64>)> = series_by_habit.iter().collect();

    for i in 0..habits.len() {
        for j in (i + 1)..habits.len() {
            let (habit_a, days_a) = habits[i];
            let (habit_b, days_b) = habits[j];

            let (values_a, values_b) = align_by_date(days_a, days_b);
            if values_a.len() < config.min_correlation_samples {
                continue;
            }

            let r = pearson_correlation(&values_a, &values_b);
            if r.is_nan() || r.abs() < config.correlation_threshold {
                continue;
            }

            let rounded = (r * 100.0).round() / 100.0;
            let direction = if r > 0.0 { "positively" } else { "negatively" };
            let sample_size = values_a.len();

            correlations.push(HabitCorrelation {
                id: HabitCorrelation::pair_id(habit_a, habit_b),
                habit_a: habit_a.clone(),
                habit_b: habit_b.clone(),
                strength: rounded,
                sample_size,
                description: format!(
                    "{} {} correlates with {} (r={:.2}, {} correlation over {} shared days)",
                    habit_a,
                    direction,
                    habit_b,
                    rounded,
                    correlation_strength(r),
                    sample_size
                ),
            });

            if r.abs() >= config.strong_correlation_threshold {
                let description = if r > 0.0 {
                    format!(
                        "Days you complete {}, {} tends to follow (r={:.2} over {} shared days)",
                        habit_a, habit_b, rounded, sample_size
                    )
                } else {
                    format!(
                        "{} and {} tend to move in opposite directions (r={:.2} over {} shared days)",
                        habit_a, habit_b, rounded, sample_size
                    )
                };
                insights.push(PatternInsight {
                    id: format!("correlation:{}+{}", habit_a, habit_b),
                    kind: InsightKind::CorrelationDerived,
                    related_habits: vec![habit_a.clone(), habit_b.clone()],
                    significance: significance(r, sample_size, 7.0),
                    description,
                    created_at: now,
                    expires_at: Some(now + Duration::days(config.insight_ttl_days)),
                    is_dismissed: false,
                });
            }
        }
    }

    correlations.sort_by(|a, b| {
        b.strength
            .abs()
            .partial_cmp(&a.strength.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    (correlations, insights)
}

/// Align two day series on their shared dates
fn align_by_date(
    days_a: &BTreeMap<NaiveDate, f64>,
    days_b: &BTreeMap<NaiveDate, f64>,
) -> (Vec<f64>, Vec<f64>) {
    let mut values_a = Vec::new();
    let mut values_b = Vec::new();

    for (date, &value_a) in days_a {
        if let Some(&value_b) = days_b.get(date) {
            values_a.push(value_a);
            values_b.push(value_b);
        }
    }

    (values_a, values_b)
}

/// Calculate Pearson correlation coefficient
///
/// Returns a value between -1 and 1:
/// - 1: perfect positive correlation
/// - 0: no correlation
/// - -1: perfect negative correlation
///
/// A constant series has no variance; the coefficient is reported as 0.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }

    let n = x.len() as f64;

    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|b| b * b).sum();

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x.powi(2)) * (n * sum_y2 - sum_y.powi(2))).sqrt();

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Convert correlation coefficient to a human-readable strength label
fn correlation_strength(r: f64) -> &'static str {
    let abs_r = r.abs();
    if abs_r > 0.7 {
        "strong"
    } else if abs_r > 0.5 {
        "moderate"
    } else {
        "weak"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn series(values: &[(u32, f64)]) -> BTreeMap<NaiveDate, f64> {
        values.iter().map(|&(d, v)| (date(d), v)).collect()
    }

    #[test]
    fn test_pearson_perfect_positive() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let r = pearson_correlation(&x, &y);
        assert!((r - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![10.0, 8.0, 6.0, 4.0, 2.0];
        let r = pearson_correlation(&x, &y);
        assert!((r + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_pearson_constant_series_is_zero() {
        let x = vec![1.0, 1.0, 1.0, 1.0];
        let y = vec![1.0, 0.0, 1.0, 0.0];
        assert_eq!(pearson_correlation(&x, &y), 0.0);
    }

    #[test]
    fn test_pearson_empty() {
        let x: Vec<f64> = vec![];
        assert_eq!(pearson_correlation(&x, &x.clone()), 0.0);
    }

    #[test]
    fn test_align_by_date_intersection_only() {
        let a = series(&[(1, 1.0), (2, 0.5), (4, 0.0)]);
        let b = series(&[(1, 0.0), (3, 1.0), (4, 1.0)]);
        let (va, vb) = align_by_date(&a, &b);
        assert_eq!(va, vec![1.0, 0.0]);
        assert_eq!(vb, vec![0.0, 1.0]);
    }

    #[test]
    fn test_pair_below_min_samples_skipped() {
        let mut by_habit = BTreeMap::new();
        by_habit.insert("a".to_string(), series(&[(1, 1.0), (2, 0.0), (3, 1.0)]));
        by_habit.insert("b".to_string(), series(&[(1, 1.0), (2, 0.0), (3, 1.0)]));

        let (correlations, insights) =
            pair_correlations(&by_habit, &AnalyzerConfig::default(), Utc::now());
        assert!(correlations.is_empty());
        assert!(insights.is_empty());
    }

    #[test]
    fn test_strong_pair_emits_correlation_and_insight() {
        let pattern: Vec<(u32, f64)> = (1..=10)
            .map(|d| (d, if d % 3 == 0 { 0.0 } else { 1.0 }))
            .collect();
        let mut by_habit = BTreeMap::new();
        by_habit.insert("meditation".to_string(), series(&pattern));
        by_habit.insert("sleep-early".to_string(), series(&pattern));

        let (correlations, insights) =
            pair_correlations(&by_habit, &AnalyzerConfig::default(), Utc::now());

        assert_eq!(correlations.len(), 1);
        let corr = &correlations[0];
        assert_eq!(corr.id, "corr:meditation+sleep-early");
        assert!((corr.strength - 1.0).abs() < 0.01);
        assert_eq!(corr.sample_size, 10);

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::CorrelationDerived);
        assert_eq!(insights[0].related_habits, vec!["meditation", "sleep-early"]);
    }

    #[test]
    fn test_pair_id_matches_canonical_ordering() {
        // The BTreeMap guarantees habit_a < habit_b, so the stored id equals
        // the canonical pair id computed from either ordering.
        let pattern: Vec<(u32, f64)> = (1..=10)
            .map(|d| (d, if d % 2 == 0 { 0.0 } else { 1.0 }))
            .collect();
        let mut by_habit = BTreeMap::new();
        by_habit.insert("zebra".to_string(), series(&pattern));
        by_habit.insert("alpha".to_string(), series(&pattern));

        let (correlations, _) =
            pair_correlations(&by_habit, &AnalyzerConfig::default(), Utc::now());
        assert_eq!(correlations[0].habit_a, "alpha");
        assert_eq!(
            correlations[0].id,
            HabitCorrelation::pair_id("zebra", "alpha")
        );
    }

    #[test]
    fn test_negative_correlation_direction() {
        let ups: Vec<(u32, f64)> = (1..=10)
            .map(|d| (d, if d % 2 == 0 { 1.0 } else { 0.0 }))
            .collect();
        let downs: Vec<(u32, f64)> = (1..=10)
            .map(|d| (d, if d % 2 == 0 { 0.0 } else { 1.0 }))
            .collect();
        let mut by_habit = BTreeMap::new();
        by_habit.insert("coffee".to_string(), series(&ups));
        by_habit.insert("sleep".to_string(), series(&downs));

        let (correlations, insights) =
            pair_correlations(&by_habit, &AnalyzerConfig::default(), Utc::now());
        assert!((correlations[0].strength + 1.0).abs() < 0.01);
        assert!(correlations[0].description.contains("negatively"));
        assert!(insights[0].description.contains("opposite directions"));
    }
}

//! Benchmarks for the pattern analyzer
//!
//! Run with: cargo bench

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use habitlens::analyzer::PatternAnalyzer;
use habitlens::history::{CompletionRecord, CompletionState, HabitHistory};
use std::collections::HashMap;

/// Synthetic history: `habits` habits over `days` days, with a mix of
/// complete/partial/missed states that exercises every analysis rule.
fn create_history(habits: usize, days: u32) -> HabitHistory {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut history = HashMap::new();

    for habit in 0..habits {
        let records: Vec<CompletionRecord> = (0..days)
            .map(|day| {
                let state = match (day as usize + habit) % 5 {
                    0 => CompletionState::Missed,
                    1 => CompletionState::Partial,
                    _ => CompletionState::Complete,
                };
                CompletionRecord::new(start + Duration::days(day as i64), state)
            })
            .collect();
        history.insert(format!("habit-{:02}", habit), records);
    }

    history
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    let analyzer = PatternAnalyzer::default();

    for (habits, days) in [(5, 30), (10, 90), (20, 365)] {
        let history = create_history(habits, days);

        group.throughput(Throughput::Elements((habits as u32 * days) as u64));
        group.bench_function(format!("{}_habits_{}_days", habits, days), |b| {
            b.iter(|| analyzer.analyze(black_box(&history)))
        });
    }

    group.finish();
}

fn bench_weekly_report(c: &mut Criterion) {
    let analyzer = PatternAnalyzer::default();
    let history = create_history(10, 90);
    let result = analyzer.analyze(&history);

    c.bench_function("weekly_report_10_habits", |b| {
        b.iter(|| analyzer.weekly_report(black_box(&history), black_box(&result.insights)))
    });
}

criterion_group!(benches, bench_analyze, bench_weekly_report);
criterion_main!(benches);

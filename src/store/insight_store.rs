//! Insight Store
//!
//! Owns the accumulated analytics aggregate: merges fresh analysis output
//! into persisted state, deduplicates by stable id, enforces the collection
//! caps, and answers ranked queries. Durable persistence is delegated to a
//! [`BlobStore`]; the aggregate is cached in memory behind a `RwLock` so
//! reads never touch the backend.
//!
//! Every mutation is a single read-modify-write: the write lock is held
//! across the whole mutate-and-persist sequence, so concurrent mutations
//! serialize and the cap/merge invariants hold. Reads run concurrently and
//! observe either the pre- or post-mutation state, never a partial write.

use crate::analyzer::PatternAnalyzer;
use crate::history::HabitHistory;
use crate::store::blob::BlobStore;
use crate::store::error::StoreResult;
use crate::store::events::{StoreEvent, EVENT_CHANNEL_CAPACITY};
use crate::types::{
    HabitCorrelation, PatternInsight, PatternInsightsData, SuccessPrediction, WeeklyInsightReport,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Store limits and persistence settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum retained insights; overflow evicts the oldest by insertion order
    pub max_insights: usize,
    /// Maximum retained correlations
    pub max_correlations: usize,
    /// Logical key the aggregate is persisted under
    pub blob_key: String,
    /// Capacity of the change-event broadcast channel
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_insights: 50,
            max_correlations: 20,
            blob_key: "pattern-insights".to_string(),
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

/// Counts from one `analyze_patterns` merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzeOutcome {
    /// Insights newly added (already-known ids skipped)
    pub new_insights: usize,
    /// Correlations added or refreshed in place
    pub merged_correlations: usize,
    /// Predictions now current
    pub predictions: usize,
}

/// Stateful owner of the persisted analytics aggregate
pub struct InsightStore {
    analyzer: PatternAnalyzer,
    blob: Arc<dyn BlobStore>,
    config: StoreConfig,
    state: RwLock<PatternInsightsData>,
    events: broadcast::Sender<StoreEvent>,
}

impl InsightStore {
    /// Open the store, loading any previously persisted aggregate.
    ///
    /// An unreadable or unparsable blob falls back to the empty aggregate:
    /// analytics are best-effort and never block the rest of the app.
    pub async fn open(
        blob: Arc<dyn BlobStore>,
        analyzer: PatternAnalyzer,
        config: StoreConfig,
    ) -> Self {
        let state = Self::load_or_default(blob.as_ref(), &config.blob_key).await;
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            analyzer,
            blob,
            config,
            state: RwLock::new(state),
            events,
        }
    }

    async fn load_or_default(blob: &dyn BlobStore, key: &str) -> PatternInsightsData {
        match blob.read(key).await {
            Ok(Some(content)) => match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(
                        key = %key,
                        error = %e,
                        "Stored insight blob is unparsable, starting from empty state"
                    );
                    PatternInsightsData::default()
                }
            },
            Ok(None) => PatternInsightsData::default(),
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    error = %e,
                    "Failed to read insight blob, starting from empty state"
                );
                PatternInsightsData::default()
            }
        }
    }

    /// Subscribe to change events; one event arrives per successful mutation
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Undismissed insights, significance descending (most-recent first on ties)
    pub async fn all_insights(&self) -> Vec<PatternInsight> {
        let state = self.state.read().await;
        ranked(state.insights.iter().filter(|i| !i.is_dismissed))
    }

    /// Undismissed insights that reference the given habit
    pub async fn insights_for_habit(&self, habit_id: &str) -> Vec<PatternInsight> {
        let state = self.state.read().await;
        ranked(
            state
                .insights
                .iter()
                .filter(|i| !i.is_dismissed && i.relates_to(habit_id)),
        )
    }

    /// All correlations, |strength| descending
    pub async fn correlations(&self) -> Vec<HabitCorrelation> {
        let state = self.state.read().await;
        let mut correlations = state.correlations.clone();
        correlations.sort_by(|a, b| {
            b.strength
                .abs()
                .partial_cmp(&a.strength.abs())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        correlations
    }

    /// All predictions, predicted date ascending
    pub async fn predictions(&self) -> Vec<SuccessPrediction> {
        let state = self.state.read().await;
        let mut predictions = state.predictions.clone();
        predictions.sort_by(|a, b| {
            a.predicted_date
                .cmp(&b.predicted_date)
                .then_with(|| a.habit_id.cmp(&b.habit_id))
        });
        predictions
    }

    /// The most recent weekly report, if any
    pub async fn weekly_report(&self) -> Option<WeeklyInsightReport> {
        self.state.read().await.weekly_report.clone()
    }

    /// When the aggregate last merged an analysis run
    pub async fn last_analyzed_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_analyzed_at
    }

    /// A consistent copy of the full aggregate
    pub async fn snapshot(&self) -> PatternInsightsData {
        self.state.read().await.clone()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Run the analyzer over `history` and merge the output into stored state.
    ///
    /// Insights merge first-seen-wins by id, so repeated runs over
    /// overlapping history never duplicate an observation and dismissals
    /// stay dismissed. Correlations refresh in place by id. Predictions are
    /// replaced wholesale: they forecast from the latest history and stale
    /// ones would surface outdated likelihoods.
    pub async fn analyze_patterns(&self, history: &HabitHistory) -> StoreResult<AnalyzeOutcome> {
        // Pure computation stays outside the lock.
        let result = self.analyzer.analyze(history);

        let mut state = self.state.write().await;

        let mut new_insights = 0;
        for insight in result.insights {
            if state.merge_insight(insight) {
                new_insights += 1;
            }
        }
        state.truncate_insights(self.config.max_insights);

        let merged_correlations = result.correlations.len();
        for correlation in result.correlations {
            state.upsert_correlation(correlation, self.config.max_correlations);
        }

        let predictions = result.predictions.len();
        state.predictions = result.predictions;
        state.last_analyzed_at = Some(Utc::now());

        self.persist(&state).await?;
        drop(state);

        tracing::info!(
            new_insights,
            merged_correlations,
            predictions,
            "Analysis merged into insight store"
        );
        self.notify(StoreEvent::Analyzed {
            new_insights,
            merged_correlations,
            predictions,
        });

        Ok(AnalyzeOutcome {
            new_insights,
            merged_correlations,
            predictions,
        })
    }

    /// Append a single insight, evicting the oldest past the cap
    pub async fn add_insight(&self, insight: PatternInsight) -> StoreResult<()> {
        let id = insight.id.clone();

        let mut state = self.state.write().await;
        state.insights.push(insight);
        state.truncate_insights(self.config.max_insights);
        self.persist(&state).await?;
        drop(state);

        self.notify(StoreEvent::InsightAdded { id });
        Ok(())
    }

    /// Insert a correlation, replacing any existing entry with the same id
    pub async fn add_correlation(&self, correlation: HabitCorrelation) -> StoreResult<()> {
        let id = correlation.id.clone();

        let mut state = self.state.write().await;
        state.upsert_correlation(correlation, self.config.max_correlations);
        self.persist(&state).await?;
        drop(state);

        self.notify(StoreEvent::CorrelationAdded { id });
        Ok(())
    }

    /// Soft-delete an insight so ranked reads never surface it again.
    /// Unknown ids are a no-op. Returns whether a matching insight existed.
    pub async fn dismiss_insight(&self, id: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if !state.dismiss(id) {
            tracing::debug!(id = %id, "Dismiss for unknown insight id ignored");
            return Ok(false);
        }
        self.persist(&state).await?;
        drop(state);

        self.notify(StoreEvent::InsightDismissed { id: id.to_string() });
        Ok(true)
    }

    /// Replace the stored weekly report
    pub async fn update_weekly_report(&self, report: WeeklyInsightReport) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.weekly_report = Some(report);
        self.persist(&state).await?;
        drop(state);

        self.notify(StoreEvent::ReportUpdated);
        Ok(())
    }

    /// Remove every insight whose expiry deadline has passed.
    /// Returns the number removed.
    pub async fn clear_expired_insights(&self) -> StoreResult<usize> {
        let mut state = self.state.write().await;
        let removed = state.remove_expired(Utc::now());
        if removed == 0 {
            return Ok(0);
        }
        self.persist(&state).await?;
        drop(state);

        tracing::info!(removed, "Expired insights cleared");
        self.notify(StoreEvent::ExpiredCleared { removed });
        Ok(removed)
    }

    /// Reset the entire aggregate to empty
    pub async fn clear_all(&self) -> StoreResult<()> {
        let mut state = self.state.write().await;
        *state = PatternInsightsData::default();
        self.persist(&state).await?;
        drop(state);

        self.notify(StoreEvent::Cleared);
        Ok(())
    }

    async fn persist(&self, state: &PatternInsightsData) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(state)?;
        self.blob.write(&self.config.blob_key, &json).await
    }

    fn notify(&self, event: StoreEvent) {
        // Send fails only when no subscriber is listening, which is fine.
        let _ = self.events.send(event);
    }
}

/// Clone and rank insights: significance descending, then newest first,
/// then id for a stable total order.
fn ranked<'a>(insights: impl Iterator<Item = &'a PatternInsight>) -> Vec<PatternInsight> {
    let mut result: Vec<PatternInsight> = insights.cloned().collect();
    result.sort_by(|a, b| {
        b.significance
            .partial_cmp(&a.significance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::CompletionRecord;
    use crate::store::blob::MemoryBlobStore;
    use crate::types::InsightKind;
    use chrono::{Duration, NaiveDate};
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
            description: format!("insight {}", id),
            created_at: Utc::now(),
            expires_at: None,
            is_dismissed: false,
        }
    }

    async fn open_memory_store() -> InsightStore {
        InsightStore::open(
            Arc::new(MemoryBlobStore::new()),
            PatternAnalyzer::default(),
            StoreConfig::default(),
        )
        .await
    }

    fn streak_history() -> HabitHistory {
        let mut history = HashMap::new();
        history.insert(
            "meditation".to_string(),
            (1..=10)
                .map(|d| CompletionRecord::complete(date(d)))
                .collect::<Vec<_>>(),
        );
        history
    }

    #[tokio::test]
    async fn test_analyze_merge_is_idempotent() {
        let store = open_memory_store().await;
        let history = streak_history();

        let first = store.analyze_patterns(&history).await.unwrap();
        assert!(first.new_insights > 0);

        let second = store.analyze_patterns(&history).await.unwrap();
        assert_eq!(second.new_insights, 0);

        let insights = store.all_insights().await;
        let mut ids: Vec<&str> = insights.iter().map(|i| i.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), insights.len());
    }

    #[tokio::test]
    async fn test_dismiss_filters_and_survives_reanalysis() {
        let store = open_memory_store().await;
        let history = streak_history();

        store.analyze_patterns(&history).await.unwrap();
        let id = store.all_insights().await[0].id.clone();

        assert!(store.dismiss_insight(&id).await.unwrap());
        assert!(store.all_insights().await.iter().all(|i| i.id != id));

        // Re-analysis of the same data must not resurface the dismissed id.
        store.analyze_patterns(&history).await.unwrap();
        assert!(store.all_insights().await.iter().all(|i| i.id != id));

        // Still retained (auditable) in the raw aggregate.
        let snapshot = store.snapshot().await;
        assert!(snapshot.insights.iter().any(|i| i.id == id && i.is_dismissed));
    }

    #[tokio::test]
    async fn test_dismiss_unknown_id_is_noop() {
        let store = open_memory_store().await;
        assert!(!store.dismiss_insight("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_insight_cap_evicts_oldest() {
        let store = open_memory_store().await;
        for i in 0..50 {
            store.add_insight(insight(&format!("i{}", i), 0.5)).await.unwrap();
        }
        store.add_insight(insight("overflow", 0.5)).await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.insights.len(), 50);
        assert!(snapshot.insights.iter().all(|i| i.id != "i0"));
        assert!(snapshot.insights.iter().any(|i| i.id == "overflow"));
    }

    #[tokio::test]
    async fn test_insights_ranked_by_significance() {
        let store = open_memory_store().await;
        store.add_insight(insight("low", 0.2)).await.unwrap();
        store.add_insight(insight("high", 0.9)).await.unwrap();
        store.add_insight(insight("mid", 0.5)).await.unwrap();

        let ids: Vec<String> = store
            .all_insights()
            .await
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn test_ranked_ties_break_newest_first() {
        let store = open_memory_store().await;
        let mut older = insight("older", 0.5);
        older.created_at = Utc::now() - Duration::hours(2);
        let mut newer = insight("newer", 0.5);
        newer.created_at = Utc::now();

        store.add_insight(older).await.unwrap();
        store.add_insight(newer).await.unwrap();

        let ids: Vec<String> = store
            .all_insights()
            .await
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_insights_for_habit_filters_by_relation() {
        let store = open_memory_store().await;
        let mut other = insight("other", 0.9);
        other.related_habits = vec!["reading".to_string()];
        store.add_insight(insight("mine", 0.5)).await.unwrap();
        store.add_insight(other).await.unwrap();

        let for_meditation = store.insights_for_habit("meditation").await;
        assert_eq!(for_meditation.len(), 1);
        assert_eq!(for_meditation[0].id, "mine");
    }

    #[tokio::test]
    async fn test_add_correlation_upserts() {
        let store = open_memory_store().await;
        let mut corr = HabitCorrelation {
            id: HabitCorrelation::pair_id("a", "b"),
            habit_a: "a".to_string(),
            habit_b: "b".to_string(),
            strength: 0.4,
            sample_size: 10,
            description: "first".to_string(),
        };
        store.add_correlation(corr.clone()).await.unwrap();

        corr.strength = 0.8;
        store.add_correlation(corr).await.unwrap();

        let correlations = store.correlations().await;
        assert_eq!(correlations.len(), 1);
        assert_eq!(correlations[0].strength, 0.8);
    }

    #[tokio::test]
    async fn test_clear_expired_removes_only_stale() {
        let store = open_memory_store().await;
        let mut stale = insight("stale", 0.5);
        stale.expires_at = Some(Utc::now() - Duration::hours(1));
        let mut fresh = insight("fresh", 0.5);
        fresh.expires_at = Some(Utc::now() + Duration::days(1));

        store.add_insight(stale).await.unwrap();
        store.add_insight(fresh).await.unwrap();

        assert_eq!(store.clear_expired_insights().await.unwrap(), 1);
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.insights.len(), 1);
        assert_eq!(snapshot.insights[0].id, "fresh");
    }

    #[tokio::test]
    async fn test_clear_all_resets_aggregate() {
        let store = open_memory_store().await;
        store.analyze_patterns(&streak_history()).await.unwrap();
        store.clear_all().await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot, PatternInsightsData::default());
    }

    #[tokio::test]
    async fn test_state_persists_across_reopen() {
        let blob: Arc<MemoryBlobStore> = Arc::new(MemoryBlobStore::new());
        let store = InsightStore::open(
            blob.clone(),
            PatternAnalyzer::default(),
            StoreConfig::default(),
        )
        .await;
        store.analyze_patterns(&streak_history()).await.unwrap();
        let before = store.snapshot().await;
        drop(store);

        let reopened = InsightStore::open(
            blob,
            PatternAnalyzer::default(),
            StoreConfig::default(),
        )
        .await;
        assert_eq!(reopened.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_corrupt_blob_falls_back_to_empty() {
        let blob = Arc::new(MemoryBlobStore::with_contents(
            "pattern-insights",
            "{not valid json",
        ));
        let store = InsightStore::open(
            blob,
            PatternAnalyzer::default(),
            StoreConfig::default(),
        )
        .await;
        assert_eq!(store.snapshot().await, PatternInsightsData::default());
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let blob = Arc::new(MemoryBlobStore::new());
        blob.fail_writes(true);
        let store = InsightStore::open(
            blob,
            PatternAnalyzer::default(),
            StoreConfig::default(),
        )
        .await;
        assert!(store.add_insight(insight("a", 0.5)).await.is_err());
    }

    #[tokio::test]
    async fn test_events_emitted_on_mutations() {
        let store = open_memory_store().await;
        let mut events = store.subscribe();

        store.add_insight(insight("a", 0.5)).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::InsightAdded { id: "a".to_string() }
        );

        store.dismiss_insight("a").await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::InsightDismissed { id: "a".to_string() }
        );

        store.clear_all().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Cleared);
    }

    #[tokio::test]
    async fn test_analyze_emits_analyzed_event() {
        let store = open_memory_store().await;
        let mut events = store.subscribe();

        let outcome = store.analyze_patterns(&streak_history()).await.unwrap();
        match events.recv().await.unwrap() {
            StoreEvent::Analyzed { new_insights, .. } => {
                assert_eq!(new_insights, outcome.new_insights)
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_adds_respect_cap() {
        let store = Arc::new(open_memory_store().await);
        let mut handles = Vec::new();
        for i in 0..60 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.add_insight(insight(&format!("c{}", i), 0.5)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.snapshot().await.insights.len(), 50);
    }
}

//! Store change events
//!
//! Every successful mutation publishes one event on a broadcast channel so
//! observers (dashboards, notification schedulers) can react live to
//! merges and dismissals without polling. Subscribers that fall behind
//! simply miss events; they can always re-query the store for a consistent
//! snapshot.

/// Default capacity of the change-event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A change to the stored analytics aggregate
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// An analysis run merged into the aggregate
    Analyzed {
        /// Insights newly added by the merge (already-known ids excluded)
        new_insights: usize,
        /// Correlations added or refreshed
        merged_correlations: usize,
        /// Predictions now current
        predictions: usize,
    },
    /// A single insight was explicitly inserted
    InsightAdded { id: String },
    /// A correlation was inserted or replaced
    CorrelationAdded { id: String },
    /// An insight was dismissed
    InsightDismissed { id: String },
    /// The weekly report was replaced
    ReportUpdated,
    /// Expired insights were removed
    ExpiredCleared { removed: usize },
    /// The entire aggregate was reset
    Cleared,
}

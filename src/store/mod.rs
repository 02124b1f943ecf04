//! Insight store: persistence and lifecycle for derived analytics
//!
//! The store layer owns the single [`PatternInsightsData`](crate::types::PatternInsightsData) aggregate:
//! - [`InsightStore`]: merge/dedup/expiry/ranking over analysis output
//! - [`BlobStore`]: pluggable durable storage for the serialized aggregate
//! - [`StoreEvent`]: broadcast change notifications for live observers

mod blob;
mod error;
mod events;
mod insight_store;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use error::{StoreError, StoreResult};
pub use events::{StoreEvent, EVENT_CHANNEL_CAPACITY};
pub use insight_store::{AnalyzeOutcome, InsightStore, StoreConfig};

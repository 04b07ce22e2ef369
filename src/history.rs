use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

use crate::detection::{DetectionResult, MediaType};

/// One completed detection run. Created exactly once when the run completes
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub media: String,
    pub media_type: MediaType,
    pub timestamp_ms: u64,
    pub results: DetectionResult,
    pub model_id: String,
}

impl HistoryItem {
    #[must_use]
    pub fn new(
        media: impl Into<String>,
        media_type: MediaType,
        timestamp_ms: u64,
        results: DetectionResult,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            media: media.into(),
            media_type,
            timestamp_ms,
            results,
            model_id: model_id.into(),
        }
    }
}

/// Session-scoped log of past detection runs, newest first.
///
/// Append-only by design: there is no removal, capacity limit, or
/// persistence; the log lives and dies with the page session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStore {
    items: VecDeque<HistoryItem>,
}

impl HistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, item: HistoryItem) {
        self.items.push_front(item);
    }

    /// Current contents in most-recent-first order.
    pub fn items(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

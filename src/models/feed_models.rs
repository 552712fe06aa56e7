use super::{DetectionSample, Event};
use crate::utils::timestamps::parse_timestamp;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Chronological position of a feed item.
///
/// Malformed timestamps order before every well-formed one, so they land at
/// the oldest end of a descending feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SortKey(Option<NaiveDateTime>);

impl SortKey {
    pub fn parse(raw: &str) -> Self {
        Self(parse_timestamp(raw))
    }

    pub fn instant(&self) -> Option<NaiveDateTime> {
        self.0
    }

    pub fn is_malformed(&self) -> bool {
        self.0.is_none()
    }
}

/// Source row behind a feed item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedEntry {
    Event(Event),
    Detection(DetectionSample),
}

/// One row of the unified activity feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub entry: FeedEntry,
    /// Timestamp text the item is ordered by
    pub timestamp: String,
    #[serde(skip)]
    pub sort_key: SortKey,
}

impl FeedItem {
    pub fn from_event(event: Event) -> Self {
        let timestamp = event.timestamp.clone();
        Self {
            sort_key: SortKey::parse(&timestamp),
            timestamp,
            entry: FeedEntry::Event(event),
        }
    }

    pub fn from_sample(sample: DetectionSample) -> Self {
        let timestamp = sample.timestamp();
        Self {
            sort_key: SortKey::parse(&timestamp),
            timestamp,
            entry: FeedEntry::Detection(sample),
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match &self.entry {
            FeedEntry::Event(event) => Some(event),
            FeedEntry::Detection(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.entry {
            FeedEntry::Event(_) => "event",
            FeedEntry::Detection(_) => "detection",
        }
    }
}

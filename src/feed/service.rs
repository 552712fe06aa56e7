use super::merge::merge;
use crate::client::ConsoleBackend;
use crate::config::FeedConfig;
use crate::error::{Error, Result};
use crate::models::{Event, FeedItem, FeedQuery};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Remote collection a feed snapshot is assembled from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    Events,
    DetectionSamples,
}

impl Display for FeedSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSource::Events => write!(f, "events"),
            FeedSource::DetectionSamples => write!(f, "detection samples"),
        }
    }
}

/// A source that could not be fetched for a snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub source: FeedSource,
    pub error: Error,
}

/// Merged feed as of one refresh
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub items: Vec<FeedItem>,
    /// Every event row fetched, including those cut from `items`
    pub events: Vec<Event>,
    /// Rows received from each source before truncation
    pub event_count: usize,
    pub sample_count: usize,
    pub refreshed_at: DateTime<Utc>,
    pub failures: Vec<SourceFailure>,
}

impl FeedSnapshot {
    /// Look an event up among all fetched rows, not only the displayed ones
    pub fn find_event(&self, id: i64) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// True when any source was refused for lack of a session or role
    pub fn is_unauthorized(&self) -> bool {
        self.failures.iter().any(|f| f.error.is_authorization())
    }
}

/// Loads the unified activity feed and applies operator actions to it
pub struct FeedService {
    backend: Arc<dyn ConsoleBackend>,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(backend: Arc<dyn ConsoleBackend>, config: FeedConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Fetch both sources concurrently and merge them.
    ///
    /// A failing source leaves the other one visible; the failure is recorded
    /// in the snapshot instead.
    pub async fn load(&self, query: &FeedQuery) -> FeedSnapshot {
        let now = Utc::now();
        let event_filters = query.event_filters(self.config.event_limit, now);
        let sample_filters = query.sample_filters(self.config.sample_limit, now);

        let (events, samples) = tokio::join!(
            self.backend.fetch_events(&event_filters),
            self.backend.fetch_detection_samples(&sample_filters)
        );

        let mut failures = Vec::new();
        let events = settle(FeedSource::Events, events, &mut failures);
        let samples = settle(FeedSource::DetectionSamples, samples, &mut failures);

        let items = merge(&events, &samples, self.config.display_limit);
        debug!(
            "Feed refreshed: {} events, {} samples, {} shown",
            events.len(),
            samples.len(),
            items.len()
        );

        FeedSnapshot {
            items,
            event_count: events.len(),
            sample_count: samples.len(),
            events,
            refreshed_at: now,
            failures,
        }
    }

    /// Acknowledge an event; already acknowledged events are left as they are
    pub async fn acknowledge(&self, event: &Event) -> Result<()> {
        if event.is_acknowledged() {
            debug!("Event {} already acknowledged, skipping", event.id);
            return Ok(());
        }

        self.backend.acknowledge_event(event.id).await?;
        info!("Acknowledged event {}", event.id);
        Ok(())
    }

    /// Acknowledge by id, looking the event up in a snapshot first when possible
    pub async fn acknowledge_id(&self, id: i64, snapshot: Option<&FeedSnapshot>) -> Result<()> {
        let known = snapshot.and_then(|s| s.find_event(id));

        match known {
            Some(event) => self.acknowledge(event).await,
            None => {
                self.backend.acknowledge_event(id).await?;
                info!("Acknowledged event {}", id);
                Ok(())
            }
        }
    }
}

fn settle<T>(source: FeedSource, result: Result<Vec<T>>, failures: &mut Vec<SourceFailure>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(error) => {
            warn!("Failed to fetch {}: {}", source, error);
            failures.push(SourceFailure { source, error });
            Vec::new()
        }
    }
}

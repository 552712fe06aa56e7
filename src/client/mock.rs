use super::ConsoleBackend;
use crate::error::{Error, Result};
use crate::models::{
    DetectionSample, Event, EventFilters, EventType, Recording, RecordingCatalog, RecordingMedia,
    SampleFilters, Severity,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

pub(crate) fn event(id: i64, timestamp: &str) -> Event {
    Event {
        id,
        event_type: EventType::Motion,
        camera_id: Some("cam-1".to_string()),
        site_id: None,
        timestamp: timestamp.to_string(),
        timestamp_utc: None,
        metadata: None,
        severity: Severity::Medium,
        acknowledged_by: None,
        acknowledged_at: None,
        integrity_hash: None,
    }
}

pub(crate) fn sample(date: &str, time: &str) -> DetectionSample {
    DetectionSample {
        date: date.to_string(),
        time: time.to_string(),
        object: Some("person".to_string()),
        ..DetectionSample::default()
    }
}

pub(crate) fn recording(name: &str) -> Recording {
    Recording {
        name: name.to_string(),
        size_bytes: 1024,
        created_utc: String::new(),
    }
}

pub(crate) fn media(transcoded: bool) -> RecordingMedia {
    RecordingMedia {
        bytes: b"not really video".to_vec(),
        content_type: if transcoded { "video/mp4" } else { "video/x-msvideo" }.to_string(),
        transcoded,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Scriptable [`ConsoleBackend`]
#[derive(Default)]
pub(crate) struct MockBackend {
    pub events: Mutex<Vec<Event>>,
    pub samples: Mutex<Vec<DetectionSample>>,
    pub catalog: Mutex<RecordingCatalog>,
    pub event_error: Mutex<Option<Error>>,
    pub sample_error: Mutex<Option<Error>>,
    pub catalog_error: Mutex<Option<Error>>,
    /// Consumed one per media call; an empty queue serves the requested rendition
    pub media_outcomes: Mutex<VecDeque<Result<RecordingMedia>>>,
    /// Consumed one per media call; the call waits until the sender fires or drops
    media_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    catalog_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub media_requests: Mutex<Vec<(String, bool)>>,
    pub event_filters_seen: Mutex<Vec<EventFilters>>,
    pub sample_filters_seen: Mutex<Vec<SampleFilters>>,
    pub acknowledged: Mutex<Vec<i64>>,
    catalog_fetches: AtomicUsize,
}

impl MockBackend {
    pub fn with_recordings(names: &[&str]) -> Self {
        let backend = Self::default();
        lock(&backend.catalog).recordings = names.iter().map(|name| recording(name)).collect();
        backend
    }

    pub fn set_catalog(&self, catalog: RecordingCatalog) {
        *lock(&self.catalog) = catalog;
    }

    pub fn push_media_outcome(&self, outcome: Result<RecordingMedia>) {
        lock(&self.media_outcomes).push_back(outcome);
    }

    /// Hold the next media call until the returned sender fires
    pub fn gate_next_media(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.media_gates).push_back(rx);
        tx
    }

    /// Hold the next catalog call until the returned sender fires
    pub fn gate_catalog(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *lock(&self.catalog_gate) = Some(rx);
        tx
    }

    pub fn media_requests(&self) -> Vec<(String, bool)> {
        lock(&self.media_requests).clone()
    }

    pub fn catalog_fetches(&self) -> usize {
        self.catalog_fetches.load(Ordering::SeqCst)
    }

    pub fn acknowledged(&self) -> Vec<i64> {
        lock(&self.acknowledged).clone()
    }
}

#[async_trait]
impl ConsoleBackend for MockBackend {
    async fn fetch_events(&self, filters: &EventFilters) -> Result<Vec<Event>> {
        lock(&self.event_filters_seen).push(filters.clone());
        if let Some(error) = lock(&self.event_error).clone() {
            return Err(error);
        }
        Ok(lock(&self.events).clone())
    }

    async fn fetch_detection_samples(&self, filters: &SampleFilters) -> Result<Vec<DetectionSample>> {
        lock(&self.sample_filters_seen).push(filters.clone());
        if let Some(error) = lock(&self.sample_error).clone() {
            return Err(error);
        }
        Ok(lock(&self.samples).clone())
    }

    async fn fetch_recording_catalog(&self) -> Result<RecordingCatalog> {
        self.catalog_fetches.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.catalog_gate).take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(error) = lock(&self.catalog_error).clone() {
            return Err(error);
        }
        Ok(lock(&self.catalog).clone())
    }

    async fn fetch_recording_media(
        &self,
        name: &str,
        prefer_transcoded: bool,
    ) -> Result<RecordingMedia> {
        lock(&self.media_requests).push((name.to_string(), prefer_transcoded));
        let gate = lock(&self.media_gates).pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let outcome = lock(&self.media_outcomes).pop_front();
        outcome.unwrap_or_else(|| Ok(media(prefer_transcoded)))
    }

    async fn acknowledge_event(&self, id: i64) -> Result<()> {
        lock(&self.acknowledged).push(id);
        Ok(())
    }
}

pub mod http;
#[cfg(test)]
pub(crate) mod mock;

use crate::error::Result;
use crate::models::{
    DetectionSample, Event, EventFilters, RecordingCatalog, RecordingMedia, SampleFilters,
};
use async_trait::async_trait;

pub use http::HttpBackend;

/// Remote data access used by the feed and playback engines
#[async_trait]
pub trait ConsoleBackend: Send + Sync {
    /// Alert events matching the filters, newest first
    async fn fetch_events(&self, filters: &EventFilters) -> Result<Vec<Event>>;

    /// Detection samples matching the filters, newest first
    async fn fetch_detection_samples(&self, filters: &SampleFilters) -> Result<Vec<DetectionSample>>;

    /// Recording directory; a forbidden listing is a flagged empty catalog, not an error
    async fn fetch_recording_catalog(&self) -> Result<RecordingCatalog>;

    /// Media bytes of one recording
    async fn fetch_recording_media(&self, name: &str, prefer_transcoded: bool)
        -> Result<RecordingMedia>;

    /// Mark an event acknowledged; acknowledging twice is not an error
    async fn acknowledge_event(&self, id: i64) -> Result<()>;
}

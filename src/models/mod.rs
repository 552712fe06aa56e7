pub mod detection_models;
pub mod event_models;
pub mod feed_models;
pub mod filter_models;
pub mod recording_models;

pub use detection_models::DetectionSample;
pub use event_models::{Acknowledgment, Event, EventMetadata, EventType, Severity};
pub use feed_models::{FeedEntry, FeedItem, SortKey};
pub use filter_models::{AckFilter, DateRange, EventFilters, FeedQuery, SampleFilters};
pub use recording_models::{MomentMatch, Recording, RecordingCatalog, RecordingMedia};

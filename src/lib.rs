pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod playback;
pub mod utils;

// Re-export main components for easier use
pub use client::{ConsoleBackend, HttpBackend};
pub use error::{Error, Result};
pub use feed::{merge, FeedRefresher, FeedService, FeedSnapshot};
pub use playback::{
    find_recording, PlaybackController, PlaybackRequest, PlaybackState, RecordingDirectory,
    TempFileMediaStore,
};

pub mod merge;
pub mod refresher;
pub mod service;

pub use merge::merge;
pub use refresher::FeedRefresher;
pub use service::{FeedService, FeedSnapshot, FeedSource, SourceFailure};

pub mod correlator;
pub mod directory;
pub mod media;
pub mod session;


pub use correlator::find_recording;
pub use directory::RecordingDirectory;
pub use media::{MediaHandle, MediaResource, MediaStore, TempFileMediaStore};
pub use session::{FailureReason, PlaybackController, PlaybackRequest, PlaybackState};

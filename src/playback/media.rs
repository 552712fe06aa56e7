use crate::error::{Error, Result};
use crate::models::RecordingMedia;
use log::{debug, warn};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Locally addressable media a player can open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResource {
    pub id: Uuid,
    pub recording: String,
    pub path: PathBuf,
    pub content_type: String,
    pub transcoded: bool,
}

/// Ownership token for allocated media.
///
/// Not `Clone`: giving it back to [`MediaStore::release`] consumes it, so a
/// handle can be released at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct MediaHandle {
    resource: MediaResource,
    size_bytes: u64,
}

impl MediaHandle {
    pub fn new(resource: MediaResource, size_bytes: u64) -> Self {
        Self {
            resource,
            size_bytes,
        }
    }

    pub fn id(&self) -> Uuid {
        self.resource.id
    }

    pub fn resource(&self) -> &MediaResource {
        &self.resource
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// Turns retrieved media bytes into player resources and frees them again
pub trait MediaStore: Send + Sync {
    fn allocate(&self, recording: &str, media: RecordingMedia) -> Result<MediaHandle>;

    fn release(&self, handle: MediaHandle) -> Result<()>;
}

/// Media store backed by temporary files, removed on release
pub struct TempFileMediaStore {
    dir: PathBuf,
    files: Mutex<HashMap<Uuid, NamedTempFile>>,
}

impl TempFileMediaStore {
    /// Store files under `dir`, or the system temp dir when `None`
    pub fn new(dir: Option<&Path>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::temp_dir(),
        };
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            files: Mutex::new(HashMap::new()),
        })
    }

    /// Number of allocated files not yet released
    pub fn live_count(&self) -> usize {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl MediaStore for TempFileMediaStore {
    fn allocate(&self, recording: &str, media: RecordingMedia) -> Result<MediaHandle> {
        let suffix = format!(".{}", media.extension());
        let mut file = tempfile::Builder::new()
            .prefix("vigil-playback-")
            .suffix(&suffix)
            .tempfile_in(&self.dir)?;
        file.write_all(&media.bytes)?;
        file.flush()?;

        let resource = MediaResource {
            id: Uuid::new_v4(),
            recording: recording.to_string(),
            path: file.path().to_path_buf(),
            content_type: media.content_type,
            transcoded: media.transcoded,
        };
        debug!(
            "Allocated {} bytes for {} at {:?}",
            media.bytes.len(),
            recording,
            resource.path
        );

        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(resource.id, file);

        Ok(MediaHandle::new(resource, media.bytes.len() as u64))
    }

    fn release(&self, handle: MediaHandle) -> Result<()> {
        let file = self
            .files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&handle.id());

        match file {
            Some(file) => {
                debug!("Releasing media {:?}", handle.resource().path);
                file.close()?;
                Ok(())
            }
            None => {
                warn!("Release of unknown media handle {}", handle.id());
                Err(Error::Media(format!("Unknown media handle {}", handle.id())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::media;

    #[test]
    fn allocate_writes_and_release_removes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = TempFileMediaStore::new(Some(dir.path()))?;

        let handle = store.allocate("recording_1704103200.avi", media(true))?;
        let path = handle.resource().path.clone();
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("mp4"));
        assert_eq!(std::fs::read(&path)?, media(true).bytes);
        assert_eq!(handle.size_bytes(), media(true).bytes.len() as u64);
        assert_eq!(store.live_count(), 1);

        store.release(handle)?;
        assert!(!path.exists());
        assert_eq!(store.live_count(), 0);
        Ok(())
    }

    #[test]
    fn archival_media_keeps_avi_extension() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = TempFileMediaStore::new(Some(dir.path()))?;

        let handle = store.allocate("recording_1.avi", media(false))?;
        assert_eq!(
            handle.resource().path.extension().and_then(|e| e.to_str()),
            Some("avi")
        );
        assert!(!handle.resource().transcoded);
        store.release(handle)
    }

    #[test]
    fn foreign_handle_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = TempFileMediaStore::new(Some(dir.path()))?;
        let other = TempFileMediaStore::new(Some(dir.path()))?;

        let handle = other.allocate("recording_1.avi", media(false))?;
        assert!(matches!(store.release(handle), Err(Error::Media(_))));
        Ok(())
    }
}

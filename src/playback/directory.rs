use crate::client::ConsoleBackend;
use crate::error::Result;
use crate::models::RecordingCatalog;
use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct CatalogEntry {
    fetched_at: Instant,
    catalog: Arc<RecordingCatalog>,
}

/// Latest recording catalog, shared by playback sessions.
///
/// Callers arriving while a load is in flight wait for it and receive the
/// same snapshot, never a missing one.
pub struct RecordingDirectory {
    backend: Arc<dyn ConsoleBackend>,
    max_age: Duration,
    current: Mutex<Option<CatalogEntry>>,
}

impl RecordingDirectory {
    pub fn new(backend: Arc<dyn ConsoleBackend>, max_age: Duration) -> Self {
        Self {
            backend,
            max_age,
            current: Mutex::new(None),
        }
    }

    /// Current catalog, loading it when missing or older than the max age
    pub async fn snapshot(&self) -> Result<Arc<RecordingCatalog>> {
        let mut current = self.current.lock().await;

        if let Some(entry) = current.as_ref() {
            if entry.fetched_at.elapsed() < self.max_age {
                return Ok(entry.catalog.clone());
            }
        }

        let catalog = Arc::new(self.backend.fetch_recording_catalog().await?);
        if catalog.forbidden {
            // Not kept, signing in should take effect on the next request
            warn!("Recording catalog is forbidden for the current session");
            *current = None;
        } else {
            debug!("Loaded recording catalog with {} entries", catalog.recordings.len());
            *current = Some(CatalogEntry {
                fetched_at: Instant::now(),
                catalog: catalog.clone(),
            });
        }

        Ok(catalog)
    }

    /// Drop the held snapshot so the next caller reloads
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockBackend;
    use crate::error::Error;

    fn directory(backend: &Arc<MockBackend>, max_age_secs: u64) -> Arc<RecordingDirectory> {
        Arc::new(RecordingDirectory::new(
            backend.clone(),
            Duration::from_secs(max_age_secs),
        ))
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_load() -> Result<()> {
        let backend = Arc::new(MockBackend::with_recordings(&["recording_1704103200.avi"]));
        let gate = backend.gate_catalog();
        let directory = directory(&backend, 60);

        let first = tokio::spawn({
            let directory = directory.clone();
            async move { directory.snapshot().await }
        });
        let second = tokio::spawn({
            let directory = directory.clone();
            async move { directory.snapshot().await }
        });

        tokio::task::yield_now().await;
        gate.send(()).unwrap();

        let first = first.await.unwrap()?;
        let second = second.await.unwrap()?;
        assert_eq!(first, second);
        assert_eq!(first.recordings.len(), 1);
        assert_eq!(backend.catalog_fetches(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn stale_or_invalidated_snapshot_reloads() -> Result<()> {
        let backend = Arc::new(MockBackend::default());

        let expired = directory(&backend, 0);
        expired.snapshot().await?;
        expired.snapshot().await?;
        assert_eq!(backend.catalog_fetches(), 2);

        let fresh = directory(&backend, 60);
        fresh.snapshot().await?;
        fresh.snapshot().await?;
        assert_eq!(backend.catalog_fetches(), 3);

        fresh.invalidate().await;
        fresh.snapshot().await?;
        assert_eq!(backend.catalog_fetches(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn forbidden_catalog_is_not_kept() -> Result<()> {
        let backend = Arc::new(MockBackend::default());
        backend.set_catalog(RecordingCatalog::forbidden());
        let directory = directory(&backend, 60);

        assert!(directory.snapshot().await?.forbidden);
        assert!(directory.snapshot().await?.forbidden);
        assert_eq!(backend.catalog_fetches(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn fetch_errors_propagate() {
        let backend = Arc::new(MockBackend::default());
        *backend.catalog_error.lock().unwrap() = Some(Error::Network("refused".to_string()));

        let result = directory(&backend, 60).snapshot().await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}

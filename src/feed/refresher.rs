use super::service::{FeedService, FeedSnapshot};
use crate::models::FeedQuery;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Keeps a feed snapshot current in the background.
///
/// Every refresh is a full reload: on each interval tick, on [`trigger`],
/// and whenever the query changes.
///
/// [`trigger`]: FeedRefresher::trigger
pub struct FeedRefresher {
    service: Arc<FeedService>,
    query: watch::Sender<FeedQuery>,
    snapshots: watch::Sender<Option<Arc<FeedSnapshot>>>,
    wake: Notify,
    shutdown: CancellationToken,
}

impl FeedRefresher {
    pub fn new(service: Arc<FeedService>, query: FeedQuery) -> Self {
        let (query, _) = watch::channel(query);
        let (snapshots, _) = watch::channel(None);
        Self {
            service,
            query,
            snapshots,
            wake: Notify::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Start the refresh loop in the background
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let period = Duration::from_secs(self.service.config().refresh_interval_secs.max(1));
        info!("Starting feed refresher with interval of {} seconds", period.as_secs());

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut query_rx = self.query.subscribe();

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                    _ = self.wake.notified() => debug!("Feed refresh requested"),
                    changed = query_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        debug!("Feed query changed");
                    }
                }

                let query = query_rx.borrow_and_update().clone();
                let snapshot = tokio::select! {
                    _ = self.shutdown.cancelled() => break,
                    snapshot = self.service.load(&query) => snapshot,
                };

                // Skip publishing results for a query that was replaced mid-load
                if query_rx.has_changed().unwrap_or(false) {
                    continue;
                }
                self.snapshots.send_replace(Some(Arc::new(snapshot)));
            }

            info!("Feed refresher stopped");
        })
    }

    /// Refresh now, e.g. after a push notification or an acknowledge
    pub fn trigger(&self) {
        self.wake.notify_one();
    }

    pub fn set_query(&self, query: FeedQuery) {
        self.query.send_replace(query);
    }

    pub fn query(&self) -> FeedQuery {
        self.query.borrow().clone()
    }

    /// Latest snapshot, `None` until the first load completes
    pub fn latest(&self) -> Option<Arc<FeedSnapshot>> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<FeedSnapshot>>> {
        self.snapshots.subscribe()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{event, MockBackend};
    use crate::config::FeedConfig;
    use crate::models::{AckFilter, DateRange};

    fn refresher(backend: &Arc<MockBackend>, interval_secs: u64) -> Arc<FeedRefresher> {
        let config = FeedConfig {
            refresh_interval_secs: interval_secs,
            ..FeedConfig::default()
        };
        let service = Arc::new(FeedService::new(backend.clone(), config));
        Arc::new(FeedRefresher::new(service, FeedQuery::default()))
    }

    async fn next_snapshot(
        rx: &mut watch::Receiver<Option<Arc<FeedSnapshot>>>,
    ) -> Arc<FeedSnapshot> {
        loop {
            tokio::time::timeout(Duration::from_secs(5), rx.changed())
                .await
                .expect("snapshot published in time")
                .expect("refresher alive");
            if let Some(snapshot) = rx.borrow_and_update().clone() {
                return snapshot;
            }
        }
    }

    #[tokio::test]
    async fn publishes_on_start_and_on_trigger() {
        let backend = Arc::new(MockBackend::default());
        *backend.events.lock().unwrap() = vec![event(1, "2024-01-01 10:00:00")];

        let refresher = refresher(&backend, 3600);
        let mut rx = refresher.subscribe();
        let task = refresher.clone().start();

        let first = next_snapshot(&mut rx).await;
        assert_eq!(first.items.len(), 1);

        backend
            .events
            .lock()
            .unwrap()
            .push(event(2, "2024-01-01 11:00:00"));
        refresher.trigger();

        let second = next_snapshot(&mut rx).await;
        assert_eq!(second.items.len(), 2);
        assert_eq!(refresher.latest().map(|s| s.items.len()), Some(2));

        refresher.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn query_change_reloads_with_new_filters() {
        let backend = Arc::new(MockBackend::default());
        let refresher = refresher(&backend, 3600);
        let mut rx = refresher.subscribe();
        let task = refresher.clone().start();

        next_snapshot(&mut rx).await;
        refresher.set_query(FeedQuery {
            range: DateRange::All,
            ack: AckFilter::Acknowledged,
            ..FeedQuery::default()
        });
        next_snapshot(&mut rx).await;

        let seen = backend.event_filters_seen.lock().unwrap().clone();
        assert_eq!(seen.last().and_then(|f| f.acknowledged), Some(true));
        assert_eq!(refresher.query().range, DateRange::All);

        refresher.shutdown();
        task.await.unwrap();
    }
}

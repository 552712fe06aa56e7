use super::correlator::find_recording;
use super::directory::RecordingDirectory;
use super::media::{MediaHandle, MediaResource, MediaStore};
use crate::client::ConsoleBackend;
use crate::config::PlaybackConfig;
use crate::error::{Error, Result};
use crate::models::{Event, MomentMatch, RecordingMedia};
use crate::utils::labels;
use log::{debug, info, warn};
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Why a playback session failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Session missing or role not allowed to view recordings (401/403)
    NotAuthorized,
    /// The recording is gone (404)
    NotFound,
    /// Transport, server or local media failure
    Unavailable,
}

impl FailureReason {
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Unauthorized(_) | Error::Forbidden(_) => FailureReason::NotAuthorized,
            Error::NotFound(_) => FailureReason::NotFound,
            _ => FailureReason::Unavailable,
        }
    }

    /// Guidance shown to the operator
    pub fn message(&self) -> &'static str {
        match self {
            FailureReason::NotAuthorized => labels::SIGN_IN_REQUIRED,
            FailureReason::NotFound => labels::RECORDING_NOT_FOUND,
            FailureReason::Unavailable => labels::PLAYBACK_FAILED,
        }
    }
}

/// Observable state of the playback session
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    Idle,
    /// Waiting for the recording catalog and correlating the moment
    Resolving,
    /// Retrieving media for the matched recording
    Loading { matched: MomentMatch },
    Ready {
        matched: MomentMatch,
        resource: MediaResource,
        /// Position the player was told to seek to once metadata arrived
        seek_seconds: Option<f64>,
    },
    /// No recording contains the moment
    NoMatch,
    Failed { reason: FailureReason, detail: String },
    Closed,
}

impl PlaybackState {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Resolving => "resolving",
            PlaybackState::Loading { .. } => "loading",
            PlaybackState::Ready { .. } => "ready",
            PlaybackState::NoMatch => "no_match",
            PlaybackState::Failed { .. } => "failed",
            PlaybackState::Closed => "closed",
        }
    }

    /// True once the session can make no further progress on its own
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            PlaybackState::Ready { .. }
                | PlaybackState::NoMatch
                | PlaybackState::Failed { .. }
                | PlaybackState::Closed
        )
    }

    /// Text for the player area, if the state has any
    pub fn message(&self) -> Option<&'static str> {
        match self {
            PlaybackState::NoMatch => Some(labels::NO_RECORDING_FOR_MOMENT),
            PlaybackState::Failed { reason, .. } => Some(reason.message()),
            _ => None,
        }
    }
}

impl Display for PlaybackState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The moment to play
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    pub timestamp: String,
    pub camera_id: Option<String>,
    pub event_id: Option<i64>,
}

impl PlaybackRequest {
    pub fn for_event(event: &Event) -> Self {
        Self {
            timestamp: event.timestamp.clone(),
            camera_id: event.camera_id.clone(),
            event_id: Some(event.id),
        }
    }

    /// Deep link to a bare moment, without a known event
    pub fn at_moment(timestamp: impl Into<String>, camera_id: Option<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            camera_id,
            event_id: None,
        }
    }
}

/// How a session's background work ended
#[derive(Debug)]
pub(crate) enum SessionOutcome {
    NoMatch,
    Retrieved(MomentMatch, RecordingMedia),
    Failed(Error),
}

struct Session {
    generation: u64,
    state: PlaybackState,
    handle: Option<MediaHandle>,
    cancel: Option<CancellationToken>,
}

struct Shared {
    backend: Arc<dyn ConsoleBackend>,
    directory: Arc<RecordingDirectory>,
    store: Arc<dyn MediaStore>,
    config: PlaybackConfig,
    session: Mutex<Session>,
    state_tx: watch::Sender<PlaybackState>,
}

/// Drives one "play at moment" view.
///
/// Each open starts a new generation. Work belonging to an older generation
/// is cancelled, and a result that still arrives for it is dropped before it
/// can change state or allocate media. The controller owns the media handle
/// and releases it when the session closes.
pub struct PlaybackController {
    shared: Arc<Shared>,
}

impl PlaybackController {
    pub fn new(
        backend: Arc<dyn ConsoleBackend>,
        directory: Arc<RecordingDirectory>,
        store: Arc<dyn MediaStore>,
        config: PlaybackConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(PlaybackState::Idle);
        Self {
            shared: Arc::new(Shared {
                backend,
                directory,
                store,
                config,
                session: Mutex::new(Session {
                    generation: 0,
                    state: PlaybackState::Idle,
                    handle: None,
                    cancel: None,
                }),
                state_tx,
            }),
        }
    }

    /// Start playback of a moment, closing any active session first.
    ///
    /// Returns the generation of the new session. Must be called from within
    /// a Tokio runtime.
    pub fn open(&self, request: PlaybackRequest) -> u64 {
        let token = CancellationToken::new();
        let generation = {
            let mut session = self.shared.lock();
            if !matches!(session.state, PlaybackState::Idle | PlaybackState::Closed) {
                self.shared.close_session(&mut session);
            }
            session.generation += 1;
            session.cancel = Some(token.clone());
            self.shared.transition(&mut session, PlaybackState::Resolving);
            session.generation
        };

        info!(
            "Opening playback session {} at {}",
            generation, request.timestamp
        );
        let shared = self.shared.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => {
                    debug!("Playback session {} cancelled", generation);
                    return;
                }
                outcome = shared.resolve(generation, &request) => outcome,
            };
            shared.apply_outcome(generation, outcome);
        });

        generation
    }

    /// Close the session, cancelling pending work and releasing its media
    pub fn close(&self) {
        let mut session = self.shared.lock();
        if session.state != PlaybackState::Closed {
            self.shared.close_session(&mut session);
        }
    }

    /// Player reported the media duration; returns the position to seek to.
    ///
    /// The position is the moment offset, kept just short of the end of the
    /// media. Nothing is returned outside `Ready`, for a zero offset, or for a
    /// duration that is not a positive finite number.
    pub fn on_metadata(&self, duration_seconds: f64) -> Option<f64> {
        let ratio = self.shared.config.seek_guard_ratio;
        let mut session = self.shared.lock();

        let PlaybackState::Ready {
            matched,
            seek_seconds,
            ..
        } = &mut session.state
        else {
            return None;
        };
        if matched.offset_seconds == 0 || !duration_seconds.is_finite() || duration_seconds <= 0.0
        {
            return None;
        }

        let target = (matched.offset_seconds as f64).min(duration_seconds * ratio);
        *seek_seconds = Some(target);
        debug!("Seeking to {:.2}s of {:.2}s", target, duration_seconds);

        let state = session.state.clone();
        self.shared.state_tx.send_replace(state);
        Some(target)
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.lock().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.shared.state_tx.subscribe()
    }

    /// Resource the player should open, available in `Ready`
    pub fn resource(&self) -> Option<MediaResource> {
        self.shared
            .lock()
            .handle
            .as_ref()
            .map(|handle| handle.resource().clone())
    }

    /// Apply the result of a session's background work
    #[cfg(test)]
    pub(crate) fn apply_outcome(&self, generation: u64, outcome: SessionOutcome) {
        self.shared.apply_outcome(generation, outcome);
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.close();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, session: &mut Session, state: PlaybackState) {
        debug!(
            "Playback session {}: {} -> {}",
            session.generation, session.state, state
        );
        session.state = state.clone();
        self.state_tx.send_replace(state);
    }

    /// Move to `state` only if `generation` is still the active session
    fn transition_if_current(&self, generation: u64, state: PlaybackState) -> bool {
        let mut session = self.lock();
        if session.generation != generation {
            return false;
        }
        self.transition(&mut session, state);
        true
    }

    fn close_session(&self, session: &mut Session) {
        session.generation += 1;
        if let Some(token) = session.cancel.take() {
            token.cancel();
        }
        if let Some(handle) = session.handle.take() {
            if let Err(e) = self.store.release(handle) {
                warn!("Failed to release playback media: {}", e);
            }
        }
        self.transition(session, PlaybackState::Closed);
    }

    async fn resolve(&self, generation: u64, request: &PlaybackRequest) -> SessionOutcome {
        let catalog = match self.directory.snapshot().await {
            Ok(catalog) => catalog,
            Err(e) => return SessionOutcome::Failed(e),
        };
        if catalog.forbidden {
            return SessionOutcome::Failed(Error::Forbidden(
                "Recording catalog is not available to this session".to_string(),
            ));
        }

        let Some(matched) = find_recording(&catalog.recordings, &request.timestamp) else {
            return SessionOutcome::NoMatch;
        };

        let name = matched.recording.name.clone();
        if !self.transition_if_current(generation, PlaybackState::Loading { matched: matched.clone() }) {
            return SessionOutcome::Failed(Error::Internal("Session superseded".to_string()));
        }

        match self.retrieve(&name).await {
            Ok(media) => SessionOutcome::Retrieved(matched, media),
            Err(e) => SessionOutcome::Failed(e),
        }
    }

    /// Fetch media, falling back to the archival container when transcoding fails
    async fn retrieve(&self, name: &str) -> Result<RecordingMedia> {
        let prefer_transcoded = self.config.prefer_transcoded;
        match self.backend.fetch_recording_media(name, prefer_transcoded).await {
            Err(e) if prefer_transcoded && e.is_transient() => {
                warn!(
                    "Transcoded playback of {} failed ({}), trying archival container",
                    name, e
                );
                self.backend.fetch_recording_media(name, false).await
            }
            result => result,
        }
    }

    fn apply_outcome(&self, generation: u64, outcome: SessionOutcome) {
        let mut session = self.lock();
        if session.generation != generation {
            debug!(
                "Discarding result of playback session {} (current {})",
                generation, session.generation
            );
            return;
        }
        session.cancel = None;

        let state = match outcome {
            SessionOutcome::NoMatch => {
                info!("No recording contains the requested moment");
                PlaybackState::NoMatch
            }
            SessionOutcome::Failed(error) => failed(error),
            SessionOutcome::Retrieved(matched, media) => {
                match self.store.allocate(&matched.recording.name, media) {
                    Ok(handle) => {
                        let resource = handle.resource().clone();
                        if let Some(previous) = session.handle.replace(handle) {
                            warn!("Releasing media left over from an earlier session");
                            if let Err(e) = self.store.release(previous) {
                                warn!("Failed to release playback media: {}", e);
                            }
                        }
                        info!(
                            "Playing {} from {}s",
                            matched.recording.name, matched.offset_seconds
                        );
                        PlaybackState::Ready {
                            matched,
                            resource,
                            seek_seconds: None,
                        }
                    }
                    Err(error) => failed(error),
                }
            }
        };

        self.transition(&mut session, state);
    }
}

fn failed(error: Error) -> PlaybackState {
    let reason = FailureReason::from_error(&error);
    warn!("Playback failed ({:?}): {}", reason, error);
    PlaybackState::Failed {
        reason,
        detail: error.to_string(),
    }
}

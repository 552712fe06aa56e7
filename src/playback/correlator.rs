use crate::models::{MomentMatch, Recording};
use crate::utils::parse_unix_seconds;

/// Find the latest recording that had started by `event_timestamp`.
///
/// Recordings whose names do not encode a start time are not candidates.
/// Returns `None` for an unparseable timestamp or when the event predates
/// every candidate.
pub fn find_recording(recordings: &[Recording], event_timestamp: &str) -> Option<MomentMatch> {
    let event_unix = parse_unix_seconds(event_timestamp)?;

    let mut candidates: Vec<(i64, &Recording)> = recordings
        .iter()
        .filter_map(|recording| recording.start_unix().map(|start| (start, recording)))
        .collect();
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    candidates
        .into_iter()
        .find(|(start, _)| *start <= event_unix)
        .map(|(start, recording)| MomentMatch {
            recording: recording.clone(),
            offset_seconds: (event_unix - start).max(0) as u64,
        })
}

/// Number of recordings that can take part in correlation
pub fn candidate_count(recordings: &[Recording]) -> usize {
    recordings
        .iter()
        .filter(|recording| recording.start_unix().is_some())
        .count()
}

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// Segment files are named after the Unix second recording started
static RECORDING_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^recording_(\d+)\.avi$").expect("valid recording name pattern"));

/// Stored video segment as listed by `GET /recordings`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    pub name: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub created_utc: String,
}

impl Recording {
    /// Start time encoded in the file name, `None` for names off the pattern
    pub fn start_unix(&self) -> Option<i64> {
        let captures = RECORDING_NAME.captures(&self.name)?;
        let start = captures.get(1)?.as_str().parse::<i64>().ok()?;
        (start > 0).then_some(start)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_utc)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Snapshot of the recording directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingCatalog {
    #[serde(default)]
    pub recordings: Vec<Recording>,
    /// Set when the signed-in role may not list recordings
    #[serde(default)]
    pub forbidden: bool,
}

impl RecordingCatalog {
    pub fn forbidden() -> Self {
        Self {
            recordings: Vec::new(),
            forbidden: true,
        }
    }
}

/// Recording containing a moment, and how far into it the moment lies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MomentMatch {
    pub recording: Recording,
    pub offset_seconds: u64,
}

/// Media bytes retrieved for playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingMedia {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// False when the archival container was served
    pub transcoded: bool,
}

impl RecordingMedia {
    /// File extension matching the served container
    pub fn extension(&self) -> &'static str {
        if self.content_type.contains("mp4") {
            "mp4"
        } else {
            "avi"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(name: &str) -> Recording {
        Recording {
            name: name.to_string(),
            size_bytes: 0,
            created_utc: String::new(),
        }
    }

    #[test]
    fn start_time_comes_from_name() {
        assert_eq!(recording("recording_1704103200.avi").start_unix(), Some(1_704_103_200));
        assert_eq!(recording("recording_0.avi").start_unix(), None);
        assert_eq!(recording("recording_1704103200.mp4").start_unix(), None);
        assert_eq!(recording("export_1704103200.avi").start_unix(), None);
        assert_eq!(recording("recording_.avi").start_unix(), None);
        assert_eq!(
            recording("recording_99999999999999999999999.avi").start_unix(),
            None
        );
    }

    #[test]
    fn catalog_without_forbidden_flag() {
        let catalog: RecordingCatalog = serde_json::from_str(
            r#"{"recordings": [{"name": "recording_1.avi", "size_bytes": 10, "created_utc": "2024-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();
        assert!(!catalog.forbidden);
        assert_eq!(catalog.recordings.len(), 1);
        assert!(catalog.recordings[0].created_at().is_some());
    }
}

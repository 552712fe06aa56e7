use crate::utils::timestamps::join_date_time;
use serde::{Deserialize, Serialize};

/// Periodic AI inference row as served by `GET /get_data`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSample {
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub individual: Option<String>,
    #[serde(default)]
    pub facial_features: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub pose: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub scene: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    /// Behaviour string, "None" when the sample raised nothing
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub crowd_count: Option<i64>,
    #[serde(default)]
    pub audio_event: Option<String>,
    #[serde(default)]
    pub device_mac: Option<String>,
    #[serde(default)]
    pub thermal_signature: Option<String>,
    #[serde(default)]
    pub camera_id: Option<String>,
}

impl DetectionSample {
    /// Combined civil timestamp, e.g. `2024-01-01T10:05:00`
    pub fn timestamp(&self) -> String {
        join_date_time(&self.date, &self.time)
    }

    /// True when the sample carries a behaviour other than "None"
    pub fn has_behavior(&self) -> bool {
        matches!(self.event.as_deref(), Some(event) if !event.is_empty() && event != "None")
    }
}

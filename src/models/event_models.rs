use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Alert categories raised by the edge detectors
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Motion,
    Loitering,
    LineCross,
    Fall,
    Crowding,
    /// Any detector type this console does not know about yet
    Other(String),
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Motion => write!(f, "motion"),
            Self::Loitering => write!(f, "loitering"),
            Self::LineCross => write!(f, "line_cross"),
            Self::Fall => write!(f, "fall"),
            Self::Crowding => write!(f, "crowding"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "motion" => Self::Motion,
            "loitering" => Self::Loitering,
            "line_cross" => Self::LineCross,
            "fall" => Self::Fall,
            "crowding" => Self::Crowding,
            _ => Self::Other(value),
        }
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.to_string()
    }
}

impl FromStr for EventType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

// Missing or unknown severities are shown as medium
fn severity_or_medium<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| s.parse::<Severity>().ok())
        .unwrap_or_default())
}

/// Who acknowledged an event, and when
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    pub by: String,
    pub at: String,
}

/// Structured part of `Event::metadata`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Behaviour string, e.g. "Loitering Detected"
    #[serde(default)]
    pub event: Option<String>,
    /// Subject description
    #[serde(default)]
    pub object: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Event model as served by `GET /events`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub event_type: EventType,
    #[serde(default)]
    pub camera_id: Option<String>,
    #[serde(default)]
    pub site_id: Option<String>,
    pub timestamp: String,
    #[serde(default)]
    pub timestamp_utc: Option<String>,
    /// JSON text, parsed on demand by [`Event::parsed_metadata`]
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default, deserialize_with = "severity_or_medium")]
    pub severity: Severity,
    #[serde(default)]
    pub acknowledged_by: Option<String>,
    #[serde(default)]
    pub acknowledged_at: Option<String>,
    #[serde(default)]
    pub integrity_hash: Option<String>,
}

impl Event {
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged_at.is_some()
    }

    pub fn acknowledgment(&self) -> Option<Acknowledgment> {
        self.acknowledged_at.as_ref().map(|at| Acknowledgment {
            by: self
                .acknowledged_by
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            at: at.clone(),
        })
    }

    /// Parse the metadata text; malformed or absent metadata yields the default
    pub fn parsed_metadata(&self) -> EventMetadata {
        self.metadata
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}

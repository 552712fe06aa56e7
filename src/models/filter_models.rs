use super::{EventType, Severity};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Date range presets of the activity view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DateRange {
    #[default]
    #[serde(rename = "last_24h")]
    Last24Hours,
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "all")]
    All,
}

impl DateRange {
    /// Inclusive `(date_from, date_to)` civil dates for the range, evaluated at `now`
    pub fn bounds(&self, now: DateTime<Utc>) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let today = now.date_naive();
        match self {
            DateRange::Last24Hours => (Some((now - Duration::days(1)).date_naive()), Some(today)),
            DateRange::Last7Days => (Some((now - Duration::days(7)).date_naive()), Some(today)),
            DateRange::All => (None, None),
        }
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DateRange::Last24Hours => write!(f, "last_24h"),
            DateRange::Last7Days => write!(f, "last_7_days"),
            DateRange::All => write!(f, "all"),
        }
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last_24h" | "24h" => Ok(DateRange::Last24Hours),
            "last_7_days" | "7d" => Ok(DateRange::Last7Days),
            "all" => Ok(DateRange::All),
            other => Err(format!("unknown date range: {}", other)),
        }
    }
}

/// Acknowledgment filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckFilter {
    #[default]
    All,
    Unacknowledged,
    Acknowledged,
}

impl AckFilter {
    pub fn as_param(&self) -> Option<bool> {
        match self {
            AckFilter::All => None,
            AckFilter::Unacknowledged => Some(false),
            AckFilter::Acknowledged => Some(true),
        }
    }
}

impl FromStr for AckFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(AckFilter::All),
            "unack" | "unacknowledged" => Ok(AckFilter::Unacknowledged),
            "ack" | "acknowledged" => Ok(AckFilter::Acknowledged),
            other => Err(format!("unknown acknowledgment filter: {}", other)),
        }
    }
}

/// Query parameters for `GET /events`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilters {
    pub limit: u32,
    pub offset: Option<u32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub acknowledged: Option<bool>,
    pub severity: Option<Severity>,
    pub event_type: Option<EventType>,
    pub camera_id: Option<String>,
    pub site_id: Option<String>,
}

impl EventFilters {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string())];
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        push_dates(&mut pairs, self.date_from, self.date_to);
        if let Some(acknowledged) = self.acknowledged {
            pairs.push(("acknowledged", acknowledged.to_string()));
        }
        if let Some(severity) = self.severity {
            pairs.push(("severity", severity.to_string()));
        }
        if let Some(event_type) = &self.event_type {
            pairs.push(("event_type", event_type.to_string()));
        }
        if let Some(camera_id) = &self.camera_id {
            pairs.push(("camera_id", camera_id.clone()));
        }
        if let Some(site_id) = &self.site_id {
            pairs.push(("site_id", site_id.clone()));
        }
        pairs
    }
}

/// Query parameters for `GET /get_data`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleFilters {
    pub limit: u32,
    pub offset: Option<u32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub camera_id: Option<String>,
    /// Behaviour string, e.g. "Fall Detected"
    pub event_type: Option<String>,
}

impl SampleFilters {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string())];
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        push_dates(&mut pairs, self.date_from, self.date_to);
        if let Some(camera_id) = &self.camera_id {
            pairs.push(("camera_id", camera_id.clone()));
        }
        if let Some(event_type) = &self.event_type {
            pairs.push(("event_type", event_type.clone()));
        }
        pairs
    }
}

fn push_dates(
    pairs: &mut Vec<(&'static str, String)>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
) {
    if let Some(from) = date_from {
        pairs.push(("date_from", from.format("%Y-%m-%d").to_string()));
    }
    if let Some(to) = date_to {
        pairs.push(("date_to", to.format("%Y-%m-%d").to_string()));
    }
}

/// Everything the activity feed is filtered by
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedQuery {
    pub range: DateRange,
    pub severity: Option<Severity>,
    pub event_type: Option<EventType>,
    pub ack: AckFilter,
    pub camera_id: Option<String>,
}

impl FeedQuery {
    pub fn event_filters(&self, limit: u32, now: DateTime<Utc>) -> EventFilters {
        let (date_from, date_to) = self.range.bounds(now);
        EventFilters {
            limit,
            offset: None,
            date_from,
            date_to,
            acknowledged: self.ack.as_param(),
            severity: self.severity,
            event_type: self.event_type.clone(),
            camera_id: self.camera_id.clone(),
            site_id: None,
        }
    }

    /// Samples carry no severity or acknowledgment, only the range and camera apply
    pub fn sample_filters(&self, limit: u32, now: DateTime<Utc>) -> SampleFilters {
        let (date_from, date_to) = self.range.bounds(now);
        SampleFilters {
            limit,
            offset: None,
            date_from,
            date_to,
            camera_id: self.camera_id.clone(),
            event_type: None,
        }
    }
}

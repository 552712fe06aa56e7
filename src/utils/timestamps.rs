use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp into a UTC civil date-time, `None` when malformed.
///
/// Accepts SQLite `datetime("now")` stamps (`2024-01-01 10:05:00`), ISO stamps
/// with or without an offset, and the `date` + `T` + `time` join used for
/// detection samples. Values without an offset are UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    // A trailing Z on an otherwise naive stamp
    let naive = raw
        .strip_suffix('Z')
        .or_else(|| raw.strip_suffix('z'))
        .unwrap_or(raw);

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Parse a timestamp straight to Unix seconds
pub fn parse_unix_seconds(raw: &str) -> Option<i64> {
    parse_timestamp(raw).map(|dt| to_unix_seconds(&dt))
}

pub fn to_unix_seconds(dt: &NaiveDateTime) -> i64 {
    Utc.from_utc_datetime(dt).timestamp()
}

/// Sort key text for a detection sample (`date` + `T` + `time`)
pub fn join_date_time(date: &str, time: &str) -> String {
    format!("{}T{}", date, time)
}

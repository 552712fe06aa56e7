use crate::models::{Event, EventType, Severity};

/// Badge text and tooltip for a feed flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag {
    pub label: &'static str,
    pub title: &'static str,
    pub slug: &'static str,
}

pub const NEEDS_REVIEW: Flag = Flag {
    label: "Needs review",
    title: "Unacknowledged; review and acknowledge when handled.",
    slug: "needs_review",
};

pub const ACKNOWLEDGED: Flag = Flag {
    label: "Acknowledged",
    title: "Event has been reviewed and acknowledged.",
    slug: "acknowledged",
};

pub const HIGH_PRIORITY: Flag = Flag {
    label: "High priority",
    title: "High severity; prioritize review.",
    slug: "high_priority",
};

pub fn event_type_label(event_type: &EventType) -> String {
    match event_type {
        EventType::Motion => "Motion".to_string(),
        EventType::Loitering => "Loitering".to_string(),
        EventType::LineCross => "Line crossing".to_string(),
        EventType::Fall => "Fall".to_string(),
        EventType::Crowding => "Crowding".to_string(),
        EventType::Other(name) if name == "motion_alert" => "Motion alert".to_string(),
        EventType::Other(name) => name.clone(),
    }
}

pub fn event_type_description(event_type: &EventType) -> &'static str {
    match event_type {
        EventType::Motion => "Camera detected motion in the frame.",
        EventType::Loitering => {
            "Person or object remained in a monitored zone longer than the threshold."
        }
        EventType::LineCross => "Person or object crossed a configured virtual line.",
        EventType::Fall => "Person down detected (pose heuristic; possible fall).",
        EventType::Crowding => "Person count exceeded crowding threshold.",
        EventType::Other(name) if name == "motion_alert" => {
            "Motion-triggered alert (e.g. threshold or zone)."
        }
        EventType::Other(_) => "",
    }
}

/// Label for the behaviour string carried by detection samples and event metadata
pub fn behavior_label(behavior: &str) -> String {
    match behavior {
        "Motion Detected" => "Motion detected",
        "Loitering Detected" => "Loitering detected",
        "Line Crossing Detected" => "Line crossing detected",
        "Fall Detected" => "Fall detected",
        "Crowding Detected" => "Crowding detected",
        "None" | "" => "No alert",
        other => other,
    }
    .to_string()
}

pub fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "High",
        Severity::Medium => "Medium",
        Severity::Low => "Low",
    }
}

pub fn severity_description(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "Requires immediate attention. Review and acknowledge.",
        Severity::Medium => "Standard priority. Review when possible.",
        Severity::Low => "Informational. No urgent action required.",
    }
}

/// Flags shown next to an event in the feed
pub fn event_flags(event: &Event) -> Vec<Flag> {
    let mut flags = Vec::new();
    if event.is_acknowledged() {
        flags.push(ACKNOWLEDGED);
    } else {
        flags.push(NEEDS_REVIEW);
        if event.severity == Severity::High {
            flags.push(HIGH_PRIORITY);
        }
    }
    flags
}

pub const NO_RECORDING_FOR_MOMENT: &str =
    "No recording found that contains this event time. Recordings are created when recording is started from Live view.";

pub const SIGN_IN_REQUIRED: &str = "Sign in required to play recordings.";

pub const RECORDING_NOT_FOUND: &str =
    "Recording not found. You can still download the recording from Export.";

pub const PLAYBACK_FAILED: &str = "Playback failed. Close and reopen to retry, or download from Export.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_custom_event_types() {
        assert_eq!(event_type_label(&EventType::LineCross), "Line crossing");
        assert_eq!(
            event_type_label(&EventType::Other("motion_alert".into())),
            "Motion alert"
        );
        assert_eq!(event_type_label(&EventType::Other("tamper".into())), "tamper");
        assert_eq!(event_type_description(&EventType::Other("tamper".into())), "");
    }

    #[test]
    fn descriptions_cover_known_types_and_severities() {
        assert_eq!(
            event_type_description(&EventType::LineCross),
            "Person or object crossed a configured virtual line."
        );
        assert!(severity_description(Severity::High).starts_with("Requires immediate attention"));
        assert_ne!(
            severity_description(Severity::Low),
            severity_description(Severity::Medium)
        );
    }

    #[test]
    fn behaviour_none_reads_as_no_alert() {
        assert_eq!(behavior_label("None"), "No alert");
        assert_eq!(behavior_label("Fall Detected"), "Fall detected");
        assert_eq!(behavior_label("Gunshot"), "Gunshot");
    }

    #[test]
    fn flags_follow_acknowledgment_and_severity() {
        let mut event = crate::client::mock::event(1, "2024-01-01 10:00:00");
        event.severity = Severity::High;
        assert_eq!(event_flags(&event), vec![NEEDS_REVIEW, HIGH_PRIORITY]);

        event.acknowledged_at = Some("2024-01-01 10:02:00".to_string());
        assert_eq!(event_flags(&event), vec![ACKNOWLEDGED]);
    }
}

use crate::models::{DetectionSample, Event, FeedItem};

/// Merge both snapshots newest first and keep at most `limit` items.
///
/// Events are placed ahead of samples before a stable sort, so items sharing a
/// timestamp keep the same relative order on every call. Unparseable
/// timestamps sort as the oldest entries and are the first to be truncated.
pub fn merge(events: &[Event], samples: &[DetectionSample], limit: usize) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = events
        .iter()
        .cloned()
        .map(FeedItem::from_event)
        .chain(samples.iter().cloned().map(FeedItem::from_sample))
        .collect();

    items.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
    items.truncate(limit);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{event, sample};
    use crate::models::FeedEntry;
    use chrono::{Duration, NaiveDate};

    fn stamps(items: &[FeedItem]) -> Vec<&str> {
        items.iter().map(|item| item.timestamp.as_str()).collect()
    }

    #[test]
    fn empty_inputs_give_empty_feed() {
        assert!(merge(&[], &[], 200).is_empty());
    }

    #[test]
    fn interleaves_by_time_descending() {
        let events = vec![
            event(1, "2024-01-01 10:05:00"),
            event(2, "2024-01-01 09:00:00"),
        ];
        let samples = vec![
            sample("2024-01-01", "10:06:00"),
            sample("2024-01-01", "09:30:00"),
            sample("2023-12-31", "23:59:59"),
        ];

        let feed = merge(&events, &samples, 200);
        assert_eq!(
            stamps(&feed),
            vec![
                "2024-01-01T10:06:00",
                "2024-01-01 10:05:00",
                "2024-01-01T09:30:00",
                "2024-01-01 09:00:00",
                "2023-12-31T23:59:59",
            ]
        );
        assert_eq!(feed[1].kind(), "event");
        assert_eq!(feed[0].kind(), "detection");
    }

    #[test]
    fn ties_are_stable_across_calls() {
        let events = vec![event(1, "2024-01-01T10:00:00"), event(2, "2024-01-01T10:00:00")];
        let samples = vec![sample("2024-01-01", "10:00:00")];

        let first = merge(&events, &samples, 200);
        let second = merge(&events, &samples, 200);
        assert_eq!(first, second);

        // Events precede samples at equal times, each in input order
        assert_eq!(first[0].as_event().map(|e| e.id), Some(1));
        assert_eq!(first[1].as_event().map(|e| e.id), Some(2));
        assert!(matches!(first[2].entry, FeedEntry::Detection(_)));
    }

    #[test]
    fn malformed_timestamps_sink_to_the_end() {
        let events = vec![event(1, "garbage"), event(2, "2024-01-01T00:00:00")];
        let samples = vec![sample("2024-01-01", ""), sample("2023-01-01", "00:00:00")];

        let feed = merge(&events, &samples, 200);
        assert_eq!(feed.len(), 4);
        assert_eq!(feed[0].as_event().map(|e| e.id), Some(2));
        assert_eq!(feed[1].timestamp, "2023-01-01T00:00:00");
        assert!(feed[2].sort_key.is_malformed());
        assert!(feed[3].sort_key.is_malformed());
    }

    #[test]
    fn truncation_keeps_the_newest_across_both_inputs() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();

        // Events on even minutes, samples on odd minutes
        let events: Vec<Event> = (0..300)
            .map(|i| {
                let at = base + Duration::minutes(2 * i);
                event(i, &at.format("%Y-%m-%d %H:%M:%S").to_string())
            })
            .collect();
        let samples: Vec<DetectionSample> = (0..300)
            .map(|i| {
                let at = base + Duration::minutes(2 * i + 1);
                sample(
                    &at.format("%Y-%m-%d").to_string(),
                    &at.format("%H:%M:%S").to_string(),
                )
            })
            .collect();

        let feed = merge(&events, &samples, 200);
        assert_eq!(feed.len(), 200);

        // The newest 200 of the 600 minutes are 400..=599
        let oldest_kept = base + Duration::minutes(400);
        assert!(feed
            .iter()
            .all(|item| item.sort_key.instant() >= Some(oldest_kept)));
        assert!(feed
            .windows(2)
            .all(|pair| pair[0].sort_key >= pair[1].sort_key));
        assert_eq!(feed.iter().filter(|item| item.as_event().is_some()).count(), 100);
    }

    #[test]
    fn length_is_min_of_total_and_limit() {
        let events = vec![event(1, "2024-01-01T00:00:01")];
        let samples = vec![sample("2024-01-01", "00:00:02"), sample("2024-01-01", "00:00:03")];
        assert_eq!(merge(&events, &samples, 2).len(), 2);
        assert_eq!(merge(&events, &samples, 10).len(), 3);
        assert!(merge(&events, &samples, 0).is_empty());
    }
}

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::level::{Level, LevelSet};
use crate::model::log::LogRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SortOrder {
    TsAsc,
    #[default]
    TsDesc,
}

/// Records whose level is allowed and whose message or source contains
/// `search` (case-insensitive). Input order is kept.
pub fn filter_logs<'a>(
    records: &'a [LogRecord],
    search: &str,
    allowed: &LevelSet,
) -> Vec<&'a LogRecord> {
    if allowed.is_empty() {
        return Vec::new();
    }

    let needle = search.trim().to_lowercase();
    records
        .iter()
        .filter(|r| allowed.contains(r.level))
        .filter(|r| needle.is_empty() || matches_search(r, &needle))
        .collect()
}

/// `needle` must already be lowercased.
fn matches_search(record: &LogRecord, needle: &str) -> bool {
    record.message.to_lowercase().contains(needle)
        || record
            .source
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains(needle))
}

/// Number of `level` records stamped within `[now - window, now]`. A window
/// reaching past the earliest representable time counts everything up to
/// `now`.
pub fn count_recent(
    records: &[LogRecord],
    level: Level,
    window: Duration,
    now: DateTime<Utc>,
) -> usize {
    if window <= Duration::zero() {
        return 0;
    }

    let since = now
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    records
        .iter()
        .filter(|r| r.level == level)
        .filter(|r| r.timestamp >= since && r.timestamp <= now)
        .count()
}

/// Stable sort by timestamp.
pub fn sort_logs(records: &mut [LogRecord], order: SortOrder) {
    match order {
        SortOrder::TsAsc => records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        SortOrder::TsDesc => records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    fn records() -> Vec<LogRecord> {
        vec![
            LogRecord::new(Level::Error, "Database connection timeout", base())
                .with_id("l1")
                .with_source("postgres"),
            LogRecord::new(Level::Info, "User signed in", base() - Duration::minutes(5))
                .with_id("l2")
                .with_source("auth-service"),
            LogRecord::new(Level::Delivered, "Alert sent to Slack", base() - Duration::minutes(9))
                .with_id("l3"),
            LogRecord::new(Level::Blocked, "Rate limited notification", base() - Duration::hours(2))
                .with_id("l4")
                .with_source("notifier"),
        ]
    }

    fn ids(found: &[&LogRecord]) -> Vec<String> {
        found.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn empty_search_with_all_levels_keeps_everything_in_order() {
        let records = records();
        let found = filter_logs(&records, "", &LevelSet::all());
        assert_eq!(ids(&found), vec!["l1", "l2", "l3", "l4"]);
    }

    #[test]
    fn empty_level_set_yields_nothing() {
        let records = records();
        assert!(filter_logs(&records, "", &LevelSet::empty()).is_empty());
        assert!(filter_logs(&records, "database", &LevelSet::empty()).is_empty());
    }

    #[test]
    fn search_is_case_insensitive_on_message_and_source() {
        let records = records();
        assert_eq!(
            ids(&filter_logs(&records, "DATABASE", &LevelSet::all())),
            vec!["l1"]
        );
        assert_eq!(
            ids(&filter_logs(&records, "Auth-SERVICE", &LevelSet::all())),
            vec!["l2"]
        );
        assert!(filter_logs(&records, "kafka", &LevelSet::all()).is_empty());
    }

    #[test]
    fn level_and_search_combine() {
        let records = records();
        let allowed: LevelSet = [Level::Delivered, Level::Blocked].into_iter().collect();
        assert_eq!(ids(&filter_logs(&records, "", &allowed)), vec!["l3", "l4"]);
        assert_eq!(
            ids(&filter_logs(&records, "  notifier ", &allowed)),
            vec!["l4"]
        );
    }

    #[test]
    fn count_recent_uses_trailing_window() {
        let now = base();
        let records = vec![
            LogRecord::new(Level::Error, "a", now),
            LogRecord::new(Level::Error, "b", now - Duration::hours(1)),
            LogRecord::new(Level::Error, "c", now - Duration::hours(30)),
            LogRecord::new(Level::Warn, "d", now),
        ];
        assert_eq!(count_recent(&records, Level::Error, Duration::hours(24), now), 2);
        assert_eq!(count_recent(&records, Level::Debug, Duration::hours(24), now), 0);
    }

    #[test]
    fn count_recent_ignores_future_and_degenerate_windows() {
        let now = base();
        let records = vec![
            LogRecord::new(Level::Error, "future", now + Duration::minutes(1)),
            LogRecord::new(Level::Error, "edge", now - Duration::hours(24)),
        ];
        assert_eq!(count_recent(&records, Level::Error, Duration::hours(24), now), 1);
        assert_eq!(count_recent(&records, Level::Error, Duration::zero(), now), 0);
        assert_eq!(count_recent(&records, Level::Error, Duration::hours(-3), now), 0);
    }

    #[test]
    fn sort_logs_orders_by_timestamp() {
        let mut records = records();
        sort_logs(&mut records, SortOrder::TsAsc);
        assert_eq!(records.first().unwrap().id, "l4");
        sort_logs(&mut records, SortOrder::TsDesc);
        assert_eq!(records.first().unwrap().id, "l1");
    }

    #[test]
    fn count_recent_survives_windows_past_the_calendar() {
        let now = base();
        let records = vec![
            LogRecord::new(Level::Error, "now", now),
            LogRecord::new(Level::Error, "ancient", DateTime::<Utc>::MIN_UTC),
            LogRecord::new(Level::Error, "future", now + Duration::minutes(1)),
        ];
        let huge = crate::time::parse_window("500000years").unwrap();
        assert_eq!(count_recent(&records, Level::Error, huge, now), 2);
        assert_eq!(count_recent(&records, Level::Error, Duration::MAX, now), 2);
    }
}

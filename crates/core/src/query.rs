use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::unacknowledged_count;
use crate::filter::{SortOrder, count_recent, filter_logs, sort_logs};
use crate::level::{Level, LevelSet};
use crate::model::alert::{Alert, AlertSeverity};
use crate::model::log::LogRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogQuery {
    pub search: String,
    pub levels: LevelSet,
    pub sort: SortOrder,
    pub limit: usize,
    pub include_stats: bool,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            levels: LevelSet::all(),
            sort: SortOrder::TsDesc,
            limit: 100,
            include_stats: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LogStats {
    pub by_level: Vec<(String, usize)>,
    pub by_source: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogView {
    pub total_matches: usize,
    pub returned: usize,
    pub records: Vec<LogRecord>,
    pub stats: Option<LogStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_logs: usize,
    pub errors_recent: usize,
    pub warnings_recent: usize,
    pub unacknowledged_alerts: usize,
    pub unacknowledged_critical: usize,
}

pub fn run_query(records: &[LogRecord], query: &LogQuery) -> LogView {
    let mut sorted = records.to_vec();
    sort_logs(&mut sorted, query.sort);

    let filtered = filter_logs(&sorted, &query.search, &query.levels);
    let total_matches = filtered.len();
    let stats = query.include_stats.then(|| compute_stats(&filtered));

    let selected = filtered
        .into_iter()
        .take(query.limit)
        .cloned()
        .collect::<Vec<_>>();

    LogView {
        total_matches,
        returned: selected.len(),
        records: selected,
        stats,
    }
}

pub fn dashboard_stats(
    records: &[LogRecord],
    alerts: &[Alert],
    window: Duration,
    now: DateTime<Utc>,
) -> DashboardStats {
    DashboardStats {
        total_logs: records.len(),
        errors_recent: count_recent(records, Level::Error, window, now),
        warnings_recent: count_recent(records, Level::Warn, window, now),
        unacknowledged_alerts: unacknowledged_count(alerts, None),
        unacknowledged_critical: unacknowledged_count(alerts, Some(AlertSeverity::Critical)),
    }
}

fn compute_stats(records: &[&LogRecord]) -> LogStats {
    let mut by_level: HashMap<String, usize> = HashMap::new();
    let mut by_source: HashMap<String, usize> = HashMap::new();
    for record in records {
        *by_level.entry(record.level.to_string()).or_default() += 1;
        let source = record.source.clone().unwrap_or_else(|| "-".to_string());
        *by_source.entry(source).or_default() += 1;
    }

    LogStats {
        by_level: sorted_counts(by_level),
        by_source: sorted_counts(by_source),
    }
}

fn sorted_counts(map: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut out = map.into_iter().collect::<Vec<_>>();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

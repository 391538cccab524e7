use crate::filter::filter_logs;
use crate::level::LevelSet;
use crate::model::alert::{Alert, AlertSeverity};
use crate::model::log::LogRecord;

/// Copy of `alerts` with `alert_id` acknowledged. The input is left untouched
/// and an unknown id yields an equal collection.
pub fn acknowledge(alerts: &[Alert], alert_id: &str) -> Vec<Alert> {
    alerts
        .iter()
        .map(|alert| {
            if alert.id == alert_id {
                Alert {
                    acknowledged: true,
                    ..alert.clone()
                }
            } else {
                alert.clone()
            }
        })
        .collect()
}

/// Unacknowledged alerts, optionally restricted to one severity.
pub fn unacknowledged_count(alerts: &[Alert], severity: Option<AlertSeverity>) -> usize {
    alerts
        .iter()
        .filter(|a| !a.acknowledged)
        .filter(|a| severity.is_none_or(|s| a.severity == s))
        .count()
}

pub fn sort_alerts_newest_first(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Logs an alert points at through its `related_logs_query`.
pub fn related_logs<'a>(
    records: &'a [LogRecord],
    alert: &Alert,
    allowed: &LevelSet,
) -> Vec<&'a LogRecord> {
    match alert.related_logs_query.as_deref() {
        Some(query) if !query.trim().is_empty() => filter_logs(records, query, allowed),
        _ => Vec::new(),
    }
}

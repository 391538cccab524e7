use chrono::SecondsFormat;
use pulselog_core::model::alert::Alert;
use pulselog_core::model::log::{Details, LogRecord};
use pulselog_core::query::{DashboardStats, LogView};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AlertRow {
    #[serde(flatten)]
    pub alert: Alert,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_logs: Option<Vec<LogRecord>>,
}

/// Everything a command can print. JSON output is the bare payload.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Output {
    Record(LogRecord),
    Logs(LogView),
    Stats(DashboardStats),
    Alerts(Vec<AlertRow>),
}

pub fn print_output(output: &Output, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }

    match output {
        Output::Record(v) => print_record_human(v),
        Output::Logs(v) => print_logs_human(v),
        Output::Stats(v) => print_stats_human(v),
        Output::Alerts(v) => print_alerts_human(v),
    }
    Ok(())
}

fn print_record_human(row: &LogRecord) {
    let ts = row.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
    let source = row.source.as_deref().unwrap_or("-");
    let (trace, span) = match &row.correlation {
        Some(c) => (c.trace_id.as_str(), c.span_id.as_str()),
        None => ("-", "-"),
    };
    let details = match &row.details {
        Some(Details::Text(text)) => text.clone(),
        Some(Details::Fields(data)) => data.to_json().to_string(),
        None => String::new(),
    };
    println!(
        "{ts} {} {} trace={trace} span={span} | {} {details}",
        source,
        row.level.as_str().to_uppercase(),
        row.message,
    );
}

fn print_logs_human(v: &LogView) {
    for row in &v.records {
        print_record_human(row);
    }
    println!("-- {} matches ({} returned) --", v.total_matches, v.returned);
    if let Some(stats) = &v.stats {
        println!("stats.by_level={:?}", stats.by_level);
        println!("stats.by_source={:?}", stats.by_source);
    }
}

fn print_stats_human(v: &DashboardStats) {
    println!("logs={}", v.total_logs);
    println!(
        "errors_recent={} warnings_recent={}",
        v.errors_recent, v.warnings_recent
    );
    println!(
        "unacknowledged={} unacknowledged_critical={}",
        v.unacknowledged_alerts, v.unacknowledged_critical
    );
}

fn print_alerts_human(rows: &[AlertRow]) {
    for row in rows {
        let a = &row.alert;
        let ack = if a.acknowledged { "acked" } else { "open" };
        println!(
            "{} {} {} [{}] {} ({}) - {}",
            a.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            a.id,
            a.severity.as_str().to_uppercase(),
            ack,
            a.title,
            a.source,
            a.description
        );
        if let Some(related) = &row.related_logs {
            for log in related {
                println!(
                    "    {} {} | {}",
                    log.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                    log.level.as_str().to_uppercase(),
                    log.message
                );
            }
        }
    }
    println!("-- {} alerts --", rows.len());
}

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use testkit::{SPAN_ID, TRACE_ID, base_time, sample_alerts, sample_logs, to_json_array};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_pulselog")
}

fn pulselog(temp: &Path) -> Command {
    let mut cmd = Command::new(bin());
    cmd.env_remove("PULSELOG_OTLP_ENDPOINT")
        .env_remove("OTEL_EXPORTER_OTLP_ENDPOINT")
        .env_remove("PULSELOG_CONSOLE")
        .env_remove("PULSELOG_LEVELS")
        .env_remove("RUST_LOG")
        .env_remove("PULSELOG_CONFIG")
        .env("XDG_CONFIG_HOME", temp.join("xdg"));
    cmd
}

fn write_fixtures(temp: &Path) -> (PathBuf, PathBuf) {
    let logs = temp.join("logs.json");
    let alerts = temp.join("alerts.json");
    std::fs::write(&logs, to_json_array(&sample_logs(base_time()))).unwrap();
    std::fs::write(&alerts, to_json_array(&sample_alerts(base_time()))).unwrap();
    (logs, alerts)
}

fn json_stdout(out: &Output) -> Value {
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn logs_filters_by_search_and_level() {
    let temp = tempfile::tempdir().unwrap();
    let (logs, _) = write_fixtures(temp.path());

    let out = pulselog(temp.path())
        .args(["--json", "logs", "--search", "payment", "--level", "error", "--file"])
        .arg(&logs)
        .output()
        .unwrap();
    let v = json_stdout(&out);
    assert_eq!(v["total_matches"], 1);
    assert_eq!(v["records"][0]["id"], "log-4");
    assert_eq!(v["records"][0]["correlation"]["trace_id"], TRACE_ID);

    let out = pulselog(temp.path())
        .args(["--json", "logs", "--level", "", "--file"])
        .arg(&logs)
        .output()
        .unwrap();
    let v = json_stdout(&out);
    assert_eq!(v["total_matches"], 0);
}

#[test]
fn logs_sorts_and_limits() {
    let temp = tempfile::tempdir().unwrap();
    let (logs, _) = write_fixtures(temp.path());

    let out = pulselog(temp.path())
        .args(["--json", "logs", "--sort", "ts_asc", "--limit", "2", "--stats", "--file"])
        .arg(&logs)
        .output()
        .unwrap();
    let v = json_stdout(&out);
    assert_eq!(v["total_matches"], 8);
    assert_eq!(v["returned"], 2);
    assert_eq!(v["records"][0]["id"], "log-8");
    assert!(v["stats"]["by_level"].is_array());
}

#[test]
fn stats_counts_recent_window() {
    let temp = tempfile::tempdir().unwrap();
    let (logs, alerts) = write_fixtures(temp.path());

    let out = pulselog(temp.path())
        .args(["--json", "stats", "--window", "24h", "--now"])
        .arg(base_time().to_rfc3339())
        .arg("--file")
        .arg(&logs)
        .arg("--alerts")
        .arg(&alerts)
        .output()
        .unwrap();
    let v = json_stdout(&out);
    assert_eq!(v["total_logs"], 8);
    assert_eq!(v["errors_recent"], 2);
    assert_eq!(v["warnings_recent"], 1);
    assert_eq!(v["unacknowledged_alerts"], 2);
    assert_eq!(v["unacknowledged_critical"], 1);
}

#[test]
fn alerts_ack_does_not_touch_file() {
    let temp = tempfile::tempdir().unwrap();
    let (logs, alerts) = write_fixtures(temp.path());
    let before = std::fs::read_to_string(&alerts).unwrap();

    let out = pulselog(temp.path())
        .args(["--json", "alerts", "--ack", "a1", "--file"])
        .arg(&alerts)
        .arg("--related")
        .arg(&logs)
        .output()
        .unwrap();
    let v = json_stdout(&out);
    let rows = v.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["id"], "a1");
    assert_eq!(rows[0]["acknowledged"], true);
    assert_eq!(rows[1]["acknowledged"], false);
    // "payment" matches the warn and error payment records
    assert_eq!(rows[0]["related_logs"].as_array().unwrap().len(), 2);

    assert_eq!(std::fs::read_to_string(&alerts).unwrap(), before);
}

#[test]
fn emit_prints_record_and_console_line() {
    let temp = tempfile::tempdir().unwrap();

    let out = pulselog(temp.path())
        .args([
            "--json",
            "emit",
            "error",
            "Payment failed",
            "--field",
            "userId=42",
            "--error",
            "timeout",
            "--source",
            "checkout",
            "--trace-id",
            TRACE_ID,
            "--span-id",
            SPAN_ID,
        ])
        .output()
        .unwrap();
    let v = json_stdout(&out);
    assert_eq!(v["level"], "error");
    assert_eq!(v["message"], "Payment failed");
    assert_eq!(v["source"], "checkout");
    assert_eq!(v["correlation"]["trace_id"], TRACE_ID);
    assert_eq!(v["correlation"]["span_id"], SPAN_ID);
    assert_eq!(v["details"]["userId"], 42);
    assert_eq!(v["details"]["error"]["message"], "timeout");

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("[ERROR] Payment failed"), "stderr: {stderr}");
}

#[test]
fn emit_unknown_level_falls_back_to_info() {
    let temp = tempfile::tempdir().unwrap();

    let out = pulselog(temp.path())
        .args(["--json", "emit", "audit", "policy updated"])
        .output()
        .unwrap();
    let v = json_stdout(&out);
    assert_eq!(v["level"], "info");
    assert!(v.get("correlation").is_none());

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("[AUDIT] policy updated"), "stderr: {stderr}");
}

#[test]
fn emit_rejects_malformed_trace_id() {
    let temp = tempfile::tempdir().unwrap();

    let out = pulselog(temp.path())
        .args(["emit", "info", "x", "--trace-id", "nothex", "--span-id", SPAN_ID])
        .output()
        .unwrap();
    assert!(!out.status.success());
}

#[test]
fn missing_explicit_config_fails() {
    let temp = tempfile::tempdir().unwrap();
    let (logs, _) = write_fixtures(temp.path());

    let out = pulselog(temp.path())
        .arg("--config")
        .arg(temp.path().join("typo.toml"))
        .args(["logs", "--file"])
        .arg(&logs)
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("does not exist"));
}

#[test]
fn stats_accepts_window_past_the_calendar() {
    let temp = tempfile::tempdir().unwrap();
    let (logs, _) = write_fixtures(temp.path());

    let out = pulselog(temp.path())
        .args(["--json", "stats", "--window", "500000years", "--now"])
        .arg(base_time().to_rfc3339())
        .arg("--file")
        .arg(&logs)
        .output()
        .unwrap();
    let v = json_stdout(&out);
    assert_eq!(v["errors_recent"], 3);

    let out = pulselog(temp.path())
        .args(["stats", "--now", "500000years", "--file"])
        .arg(&logs)
        .output()
        .unwrap();
    assert!(!out.status.success());
}

#[test]
fn emitted_error_record_reads_back_with_its_error() {
    let temp = tempfile::tempdir().unwrap();

    let out = pulselog(temp.path())
        .args(["--json", "emit", "error", "Payment failed", "--error", "timeout"])
        .output()
        .unwrap();
    let emitted = json_stdout(&out);
    let logs = temp.path().join("emitted.jsonl");
    std::fs::write(&logs, format!("{emitted}\n")).unwrap();

    let out = pulselog(temp.path())
        .args(["--json", "logs", "--level", "error", "--file"])
        .arg(&logs)
        .output()
        .unwrap();
    let v = json_stdout(&out);
    assert_eq!(v["total_matches"], 1);
    assert_eq!(v["records"][0]["details"]["error"], emitted["details"]["error"]);
    assert_eq!(v["records"][0]["details"]["error"]["message"], "timeout");
}

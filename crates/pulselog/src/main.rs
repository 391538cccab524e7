mod input;
mod output;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use pulselog_core::alerts::{acknowledge, related_logs, sort_alerts_newest_first};
use pulselog_core::config::{Config, ConsoleMode};
use pulselog_core::filter::SortOrder;
use pulselog_core::ids::Correlation;
use pulselog_core::level::LevelSet;
use pulselog_core::model::alert::Alert;
use pulselog_core::model::log::LogRecord;
use pulselog_core::query::{LogQuery, dashboard_stats, run_query};
use pulselog_core::time::{parse_time_or_relative, parse_window};
use pulselog_emit::Emitter;
use pulselog_emit::console::{Console, NullConsole, StdConsole, TracingConsole};
use pulselog_emit::metrics::InMemoryMetrics;
use pulselog_emit::otel::OtelSpan;
use pulselog_emit::sink::{NoopSink, TelemetrySink};
use pulselog_emit::span::ActiveSpan;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::input::{build_event_data, read_items};
use crate::output::{AlertRow, Output, print_output};
use crate::telemetry::{build_otlp, init_cli_tracing, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "pulselog")]
#[command(about = "Emit correlated log events and slice log/alert streams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Emit one log event to the console and telemetry sink")]
    Emit {
        level: String,
        message: String,
        #[arg(long = "field", help = "Payload entry as key=value (value parsed as JSON if possible)")]
        fields: Vec<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long, help = "Attach an error with this message under key `error`")]
        error: Option<String>,
        #[arg(long, requires = "span_id")]
        trace_id: Option<String>,
        #[arg(long, requires = "trace_id")]
        span_id: Option<String>,
    },
    #[command(about = "Filter a log file by search term and level")]
    Logs {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, help = "Comma-separated levels, or `all`")]
        level: Option<String>,
        #[arg(long, value_enum, default_value_t = SortArg::TsDesc)]
        sort: SortArg,
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long, help = "Include per-level and per-source counts")]
        stats: bool,
    },
    #[command(about = "Dashboard counters over logs and alerts")]
    Stats {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        alerts: Option<PathBuf>,
        #[arg(long, help = "Trailing window, e.g. 24h")]
        window: Option<String>,
        #[arg(long, help = "Reference time (RFC3339 or duration ago)")]
        now: Option<String>,
    },
    #[command(about = "Alert timeline, newest first")]
    Alerts {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, help = "Acknowledge this alert in the printed timeline")]
        ack: Option<String>,
        #[arg(long, help = "Log file to pivot into through each alert's query")]
        related: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SortArg {
    #[value(name = "ts_desc")]
    TsDesc,
    #[value(name = "ts_asc")]
    TsAsc,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::TsDesc => SortOrder::TsDesc,
            SortArg::TsAsc => SortOrder::TsAsc,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Emit {
            level,
            message,
            fields,
            source,
            error,
            trace_id,
            span_id,
        } => {
            let remote = match (trace_id, span_id) {
                (Some(t), Some(s)) => Some(Correlation::parse(&t, &s)?),
                _ => None,
            };
            let record = run_emit(
                &cfg,
                EmitArgs {
                    level,
                    message,
                    fields,
                    source,
                    error,
                    remote,
                },
            )?;
            print_output(&Output::Record(record), cli.json)
        }
        Commands::Logs {
            file,
            search,
            level,
            sort,
            limit,
            stats,
        } => {
            init_cli_tracing("warn");
            let records: Vec<LogRecord> = read_items(&file)?;
            let levels = match level {
                Some(raw) => LevelSet::parse(&raw)?,
                None => cfg.default_levels.clone(),
            };
            let view = run_query(
                &records,
                &LogQuery {
                    search,
                    levels,
                    sort: sort.into(),
                    limit,
                    include_stats: stats,
                },
            );
            print_output(&Output::Logs(view), cli.json)
        }
        Commands::Stats {
            file,
            alerts,
            window,
            now,
        } => {
            init_cli_tracing("warn");
            let records: Vec<LogRecord> = read_items(&file)?;
            let alerts: Vec<Alert> = match alerts {
                Some(path) => read_items(&path)?,
                None => Vec::new(),
            };
            let window = match window {
                Some(raw) => parse_window(&raw)?,
                None => chrono::Duration::from_std(cfg.recent_window)?,
            };
            let now = match now {
                Some(raw) => parse_time_or_relative(&raw)?,
                None => chrono::Utc::now(),
            };
            let stats = dashboard_stats(&records, &alerts, window, now);
            print_output(&Output::Stats(stats), cli.json)
        }
        Commands::Alerts { file, ack, related } => {
            init_cli_tracing("warn");
            let mut alerts: Vec<Alert> = read_items(&file)?;
            if let Some(id) = ack {
                if !alerts.iter().any(|a| a.id == id) {
                    tracing::warn!(alert_id = %id, "no alert with that id");
                }
                alerts = acknowledge(&alerts, &id);
            }
            sort_alerts_newest_first(&mut alerts);

            let logs: Option<Vec<LogRecord>> = related.map(|p| read_items(&p)).transpose()?;
            let rows = alerts
                .into_iter()
                .map(|alert| {
                    let related = logs.as_ref().map(|logs| {
                        related_logs(logs, &alert, &cfg.default_levels)
                            .into_iter()
                            .cloned()
                            .collect()
                    });
                    AlertRow {
                        alert,
                        related_logs: related,
                    }
                })
                .collect();
            print_output(&Output::Alerts(rows), cli.json)
        }
    }
}

struct EmitArgs {
    level: String,
    message: String,
    fields: Vec<String>,
    source: Option<String>,
    error: Option<String>,
    remote: Option<Correlation>,
}

fn run_emit(cfg: &Config, args: EmitArgs) -> anyhow::Result<LogRecord> {
    let otlp = build_otlp(cfg)?;
    let directive = match cfg.console {
        ConsoleMode::Tracing => "debug",
        ConsoleMode::Plain | ConsoleMode::Off => "warn",
    };
    init_tracing(directive, otlp.as_ref());

    let console: Arc<dyn Console> = match cfg.console {
        ConsoleMode::Tracing => Arc::new(TracingConsole),
        ConsoleMode::Off => Arc::new(NullConsole),
        ConsoleMode::Plain => Arc::new(StdConsole::new()),
    };
    let sink: Arc<dyn TelemetrySink> = match &otlp {
        Some(pipeline) => Arc::new(pipeline.sink()),
        None => Arc::new(NoopSink),
    };
    let metrics = Arc::new(InMemoryMetrics::new());
    let mut emitter = Emitter::new(sink, console).with_metrics(metrics.clone());
    if let Some(source) = args.source.or_else(|| cfg.source.clone()) {
        emitter = emitter.with_source(source);
    }

    let data = build_event_data(&args.fields, args.error)?;

    let record = match &otlp {
        Some(pipeline) => {
            let span =
                OtelSpan::start(&pipeline.tracer(), "pulselog.emit", args.remote.as_ref())?;
            // Child span for local diagnostics when RUST_LOG enables it.
            let diagnostics = tracing::info_span!("pulselog.emit.diagnostics");
            diagnostics.set_parent(span.context().clone());
            let record = diagnostics.in_scope(|| {
                emitter.emit_raw(
                    &args.level,
                    &args.message,
                    data.as_ref(),
                    Some(&span as &dyn ActiveSpan),
                )
            });
            span.end();
            record
        }
        None => {
            let remote = args.remote.as_ref().map(OtelSpan::remote).transpose()?;
            emitter.emit_raw(
                &args.level,
                &args.message,
                data.as_ref(),
                remote.as_ref().map(|s| s as &dyn ActiveSpan),
            )
        }
    };

    tracing::debug!(
        emitted = metrics.emitted_total(),
        sink_failures = metrics.sink_failures(),
        "emit finished"
    );
    if let Some(pipeline) = otlp {
        pipeline.shutdown();
    }
    Ok(record)
}

use std::io::IsTerminal;

use opentelemetry::logs::LoggerProvider as _;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::{SdkLogger, SdkLoggerProvider};
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use pulselog_core::config::Config;
use pulselog_emit::otel::OtelLogSink;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SCOPE: &str = "pulselog";

/// Log and trace providers exporting over OTLP/gRPC.
pub struct OtlpPipeline {
    logs: SdkLoggerProvider,
    traces: SdkTracerProvider,
}

impl OtlpPipeline {
    pub fn sink(&self) -> OtelLogSink<SdkLogger> {
        OtelLogSink::new(self.logs.logger(SCOPE))
    }

    pub fn tracer(&self) -> SdkTracer {
        self.traces.tracer(SCOPE)
    }

    pub fn shutdown(self) {
        if let Err(err) = self.logs.shutdown() {
            tracing::debug!(error = ?err, "log provider shutdown failed");
        }
        if let Err(err) = self.traces.shutdown() {
            tracing::debug!(error = ?err, "tracer provider shutdown failed");
        }
    }
}

/// Builds the OTLP pipeline when an endpoint is configured.
pub fn build_otlp(cfg: &Config) -> anyhow::Result<Option<OtlpPipeline>> {
    let Some(endpoint) = cfg.otlp_endpoint.as_deref() else {
        return Ok(None);
    };

    let resource = Resource::builder()
        .with_service_name(cfg.service_name.clone())
        .build();

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(cfg.otlp_timeout)
        .build()
        .map_err(|e| anyhow::anyhow!("build OTLP log exporter: {e}"))?;
    let logs = SdkLoggerProvider::builder()
        .with_resource(resource.clone())
        .with_batch_exporter(log_exporter)
        .build();

    let span_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(cfg.otlp_timeout)
        .build()
        .map_err(|e| anyhow::anyhow!("build OTLP span exporter: {e}"))?;
    let traces = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(span_exporter)
        .build();

    Ok(Some(OtlpPipeline { logs, traces }))
}

/// Stderr fmt subscriber. `RUST_LOG` wins over `default_directive`.
pub fn init_cli_tracing(default_directive: &str) {
    init_tracing(default_directive, None);
}

/// Like [`init_cli_tracing`], plus an OpenTelemetry layer when a pipeline is
/// running so `tracing` spans become exported spans.
pub fn init_tracing(default_directive: &str, otlp: Option<&OtlpPipeline>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .compact();
    let otel_layer = otlp.map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer()));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init();
}

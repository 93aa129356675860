//! Observability wiring: `tracing-subscriber` with an optional OTLP exporter.

use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace::TracerProvider};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const TRACER_NAME: &str = "hookrelay";

/// Log output options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySettings {
    pub level: LevelFilter,
    pub json: bool,
    pub otlp_endpoint: Option<String>,
}

/// Flushes pending spans when dropped.
#[must_use = "dropping the guard stops span export"]
pub struct TelemetryGuard {
    provider: Option<TracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to flush OpenTelemetry spans: {e}");
            }
        }
    }
}

/// Installs the global subscriber for the long-running commands.
///
/// Log lines go to stdout. When `otlp_endpoint` is set, spans are also
/// exported over OTLP/gRPC. Must be called from within the tokio runtime.
pub fn init(settings: &TelemetrySettings) -> Result<TelemetryGuard> {
    let provider = settings
        .otlp_endpoint
        .as_deref()
        .map(build_provider)
        .transpose()?;
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(TRACER_NAME)));

    let json_layer = settings.json.then(|| fmt::layer().json().with_current_span(true));
    let text_layer = (!settings.json).then(fmt::layer);

    tracing_subscriber::registry()
        .with(EnvFilter::default().add_directive(settings.level.into()))
        .with(json_layer)
        .with(text_layer)
        .with(otel_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(TelemetryGuard { provider })
}

/// Installs a plain stderr subscriber for one-shot commands whose stdout is data.
pub fn init_stderr(level: LevelFilter) -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::default().add_directive(level.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to install tracing subscriber")
}

fn build_provider(endpoint: &str) -> Result<TracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("Failed to build OTLP span exporter")?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .build())
}

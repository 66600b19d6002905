//! Telemetry initialization and configuration

use crate::span_exporter::{TraceCollector, TraceLayer};
use std::sync::Once;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

pub type TelemetryResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

fn env_filter() -> Result<EnvFilter, Box<dyn std::error::Error + Send + Sync>> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new("info")?),
    }
}

/// Console output, filtered by `filter`
///
/// The filter sits on this layer alone so agentic spans still reach the
/// trace collector when `RUST_LOG` is quieter than `info`.
fn console_layer<S>(filter: EnvFilter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_filter(filter)
}

/// Initialize console logging
///
/// Honors `RUST_LOG`, defaulting to `info`. Only the first call in a process
/// installs a subscriber.
///
/// # Example
/// ```
/// use trip_telemetry::init_telemetry;
/// init_telemetry("travel-booking").expect("Failed to initialize telemetry");
/// ```
pub fn init_telemetry(service_name: &str) -> TelemetryResult {
    init_inner(service_name, None)
}

/// Initialize console logging and capture agentic spans into `collector`
pub fn init_with_collector(service_name: &str, collector: TraceCollector) -> TelemetryResult {
    init_inner(service_name, Some(collector))
}

fn init_inner(service_name: &str, collector: Option<TraceCollector>) -> TelemetryResult {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = env_filter().and_then(|filter| {
            tracing_subscriber::registry()
                .with(console_layer(filter))
                .with(collector.map(TraceLayer::new))
                .try_init()?;
            Ok(())
        });

        tracing::info!(service.name = service_name, "Telemetry initialized");
    });
    result
}

/// Initialize telemetry with OpenTelemetry OTLP export
///
/// Spans are exported to the collector at `endpoint` over gRPC. When a
/// `collector` is supplied, agentic spans are also captured locally.
///
/// # Example
/// ```no_run
/// use trip_telemetry::init_with_otlp;
/// # #[tokio::main]
/// # async fn main() {
/// init_with_otlp("travel-booking", "http://localhost:4317", None)
///     .expect("Failed to initialize telemetry");
/// # }
/// ```
pub fn init_with_otlp(
    service_name: &str,
    endpoint: &str,
    collector: Option<TraceCollector>,
) -> TelemetryResult {
    use opentelemetry_otlp::WithExportConfig;
    use tracing_opentelemetry::OpenTelemetryLayer;

    let mut result = Ok(());
    INIT.call_once(|| {
        result = (|| -> TelemetryResult {
            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
                .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
                    opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                        "service.name",
                        service_name.to_string(),
                    )]),
                ))
                .install_batch(opentelemetry_sdk::runtime::Tokio)?;

            tracing_subscriber::registry()
                .with(console_layer(env_filter()?))
                .with(OpenTelemetryLayer::new(tracer).with_filter(env_filter()?))
                .with(collector.map(TraceLayer::new))
                .try_init()?;
            Ok(())
        })();

        tracing::info!(
            service.name = service_name,
            otlp.endpoint = endpoint,
            "Telemetry initialized with OpenTelemetry"
        );
    });
    result
}

/// Flush pending spans to the OTLP collector
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}

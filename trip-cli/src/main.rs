use anyhow::{Context, Result};
use clap::Parser;
use trip_booking::{PipelineBuilder, PipelineConfig};
use trip_cli::{Cli, ask, run_console, write_trace};
use trip_telemetry::TraceCollector;

const SERVICE_NAME: &str = "trip";

#[tokio::main]
async fn main() -> Result<()> {
    if let Ok(path) = dotenvy::dotenv() {
        eprintln!("Loaded config from: {}", path.display());
    }

    let cli = Cli::parse();
    let collector = cli.trace_json.as_ref().map(|_| TraceCollector::new());

    let telemetry = match &cli.otlp_endpoint {
        Some(endpoint) => trip_telemetry::init_with_otlp(SERVICE_NAME, endpoint, collector.clone()),
        None => match &collector {
            Some(collector) => trip_telemetry::init_with_collector(SERVICE_NAME, collector.clone()),
            None => trip_telemetry::init_telemetry(SERVICE_NAME),
        },
    };
    if let Err(e) = telemetry {
        eprintln!("Telemetry Warning: {e}");
    }

    let result = run(&cli).await;

    if let (Some(path), Some(collector)) = (&cli.trace_json, &collector) {
        write_trace(path, collector)?;
    }
    if cli.otlp_endpoint.is_some() {
        trip_telemetry::shutdown_telemetry();
    }
    result
}

async fn run(cli: &Cli) -> Result<()> {
    let config = cli.apply(PipelineConfig::from_env().context("invalid configuration")?);
    let pipeline = PipelineBuilder::new(config).build()?;

    match cli.request() {
        Some(request) => ask(&pipeline, &request, &mut std::io::stdout()).await,
        None => run_console(&pipeline).await,
    }
}

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use std::path::Path;
use trip_booking::TravelPipeline;
use trip_telemetry::TraceCollector;

pub const GREETING: &str = "I am a travel booking agent. How can I assist you with your travel plans?";

/// Run one request and print the final response to `out`
pub async fn ask(pipeline: &TravelPipeline, request: &str, out: &mut impl Write) -> Result<()> {
    let run = pipeline.run(request).await?;
    if run.output.is_empty() {
        eprintln!("No booking was made for this request.");
    } else {
        writeln!(out, "{}", run.output)?;
    }
    Ok(())
}

/// Prompt for requests until EOF, Ctrl+C or `exit`
///
/// A failed request is reported and the prompt continues.
pub async fn run_console(pipeline: &TravelPipeline) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{GREETING}");

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let request = line.trim();
                if request.is_empty() {
                    continue;
                }
                if request == "exit" || request == "quit" {
                    break;
                }
                rl.add_history_entry(request)?;

                let mut stdout = std::io::stdout();
                if let Err(e) = ask(pipeline, request, &mut stdout).await {
                    eprintln!("Error: {e:#}");
                }
                stdout.flush()?;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

/// Dump every captured agentic span to `path` as pretty JSON
pub fn write_trace(path: &Path, collector: &TraceCollector) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create trace file {}", path.display()))?;
    serde_json::to_writer_pretty(file, &collector.spans())?;
    tracing::debug!(path = %path.display(), "Trace written");
    Ok(())
}

use clap::Parser;
use std::path::PathBuf;
use trip_booking::{InstructionProfile, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "trip")]
#[command(about = "Book flights and hotels with a pipeline of agents", long_about = None)]
pub struct Cli {
    /// Booking request; prompts for one when omitted
    #[arg(trailing_var_arg = true)]
    pub request: Vec<String>,

    /// Instruction profile: focused, lenient or clarifying
    #[arg(short, long)]
    pub profile: Option<InstructionProfile>,

    /// Gemini model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// Output token budget for every agent
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i32::MAX as i64))]
    pub max_output_tokens: Option<u32>,

    /// Write the captured agent and tool spans to this file as JSON
    #[arg(long)]
    pub trace_json: Option<PathBuf>,

    /// Export spans to an OTLP collector, e.g. http://localhost:4317
    #[arg(long)]
    pub otlp_endpoint: Option<String>,
}

impl Cli {
    /// The request given on the command line, if any
    pub fn request(&self) -> Option<String> {
        let request = self.request.join(" ");
        let request = request.trim();
        (!request.is_empty()).then(|| request.to_string())
    }

    /// Apply flag overrides on top of the environment configuration
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(profile) = self.profile {
            config = config.with_profile(profile);
        }
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(max) = self.max_output_tokens {
            config = config.with_max_output_tokens(max);
        }
        config
    }
}

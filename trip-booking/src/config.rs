//! Pipeline configuration
//!
//! Resolved from environment variables by [`PipelineConfig::from_env`];
//! every field has a documented default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use trip_core::{Result, TripError};
use trip_model::gemini::DEFAULT_MODEL;

pub const DEFAULT_APP_NAME: &str = "travel_booking_app";
pub const DEFAULT_USER_ID: &str = "user_123";

/// Which set of agent instructions the pipeline runs with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionProfile {
    /// Each agent handles only its part of the request; one-sentence summary.
    #[default]
    Focused,
    /// Short instructions and a 100-token budget.
    Lenient,
    /// Like `Focused`, but the hotel agent asks before booking when the
    /// request reads "Flight Hotel"; paragraph summary.
    Clarifying,
}

impl InstructionProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstructionProfile::Focused => "focused",
            InstructionProfile::Lenient => "lenient",
            InstructionProfile::Clarifying => "clarifying",
        }
    }

    /// Output-token budget used when none is configured
    pub fn default_max_output_tokens(&self) -> u32 {
        match self {
            InstructionProfile::Lenient => 100,
            InstructionProfile::Focused | InstructionProfile::Clarifying => 1000,
        }
    }
}

impl fmt::Display for InstructionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstructionProfile {
    type Err = TripError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "focused" => Ok(InstructionProfile::Focused),
            "lenient" => Ok(InstructionProfile::Lenient),
            "clarifying" => Ok(InstructionProfile::Clarifying),
            other => Err(TripError::Config(format!(
                "unknown instruction profile '{other}' (expected focused, lenient or clarifying)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Gemini model name (`GOOGLE_GENAI_MODEL`)
    pub model: String,
    /// Per-agent output budget (`MAX_OUTPUT_TOKENS`); the profile's budget when unset
    pub max_output_tokens: Option<u32>,
    /// `GOOGLE_API_KEY` or `GEMINI_API_KEY`; only needed for the Gemini client
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub app_name: String,
    pub user_id: String,
    /// `TRIP_INSTRUCTION_PROFILE`
    pub profile: InstructionProfile,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: None,
            api_key: None,
            app_name: DEFAULT_APP_NAME.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            profile: InstructionProfile::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration through `lookup` instead of the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(model) = lookup("GOOGLE_GENAI_MODEL") {
            config.model = model;
        }
        if let Some(tokens) = lookup("MAX_OUTPUT_TOKENS") {
            config.max_output_tokens = Some(parse_tokens(&tokens)?);
        }
        config.api_key = lookup("GOOGLE_API_KEY").or_else(|| lookup("GEMINI_API_KEY"));
        if let Some(profile) = lookup("TRIP_INSTRUCTION_PROFILE") {
            config.profile = profile.parse()?;
        }

        Ok(config)
    }

    pub fn with_profile(mut self, profile: InstructionProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Budget each agent runs with
    pub fn effective_max_output_tokens(&self) -> u32 {
        self.max_output_tokens.unwrap_or_else(|| self.profile.default_max_output_tokens())
    }
}

fn parse_tokens(value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 && n <= i32::MAX as u32 => Ok(n),
        _ => Err(TripError::Config(format!(
            "MAX_OUTPUT_TOKENS must be a positive integer, got '{value}'"
        ))),
    }
}

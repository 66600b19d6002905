#[derive(Debug, thiserror::Error)]
pub enum TripError {
    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A pipeline stage failed; the run stops here.
    #[error("Stage '{agent}' failed: {source}")]
    Stage {
        agent: String,
        #[source]
        source: Box<TripError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl TripError {
    /// Attributes this error to a pipeline stage, keeping the innermost stage.
    pub fn in_stage(self, agent: impl Into<String>) -> Self {
        match self {
            TripError::Stage { .. } => self,
            other => TripError::Stage { agent: agent.into(), source: Box::new(other) },
        }
    }

    /// Name of the stage this error was attributed to, if any.
    pub fn stage(&self) -> Option<&str> {
        match self {
            TripError::Stage { agent, .. } => Some(agent),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TripError>;

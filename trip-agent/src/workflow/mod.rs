mod sequential_agent;

pub use sequential_agent::SequentialAgent;

//! Error types for config generation

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a generation run
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Tool-selection output is not a JSON list of tool names
    #[error("Failed to parse tool selection output as a JSON list of tool names: {source}\nOutput was: {output}")]
    MalformedSelection {
        output: String,
        #[source]
        source: serde_json::Error,
    },

    /// Selected tool is not offered by any available toolkit
    #[error("Selected tool '{0}' does not belong to any available toolkit")]
    UnknownTool(String),

    /// Requested toolkit is not in the catalogue
    #[error("Unknown toolkit '{0}'")]
    UnknownToolkit(String),

    /// A toolkit could not list its tools
    #[error("Toolkit '{toolkit}' failed: {source:#}")]
    Toolkit {
        toolkit: String,
        #[source]
        source: anyhow::Error,
    },

    /// Name generation produced nothing usable as a file name
    #[error("Generated agent name is empty")]
    EmptyName,

    /// Agent name cannot be used as a file name inside the output directory
    #[error("Agent name '{0}' is not a plain file name")]
    InvalidName(String),

    /// The agent runtime failed
    #[error("Agent '{agent}' failed: {source:#}")]
    Agent {
        agent: String,
        #[source]
        source: anyhow::Error,
    },

    /// A step was run before the step producing its input
    #[error("Missing {0}: the step producing it has not completed")]
    MissingStepOutput(&'static str),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load template '{name}': {message}")]
    Template { name: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The background run was cancelled before it finished
    #[error("Generation was cancelled")]
    Cancelled,
}

impl GeneratorError {
    pub(crate) fn agent(agent: &str, source: anyhow::Error) -> Self {
        GeneratorError::Agent {
            agent: agent.to_string(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeneratorError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

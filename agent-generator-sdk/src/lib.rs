//! Shared building blocks for the agent config generator.
//!
//! - [`agent`]: the agent capability (`Agent`, `AgentFactory`, streamed `AgentEvent`s)
//! - [`toolkit`]: the toolkit capability (`Toolkit`, `ToolInfo`)
//! - [`GeneratorEvent`]: structured progress events for UI consumers
//! - console logging macros for human-readable progress output

pub mod agent;
pub mod toolkit;

pub use agent::{
    event_stream, Agent, AgentEvent, AgentEventStream, AgentFactory, AgentSpec, ToolUseBehavior,
};
pub use toolkit::{ToolInfo, Toolkit};

// Re-export async trait for convenience
pub use async_trait::async_trait;

use serde::{Deserialize, Serialize};

/// Prefix marking a structured event line on stderr
pub const EVENT_PREFIX: &str = "__AG_EVENT__:";

/// Structured progress events emitted while generating an agent config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneratorEvent {
    /// Step started
    StepStarted {
        step: usize,
        name: String,
        total_steps: usize,
    },
    /// Step completed
    StepCompleted { step: usize, name: String },
    /// Event relayed from the agent running a step
    Agent {
        step: usize,
        agent_name: String,
        event: AgentEvent,
    },
    /// Configuration document written
    ConfigWritten { path: String },
    /// Pipeline finished, no further events follow
    PipelineCompleted { path: String },
    /// Pipeline aborted, no further events follow
    PipelineFailed { error: String },
}

impl GeneratorEvent {
    /// Emit this event to stderr for UI parsing
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            use std::io::Write;
            eprintln!("{}{}", EVENT_PREFIX, json);
            // Force flush stderr in async/concurrent contexts
            let _ = std::io::stderr().flush();
        }
    }

    /// Parse a stderr line produced by [`GeneratorEvent::emit`]
    pub fn parse_line(line: &str) -> Option<Self> {
        let json = line.strip_prefix(EVENT_PREFIX)?;
        serde_json::from_str(json).ok()
    }

    /// Whether this event ends the event stream
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GeneratorEvent::PipelineCompleted { .. } | GeneratorEvent::PipelineFailed { .. }
        )
    }
}

// ============================================================================
// Console Logging Macros
// ============================================================================
// Colored console output for human-readable logs, complementing the
// structured GeneratorEvent stream used by UI consumers.
// ============================================================================

/// Logs the start of a pipeline step with a header and description.
///
/// # Example
/// ```
/// use agent_generator_sdk::log_phase_start_console;
/// log_phase_start_console!(1, "Clarify", "Gather requirements from the user");
/// ```
///
/// Outputs:
/// ```text
/// ═══ STEP 1: Clarify ═══
/// Gather requirements from the user
/// ```
#[macro_export]
macro_rules! log_phase_start_console {
    ($phase:expr, $title:expr, $description:expr) => {
        println!("\x1b[1;36m═══ STEP {}: {} ═══\x1b[0m", $phase, $title);
        println!("\x1b[36m{}\x1b[0m", $description);
    };
}

/// Logs the completion of a pipeline step.
///
/// Outputs:
/// ```text
/// ✓ Step 1 complete
/// ```
#[macro_export]
macro_rules! log_phase_complete_console {
    ($phase:expr) => {
        println!("\x1b[32m✓ Step {} complete\x1b[0m", $phase);
    };
}

/// Logs an informational message.
///
/// # Example
/// ```
/// use agent_generator_sdk::log_info;
/// log_info!("Loading toolkits...");
/// let count = 3;
/// log_info!("Found {} toolkits", count);
/// ```
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
///
/// Outputs:
/// ```text
/// ⚠ Warning: Generated name is too long or contains spaces
/// ```
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs that a file has been saved.
///
/// Outputs:
/// ```text
/// ✓ Saved: configs/agents/generated/web_summarizer.yaml
/// ```
#[macro_export]
macro_rules! log_file_saved {
    ($path:expr) => {
        println!("\x1b[32m✓ Saved: {}\x1b[0m", $path);
    };
}

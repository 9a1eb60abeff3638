//! Agent config generator
//!
//! Interviews a user and turns the answers into an agent configuration
//! document: clarified requirements, a tool selection grouped by toolkit,
//! operating instructions and a short agent name.

pub mod claude;
pub mod cli;
pub mod config;
pub mod error;
pub mod formatter;
pub mod generator;
pub mod prompts;
pub mod recorder;
pub mod scripted;
pub mod toolkits;

pub use config::{ExecutionMode, GeneratorConfig};
pub use error::{GeneratorError, Result};
pub use generator::{EventSink, GeneratorAgents, SimpleAgentGenerator};
pub use recorder::{GeneratorState, SelectedTools, TaskRecorder};
pub use toolkits::{ToolCatalogue, UserInteractionToolkit};

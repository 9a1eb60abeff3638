//! Agent capability: a model-driven decision loop with optional tools

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{BoxStream, Stream};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::toolkit::Toolkit;

/// Event observed while an agent runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Text produced by the model
    Message { text: String },
    /// The model invoked a tool
    ToolCalled { tool: String, input: Value },
    /// A tool returned
    ToolOutput { tool: String, output: String },
    /// Terminal event carrying the run's final output
    Completed { final_output: String },
}

/// Stream of events for a single agent run. Ends after [`AgentEvent::Completed`].
pub type AgentEventStream = BoxStream<'static, Result<AgentEvent>>;

/// Box a stream of agent events, e.g. one built with `async_stream::try_stream!`
pub fn event_stream(stream: impl Stream<Item = Result<AgentEvent>> + Send + 'static) -> AgentEventStream {
    Box::pin(stream)
}

/// What the agent loop does after a tool call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolUseBehavior {
    /// Feed tool output back to the model and keep going
    #[default]
    RunLlmAgain,
    /// Stop right after one of these tools is called; its output is the final output
    StopAtTools(Vec<String>),
}

impl ToolUseBehavior {
    /// Whether calling `tool` ends the run. Accepts MCP-qualified names (`mcp__<server>__<tool>`).
    pub fn stops_at(&self, tool: &str) -> bool {
        match self {
            ToolUseBehavior::RunLlmAgain => false,
            ToolUseBehavior::StopAtTools(names) => {
                let bare = tool.rsplit("__").next().unwrap_or(tool);
                names.iter().any(|n| n == tool || n == bare)
            }
        }
    }
}

/// Everything needed to construct an agent
#[derive(Clone)]
pub struct AgentSpec {
    pub name: String,
    /// Static instructions (system prompt)
    pub instructions: String,
    pub toolkit: Option<Arc<dyn Toolkit>>,
    pub tool_use_behavior: ToolUseBehavior,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            toolkit: None,
            tool_use_behavior: ToolUseBehavior::default(),
        }
    }

    pub fn with_toolkit(mut self, toolkit: Arc<dyn Toolkit>) -> Self {
        self.toolkit = Some(toolkit);
        self
    }

    pub fn stop_at_tools(mut self, names: &[&str]) -> Self {
        self.tool_use_behavior =
            ToolUseBehavior::StopAtTools(names.iter().map(|n| n.to_string()).collect());
        self
    }
}

impl fmt::Debug for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSpec")
            .field("name", &self.name)
            .field("instructions_len", &self.instructions.len())
            .field("toolkit", &self.toolkit.as_ref().map(|t| t.name().to_string()))
            .field("tool_use_behavior", &self.tool_use_behavior)
            .finish()
    }
}

/// A runnable agent
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    /// Acquire resources needed for a run
    async fn enter(&self) -> Result<()> {
        Ok(())
    }

    /// Release resources acquired in [`Agent::enter`]
    async fn exit(&self) -> Result<()> {
        Ok(())
    }

    /// Start a run on `input`. The returned stream must be drained to reach the final output.
    fn run_streamed(&self, input: &str) -> AgentEventStream;
}

/// Builds agents for a concrete runtime
pub trait AgentFactory: Send + Sync {
    fn create(&self, spec: AgentSpec) -> Result<Arc<dyn Agent>>;
}

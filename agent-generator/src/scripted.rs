//! Scripted agent backend for offline runs and tests
//!
//! Each agent replays one scripted turn read from YAML instead of calling a
//! model. Scripted tool calls are really executed against the agent's toolkit,
//! so a scripted `ask_user` reaches the user.
//!
//! # YAML format
//!
//! ```yaml
//! agents:
//!   clarification_agent:
//!     tool_calls:
//!       - tool: ask_user
//!         args:
//!           question: "Which documents should it read?"
//!       - tool: final_answer
//!         args:
//!           answer: "Search the web and summarize PDFs"
//!   tool_selection_agent:
//!     reply: '["web_search", "pdf_reader"]'
//!   instructions_generation_agent:
//!     reply: "You are a research assistant."
//!   name_generation_agent:
//!     reply: "web_pdf_summarizer"
//! ```
//!
//! `{input}` in a reply is replaced by the text the agent was run on.

use agent_generator_sdk::{
    event_stream, Agent, AgentEvent, AgentEventStream, AgentFactory, AgentSpec, ToolUseBehavior,
    Toolkit,
};
use anyhow::{anyhow, Context, Result};
use async_stream::try_stream;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Root document
#[derive(Debug, Deserialize)]
pub struct ScriptConfig {
    pub agents: IndexMap<String, ScriptedTurn>,
}

/// What one agent does when run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptedTurn {
    /// Tool calls executed in order before replying
    #[serde(default)]
    pub tool_calls: Vec<ScriptedToolCall>,
    /// Final text, unless a stop-at tool ended the run first
    pub reply: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedToolCall {
    pub tool: String,
    #[serde(default = "empty_args")]
    pub args: serde_json::Value,
}

fn empty_args() -> serde_json::Value {
    serde_json::json!({})
}

/// Creates agents that replay a script
pub struct ScriptedAgentFactory {
    script: Arc<ScriptConfig>,
    created: AtomicUsize,
}

impl ScriptedAgentFactory {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading agent script: {}", path.display()))?;
        Self::load(&text)
    }

    pub fn load(yaml: &str) -> Result<Self> {
        let script: ScriptConfig = serde_yaml::from_str(yaml).context("parsing agent script YAML")?;
        Ok(Self::new(script))
    }

    pub fn new(script: ScriptConfig) -> Self {
        Self {
            script: Arc::new(script),
            created: AtomicUsize::new(0),
        }
    }

    /// Number of agents created so far
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl AgentFactory for ScriptedAgentFactory {
    fn create(&self, spec: AgentSpec) -> Result<Arc<dyn Agent>> {
        let turn = self
            .script
            .agents
            .get(&spec.name)
            .cloned()
            .ok_or_else(|| anyhow!("No scripted turn for agent '{}'", spec.name))?;

        self.created.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(agent = %spec.name, tool_calls = turn.tool_calls.len(), "scripted agent created");

        Ok(Arc::new(ScriptedAgent {
            name: spec.name,
            toolkit: spec.toolkit,
            behavior: spec.tool_use_behavior,
            turn: Arc::new(turn),
        }))
    }
}

/// An agent replaying a [`ScriptedTurn`]
pub struct ScriptedAgent {
    name: String,
    toolkit: Option<Arc<dyn Toolkit>>,
    behavior: ToolUseBehavior,
    turn: Arc<ScriptedTurn>,
}

impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_streamed(&self, input: &str) -> AgentEventStream {
        let name = self.name.clone();
        let toolkit = self.toolkit.clone();
        let behavior = self.behavior.clone();
        let turn = Arc::clone(&self.turn);
        let input = input.to_string();

        event_stream(try_stream! {
            let mut stopped_with = None;

            for call in turn.tool_calls.iter() {
                yield AgentEvent::ToolCalled {
                    tool: call.tool.clone(),
                    input: call.args.clone(),
                };

                let toolkit = toolkit.as_ref().ok_or_else(|| {
                    anyhow!("Agent '{}' has no tools but its script calls '{}'", name, call.tool)
                })?;
                let output = toolkit.call_tool(&call.tool, call.args.clone()).await?;

                yield AgentEvent::ToolOutput {
                    tool: call.tool.clone(),
                    output: output.clone(),
                };

                if behavior.stops_at(&call.tool) {
                    stopped_with = Some(output);
                    break;
                }
            }

            let final_output = match stopped_with {
                Some(output) => output,
                None => {
                    let reply = turn
                        .reply
                        .as_deref()
                        .ok_or_else(|| anyhow!("Script for agent '{}' has no reply", name))?
                        .replace("{input}", &input);
                    yield AgentEvent::Message { text: reply.clone() };
                    reply
                }
            };

            yield AgentEvent::Completed { final_output };
        })
    }
}

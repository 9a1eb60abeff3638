//! Event relay between a running agent and the consumer of progress events
//!
//! Every step funnels its agent run through [`process_streamed`], which drains
//! the agent's event stream to the end, forwards each event to an [`EventSink`],
//! and only then hands back the final output.

use agent_generator_sdk::{
    log_file_saved, log_phase_complete_console, log_phase_start_console, Agent, AgentEvent,
    AgentEventStream, GeneratorEvent,
};
use anyhow::anyhow;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::{GeneratorError, Result};

/// Where progress events go
#[derive(Debug, Clone)]
pub enum EventSink {
    /// Print human-readable progress; optionally also emit structured lines on stderr
    Console { json_events: bool },
    /// Queue events for a consumer draining a [`crate::TaskRecorder`]
    Queue(mpsc::UnboundedSender<GeneratorEvent>),
}

impl EventSink {
    pub fn console() -> Self {
        EventSink::Console { json_events: false }
    }

    pub fn send(&self, event: GeneratorEvent) {
        match self {
            EventSink::Console { json_events } => {
                print_event(&event);
                if *json_events {
                    event.emit();
                }
            }
            EventSink::Queue(tx) => {
                if tx.send(event).is_err() {
                    tracing::debug!("event receiver dropped, discarding progress event");
                }
            }
        }
    }
}

/// Drain an agent run, relaying each event, and return its final output
pub async fn process_streamed(
    mut stream: AgentEventStream,
    step: usize,
    agent_name: &str,
    sink: &EventSink,
) -> anyhow::Result<String> {
    let mut final_output = None;
    let mut event_count = 0usize;

    while let Some(event) = stream.next().await {
        let event = event?;
        event_count += 1;
        tracing::debug!(step, agent = agent_name, ?event, "agent event");

        if let AgentEvent::Completed { final_output: output } = &event {
            final_output = Some(output.clone());
        }

        sink.send(GeneratorEvent::Agent {
            step,
            agent_name: agent_name.to_string(),
            event,
        });
    }

    tracing::debug!(step, agent = agent_name, event_count, "agent stream drained");

    final_output.ok_or_else(|| anyhow!("Agent stream ended without a final output"))
}

/// Run `agent` once on `input`, holding its resources only for the duration of the run
pub async fn run_scoped(
    agent: &Arc<dyn Agent>,
    step: usize,
    input: &str,
    sink: &EventSink,
) -> Result<String> {
    agent
        .enter()
        .await
        .map_err(|e| GeneratorError::agent(agent.name(), e))?;

    let result = process_streamed(agent.run_streamed(input), step, agent.name(), sink).await;
    let exited = agent.exit().await;

    let output = result.map_err(|e| GeneratorError::agent(agent.name(), e))?;
    exited.map_err(|e| GeneratorError::agent(agent.name(), e))?;
    Ok(output)
}

/// Print a progress event for a human watching the terminal
pub fn print_event(event: &GeneratorEvent) {
    match event {
        GeneratorEvent::StepStarted { step, name, .. } => {
            log_phase_start_console!(step, name, step_description(*step));
        }
        GeneratorEvent::StepCompleted { step, .. } => {
            log_phase_complete_console!(step);
        }
        GeneratorEvent::Agent { event, .. } => match event {
            AgentEvent::Message { text } => println!("{}", text),
            AgentEvent::ToolCalled { tool, input } => {
                println!("{}", describe_tool_call(tool, input));
            }
            AgentEvent::ToolOutput { tool, .. } => {
                println!("\x1b[2m✓ Tool result: {}\x1b[0m", tool);
            }
            AgentEvent::Completed { .. } => {}
        },
        GeneratorEvent::ConfigWritten { path } => {
            log_file_saved!(path);
        }
        GeneratorEvent::PipelineCompleted { .. } => {}
        GeneratorEvent::PipelineFailed { error } => {
            eprintln!("\x1b[31m✗ Generation failed: {}\x1b[0m", error);
        }
    }
}

fn step_description(step: usize) -> &'static str {
    match step {
        1 => "Clarify requirements with the user",
        2 => "Select tools from the available toolkits",
        3 => "Draft operating instructions",
        4 => "Generate the agent name",
        _ => "",
    }
}

/// One-line description of a tool call for console output
fn describe_tool_call(tool: &str, input: &serde_json::Value) -> String {
    let bare = tool.rsplit("__").next().unwrap_or(tool);
    match bare {
        "ask_user" => {
            if let Some(question) = input.get("question").and_then(|v| v.as_str()) {
                format!("💬 Asking user: {}", question)
            } else {
                "💬 Asking user".to_string()
            }
        }
        "final_answer" => {
            let answer = input
                .get("answer")
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .unwrap_or_default();
            if answer.chars().count() > 60 {
                let preview: String = answer.chars().take(57).collect();
                format!("🏁 Final answer: {}...", preview)
            } else if answer.is_empty() {
                "🏁 Final answer".to_string()
            } else {
                format!("🏁 Final answer: {}", answer)
            }
        }
        _ => format!("🔧 Using tool: {}", tool),
    }
}

//! Agent backend driving the Claude agent SDK
//!
//! Each [`ClaudeAgent`] owns one SDK client between `enter` and `exit`. An
//! agent's toolkit is served in-process as an SDK MCP server named after the
//! toolkit, so its tools reach the model as `mcp__<toolkit>__<tool>`. The CLI's
//! built-in tools are never available to a generator agent.

use agent_generator_sdk::{
    async_trait, event_stream, Agent, AgentEvent, AgentEventStream, AgentFactory, AgentSpec,
    ToolUseBehavior, Toolkit,
};
use anyhow::{anyhow, Context, Result};
use async_stream::try_stream;
use claude_agent_sdk::mcp::{SdkMcpServer, SdkMcpTool, ToolResult};
use claude_agent_sdk::types::{
    ContentBlock, ContentValue, McpServerConfig, McpServers, Message, SdkMcpServerMarker,
};
use claude_agent_sdk::{ClaudeAgentOptions, ClaudeSDKClient, SystemPrompt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tools built into the Claude CLI. Generator agents only ever get their own toolkit.
const BUILTIN_TOOLS: &[&str] = &[
    "Bash",
    "BashOutput",
    "KillShell",
    "Read",
    "Write",
    "Edit",
    "MultiEdit",
    "Glob",
    "Grep",
    "LS",
    "NotebookRead",
    "NotebookEdit",
    "WebFetch",
    "WebSearch",
    "Task",
    "TodoWrite",
    "SlashCommand",
    "ExitPlanMode",
];

/// Creates agents backed by the Claude CLI
#[derive(Debug, Clone, Default)]
pub struct ClaudeAgentFactory {
    cli_path: Option<std::path::PathBuf>,
}

impl ClaudeAgentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific Claude CLI binary instead of the one on `PATH`
    pub fn with_cli_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.cli_path = Some(path.into());
        self
    }
}

impl AgentFactory for ClaudeAgentFactory {
    fn create(&self, spec: AgentSpec) -> Result<Arc<dyn Agent>> {
        Ok(Arc::new(ClaudeAgent {
            spec,
            cli_path: self.cli_path.clone(),
            client: Arc::new(Mutex::new(None)),
        }))
    }
}

pub struct ClaudeAgent {
    spec: AgentSpec,
    cli_path: Option<std::path::PathBuf>,
    client: Arc<Mutex<Option<ClaudeSDKClient>>>,
}

impl ClaudeAgent {
    async fn options(&self) -> Result<ClaudeAgentOptions> {
        let mut options = ClaudeAgentOptions {
            system_prompt: Some(SystemPrompt::String(self.spec.instructions.clone())),
            disallowed_tools: BUILTIN_TOOLS
                .iter()
                .map(|tool| tool.to_string().into())
                .collect(),
            ..Default::default()
        };

        match &self.spec.toolkit {
            Some(toolkit) => {
                let server_name = toolkit.name().to_string();
                let (server, tool_names) = mcp_server_for(Arc::clone(toolkit)).await?;

                let mut servers = HashMap::new();
                servers.insert(
                    server_name.clone(),
                    McpServerConfig::Sdk(SdkMcpServerMarker {
                        name: server_name.clone(),
                        instance: Arc::new(server),
                    }),
                );
                options.mcp_servers = McpServers::Dict(servers);
                options.allowed_tools = qualified_tool_names(&server_name, &tool_names)
                    .into_iter()
                    .map(Into::into)
                    .collect();
            }
            None => {
                // Text in, text out
                options.max_turns = Some(1);
            }
        }

        Ok(options)
    }
}

/// Names under which the model sees the tools of an SDK MCP server
fn qualified_tool_names(server_name: &str, tool_names: &[String]) -> Vec<String> {
    tool_names
        .iter()
        .map(|tool| format!("mcp__{}__{}", server_name, tool))
        .collect()
}

/// Serve every tool of `toolkit` from an in-process MCP server
async fn mcp_server_for(toolkit: Arc<dyn Toolkit>) -> Result<(SdkMcpServer, Vec<String>)> {
    let tools = toolkit
        .get_tools_in_agents()
        .await
        .with_context(|| format!("Failed to list tools of toolkit '{}'", toolkit.name()))?;

    let mut server = SdkMcpServer::new(toolkit.name()).version("1.0.0");
    let mut tool_names = Vec::with_capacity(tools.len());

    for info in tools {
        let handler_toolkit = Arc::clone(&toolkit);
        let tool_name = info.name.clone();
        server = server.tool(SdkMcpTool::new(
            info.name.as_str(),
            info.description.as_str(),
            info.parameters.clone(),
            move |params| {
                let toolkit = Arc::clone(&handler_toolkit);
                let tool_name = tool_name.clone();
                Box::pin(async move {
                    match toolkit.call_tool(&tool_name, params).await {
                        Ok(output) => Ok(ToolResult::text(output)),
                        Err(e) => Ok(ToolResult::error(format!("{:#}", e))),
                    }
                })
            },
        ));
        tool_names.push(info.name);
    }

    Ok((server, tool_names))
}

fn tool_result_text(content: Option<ContentValue>) -> String {
    match content {
        Some(ContentValue::String(text)) => text,
        Some(ContentValue::Blocks(_)) => "[Structured data returned]".to_string(),
        None => String::new(),
    }
}

/// Client message reduced to what the agent loop acts on
#[derive(Debug, Clone, PartialEq)]
enum Reply {
    Assistant(Vec<Block>),
    Finished {
        is_error: bool,
        subtype: String,
        result: Option<String>,
    },
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Text(String),
    ToolUse { id: String, name: String, input: Value },
    ToolResult { tool_use_id: String, output: String },
}

impl From<Message> for Reply {
    fn from(message: Message) -> Self {
        match message {
            Message::Assistant { message, .. } => Reply::Assistant(
                message
                    .content
                    .into_iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text { text } => Some(Block::Text(text)),
                        ContentBlock::ToolUse { id, name, input } => {
                            Some(Block::ToolUse { id, name, input })
                        }
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } => Some(Block::ToolResult {
                            tool_use_id,
                            output: tool_result_text(content),
                        }),
                        _ => None,
                    })
                    .collect(),
            ),
            Message::Result {
                is_error,
                subtype,
                result,
                ..
            } => Reply::Finished {
                is_error,
                subtype: subtype.to_string(),
                result: result.map(|r| r.to_string()),
            },
            _ => Reply::Ignored,
        }
    }
}

/// What the agent loop does after a reply
#[derive(Debug, Clone, PartialEq)]
enum Flow {
    Continue,
    /// A stop tool was called; run it and end the loop
    StopAt { tool: String, input: Value },
    Done,
}

/// Turns client replies into agent events and tracks the run's final output
#[derive(Debug)]
struct TurnMapper {
    behavior: ToolUseBehavior,
    response_text: String,
    pending_tools: HashMap<String, String>,
    final_output: Option<String>,
}

impl TurnMapper {
    fn new(behavior: ToolUseBehavior) -> Self {
        Self {
            behavior,
            response_text: String::new(),
            pending_tools: HashMap::new(),
            final_output: None,
        }
    }

    fn apply(&mut self, reply: Reply) -> Result<(Vec<AgentEvent>, Flow)> {
        match reply {
            Reply::Assistant(blocks) => {
                let mut events = Vec::with_capacity(blocks.len());
                let mut stop = None;
                for block in blocks {
                    match block {
                        Block::Text(text) => {
                            self.response_text.push_str(&text);
                            events.push(AgentEvent::Message { text });
                        }
                        Block::ToolUse { id, name, input } => {
                            events.push(AgentEvent::ToolCalled {
                                tool: name.clone(),
                                input: input.clone(),
                            });
                            if stop.is_none() && self.behavior.stops_at(&name) {
                                stop = Some(Flow::StopAt {
                                    tool: name.clone(),
                                    input,
                                });
                            }
                            self.pending_tools.insert(id, name);
                        }
                        Block::ToolResult {
                            tool_use_id,
                            output,
                        } => {
                            let tool = self
                                .pending_tools
                                .remove(&tool_use_id)
                                .unwrap_or(tool_use_id);
                            events.push(AgentEvent::ToolOutput { tool, output });
                        }
                    }
                }
                Ok((events, stop.unwrap_or(Flow::Continue)))
            }
            Reply::Finished {
                is_error: true,
                subtype,
                result,
            } => Err(match result {
                Some(result) => anyhow!("Claude run failed ({}): {}", subtype, result),
                None => anyhow!("Claude run failed ({})", subtype),
            }),
            Reply::Finished { .. } => {
                let text = std::mem::take(&mut self.response_text);
                self.final_output.get_or_insert(text);
                Ok((Vec::new(), Flow::Done))
            }
            Reply::Ignored => Ok((Vec::new(), Flow::Continue)),
        }
    }

    /// Record the output of the stop tool as the run's final output
    fn stop_with(&mut self, output: String) {
        self.final_output = Some(output);
    }

    fn into_final_output(self) -> Result<String> {
        self.final_output
            .ok_or_else(|| anyhow!("Claude stream ended without a result"))
    }
}

#[async_trait]
impl Agent for ClaudeAgent {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn enter(&self) -> Result<()> {
        let options = self.options().await?;
        let client = ClaudeSDKClient::new(options, self.cli_path.clone())
            .await
            .map_err(|e| anyhow!("Failed to start Claude client: {}", e))?;
        *self.client.lock().await = Some(client);
        tracing::debug!(agent = %self.spec.name, "claude client connected");
        Ok(())
    }

    async fn exit(&self) -> Result<()> {
        if let Some(mut client) = self.client.lock().await.take() {
            client
                .close()
                .await
                .map_err(|e| anyhow!("Failed to close Claude client: {}", e))?;
            tracing::debug!(agent = %self.spec.name, "claude client closed");
        }
        Ok(())
    }

    fn run_streamed(&self, input: &str) -> AgentEventStream {
        let name = self.spec.name.clone();
        let toolkit = self.spec.toolkit.clone();
        let behavior = self.spec.tool_use_behavior.clone();
        let client = Arc::clone(&self.client);
        let input = input.to_string();

        event_stream(try_stream! {
            let mut guard = client.lock().await;
            let client = guard
                .as_mut()
                .ok_or_else(|| anyhow!("Agent '{}' was run before enter()", name))?;

            client
                .send_message(input)
                .await
                .map_err(|e| anyhow!("Failed to send message to Claude: {}", e))?;

            let mut mapper = TurnMapper::new(behavior);

            while let Some(message) = client.next_message().await {
                let message = message.map_err(|e| anyhow!("Claude error: {}", e))?;
                let (events, flow) = mapper.apply(Reply::from(message))?;
                for event in events {
                    yield event;
                }

                match flow {
                    Flow::Continue => {}
                    Flow::Done => break,
                    Flow::StopAt { tool, input } => {
                        let bare = tool.rsplit("__").next().unwrap_or(&tool).to_string();
                        let toolkit = toolkit.as_ref().ok_or_else(|| {
                            anyhow!("Agent '{}' stopped at '{}' without a toolkit", name, tool)
                        })?;
                        let output = toolkit.call_tool(&bare, input).await?;
                        yield AgentEvent::ToolOutput {
                            tool,
                            output: output.clone(),
                        };
                        mapper.stop_with(output);
                        if let Err(e) = client.interrupt().await {
                            tracing::debug!(agent = %name, error = %e, "interrupt after stop tool failed");
                        }
                        break;
                    }
                }
            }

            let final_output = mapper.into_final_output()?;
            yield AgentEvent::Completed { final_output };
        })
    }
}

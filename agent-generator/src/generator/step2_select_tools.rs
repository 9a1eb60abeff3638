//! Step 2: Select tools from the available toolkits
//!
//! Every tool of every requested group is listed for the tool-selection agent,
//! which answers with a JSON list of tool names. The names are then filed under
//! the group that offers them.

use agent_generator_sdk::Agent;
use std::collections::HashMap;
use std::sync::Arc;

use super::relay::{run_scoped, EventSink};
use crate::error::{GeneratorError, Result};
use crate::prompts::render_tool_selection;
use crate::recorder::SelectedTools;
use crate::toolkits::ToolCatalogue;

/// Tool catalogue rendered for the selection prompt, plus the tool → group index
#[derive(Debug, Default)]
pub struct AvailableTools {
    pub descriptions: Vec<String>,
    pub tool_to_toolkit: HashMap<String, String>,
}

/// Describe every tool of the requested groups
///
/// A tool offered by several groups is filed under the last one.
pub async fn collect_available_tools(
    catalogue: &ToolCatalogue,
    toolkit_names: &[String],
) -> Result<AvailableTools> {
    let toolkits = catalogue.get_toolkits_map(toolkit_names)?;
    let mut available = AvailableTools::default();

    for (toolkit_name, toolkit) in &toolkits {
        let tools = toolkit
            .get_tools_in_agents()
            .await
            .map_err(|source| GeneratorError::Toolkit {
                toolkit: toolkit_name.clone(),
                source,
            })?;
        for tool in tools {
            available
                .descriptions
                .push(format!("- {}: {}", tool.name, tool.description));
            available.tool_to_toolkit.insert(tool.name, toolkit_name.clone());
        }
    }

    Ok(available)
}

/// Strip markdown code fences around agent output
fn strip_code_fences(text: &str) -> &str {
    let body = if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        rest.rfind("```").map_or(rest, |end| &rest[..end])
    } else if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        rest.rfind("```").map_or(rest, |end| &rest[..end])
    } else {
        text
    };
    body.trim()
}

/// Parse the selection agent's output as a JSON list of tool names
pub fn parse_selected_tool_names(output: &str) -> Result<Vec<String>> {
    serde_json::from_str(strip_code_fences(output)).map_err(|source| {
        GeneratorError::MalformedSelection {
            output: output.to_string(),
            source,
        }
    })
}

/// File each selected tool under its owning group, keeping selection order
pub fn group_by_toolkit(
    tool_names: &[String],
    tool_to_toolkit: &HashMap<String, String>,
) -> Result<SelectedTools> {
    let mut selected = SelectedTools::new();
    for tool_name in tool_names {
        let toolkit = tool_to_toolkit
            .get(tool_name)
            .ok_or_else(|| GeneratorError::UnknownTool(tool_name.clone()))?;
        selected
            .entry(toolkit.clone())
            .or_default()
            .push(tool_name.clone());
    }
    Ok(selected)
}

pub async fn step2_select_tools(
    catalogue: &ToolCatalogue,
    toolkit_names: &[String],
    requirements: &str,
    agent: &Arc<dyn Agent>,
    sink: &EventSink,
) -> Result<SelectedTools> {
    let available = collect_available_tools(catalogue, toolkit_names).await?;
    tracing::debug!(tools = available.descriptions.len(), "tools offered for selection");

    let query = render_tool_selection(&available.descriptions.join("\n"), requirements);
    let output = run_scoped(agent, 2, &query, sink).await?;

    let tool_names = parse_selected_tool_names(&output)?;
    group_by_toolkit(&tool_names, &available.tool_to_toolkit)
}

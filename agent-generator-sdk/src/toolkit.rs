//! Toolkit capability: a named bundle of related tools

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description of a single tool as presented to an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool arguments
    #[serde(default = "empty_object_schema")]
    pub parameters: Value,
}

fn empty_object_schema() -> Value {
    serde_json::json!({"type": "object", "properties": {}})
}

impl ToolInfo {
    /// Tool without arguments
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: empty_object_schema(),
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }
}

/// A named bundle of tools
#[async_trait]
pub trait Toolkit: Send + Sync {
    /// Toolkit (tool group) name
    fn name(&self) -> &str;

    /// Tools this toolkit exposes to agents
    async fn get_tools_in_agents(&self) -> Result<Vec<ToolInfo>>;

    /// Invoke one of the tools. Catalogue-only toolkits describe tools they cannot run.
    async fn call_tool(&self, name: &str, input: Value) -> Result<String> {
        let _ = input;
        anyhow::bail!("Tool '{}' of toolkit '{}' is not executable", name, self.name())
    }
}

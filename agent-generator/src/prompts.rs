//! Instruction templates for the four generator agents
//!
//! Built-in defaults ship with the crate. A prompts directory can override any
//! of them with `<dir>/<template>.md`.

use std::path::Path;

use crate::error::{GeneratorError, Result};

pub const REQUIREMENTS_CLARIFICATION: &str = "requirements_clarification";
pub const TOOLS_SELECTION: &str = "tools_selection";
pub const INSTRUCTIONS_GENERATION: &str = "instructions_generation";
pub const NAME_GENERATION: &str = "name_generation";

/// Question put to the user before clarification starts
pub const DEFAULT_QUESTION: &str = "Please enter your requirements:";

const DEFAULT_REQUIREMENTS_CLARIFICATION: &str = r#"You are a requirements analyst helping a user specify an AI agent they want to build.

The user has described what they need. Your goal is to turn that description into a clear, complete requirements statement.

Key instructions:
- If the description is ambiguous or misses important details (inputs, outputs, data sources, constraints), use the `ask_user` tool to ask ONE focused question at a time
- Ask at most three questions; do not ask about things the user already told you
- When the requirements are clear, call the `final_answer` tool with the full requirements statement
- The requirements statement should describe the agent's purpose, the tasks it performs, the information sources it needs and the expected output format
- Write the statement in the user's language"#;

const DEFAULT_TOOLS_SELECTION: &str = r#"You are a tool selection specialist.

You receive a list of available tools inside <available_tools> and the requirements of an AI agent inside <requirement>.

Key instructions:
- Select the tools the agent needs to fulfil the requirements, and only those
- Use tool names exactly as listed; never invent tools
- Prefer a small, sufficient set of tools over a broad one

Output only a JSON list of tool names, for example ["web_search", "pdf_reader"], with no markdown code blocks or extra commentary."#;

const DEFAULT_INSTRUCTIONS_GENERATION: &str = r#"You are an expert prompt engineer writing operating instructions for an AI agent.

Given the agent requirements, write the instructions the agent will follow.

Key instructions:
- Address the agent directly ("You are ...")
- Describe its role, the steps it should follow and how it should use its tools
- State the expected output format and quality bar
- Keep the instructions concise and actionable

Output only the instructions text, with no markdown code blocks or extra commentary."#;

const DEFAULT_NAME_GENERATION: &str = r#"You name AI agents.

Given the agent requirements, generate a short identifier for the agent.

Key instructions:
- Use lowercase words joined by underscores, e.g. web_summarizer
- At most 50 characters, no spaces

Output only the name."#;

/// The instruction texts used to build the generator agents
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplates {
    pub requirements_clarification: String,
    pub tools_selection: String,
    pub instructions_generation: String,
    pub name_generation: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            requirements_clarification: DEFAULT_REQUIREMENTS_CLARIFICATION.to_string(),
            tools_selection: DEFAULT_TOOLS_SELECTION.to_string(),
            instructions_generation: DEFAULT_INSTRUCTIONS_GENERATION.to_string(),
            name_generation: DEFAULT_NAME_GENERATION.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Defaults, with any `<dir>/<template>.md` file taking precedence
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut templates = Self::default();
        let Some(dir) = dir else {
            return Ok(templates);
        };

        if !dir.is_dir() {
            return Err(GeneratorError::Template {
                name: dir.display().to_string(),
                message: "prompts directory does not exist".to_string(),
            });
        }

        for (name, slot) in [
            (REQUIREMENTS_CLARIFICATION, &mut templates.requirements_clarification),
            (TOOLS_SELECTION, &mut templates.tools_selection),
            (INSTRUCTIONS_GENERATION, &mut templates.instructions_generation),
            (NAME_GENERATION, &mut templates.name_generation),
        ] {
            if let Some(text) = load_template_file(dir, name)? {
                tracing::debug!(template = name, "using prompt override");
                *slot = text;
            }
        }

        Ok(templates)
    }
}

/// Query for the tool-selection agent: the tool catalogue followed by the requirements
pub fn render_tool_selection(available_tools: &str, requirement: &str) -> String {
    format!(
        "<available_tools>\n{available_tools}\n</available_tools>\n<requirement>\n{requirement}\n</requirement>"
    )
}

fn load_template_file(dir: &Path, name: &str) -> Result<Option<String>> {
    let path = dir.join(format!("{}.md", name));
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path).map_err(|e| GeneratorError::Template {
        name: name.to_string(),
        message: format!("{}: {}", path.display(), e),
    })?;
    if text.trim().is_empty() {
        return Err(GeneratorError::Template {
            name: name.to_string(),
            message: format!("{} is empty", path.display()),
        });
    }
    Ok(Some(text))
}

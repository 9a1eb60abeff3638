//! Renders a finished [`GeneratorState`] as an agent configuration document

use serde_json::json;
use std::path::{Component, Path, PathBuf};

use crate::error::{GeneratorError, Result};
use crate::recorder::GeneratorState;

/// Prefix every line of `lines` with `indent` spaces
fn indent_lines<'a>(lines: impl IntoIterator<Item = &'a str>, indent: usize) -> String {
    let pad = " ".repeat(indent);
    lines
        .into_iter()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the configuration document for a completed run
pub fn render_config(state: &GeneratorState) -> Result<String> {
    let name = state.name()?;
    let instructions = state.instructions()?;
    let selected_tools = state.selected_tools()?;

    let mut includes = Vec::with_capacity(selected_tools.len());
    let mut configs = Vec::with_capacity(selected_tools.len());
    for (group, tools) in selected_tools {
        includes.push(format!("- /tools/{group}@toolkits.{group}"));
        configs.push(format!("{}: {}", group, json!({ "activated_tools": tools })));
    }

    Ok(format!(
        "
# @package _global_
defaults:
  - /model/base@model
{includes}
  - _self_

toolkits:
{configs}

agent:
  name: {name}
  instructions: |
{instructions}
",
        includes = indent_lines(includes.iter().map(String::as_str), 2),
        configs = indent_lines(configs.iter().map(String::as_str), 2),
        name = name,
        instructions = indent_lines(instructions.split('\n'), 4),
    ))
}

/// True when `file_name` names an entry directly inside a directory
fn is_plain_file_name(file_name: &str) -> bool {
    let mut components = Path::new(file_name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !file_name.contains(char::is_whitespace)
}

/// Write the document to `<output_dir>/<name>.yaml`, creating the directory if needed
pub async fn format_config(state: &GeneratorState, output_dir: &Path) -> Result<PathBuf> {
    let document = render_config(state)?;
    let file_name = format!("{}.yaml", state.name()?);
    if !is_plain_file_name(&file_name) {
        return Err(GeneratorError::InvalidName(state.name()?.to_string()));
    }
    let path = output_dir.join(file_name);

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| GeneratorError::io(output_dir, e))?;
    tokio::fs::write(&path, document)
        .await
        .map_err(|e| GeneratorError::io(&path, e))?;

    tracing::info!(path = %path.display(), "agent config written");
    Ok(path)
}

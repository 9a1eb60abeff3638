//! Step 4: Generate the agent name
//!
//! The name doubles as the config file name: at most 50 characters, no spaces,
//! and nothing that could step outside the output directory.

use agent_generator_sdk::{log_warning, Agent};
use std::sync::Arc;

use super::relay::{run_scoped, EventSink};
use crate::error::{GeneratorError, Result};

pub const MAX_NAME_CHARS: usize = 50;

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Trim `raw` and enforce the name constraints
///
/// The name is cut to [`MAX_NAME_CHARS`] characters. Spaces and any other
/// character outside letters, digits, `_`, `-` and `.` become `_`, and leading
/// dots are dropped. Returns the usable name and whether it had to be changed
/// beyond trimming.
pub fn sanitize_name(raw: &str) -> Result<(String, bool)> {
    let trimmed = raw.trim();
    let replaced: String = trimmed
        .chars()
        .take(MAX_NAME_CHARS)
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect();
    let name = replaced.trim_start_matches('.');
    if name.is_empty() {
        return Err(GeneratorError::EmptyName);
    }

    Ok((name.to_string(), name != trimmed))
}

pub async fn step4_generate_name(
    requirements: &str,
    agent: &Arc<dyn Agent>,
    sink: &EventSink,
) -> Result<String> {
    let raw = run_scoped(agent, 4, requirements, sink).await?;
    let (name, sanitized) = sanitize_name(&raw)?;

    if sanitized {
        tracing::warn!(raw = %raw.trim(), sanitized = %name, "Generated name is too long or contains spaces or unsafe characters");
        log_warning!("Generated name is too long or contains spaces or unsafe characters: {}", raw.trim());
    }

    Ok(name)
}

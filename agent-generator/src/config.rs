//! Generator configuration

use std::path::PathBuf;

use crate::cli::{Args, ModeArg};
use crate::prompts::DEFAULT_QUESTION;
use crate::toolkits::DEFAULT_TOOLKITS;

/// How a generator instance reports progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// `run()`: progress printed to the console as it happens
    #[default]
    Local,
    /// `run_streamed()`: progress queued on a [`crate::TaskRecorder`]
    Streamed,
}

/// Generator configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Directory the generated config is written to
    pub output_dir: PathBuf,

    /// Optional directory of prompt overrides
    pub prompts_dir: Option<PathBuf>,

    /// Tool groups offered in step 2, in listing order
    pub toolkit_names: Vec<String>,

    /// Optional YAML file extending the built-in tool catalogue
    pub catalogue_file: Option<PathBuf>,

    /// Question asked before clarification
    pub initial_question: String,

    /// Mode used by [`crate::SimpleAgentGenerator::generate`]
    pub mode: ExecutionMode,

    /// Also emit structured events on stderr when printing progress
    pub json_events: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("configs/agents/generated"),
            prompts_dir: None,
            toolkit_names: DEFAULT_TOOLKITS.iter().map(|s| s.to_string()).collect(),
            catalogue_file: None,
            initial_question: DEFAULT_QUESTION.to_string(),
            mode: ExecutionMode::Local,
            json_events: false,
        }
    }
}

impl From<Args> for GeneratorConfig {
    fn from(args: Args) -> Self {
        let mode = match args.mode {
            ModeArg::Local => ExecutionMode::Local,
            ModeArg::Streamed => ExecutionMode::Streamed,
        };

        GeneratorConfig {
            output_dir: args.output_dir,
            prompts_dir: args.prompts_dir,
            toolkit_names: args
                .toolkits
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            catalogue_file: args.catalogue,
            initial_question: args.question,
            mode,
            json_events: args.json_events,
        }
    }
}

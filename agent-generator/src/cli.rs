//! CLI argument definitions for the agent generator

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How the pipeline is driven
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Run in the foreground and print progress as it happens
    #[default]
    Local,
    /// Run as a background task and drain its event queue
    Streamed,
}

/// Interview a user and generate an agent configuration document
///
/// Four agents run one after another:
///
/// - Step 1: Clarify requirements with the user
/// - Step 2: Select tools from the available toolkits
/// - Step 3: Draft operating instructions
/// - Step 4: Generate the agent name
///
/// The result is written to `<output-dir>/<name>.yaml`.
#[derive(Parser, Debug, Clone)]
#[command(name = "agent-generator")]
#[command(about = "Interview a user and generate an agent configuration document")]
#[command(version)]
pub struct Args {
    /// Directory the generated config is written to
    #[arg(long, value_name = "DIR", default_value = "configs/agents/generated")]
    pub output_dir: PathBuf,

    /// Directory with prompt overrides (`<template>.md`)
    #[arg(long, value_name = "DIR")]
    pub prompts_dir: Option<PathBuf>,

    /// Tool groups offered to the tool-selection agent
    #[arg(
        long,
        value_name = "NAMES",
        value_delimiter = ',',
        default_value = "search,document,image,audio,bash,tabular"
    )]
    pub toolkits: Vec<String>,

    /// YAML file adding or replacing tool groups
    ///
    /// Format: `toolkits: { <group>: [ {name, description}, ... ] }`
    #[arg(long, value_name = "PATH")]
    pub catalogue: Option<PathBuf>,

    /// Opening question put to the user
    #[arg(long, value_name = "TEXT", default_value = crate::prompts::DEFAULT_QUESTION)]
    pub question: String,

    #[arg(long, value_enum, default_value_t = ModeArg::Local)]
    pub mode: ModeArg,

    /// Replay scripted agent turns from a YAML file instead of calling Claude
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Also emit structured progress events on stderr (local mode)
    #[arg(long)]
    pub json_events: bool,
}

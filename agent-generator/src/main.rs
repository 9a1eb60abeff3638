use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use agent_generator::claude::ClaudeAgentFactory;
use agent_generator::cli::Args;
use agent_generator::scripted::ScriptedAgentFactory;
use agent_generator::{GeneratorConfig, SimpleAgentGenerator};
use agent_generator_sdk::AgentFactory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let factory: Arc<dyn AgentFactory> = match &args.script {
        Some(path) => Arc::new(
            ScriptedAgentFactory::from_file(path).context("Failed to load agent script")?,
        ),
        None => Arc::new(ClaudeAgentFactory::new()),
    };

    let config = GeneratorConfig::from(args);
    let generator = Arc::new(
        SimpleAgentGenerator::new(config, factory).context("Failed to set up the generator")?,
    );
    generator.generate().await.context("Agent generation failed")?;

    Ok(())
}

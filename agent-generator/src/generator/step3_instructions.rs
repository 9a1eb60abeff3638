//! Step 3: Draft operating instructions for the generated agent

use agent_generator_sdk::Agent;
use std::sync::Arc;

use super::relay::{run_scoped, EventSink};
use crate::error::Result;

/// The agent's output is stored verbatim
pub async fn step3_generate_instructions(
    requirements: &str,
    agent: &Arc<dyn Agent>,
    sink: &EventSink,
) -> Result<String> {
    run_scoped(agent, 3, requirements, sink).await
}

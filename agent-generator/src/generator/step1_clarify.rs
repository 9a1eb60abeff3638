//! Step 1: Clarify the user's requirements
//!
//! The user answers an opening question, then the clarification agent may ask
//! follow-ups through `ask_user` until it calls `final_answer`.

use agent_generator_sdk::Agent;
use std::sync::Arc;

use super::relay::{run_scoped, EventSink};
use crate::error::{GeneratorError, Result};
use crate::toolkits::UserInteractionToolkit;

pub async fn step1_clarify_requirements(
    interaction: &UserInteractionToolkit,
    question: &str,
    agent: &Arc<dyn Agent>,
    sink: &EventSink,
) -> Result<String> {
    let user_input = interaction
        .ask_user(question)
        .await
        .map_err(|e| GeneratorError::agent("user_interaction", e))?;
    tracing::debug!(chars = user_input.len(), "initial requirements received");

    run_scoped(agent, 1, &user_input, sink).await
}

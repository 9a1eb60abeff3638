//! Common test utilities for generator tests

use agent_generator::scripted::ScriptedAgentFactory;
use agent_generator::toolkits::{AskFunction, UserInteractionToolkit};
use agent_generator::{GeneratorConfig, SimpleAgentGenerator};
use futures::future::BoxFuture;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub const REQUIREMENTS: &str = "I need an agent that can search the web and summarize PDFs";

pub const INSTRUCTIONS: &str =
    "You are a research assistant.\nSearch the web, then summarize the PDFs you find.";

pub const LONG_NAME: &str = "a very long name with spaces that exceeds fifty characters total";

/// Script for the four generator agents; the clarification agent asks one
/// follow-up question and settles on [`REQUIREMENTS`]
pub fn script(selection_reply: &str, name_reply: &str) -> String {
    format!(
        r#"
agents:
  clarification_agent:
    tool_calls:
      - tool: ask_user
        args:
          question: "Which kind of documents should it summarize?"
      - tool: final_answer
        args:
          answer: "{REQUIREMENTS}"
  tool_selection_agent:
    reply: '{selection_reply}'
  instructions_generation_agent:
    reply: "You are a research assistant.\nSearch the web, then summarize the PDFs you find."
  name_generation_agent:
    reply: "{name_reply}"
"#
    )
}

pub fn round_trip_script() -> String {
    script(r#"["web_search", "pdf_reader"]"#, "web_pdf_summarizer")
}

/// Ask function answering every question with `answer`
pub fn answering(answer: &'static str) -> AskFunction {
    Arc::new(move |_question: String| -> BoxFuture<'static, anyhow::Result<String>> {
        Box::pin(async move { Ok(answer.to_string()) })
    })
}

/// Ask function recording every question it is asked
pub fn recording(questions: Arc<Mutex<Vec<String>>>) -> AskFunction {
    Arc::new(move |question: String| -> BoxFuture<'static, anyhow::Result<String>> {
        let questions = Arc::clone(&questions);
        Box::pin(async move {
            questions.lock().unwrap().push(question);
            Ok("PDF reports".to_string())
        })
    })
}

/// Ask function that waits for one permit of `gate` per question
pub fn gated(gate: Arc<Semaphore>) -> AskFunction {
    Arc::new(move |_question: String| -> BoxFuture<'static, anyhow::Result<String>> {
        let gate = Arc::clone(&gate);
        Box::pin(async move {
            gate.acquire().await?.forget();
            Ok("PDF reports".to_string())
        })
    })
}

pub fn config(output_dir: &Path) -> GeneratorConfig {
    GeneratorConfig {
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    }
}

/// Generator running `script`, answering questions with `ask`
pub fn generator_with(
    script: &str,
    config: GeneratorConfig,
    ask: AskFunction,
) -> (Arc<SimpleAgentGenerator>, Arc<ScriptedAgentFactory>) {
    let factory = Arc::new(ScriptedAgentFactory::load(script).unwrap());
    let generator = SimpleAgentGenerator::new(config, factory.clone())
        .unwrap()
        .with_interaction(Arc::new(UserInteractionToolkit::with_ask_function(ask)));
    (Arc::new(generator), factory)
}

pub fn generator(script: &str, output_dir: &Path) -> (Arc<SimpleAgentGenerator>, Arc<ScriptedAgentFactory>) {
    generator_with(script, config(output_dir), answering("PDF reports"))
}

/// Names of the `.yaml` files in `dir`; empty if `dir` does not exist
pub fn yaml_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".yaml"))
        .collect();
    names.sort();
    names
}

//! Interactive toolkit: lets an agent ask the user questions and hand back a final answer

use agent_generator_sdk::{async_trait, ToolInfo, Toolkit};
use anyhow::{anyhow, Context, Result};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::sync::{Arc, RwLock};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// Tool that asks the user a question
pub const ASK_USER: &str = "ask_user";
/// Tool that ends the clarification loop with an answer
pub const FINAL_ANSWER: &str = "final_answer";

/// Asks the user a question and resolves to the answer
pub type AskFunction = Arc<dyn Fn(String) -> BoxFuture<'static, Result<String>> + Send + Sync>;

/// Prompt on stdout and read one line from stdin
pub fn console_ask_function() -> AskFunction {
    line_reader_ask_function(BufReader::new(tokio::io::stdin()))
}

/// Prompt on stdout and read answers line by line from `reader`
///
/// One reader serves every question, so answers piped in ahead of time are
/// handed out in order.
pub fn line_reader_ask_function<R>(reader: R) -> AskFunction
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let reader = Arc::new(Mutex::new(reader));
    Arc::new(move |question: String| -> BoxFuture<'static, Result<String>> {
        let reader = Arc::clone(&reader);
        Box::pin(async move {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(format!("{} ", question).as_bytes())
                .await
                .context("Failed to write question to stdout")?;
            stdout.flush().await.context("Failed to flush stdout")?;

            let mut line = String::new();
            let read = reader
                .lock()
                .await
                .read_line(&mut line)
                .await
                .context("Failed to read answer from stdin")?;
            if read == 0 {
                anyhow::bail!("stdin closed before an answer was given");
            }
            Ok(line.trim_end_matches(['\r', '\n']).to_string())
        })
    })
}

/// Toolkit exposing `ask_user` and `final_answer`
pub struct UserInteractionToolkit {
    ask_function: RwLock<AskFunction>,
}

impl UserInteractionToolkit {
    /// Toolkit asking on the console
    pub fn new() -> Self {
        Self::with_ask_function(console_ask_function())
    }

    pub fn with_ask_function(ask_function: AskFunction) -> Self {
        Self {
            ask_function: RwLock::new(ask_function),
        }
    }

    /// Replace how questions reach the user, e.g. to route them through a UI
    pub fn set_ask_function(&self, ask_function: AskFunction) {
        *self
            .ask_function
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = ask_function;
    }

    /// Ask the user a question
    pub async fn ask_user(&self, question: &str) -> Result<String> {
        let ask = self
            .ask_function
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        ask(question.to_string()).await
    }

    /// Provide a final answer; strings come back verbatim, other values as JSON
    pub fn final_answer(answer: &Value) -> String {
        match answer {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl Default for UserInteractionToolkit {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Toolkit for UserInteractionToolkit {
    fn name(&self) -> &str {
        "user_interaction"
    }

    async fn get_tools_in_agents(&self) -> Result<Vec<ToolInfo>> {
        Ok(vec![
            ToolInfo::new(ASK_USER, "Asks for user's input on a specific question").with_parameters(json!({
                "type": "object",
                "properties": {
                    "question": {"type": "string", "description": "The question to ask."}
                },
                "required": ["question"]
            })),
            ToolInfo::new(FINAL_ANSWER, "Provides a final answer to the given problem.").with_parameters(json!({
                "type": "object",
                "properties": {
                    "answer": {"description": "The final answer."}
                },
                "required": ["answer"]
            })),
        ])
    }

    async fn call_tool(&self, name: &str, input: Value) -> Result<String> {
        match name {
            ASK_USER => {
                let question = input
                    .get("question")
                    .and_then(Value::as_str)
                    .ok_or_else(|| anyhow!("ask_user requires a 'question' string"))?;
                self.ask_user(question).await
            }
            FINAL_ANSWER => {
                let answer = input
                    .get("answer")
                    .ok_or_else(|| anyhow!("final_answer requires an 'answer'"))?;
                Ok(Self::final_answer(answer))
            }
            other => anyhow::bail!("Unknown user interaction tool '{}'", other),
        }
    }
}

//! Pipeline driver
//!
//! [`SimpleAgentGenerator`] runs the four steps strictly in order:
//! 1. Clarify requirements with the user
//! 2. Select tools from the available toolkits
//! 3. Draft operating instructions
//! 4. Generate the agent name
//!
//! and then writes the agent config. [`SimpleAgentGenerator::run`] does this in
//! the foreground; [`SimpleAgentGenerator::run_streamed`] schedules it as a
//! background task and hands back a [`TaskRecorder`].

pub mod relay;
mod step1_clarify;
mod step2_select_tools;
mod step3_instructions;
mod step4_name;

use agent_generator_sdk::{Agent, AgentFactory, AgentSpec, GeneratorEvent, Toolkit};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, OnceCell};
use tracing::Instrument;

use crate::config::{ExecutionMode, GeneratorConfig};
use crate::error::{GeneratorError, Result};
use crate::formatter::format_config;
use crate::prompts::PromptTemplates;
use crate::recorder::{snapshot_state, update_state, GeneratorState, SharedState, TaskRecorder};
use crate::toolkits::{user_interaction::FINAL_ANSWER, ToolCatalogue, UserInteractionToolkit};

pub use relay::{print_event, EventSink};
pub use step2_select_tools::{
    collect_available_tools, group_by_toolkit, parse_selected_tool_names, AvailableTools,
};
pub use step4_name::{sanitize_name, MAX_NAME_CHARS};

use step1_clarify::step1_clarify_requirements;
use step2_select_tools::step2_select_tools;
use step3_instructions::step3_generate_instructions;
use step4_name::step4_generate_name;

pub const CLARIFICATION_AGENT: &str = "clarification_agent";
pub const TOOL_SELECTION_AGENT: &str = "tool_selection_agent";
pub const INSTRUCTIONS_GENERATION_AGENT: &str = "instructions_generation_agent";
pub const NAME_GENERATION_AGENT: &str = "name_generation_agent";

const STEP_NAMES: [&str; 4] = [
    "Clarify Requirements",
    "Select Tools",
    "Generate Instructions",
    "Generate Name",
];

/// The four agents of the pipeline, built once per generator
pub struct GeneratorAgents {
    pub clarification: Arc<dyn Agent>,
    pub tool_selection: Arc<dyn Agent>,
    pub instructions_generation: Arc<dyn Agent>,
    pub name_generation: Arc<dyn Agent>,
}

impl std::fmt::Debug for GeneratorAgents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorAgents")
            .field("clarification", &self.clarification.name())
            .field("tool_selection", &self.tool_selection.name())
            .field("instructions_generation", &self.instructions_generation.name())
            .field("name_generation", &self.name_generation.name())
            .finish()
    }
}

/// Generates an agent config by interviewing the user
pub struct SimpleAgentGenerator {
    config: GeneratorConfig,
    factory: Arc<dyn AgentFactory>,
    catalogue: ToolCatalogue,
    templates: PromptTemplates,
    interaction: Arc<UserInteractionToolkit>,
    agents: OnceCell<Arc<GeneratorAgents>>,
}

impl SimpleAgentGenerator {
    /// Load prompt overrides and the tool catalogue named by `config`
    pub fn new(config: GeneratorConfig, factory: Arc<dyn AgentFactory>) -> Result<Self> {
        let templates = PromptTemplates::load(config.prompts_dir.as_deref())?;
        let catalogue = match &config.catalogue_file {
            Some(path) => ToolCatalogue::load(path)?,
            None => ToolCatalogue::builtin(),
        };

        Ok(Self {
            config,
            factory,
            catalogue,
            templates,
            interaction: Arc::new(UserInteractionToolkit::new()),
            agents: OnceCell::new(),
        })
    }

    pub fn with_catalogue(mut self, catalogue: ToolCatalogue) -> Self {
        self.catalogue = catalogue;
        self
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Use `interaction` for the opening question and the clarification agent
    pub fn with_interaction(mut self, interaction: Arc<UserInteractionToolkit>) -> Self {
        self.interaction = interaction;
        self
    }

    /// The toolkit questions go through; use it to replace the ask function
    pub fn interaction_toolkit(&self) -> &Arc<UserInteractionToolkit> {
        &self.interaction
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn mode(&self) -> ExecutionMode {
        self.config.mode
    }

    /// Create the four agents. Later calls return the same agents.
    pub async fn build(&self) -> Result<Arc<GeneratorAgents>> {
        self.agents
            .get_or_try_init(|| async {
                tracing::debug!("building generator agents");
                let interaction: Arc<dyn Toolkit> = self.interaction.clone();
                let agents = GeneratorAgents {
                    clarification: self.create_agent(
                        AgentSpec::new(
                            CLARIFICATION_AGENT,
                            self.templates.requirements_clarification.clone(),
                        )
                        .with_toolkit(interaction)
                        .stop_at_tools(&[FINAL_ANSWER]),
                    )?,
                    tool_selection: self.create_agent(AgentSpec::new(
                        TOOL_SELECTION_AGENT,
                        self.templates.tools_selection.clone(),
                    ))?,
                    instructions_generation: self.create_agent(AgentSpec::new(
                        INSTRUCTIONS_GENERATION_AGENT,
                        self.templates.instructions_generation.clone(),
                    ))?,
                    name_generation: self.create_agent(AgentSpec::new(
                        NAME_GENERATION_AGENT,
                        self.templates.name_generation.clone(),
                    ))?,
                };
                Ok::<_, GeneratorError>(Arc::new(agents))
            })
            .await
            .map(Arc::clone)
    }

    fn create_agent(&self, spec: AgentSpec) -> Result<Arc<dyn Agent>> {
        let name = spec.name.clone();
        self.factory
            .create(spec)
            .map_err(|e| GeneratorError::agent(&name, e))
    }

    /// Run the pipeline in the configured [`ExecutionMode`]
    ///
    /// `Local` runs in the foreground. `Streamed` runs in the background while
    /// this call drains the event queue to the console, then waits for the result.
    pub async fn generate(self: &Arc<Self>) -> Result<PathBuf> {
        match self.config.mode {
            ExecutionMode::Local => self.run().await,
            ExecutionMode::Streamed => {
                let recorder = self.run_streamed();
                let console = EventSink::Console {
                    json_events: self.config.json_events,
                };
                while let Some(event) = recorder.next_event().await {
                    console.send(event);
                }
                recorder.wait().await
            }
        }
    }

    /// Run the whole pipeline in the foreground and return the written config path
    pub async fn run(&self) -> Result<PathBuf> {
        let state = RwLock::new(GeneratorState::default());
        let sink = EventSink::Console {
            json_events: self.config.json_events,
        };

        match self.execute(&state, &sink).await {
            Ok(path) => {
                sink.send(GeneratorEvent::PipelineCompleted {
                    path: path.display().to_string(),
                });
                Ok(path)
            }
            Err(e) => {
                sink.send(GeneratorEvent::PipelineFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Schedule the whole pipeline as a background task
    ///
    /// Returns immediately. Progress is observed through the recorder's event
    /// queue and completion flag.
    pub fn run_streamed(self: &Arc<Self>) -> TaskRecorder {
        let state: SharedState = Arc::new(RwLock::new(GeneratorState::default()));
        let complete = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();

        let generator = Arc::clone(self);
        let task_state = Arc::clone(&state);
        let task_complete = Arc::clone(&complete);
        let task = tokio::spawn(
            async move {
                let sink = EventSink::Queue(tx);
                match generator.execute(&task_state, &sink).await {
                    Ok(path) => {
                        task_complete.store(true, Ordering::SeqCst);
                        println!("task_recorder: {:?}", snapshot_state(&task_state));
                        sink.send(GeneratorEvent::PipelineCompleted {
                            path: path.display().to_string(),
                        });
                        Ok(path)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "agent generation failed");
                        sink.send(GeneratorEvent::PipelineFailed {
                            error: e.to_string(),
                        });
                        Err(e)
                    }
                }
            }
            .instrument(tracing::info_span!("agent_generation")),
        );

        TaskRecorder::new(state, rx, complete, task)
    }

    async fn execute(&self, state: &RwLock<GeneratorState>, sink: &EventSink) -> Result<PathBuf> {
        let agents = self.build().await?;

        step_started(sink, 1);
        let requirements = step1_clarify_requirements(
            &self.interaction,
            &self.config.initial_question,
            &agents.clarification,
            sink,
        )
        .await?;
        update_state(state, |s| s.requirements = Some(requirements.clone()));
        step_completed(sink, 1);

        step_started(sink, 2);
        let selected_tools = step2_select_tools(
            &self.catalogue,
            &self.config.toolkit_names,
            &requirements,
            &agents.tool_selection,
            sink,
        )
        .await?;
        update_state(state, |s| s.selected_tools = Some(selected_tools));
        step_completed(sink, 2);

        step_started(sink, 3);
        let instructions =
            step3_generate_instructions(&requirements, &agents.instructions_generation, sink)
                .await?;
        update_state(state, |s| s.instructions = Some(instructions));
        step_completed(sink, 3);

        step_started(sink, 4);
        let name = step4_generate_name(&requirements, &agents.name_generation, sink).await?;
        update_state(state, |s| s.name = Some(name));
        step_completed(sink, 4);

        let path = format_config(&snapshot_state(state), &self.config.output_dir).await?;
        sink.send(GeneratorEvent::ConfigWritten {
            path: path.display().to_string(),
        });
        Ok(path)
    }
}

impl std::fmt::Debug for SimpleAgentGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleAgentGenerator")
            .field("config", &self.config)
            .field("catalogue", &self.catalogue)
            .field("built", &self.agents.initialized())
            .finish()
    }
}

fn step_started(sink: &EventSink, step: usize) {
    let name = STEP_NAMES[step - 1];
    tracing::info!(step, step_name = name, "step started");
    sink.send(GeneratorEvent::StepStarted {
        step,
        name: name.to_string(),
        total_steps: STEP_NAMES.len(),
    });
}

fn step_completed(sink: &EventSink, step: usize) {
    let name = STEP_NAMES[step - 1];
    tracing::info!(step, step_name = name, "step completed");
    sink.send(GeneratorEvent::StepCompleted {
        step,
        name: name.to_string(),
    });
}

//! Task state accumulated over one generation run
//!
//! [`GeneratorState`] holds the artifacts produced step by step. In background
//! mode the caller gets a [`TaskRecorder`], which shares that state with the
//! running pipeline and exposes its progress events and completion.

use agent_generator_sdk::GeneratorEvent;
use futures::Stream;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{GeneratorError, Result};

/// Selected tools grouped by owning toolkit, in discovery order
pub type SelectedTools = IndexMap<String, Vec<String>>;

/// Artifacts of a generation run. Each field is set once, by its step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorState {
    /// Clarified user requirements (step 1)
    pub requirements: Option<String>,
    /// Tool names grouped by toolkit (step 2)
    pub selected_tools: Option<SelectedTools>,
    /// Operating instructions for the generated agent (step 3)
    pub instructions: Option<String>,
    /// Sanitized agent name (step 4)
    pub name: Option<String>,
}

impl GeneratorState {
    pub fn requirements(&self) -> Result<&str> {
        self.requirements
            .as_deref()
            .ok_or(GeneratorError::MissingStepOutput("requirements"))
    }

    pub fn selected_tools(&self) -> Result<&SelectedTools> {
        self.selected_tools
            .as_ref()
            .ok_or(GeneratorError::MissingStepOutput("selected tools"))
    }

    pub fn instructions(&self) -> Result<&str> {
        self.instructions
            .as_deref()
            .ok_or(GeneratorError::MissingStepOutput("instructions"))
    }

    pub fn name(&self) -> Result<&str> {
        self.name
            .as_deref()
            .ok_or(GeneratorError::MissingStepOutput("agent name"))
    }
}

/// Shared handle on the state of a running pipeline
pub(crate) type SharedState = Arc<RwLock<GeneratorState>>;

pub(crate) fn update_state(state: &RwLock<GeneratorState>, update: impl FnOnce(&mut GeneratorState)) {
    let mut guard = state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    update(&mut guard);
}

pub(crate) fn snapshot_state(state: &RwLock<GeneratorState>) -> GeneratorState {
    state
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Handle on a generation run executing in the background
///
/// Progress events queue up until drained with [`TaskRecorder::next_event`] or
/// [`TaskRecorder::stream_events`]. The event stream ends once the run finishes,
/// fails or is cancelled.
pub struct TaskRecorder {
    state: SharedState,
    events: tokio::sync::Mutex<mpsc::UnboundedReceiver<GeneratorEvent>>,
    complete: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<Result<PathBuf>>>>,
}

impl TaskRecorder {
    pub(crate) fn new(
        state: SharedState,
        events: mpsc::UnboundedReceiver<GeneratorEvent>,
        complete: Arc<AtomicBool>,
        task: JoinHandle<Result<PathBuf>>,
    ) -> Self {
        Self {
            state,
            events: tokio::sync::Mutex::new(events),
            complete,
            task: Mutex::new(Some(task)),
        }
    }

    /// Snapshot of the artifacts produced so far
    pub fn state(&self) -> GeneratorState {
        snapshot_state(&self.state)
    }

    /// True once all four steps and formatting have finished
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::SeqCst)
    }

    /// Next queued event; `None` once the run is over and the queue is drained
    pub async fn next_event(&self) -> Option<GeneratorEvent> {
        self.events.lock().await.recv().await
    }

    /// All events until the run is over
    pub fn stream_events(&self) -> impl Stream<Item = GeneratorEvent> + '_ {
        async_stream::stream! {
            while let Some(event) = self.next_event().await {
                yield event;
            }
        }
    }

    /// Abort the background run. Already queued events stay readable.
    pub fn cancel(&self) {
        let task = self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = task.as_ref() {
            handle.abort();
        }
    }

    /// Wait for the run to finish and return the written config path
    ///
    /// The result can be taken once; later calls report a configuration error.
    pub async fn wait(&self) -> Result<PathBuf> {
        let handle = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or_else(|| GeneratorError::Config("run result was already taken".to_string()))?;

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(GeneratorError::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

impl std::fmt::Debug for TaskRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRecorder")
            .field("state", &self.state())
            .field("complete", &self.is_complete())
            .finish()
    }
}

//! Background runs observed through the task recorder

use agent_generator::{GeneratorError, SelectedTools};
use agent_generator_sdk::GeneratorEvent;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::common::{config, gated, generator, generator_with, round_trip_script, script, REQUIREMENTS};

async fn let_background_run() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_completion_flag_flips_after_formatting() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Arc::new(Semaphore::new(0));
    let (generator, _factory) =
        generator_with(&round_trip_script(), config(dir.path()), gated(Arc::clone(&gate)));

    let recorder = generator.run_streamed();
    let_background_run().await;

    // Blocked on the opening question: nothing recorded yet
    assert!(!recorder.is_complete());
    assert_eq!(recorder.state().requirements, None);
    assert_eq!(recorder.state().selected_tools, None);

    gate.add_permits(2);
    let events: Vec<GeneratorEvent> = recorder.stream_events().collect().await;

    assert!(recorder.is_complete());
    let path = recorder.wait().await.unwrap();
    assert_eq!(path, dir.path().join("web_pdf_summarizer.yaml"));
    assert!(path.exists());

    let state = recorder.state();
    assert_eq!(state.requirements.as_deref(), Some(REQUIREMENTS));
    let mut expected = SelectedTools::new();
    expected.insert("search".to_string(), vec!["web_search".to_string()]);
    expected.insert("document".to_string(), vec!["pdf_reader".to_string()]);
    assert_eq!(state.selected_tools, Some(expected));
    assert_eq!(state.name.as_deref(), Some("web_pdf_summarizer"));

    assert!(matches!(
        events.last(),
        Some(GeneratorEvent::PipelineCompleted { path: done }) if done == &path.display().to_string()
    ));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[tokio::test]
async fn test_events_follow_step_order() {
    let dir = tempfile::tempdir().unwrap();
    let (generator, _factory) = generator(&round_trip_script(), dir.path());

    let recorder = generator.run_streamed();
    let events: Vec<GeneratorEvent> = recorder.stream_events().collect().await;
    recorder.wait().await.unwrap();

    let started: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            GeneratorEvent::StepStarted { step, total_steps, .. } => {
                assert_eq!(*total_steps, 4);
                Some(*step)
            }
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![1, 2, 3, 4]);

    // Agent events of a step sit between that step's start and completion
    let mut current = None;
    for event in &events {
        match event {
            GeneratorEvent::StepStarted { step, .. } => current = Some(*step),
            GeneratorEvent::StepCompleted { step, .. } => {
                assert_eq!(current, Some(*step));
                current = None;
            }
            GeneratorEvent::Agent { step, .. } => assert_eq!(current, Some(*step)),
            _ => assert_eq!(current, None),
        }
    }

    let agents: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            GeneratorEvent::Agent { agent_name, .. } => Some(agent_name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(agents.first(), Some(&"clarification_agent"));
    assert_eq!(agents.last(), Some(&"name_generation_agent"));

    let written = events
        .iter()
        .position(|e| matches!(e, GeneratorEvent::ConfigWritten { .. }))
        .unwrap();
    assert_eq!(written, events.len() - 2);
}

#[tokio::test]
async fn test_failed_run_ends_stream_without_completing() {
    let dir = tempfile::tempdir().unwrap();
    let (generator, _factory) = generator(&script("not json", "never_named"), dir.path());

    let recorder = generator.run_streamed();
    let events: Vec<GeneratorEvent> = recorder.stream_events().collect().await;

    assert!(matches!(events.last(), Some(GeneratorEvent::PipelineFailed { .. })));
    assert!(!events
        .iter()
        .any(|e| matches!(e, GeneratorEvent::StepStarted { step: 3, .. })));
    assert!(!recorder.is_complete());
    assert!(matches!(
        recorder.wait().await,
        Err(GeneratorError::MalformedSelection { .. })
    ));
}

#[tokio::test]
async fn test_cancel_stops_run_and_event_stream() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Arc::new(Semaphore::new(0));
    let (generator, _factory) =
        generator_with(&round_trip_script(), config(dir.path()), gated(gate));

    let recorder = generator.run_streamed();
    let_background_run().await;
    recorder.cancel();

    let events: Vec<GeneratorEvent> = recorder.stream_events().collect().await;
    assert!(events.iter().all(|e| !e.is_terminal()));
    assert!(!recorder.is_complete());
    assert!(matches!(recorder.wait().await, Err(GeneratorError::Cancelled)));
    assert!(recorder.state().requirements.is_none());
}

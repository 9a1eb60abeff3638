//! Foreground pipeline runs driven by scripted agents

use agent_generator::generator::collect_available_tools;
use agent_generator::toolkits::ToolCatalogue;
use agent_generator::{ExecutionMode, GeneratorConfig, GeneratorError};
use std::sync::{Arc, Mutex};
use tracing_test::traced_test;

use super::common::{
    answering, config, generator, generator_with, recording, round_trip_script, script,
    yaml_files, LONG_NAME,
};

const SANITIZE_WARNING: &str = "Generated name is too long or contains spaces";

#[tokio::test]
async fn test_round_trip_writes_grouped_tools() {
    let dir = tempfile::tempdir().unwrap();
    let (generator, _factory) = generator(&round_trip_script(), dir.path());

    let path = generator.run().await.unwrap();
    assert_eq!(path, dir.path().join("web_pdf_summarizer.yaml"));

    let document = std::fs::read_to_string(&path).unwrap();
    let includes: Vec<&str> = document
        .lines()
        .filter(|line| line.starts_with("  - /tools/"))
        .collect();
    assert_eq!(
        includes,
        vec![
            "  - /tools/search@toolkits.search",
            "  - /tools/document@toolkits.document",
        ]
    );

    let value: serde_yaml::Value = serde_yaml::from_str(&document).unwrap();
    assert_eq!(value["agent"]["name"].as_str(), Some("web_pdf_summarizer"));
    assert_eq!(
        value["toolkits"]["search"]["activated_tools"][0].as_str(),
        Some("web_search")
    );
    assert_eq!(
        value["toolkits"]["document"]["activated_tools"][0].as_str(),
        Some("pdf_reader")
    );
}

#[tokio::test]
async fn test_every_selected_tool_is_filed_under_its_owner() {
    let dir = tempfile::tempdir().unwrap();
    let selection = r#"["get_column_info", "web_qa", "audio_transcribe", "web_search"]"#;
    let (generator, _factory) = generator(&script(selection, "mixed_agent"), dir.path());

    let path = generator.run().await.unwrap();
    let value: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

    let available = collect_available_tools(
        &ToolCatalogue::builtin(),
        &GeneratorConfig::default().toolkit_names,
    )
    .await
    .unwrap();

    let toolkits = value["toolkits"].as_mapping().unwrap();
    let groups: Vec<&str> = toolkits.keys().map(|k| k.as_str().unwrap()).collect();
    assert_eq!(groups, vec!["tabular", "search", "audio"]);

    for (group, config) in toolkits {
        let group = group.as_str().unwrap();
        for tool in config["activated_tools"].as_sequence().unwrap() {
            assert_eq!(available.tool_to_toolkit[tool.as_str().unwrap()], group);
        }
    }
    assert_eq!(
        value["toolkits"]["search"]["activated_tools"],
        serde_yaml::from_str::<serde_yaml::Value>(r#"["web_qa", "web_search"]"#).unwrap()
    );
}

#[tokio::test]
async fn test_malformed_selection_writes_no_document() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("generated");
    let (generator, _factory) = generator(
        &script("I would pick web_search and pdf_reader", "never_named"),
        &output_dir,
    );

    let err = generator.run().await.unwrap_err();
    assert!(matches!(err, GeneratorError::MalformedSelection { .. }));
    assert!(yaml_files(&output_dir).is_empty());
}

#[tokio::test]
async fn test_unknown_tool_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let (generator, _factory) = generator(&script(r#"["teleport"]"#, "never_named"), dir.path());

    let err = generator.run().await.unwrap_err();
    assert!(matches!(err, GeneratorError::UnknownTool(ref tool) if tool == "teleport"));
    assert!(yaml_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_build_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (generator, factory) = generator(&round_trip_script(), dir.path());

    let first = generator.build().await.unwrap();
    let second = generator.build().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.clarification, &second.clarification));
    assert_eq!(factory.created_count(), 4);

    generator.run().await.unwrap();
    assert_eq!(factory.created_count(), 4);
}

#[tokio::test]
async fn test_missing_agent_script_fails_build() {
    let dir = tempfile::tempdir().unwrap();
    let (generator, _factory) = generator(
        r#"
agents:
  clarification_agent:
    reply: "{input}"
"#,
        dir.path(),
    );

    let err = generator.build().await.unwrap_err();
    assert!(matches!(err, GeneratorError::Agent { ref agent, .. } if agent == "tool_selection_agent"));
}

#[tokio::test]
#[traced_test]
async fn test_long_name_is_sanitized_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    let (generator, _factory) = generator(
        &script(r#"["web_search"]"#, LONG_NAME),
        dir.path(),
    );

    let path = generator.run().await.unwrap();
    let expected = LONG_NAME[..50].replace(' ', "_");
    assert_eq!(path, dir.path().join(format!("{}.yaml", expected)));
    assert!(logs_contain(SANITIZE_WARNING));
}

#[tokio::test]
#[traced_test]
async fn test_short_name_passes_without_warning() {
    let dir = tempfile::tempdir().unwrap();
    let (generator, _factory) = generator(&script(r#"["web_search"]"#, "shortname"), dir.path());

    let path = generator.run().await.unwrap();
    assert_eq!(path, dir.path().join("shortname.yaml"));
    assert!(!logs_contain(SANITIZE_WARNING));
}

#[tokio::test]
async fn test_opening_question_is_asked_first() {
    let dir = tempfile::tempdir().unwrap();
    let questions = Arc::new(Mutex::new(Vec::new()));
    let mut config = config(dir.path());
    config.initial_question = "What should your agent do?".to_string();
    let (generator, _factory) =
        generator_with(&round_trip_script(), config, recording(Arc::clone(&questions)));

    generator.run().await.unwrap();
    assert_eq!(
        *questions.lock().unwrap(),
        vec![
            "What should your agent do?".to_string(),
            "Which kind of documents should it summarize?".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_custom_catalogue_and_toolkit_names() {
    let dir = tempfile::tempdir().unwrap();
    let catalogue_path = dir.path().join("catalogue.yaml");
    std::fs::write(
        &catalogue_path,
        r#"
toolkits:
  calendar:
    - name: list_events
      description: List upcoming calendar events
"#,
    )
    .unwrap();

    let output_dir = dir.path().join("out");
    let config = GeneratorConfig {
        catalogue_file: Some(catalogue_path),
        toolkit_names: vec!["calendar".to_string(), "search".to_string()],
        ..config(&output_dir)
    };
    let (generator, _factory) = generator_with(
        &script(r#"["list_events", "web_search"]"#, "planner"),
        config,
        answering("meetings"),
    );

    let path = generator.run().await.unwrap();
    let document = std::fs::read_to_string(path).unwrap();
    assert!(document.contains("  - /tools/calendar@toolkits.calendar\n  - /tools/search@toolkits.search\n"));
}

#[tokio::test]
async fn test_unknown_toolkit_name_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig {
        toolkit_names: vec!["search".to_string(), "video".to_string()],
        ..config(dir.path())
    };
    let (generator, _factory) =
        generator_with(&round_trip_script(), config, answering("videos"));

    let err = generator.run().await.unwrap_err();
    assert!(matches!(err, GeneratorError::UnknownToolkit(ref name) if name == "video"));
}

#[tokio::test]
#[traced_test]
async fn test_path_like_name_stays_inside_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("generated");
    let (generator, _factory) = generator(&script(r#"["web_search"]"#, "../escaped"), &output_dir);

    let path = generator.run().await.unwrap();
    assert_eq!(path, output_dir.join("_escaped.yaml"));
    assert_eq!(yaml_files(&output_dir).len(), 1);
    assert!(!dir.path().join("escaped.yaml").exists());
    assert!(logs_contain(SANITIZE_WARNING));
}

#[tokio::test]
async fn test_multiline_name_renders_one_name_line() {
    let dir = tempfile::tempdir().unwrap();
    let (generator, _factory) =
        generator(&script(r#"["web_search"]"#, r"web\nsummarizer"), dir.path());

    let path = generator.run().await.unwrap();
    assert_eq!(path, dir.path().join("web_summarizer.yaml"));

    let value: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(value["agent"]["name"].as_str(), Some("web_summarizer"));
}

#[tokio::test]
async fn test_generate_follows_configured_mode() {
    for mode in [ExecutionMode::Local, ExecutionMode::Streamed] {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            mode,
            ..config(dir.path())
        };
        let (generator, _factory) =
            generator_with(&round_trip_script(), config, answering("PDF reports"));
        assert_eq!(generator.mode(), mode);

        let path = generator.generate().await.unwrap();
        assert_eq!(path, dir.path().join("web_pdf_summarizer.yaml"));
        assert_eq!(yaml_files(dir.path()), vec!["web_pdf_summarizer.yaml".to_string()]);
    }
}

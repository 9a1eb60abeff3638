//! The agent-generator binary driven by a script, with answers piped on stdin

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn demo_script() -> String {
    format!("{}/demos/web_pdf_summarizer.yaml", env!("CARGO_MANIFEST_DIR"))
}

fn run_binary(output_dir: &Path, mode: &str, stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_agent-generator"))
        .args(["--script", &demo_script(), "--mode", mode, "--output-dir"])
        .arg(output_dir)
        .current_dir(output_dir)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn test_piped_answers_reach_every_question() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_binary(dir.path(), "local", "summarize papers\nPDF reports\n");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(dir.path().join("web_pdf_summarizer.yaml").exists());
}

#[test]
fn test_output_path_printed_once() {
    for mode in ["local", "streamed"] {
        let dir = tempfile::tempdir().unwrap();
        let output = run_binary(dir.path(), mode, "summarize papers\nPDF reports\n");
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = dir.path().join("web_pdf_summarizer.yaml");
        assert_eq!(
            stdout.matches(&path.display().to_string()).count(),
            1,
            "stdout: {}",
            stdout
        );
    }
}

#[test]
fn test_closed_stdin_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_binary(dir.path(), "local", "summarize papers\n");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("stdin closed"));
    assert!(!dir.path().join("web_pdf_summarizer.yaml").exists());
}

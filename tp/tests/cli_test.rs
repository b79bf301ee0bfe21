//! Integration tests for the `tp` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `tp` with HOME and XDG dirs isolated so logs and config stay in a temp dir
fn tp(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tp").expect("tp binary should build");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    tp(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("show-config"))
        .stdout(predicate::str::contains("prompts"));
}

#[test]
fn test_empty_task_is_rejected_before_any_call() {
    let home = TempDir::new().unwrap();
    tp(&home)
        .args(["plan", "   "])
        .env_remove("GROQ_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a valid task"));
}

#[test]
fn test_empty_stdin_is_rejected() {
    let home = TempDir::new().unwrap();
    tp(&home)
        .args(["plan", "-"])
        .write_stdin("\n\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please enter a valid task"));
}

#[test]
fn test_missing_api_key_fails_with_env_name() {
    let home = TempDir::new().unwrap();
    tp(&home)
        .args(["plan", "plan a party"])
        .env_remove("GROQ_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GROQ_API_KEY"));
}

#[test]
fn test_show_config_prints_yaml_defaults() {
    let home = TempDir::new().unwrap();
    tp(&home)
        .arg("show-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("provider: groq"))
        .stdout(predicate::str::contains("max-iterations: 25"));
}

#[test]
fn test_show_config_reads_project_file() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".taskplanner.yml"), "decomposition:\n  max-iterations: 7\n").unwrap();

    tp(&home)
        .arg("show-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max-iterations: 7"));
}

#[test]
fn test_prompts_lists_embedded_templates() {
    let home = TempDir::new().unwrap();
    tp(&home)
        .arg("prompts")
        .assert()
        .success()
        .stdout(predicate::str::contains("decomposer"))
        .stdout(predicate::str::contains("embedded"));
}

#[test]
fn test_prompts_prefers_override() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join(".taskplanner").join("prompts");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("evaluator.pmt"), "Custom evaluator prompt").unwrap();

    tp(&home)
        .args(["prompts", "evaluator"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Custom evaluator prompt"));
}

#[test]
fn test_prompts_unknown_name_fails() {
    let home = TempDir::new().unwrap();
    tp(&home)
        .args(["prompts", "summarizer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("summarizer"));
}

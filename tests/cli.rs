//! Binary-level tests for commands that need no model access.

#![allow(clippy::panic)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const KEY_VARS: [&str; 4] = [
    "PERPLEXITY_API_KEY",
    "OPENAI_API_KEY",
    "RAGENT_API_KEY",
    "RAGENT_API_KEY_FILE",
];

fn ragent() -> Command {
    let mut cmd = Command::cargo_bin("ragent-rs").unwrap_or_else(|e| panic!("binary: {e}"));
    for var in KEY_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

fn docs_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
    std::fs::write(
        dir.path().join("hr_policy.md"),
        "# Leave\nEmployees accrue 25 days of annual leave.",
    )
    .unwrap_or_else(|_| unreachable!());
    std::fs::write(dir.path().join("faq.txt"), "Managers approve leave requests.")
        .unwrap_or_else(|_| unreachable!());
    dir
}

#[test]
fn test_help_lists_commands() {
    ragent()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("query"))
        .stdout(predicate::str::contains("inspect-reply"))
        .stdout(predicate::str::contains("init-prompts"));
}

#[test]
fn test_documents_text_and_json() {
    let dir = docs_dir();

    ragent()
        .args(["documents", "--docs"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 document(s)"))
        .stdout(predicate::str::contains("hr_policy.md"));

    let output = ragent()
        .args(["--format", "json", "documents", "--docs"])
        .arg(dir.path())
        .output()
        .unwrap_or_else(|e| panic!("run: {e}"));
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).unwrap_or_else(|e| panic!("invalid json: {e}"));
    assert_eq!(value["count"], 2);
    assert_eq!(value["documents"][0]["source"], "faq.txt");
    assert_eq!(value["documents"][1]["kind"], "markdown");
}

#[test]
fn test_documents_empty_directory_fails() {
    let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
    ragent()
        .args(["documents", "--docs"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no supported documents"));
}

#[test]
fn test_inspect_reply_from_stdin() {
    ragent()
        .args(["inspect-reply", "--judge", "analysis"])
        .write_stdin("<think>intent?</think>\n```json\n{\"intent\": \"comparison\", \"confidence\": 0.8}\n```\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Judge: analysis"))
        .stdout(predicate::str::contains("Status: parsed"))
        .stdout(predicate::str::contains("\"intent\": \"comparison\""));
}

#[test]
fn test_inspect_reply_garbage_falls_back() {
    ragent()
        .arg("inspect-reply")
        .write_stdin("I think the answer is complete.")
        .assert()
        .success()
        .stdout(predicate::str::contains("default record substituted"))
        .stdout(predicate::str::contains("\"is_complete\": true"));
}

#[test]
fn test_init_prompts_writes_templates() {
    let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
    let target = dir.path().join("prompts");

    ragent()
        .args(["init-prompts", "--dir"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 prompt template(s)"));

    for name in ["analysis.md", "reflection.md", "answer.md"] {
        assert!(target.join(name).is_file(), "{name} missing");
    }
}

#[test]
fn test_query_without_api_key_fails_cleanly() {
    let dir = docs_dir();
    ragent()
        .args(["query", "How much leave?", "--docs"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key missing"));
}

#[test]
fn test_query_rejects_zero_top_k() {
    let dir = docs_dir();
    ragent()
        .args(["query", "How much leave?", "-k", "0", "--docs"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--top-k must be at least 1"));
}

//! Command-line integration tests.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn catalog_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join("knowledge")
}

/// A command isolated from the caller's environment and working directory.
fn luxe(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("luxe-assist").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("GROQ_API_KEY")
        .env_remove("LUXE_API_KEY")
        .env_remove("LUXE_PROVIDER")
        .env_remove("LUXE_KNOWLEDGE_DIR")
        .env_remove("LUXE_INDEX_PATH")
        .env_remove("LUXE_PROMPT_DIR")
        .env_remove("RUST_LOG")
        .env_remove("LUXE_LOG");
    cmd
}

#[test]
fn ingest_search_and_status() {
    let dir = TempDir::new().unwrap();

    luxe(&dir)
        .arg("ingest")
        .arg(catalog_dir())
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed 15 document(s)"));
    assert!(dir.path().join(".luxe").join("knowledge.db").exists());

    luxe(&dir)
        .args(["search", "What is your return policy?", "--type", "faq", "-n", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30 days"));

    luxe(&dir)
        .args(["--format", "json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"products\": 8"))
        .stdout(predicate::str::contains("\"faqs\": 7"));
}

#[test]
fn knowledge_dir_from_environment() {
    let dir = TempDir::new().unwrap();

    luxe(&dir)
        .env("LUXE_KNOWLEDGE_DIR", catalog_dir())
        .env("LUXE_INDEX_PATH", dir.path().join("custom.db"))
        .arg("ingest")
        .assert()
        .success();
    assert!(dir.path().join("custom.db").exists());
}

#[test]
fn search_without_index_fails() {
    let dir = TempDir::new().unwrap();

    luxe(&dir)
        .args(["search", "sofa"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("luxe-assist ingest"));
}

#[test]
fn chat_requires_api_key() {
    let dir = TempDir::new().unwrap();

    luxe(&dir)
        .args(["chat", "Where is my order ORD-87654?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key missing"));
}

#[test]
fn init_prompts_writes_templates() {
    let dir = TempDir::new().unwrap();
    let prompts = dir.path().join("prompts");

    luxe(&dir)
        .arg("init-prompts")
        .arg("--dir")
        .arg(&prompts)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 prompt template(s)"));
    assert!(prompts.join("assistant.md").exists());
    assert!(prompts.join("corrective.md").exists());
}

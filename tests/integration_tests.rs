//! Integration tests for the nestwalk CLI

mod common;

use assert_cmd::Command;
use common::{Tree, broken_gzip};
use predicates::prelude::*;

fn nestwalk(tree: &Tree) -> Command {
    let mut cmd = Command::cargo_bin("nestwalk").unwrap();
    cmd.current_dir(tree.root()).env_remove("RUST_LOG");
    cmd
}

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("nestwalk").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("archives"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("nestwalk").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nestwalk"));
}

#[test]
fn test_invalid_subcommand() {
    let mut cmd = Command::cargo_bin("nestwalk").unwrap();
    cmd.arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_list_shows_nested_paths() {
    let tree = Tree::mixed();
    nestwalk(&tree)
        .args(["list", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("./docs/bundle.zip!sub/y.txt"))
        .stdout(predicate::str::contains("./data.tar.gz%!inner.zip!deep.txt"))
        .stdout(predicate::str::contains("./logs/app.log.zst%"));
}

#[test]
fn test_list_without_looking_into_containers() {
    let tree = Tree::mixed();
    nestwalk(&tree)
        .args(["list", "--no-look-into", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("./docs/bundle.zip\n"))
        .stdout(predicate::str::contains("!").not());
}

#[test]
fn test_list_json() {
    let tree = Tree::mixed();
    let output = nestwalk(&tree)
        .args(["list", "--format", "json", "--mode", "parallel", "."])
        .output()
        .unwrap();
    assert!(output.status.success());

    let manifest: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(manifest["leaves"].as_array().unwrap().len(), 8);
    assert_eq!(manifest["archives"], 3);
    assert_eq!(manifest["compressed"], 3);
}

#[test]
fn test_default_config_skips_git_directories() {
    let tree = Tree::new();
    tree.file("src/main.rs", b"fn main() {}");
    tree.file(".git/HEAD", b"ref: refs/heads/main");

    nestwalk(&tree)
        .args(["list", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("./src/main.rs"))
        .stdout(predicate::str::contains(".git").not());
}

#[test]
fn test_summary_reports_failures() {
    let tree = Tree::new();
    tree.file("a.txt", b"alpha");
    tree.file("b.gz", &broken_gzip());

    nestwalk(&tree)
        .args(["summary", "--json", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"files\": 1"))
        .stdout(predicate::str::contains("./b.gz%"));
}

#[test]
fn test_summary_text_report() {
    let tree = Tree::new();
    tree.file("a.txt", b"alpha");
    tree.file("b.gz", &broken_gzip());

    nestwalk(&tree)
        .args(["summary", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("Suppressed failures"))
        .stdout(predicate::str::contains("1 unit(s) could not be read"))
        .stdout(predicate::str::contains("./b.gz%"));
}

#[test]
fn test_summary_fail_fast() {
    let tree = Tree::new();
    tree.file("a.txt", b"alpha");
    tree.file("b.gz", &broken_gzip());

    nestwalk(&tree)
        .args(["summary", "--fail-fast", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("b.gz%"));
}

#[test]
fn test_missing_path_fails() {
    let tree = Tree::new();
    nestwalk(&tree)
        .args(["list", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("path not found"));
}

#[test]
fn test_repository_config_is_applied() {
    let tree = Tree::mixed();
    tree.file("nestwalk.toml", b"[walk]\nlook_into = []\n");

    nestwalk(&tree)
        .args(["list", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("./data.tar.gz\n"));
}

#[test]
fn test_config_show_and_get() {
    let tree = Tree::new();
    nestwalk(&tree)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[walk]"));

    nestwalk(&tree)
        .args(["config", "get", "walk.formats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("zstd"));

    nestwalk(&tree)
        .env("NESTWALK_WALK__PARALLEL__MODE", "sequential")
        .args(["config", "get", "walk.parallel.mode"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sequential"));
}

#[test]
fn test_config_validate_rejects_unknown_format() {
    let tree = Tree::new();
    let config = tree.file("custom.toml", b"[walk]\nformats = [\"rar\"]\n");

    nestwalk(&tree)
        .arg("--config")
        .arg(&config)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rar"));
}

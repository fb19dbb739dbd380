use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn sidekick(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sidekick").unwrap();
    cmd.env("SIDEKICK_DATA_DIR", data_dir);
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("run sidekick");
    assert!(output.status.success());
    String::from_utf8(output.stdout).expect("utf8 stdout")
}

#[test]
fn attaches_and_lists_a_manual_note() {
    let tmp = tempdir().unwrap();

    sidekick(tmp.path())
        .args(["context", "add", "remember the deadline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Attached note (relevance 75)"));

    sidekick(tmp.path())
        .args(["context", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("1 context item(s)")
                .and(predicate::str::contains("manual"))
                .and(predicate::str::contains("manual-input")),
        );
}

#[test]
fn attaches_a_file_with_its_path() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("notes.txt");
    fs::write(&file, "fn main() {}\n").unwrap();

    sidekick(tmp.path())
        .args(["context", "add-file", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("relevance 80"));

    sidekick(tmp.path())
        .args(["context", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("file").and(predicate::str::contains("notes.txt")));
}

#[test]
fn missing_file_fails() {
    let tmp = tempdir().unwrap();

    sidekick(tmp.path())
        .args(["context", "add-file", "/no/such/file.rs"])
        .assert()
        .failure();
}

#[test]
fn empty_selection_attaches_nothing() {
    let tmp = tempdir().unwrap();

    sidekick(tmp.path())
        .args(["context", "add-selection"])
        .write_stdin("   \n\t")
        .assert()
        .success()
        .stdout(predicate::str::contains("Selection is empty; nothing attached"));

    sidekick(tmp.path())
        .args(["context", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No context attached"));
}

#[test]
fn selection_from_argument_uses_its_default_relevance() {
    let tmp = tempdir().unwrap();

    sidekick(tmp.path())
        .args(["context", "add-selection", "let x = 1;"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Attached selection (relevance 90)"));
}

#[test]
fn relevance_override_is_respected() {
    let tmp = tempdir().unwrap();

    sidekick(tmp.path())
        .args(["context", "add", "important", "--relevance", "95"])
        .assert()
        .success()
        .stdout(predicate::str::contains("relevance 95"));
}

#[test]
fn remove_by_id_then_list_is_empty() {
    let tmp = tempdir().unwrap();

    let stdout = stdout_of(sidekick(tmp.path()).args(["context", "add", "short-lived"]));
    let id = stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("id: "))
        .expect("id line")
        .to_string();

    sidekick(tmp.path())
        .args(["context", "remove", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Removed {}", id)));

    sidekick(tmp.path())
        .args(["context", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No context attached"));
}

#[test]
fn remove_of_unknown_id_reports_not_found() {
    let tmp = tempdir().unwrap();

    sidekick(tmp.path())
        .args(["context", "remove", "does-not-exist"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No context item with id"));
}

#[test]
fn clear_drops_everything() {
    let tmp = tempdir().unwrap();

    sidekick(tmp.path())
        .args(["context", "add", "one"])
        .assert()
        .success();
    sidekick(tmp.path())
        .args(["context", "add", "two"])
        .assert()
        .success();

    sidekick(tmp.path())
        .args(["context", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 2 context item(s)"));

    sidekick(tmp.path())
        .args(["context", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No context attached"));
}

#[test]
fn context_persists_across_invocations() {
    let tmp = tempdir().unwrap();

    sidekick(tmp.path())
        .args(["context", "add", "durable note"])
        .assert()
        .success();

    // A fresh process sees the same collection.
    sidekick(tmp.path())
        .args(["context", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 context item(s)"));
}

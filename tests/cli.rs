//! End-to-end CLI tests

#![cfg(unix)]

mod common;

use assert_cmd::Command;
use common::create_test_config;
use predicates::prelude::*;
use std::fs;

fn remake() -> Command {
    let mut cmd = Command::cargo_bin("remake").unwrap();
    cmd.env("REMAKE_NO_UPDATE_CHECK", "1");
    cmd
}

#[test]
fn test_run_default_target() {
    let (tmp, _path) = create_test_config(
        r#"
tasks:
  hello:
    cmds: ["echo from-hello"]
"#,
    );

    remake()
        .current_dir(tmp.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("[run] hello"))
        .stdout(predicate::str::contains("$ echo from-hello"))
        .stdout(predicate::str::contains("from-hello"));
}

#[test]
fn test_second_run_reports_skip_reason() {
    let (tmp, _path) = create_test_config(
        r#"
tasks:
  build:
    inputs: ["a.src"]
    outputs: ["a.out"]
    cmds: ["sleep 0.05", "cp a.src a.out"]
"#,
    );
    fs::write(tmp.path().join("a.src"), "v1").unwrap();

    remake()
        .current_dir(tmp.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("[run] build"));

    remake()
        .current_dir(tmp.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[skip] build (outputs newer than inputs)",
        ));
}

#[test]
fn test_failing_task_exits_nonzero_and_names_task() {
    let (tmp, _path) = create_test_config(
        r#"
tasks:
  broken:
    cmds: ["exit 9"]
"#,
    );

    remake()
        .current_dir(tmp.path())
        .args(["run", "broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken"));
}

#[test]
fn test_unknown_target_is_an_error() {
    let (tmp, _path) = create_test_config(
        r#"
tasks:
  t:
    cmds: ["echo hi"]
"#,
    );

    remake()
        .current_dir(tmp.path())
        .args(["run", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'ghost' is not defined"));
}

#[test]
fn test_define_overrides_variable() {
    let (tmp, _path) = create_test_config(
        r#"
vars:
  NAME: original
tasks:
  t:
    cmds: ["echo value=${NAME}"]
"#,
    );

    remake()
        .current_dir(tmp.path())
        .args(["run", "-D", "NAME=patched"])
        .assert()
        .success()
        .stdout(predicate::str::contains("value=patched"));
}

#[test]
fn test_list_shows_tasks_in_order() {
    let (tmp, _path) = create_test_config(
        r#"
default: second
tasks:
  first:
    desc: The first task
    cmds: ["echo 1"]
  second:
    desc: The second task
    cmds: ["echo 2"]
"#,
    );

    let assert = remake().current_dir(tmp.path()).arg("list").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();

    let first_pos = stdout.find("first").unwrap();
    let second_pos = stdout.find("second").unwrap();
    assert!(first_pos < second_pos);
    assert!(stdout.contains("The first task"));
    // default marker sits on the default task's line
    let marked: Vec<&str> = stdout.lines().filter(|l| l.starts_with('*')).collect();
    assert_eq!(marked.len(), 1);
    assert!(marked[0].contains("second"));
}

#[test]
fn test_graph_prints_dependency_tree() {
    let (tmp, _path) = create_test_config(
        r#"
tasks:
  app:
    deps: [lib]
    cmds: ["echo app"]
  lib:
    deps: [gen]
    cmds: ["echo lib"]
  gen:
    cmds: ["echo gen"]
"#,
    );

    remake()
        .current_dir(tmp.path())
        .args(["graph", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("app"))
        .stdout(predicate::str::contains("  lib"))
        .stdout(predicate::str::contains("    gen"));
}

#[test]
fn test_graph_reports_cycles() {
    let (tmp, _path) = create_test_config(
        r#"
tasks:
  a:
    deps: [b]
  b:
    deps: [a]
"#,
    );

    remake()
        .current_dir(tmp.path())
        .args(["graph", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle"));
}

#[test]
fn test_init_writes_starter_and_respects_force() {
    let tmp = tempfile::TempDir::new().unwrap();

    remake()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success();
    assert!(tmp.path().join("remake.yml").exists());

    remake()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    remake()
        .current_dir(tmp.path())
        .args(["init", "--force"])
        .assert()
        .success();

    // the starter file loads and lists
    remake()
        .current_dir(tmp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"));
}

#[test]
fn test_fmt_check_flags_non_canonical_file() {
    let (tmp, path) = create_test_config(
        r#"
tasks:
  t:
    cmd: echo hi
"#,
    );

    remake()
        .current_dir(tmp.path())
        .args(["fmt", "--check"])
        .assert()
        .failure();

    remake()
        .current_dir(tmp.path())
        .arg("fmt")
        .assert()
        .success();

    remake()
        .current_dir(tmp.path())
        .args(["fmt", "--check"])
        .assert()
        .success();

    // content was rewritten into canonical layout and still loads
    let rewritten = fs::read_to_string(&path).unwrap();
    assert!(rewritten.contains("default:"));
    remake()
        .current_dir(tmp.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("hi"));
}

#[test]
fn test_doctor_reports_config_health() {
    let (tmp, _path) = create_test_config(
        r#"
tasks:
  t:
    cmds: ["echo hi"]
"#,
    );

    remake()
        .current_dir(tmp.path())
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("remakefile"))
        .stdout(predicate::str::contains("tasks=1"));
}

#[test]
fn test_doctor_fails_on_broken_config() {
    let (tmp, _path) = create_test_config("tasks: [broken]\n");

    remake()
        .current_dir(tmp.path())
        .arg("doctor")
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL"));
}

#[test]
fn test_explicit_file_flag() {
    let (tmp, path) = create_test_config(
        r#"
tasks:
  t:
    cmds: ["echo via-flag"]
"#,
    );
    let renamed = tmp.path().join("other.yml");
    fs::rename(&path, &renamed).unwrap();

    remake()
        .current_dir(tmp.path())
        .args(["run", "-f", "other.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("via-flag"));
}

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn goldenfmt(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_goldenfmt"))
        .current_dir(dir)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

/// A fixture tree under `fixtures/` with a registry that names it.
fn project(cases: &[(&str, &str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let fixtures = dir.path().join("fixtures");
    fs::create_dir(&fixtures).unwrap();

    let mut entries = Vec::new();
    for (name, input, expected) in cases {
        fs::write(fixtures.join(format!("{name}.kt")), input).unwrap();
        fs::write(fixtures.join(format!("{name}.after.kt")), expected).unwrap();
        entries.push(format!(r#"{{"id": "test{name}", "path": "{name}.kt"}}"#));
    }
    fs::write(
        dir.path().join("registry.json"),
        format!(r#"{{"root": "fixtures", "cases": [{}]}}"#, entries.join(", ")),
    )
    .unwrap();
    dir
}

#[test]
fn run_passes_with_identity_formatter() {
    let dir = project(&[("Alpha", "val x = 1\n", "val x = 1\n")]);
    let report = dir.path().join("report.json");
    let output = goldenfmt(
        dir.path(),
        &[
            "run",
            "--registry",
            "registry.json",
            "--report",
            report.to_str().unwrap(),
            "--",
            "cat",
        ],
    );

    assert_eq!(output.status.code(), Some(0), "{output:?}");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report).unwrap()).unwrap();
    assert_eq!(json["counts"]["passed"], 1);
}

#[test]
fn run_reports_mismatch() {
    let dir = project(&[
        ("Alpha", "val x = 1\n", "val x = 1\n"),
        ("Beta", "val y=2\n", "val y = 2\n"),
    ]);
    let output = goldenfmt(dir.path(), &["run", "-r", "registry.json", "--", "cat"]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("FAIL testBeta"), "{stdout}");
    assert!(stdout.contains("+val y=2"), "{stdout}");
    assert!(!stdout.contains("FAIL testAlpha"));
}

#[test]
fn drift_is_fatal() {
    let dir = project(&[("Alpha", "x\n", "x\n")]);
    fs::write(dir.path().join("fixtures/Gamma.kt"), "x\n").unwrap();

    let output = goldenfmt(dir.path(), &["run", "-r", "registry.json", "--", "cat"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Gamma.kt"), "{stderr}");

    let check = goldenfmt(dir.path(), &["check", "-r", "registry.json"]);
    assert_eq!(check.status.code(), Some(2));
}

#[test]
fn case_by_identifier() {
    let dir = project(&[("Alpha", "x\n", "x\n"), ("Beta", "y\n", "z\n")]);

    let pass = goldenfmt(dir.path(), &["case", "testAlpha", "-r", "registry.json", "--", "cat"]);
    assert_eq!(pass.status.code(), Some(0));

    let fail = goldenfmt(dir.path(), &["case", "testBeta", "-r", "registry.json", "--", "cat"]);
    assert_eq!(fail.status.code(), Some(1));

    let unknown = goldenfmt(dir.path(), &["case", "testNope", "-r", "registry.json", "--", "cat"]);
    assert_eq!(unknown.status.code(), Some(2));
}

#[test]
fn check_consistent_tree() {
    let dir = project(&[("Alpha", "x\n", "x\n")]);
    let output = goldenfmt(dir.path(), &["check", "-r", "registry.json"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn ident_prints_derived_identifiers() {
    let dir = TempDir::new().unwrap();
    let output = goldenfmt(dir.path(), &["ident", "idioms/block_for.kt", "If.kt"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("testIdiomsBlockFor\tidioms/block_for.kt"));
    assert!(stdout.contains("testIf\tIf.kt"));
}

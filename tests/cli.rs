//! Integration tests for the lobprob binary

use std::path::Path;
use std::process::{Command, Output};

fn lobprob(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lobprob"))
        .args(args)
        .env_remove("LOBPROB_CONFIG")
        .output()
        .expect("failed to run lobprob")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("non-utf8 temp path")
}

#[test]
fn test_write_default_then_run_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("experiment.toml");

    let output = lobprob(&["--write-default", path_arg(&path)]);
    assert!(output.status.success(), "{:?}", output);
    assert!(path.exists());

    let output = lobprob(&[
        "--config",
        path_arg(&path),
        "--trials",
        "300",
        "--seed",
        "3",
        "--json",
    ]);
    assert!(output.status.success(), "{:?}", output);

    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 5);
    for result in results {
        assert_eq!(result["report"]["trials"], 300);
        let p = result["report"]["probability"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&p));
    }
    assert!(results[4]["reach_probability"].is_f64());
    assert!(results[0].get("initial_book").is_none());
    assert_eq!(results[2]["initial_book"]["bids"][0][0], 0);
    assert_eq!(results[2]["initial_book"]["asks"][0][0], 10);
}

#[test]
fn test_sequential_run_is_reproducible() {
    let run = || {
        lobprob(&["--trials", "200", "--seed", "11", "--sequential", "--json"]).stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn test_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let output = lobprob(&["--config", path_arg(&path)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loading experiment file"), "{}", stderr);
}

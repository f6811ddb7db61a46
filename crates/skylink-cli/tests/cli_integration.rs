//! CLI subprocess integration tests.
//!
//! These tests invoke the `skylink` binary as a subprocess and verify exit
//! codes, stdout content, and JSON output.

use std::path::{Path, PathBuf};
use std::process::Command;

const CODE_SIGNING: &str = "aws/lambda/function::aws/lambda/codeSigningConfig";
const INVOKE: &str = "aws/lambda/function::aws/lambda/function";

fn skylink_bin(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_skylink"));
    cmd.current_dir(dir);
    cmd.env_remove("SKYLINK_LOG");
    cmd
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn write_stage_input(dir: &Path, current: &str) -> PathBuf {
    write_file(
        dir,
        "stage.json",
        &format!(
            r#"{{
  "resourceAChanges": {{"resourceName": "fn", "resourceType": "aws/lambda/function", "resolvedSpec": {{}}}},
  "resourceBChanges": {{
    "resourceName": "csc",
    "resourceType": "aws/lambda/codeSigningConfig",
    "resolvedSpec": {{"codeSigningConfigArn": "arn:csc:123"}}
  }},
  "currentLinkData": {current}
}}"#
        ),
    )
}

fn write_update_input(dir: &Path, function_state: &str) -> PathBuf {
    write_file(
        dir,
        "update.json",
        &format!(
            r#"{{
  "resourceInfo": {{"resourceName": "orders", "currentState": {function_state}}},
  "otherResourceInfo": {{"resourceName": "csc", "currentState": {{"codeSigningConfigArn": "arn:csc:123"}}}},
  "intent": "create",
  "providerContext": {{"sessionId": "s1", "variables": {{"region": "eu-west-2"}}}}
}}"#
        ),
    )
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn cli_version_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = skylink_bin(dir.path()).arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("skylink"));
}

#[test]
fn cli_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    let output = skylink_bin(dir.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["links", "stage", "update"] {
        assert!(stdout.contains(command), "help must list '{command}'");
    }
}

#[test]
fn links_json_lists_builtin_link_types() {
    let dir = tempfile::tempdir().unwrap();
    let output = skylink_bin(dir.path())
        .args(["links", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    let types: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["linkType"].as_str().unwrap().to_owned())
        .collect();
    assert!(types.contains(&CODE_SIGNING.to_owned()));
    assert!(types.contains(&INVOKE.to_owned()));
    assert_eq!(types.len(), 3);
}

#[test]
fn stage_reports_new_field() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_stage_input(dir.path(), "{}");
    let output = skylink_bin(dir.path())
        .args(["stage", CODE_SIGNING])
        .arg(&input)
        .arg("--json")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json = stdout_json(&output);
    assert_eq!(json["linkType"], CODE_SIGNING);
    assert_eq!(json["hasChanges"], true);
    assert_eq!(
        json["changes"]["newFields"][0]["fieldPath"],
        "[\"fn\"].codeSigningConfigArn"
    );
    assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
}

#[test]
fn stage_fingerprint_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_stage_input(dir.path(), r#"{"fn": {"codeSigningConfigArn": "arn:csc:123"}}"#);
    let run = || {
        let output = skylink_bin(dir.path())
            .args(["stage", CODE_SIGNING])
            .arg(&input)
            .arg("--json")
            .output()
            .unwrap();
        assert!(output.status.success());
        stdout_json(&output)
    };
    let first = run();
    let second = run();
    assert_eq!(first["fingerprint"], second["fingerprint"]);
    assert_eq!(first["hasChanges"], false);
}

#[test]
fn stage_human_output_shows_classification() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_stage_input(dir.path(), "null");
    let output = skylink_bin(dir.path())
        .args(["stage", CODE_SIGNING])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("new"));
    assert!(stdout.contains("[\"fn\"].codeSigningConfigArn"));
    assert!(stdout.contains("fingerprint:"));
}

#[test]
fn stage_unknown_link_type_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_stage_input(dir.path(), "{}");
    let output = skylink_bin(dir.path())
        .args(["stage", "aws/s3/bucket::aws/iam/role"])
        .arg(&input)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown link type"));
}

#[test]
fn stage_malformed_input_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_file(dir.path(), "stage.json", "{ not json");
    let output = skylink_bin(dir.path())
        .args(["stage", CODE_SIGNING])
        .arg(&input)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("input error"));
}

#[test]
fn bad_config_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_file(dir.path(), "custom.toml", "config_version = 1\nunknown = true\n");
    let output = skylink_bin(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("links")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config error"));
}

#[test]
fn update_a_records_one_call() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_update_input(dir.path(), r#"{"arn": "arn:fn:orders"}"#);
    let output = skylink_bin(dir.path())
        .args(["update", CODE_SIGNING])
        .arg(&input)
        .args(["--target", "a", "--json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json = stdout_json(&output);
    assert_eq!(
        json["linkData"],
        serde_json::json!({"orders": {"codeSigningConfigArn": "arn:csc:123"}})
    );
    let calls = json["calls"].as_array().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["operation"], "PutFunctionCodeSigningConfig");
    assert_eq!(calls[0]["region"], "eu-west-2");
}

#[test]
fn update_intent_flag_selects_teardown() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_update_input(dir.path(), r#"{"arn": "arn:fn:orders"}"#);
    let output = skylink_bin(dir.path())
        .args(["update", CODE_SIGNING])
        .arg(&input)
        .args(["--target", "a", "--intent", "destroy", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["linkData"], serde_json::json!({}));
    assert_eq!(json["calls"][0]["operation"], "DeleteFunctionCodeSigningConfig");
}

#[test]
fn update_missing_arn_fails_without_calls() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_update_input(dir.path(), "{}");
    let output = skylink_bin(dir.path())
        .args(["update", CODE_SIGNING])
        .arg(&input)
        .args(["--target", "a"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing required attribute 'arn'"), "stderr: {stderr}");
}

#[test]
fn update_uses_region_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "skylink.toml",
        "config_version = 1\n[aws]\nregion = \"ap-southeast-2\"\n",
    );
    let input = write_file(
        dir.path(),
        "update.json",
        r#"{
  "resourceInfo": {"resourceName": "orders", "currentState": {"arn": "arn:fn:orders"}},
  "otherResourceInfo": {"resourceName": "csc", "currentState": {"codeSigningConfigArn": "arn:csc:123"}},
  "intent": "update"
}"#,
    );
    let output = skylink_bin(dir.path())
        .args(["update", CODE_SIGNING])
        .arg(&input)
        .args(["--target", "a", "--json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(stdout_json(&output)["calls"][0]["region"], "ap-southeast-2");
}

#[test]
fn update_rejects_unknown_target() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_update_input(dir.path(), "{}");
    let output = skylink_bin(dir.path())
        .args(["update", CODE_SIGNING])
        .arg(&input)
        .args(["--target", "c"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

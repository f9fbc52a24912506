//! CLI tests for awplus-reconcile
//!
//! This test suite covers:
//! - Subcommand parsing
//! - Output format handling
//! - Config file loading
//! - Exit codes for invalid input
//! - Integration testing with assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

// Helper to get a command for testing
fn reconcile_cmd() -> Command {
    let mut cmd = Command::cargo_bin("awplus-reconcile").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("AWPLUS_CONFIG")
        .env_remove("AWPLUS_STATE")
        .env_remove("AWPLUS_FACTS_DIR")
        .env_remove("RUST_LOG");
    cmd
}

// Helper to create a YAML document with the given suffix
fn document(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

fn empty_config() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[defaults]").unwrap();
    file
}

// ============================================================================
// Basic Commands
// ============================================================================

#[test]
fn test_help() {
    reconcile_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reconcile"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_version() {
    reconcile_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("awplus-reconcile"));
}

#[test]
fn test_list_modules() {
    let config = empty_config();
    reconcile_cmd()
        .args(["-c", config.path().to_str().unwrap(), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("awplus_interfaces"))
        .stdout(predicate::str::contains("awplus_vxlan"))
        .stdout(predicate::str::contains("awplus_policy_maps"));
}

#[test]
fn test_list_json() {
    let config = empty_config();
    let output = reconcile_cmd()
        .args([
            "-c",
            config.path().to_str().unwrap(),
            "--output",
            "json",
            "list",
            "bgp",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["resource"], "bgp");
}

// ============================================================================
// Reconcile
// ============================================================================

#[test]
fn test_reconcile_prints_commands() {
    let config = empty_config();
    let want = document("- vlan: 10\n  vni: 5001\n");
    let facts = document("- vlan: 10\n  vni: 5000\n");

    reconcile_cmd()
        .args([
            "-c",
            config.path().to_str().unwrap(),
            "reconcile",
            "vxlan",
            "--state",
            "merged",
            "--config",
            want.path().to_str().unwrap(),
            "--facts",
            facts.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("nvo vxlan"))
        .stdout(predicate::str::contains("no map vlan 10 vni 5000"))
        .stdout(predicate::str::contains("map vlan 10 vni 5001"));
}

#[test]
fn test_reconcile_json_output() {
    let config = empty_config();
    let want = document("- dscp_in: 63\n");
    let facts = document("- dscp_in: 63\n  dscp_new: 40\n  cos_new: 4\n  class_new: red\n");

    let output = reconcile_cmd()
        .args([
            "-c",
            config.path().to_str().unwrap(),
            "--output",
            "json",
            "reconcile",
            "premark_dscp",
            "--state",
            "deleted",
            "--config",
            want.path().to_str().unwrap(),
            "--facts",
            facts.path().to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["module"], "awplus_premark_dscp");
    assert_eq!(report["state"], "deleted");
    assert_eq!(report["changed"], true);
    assert_eq!(
        report["commands"],
        serde_json::json!(["no mls qos map premark-dscp 63"])
    );
}

#[test]
fn test_reconcile_without_changes() {
    let config = empty_config();
    let want = document("- vlan: 10\n  vni: 5000\n");
    let facts = document("- vlan: 10\n  vni: 5000\n");

    reconcile_cmd()
        .args([
            "-c",
            config.path().to_str().unwrap(),
            "reconcile",
            "awplus_vxlan",
            "--config",
            want.path().to_str().unwrap(),
            "--facts",
            facts.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok:"));
}

#[test]
fn test_reconcile_with_diff() {
    let config = empty_config();
    let want = document("- vlan: 10\n  vni: 5001\n");
    let facts = document("- vlan: 10\n  vni: 5000\n");

    reconcile_cmd()
        .args([
            "-c",
            config.path().to_str().unwrap(),
            "--diff",
            "reconcile",
            "vxlan",
            "--state",
            "replaced",
            "--config",
            want.path().to_str().unwrap(),
            "--facts",
            facts.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("--- before"))
        .stdout(predicate::str::contains("-  vni: 5000"))
        .stdout(predicate::str::contains("+  vni: 5001"));
}

#[test]
fn test_reconcile_uses_facts_dir_from_config() {
    let facts_dir = tempdir().unwrap();
    std::fs::write(
        facts_dir.path().join("vxlan.yml"),
        "- vlan: 20\n  vni: 6000\n",
    )
    .unwrap();
    let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        config,
        "[defaults]\nstate = \"deleted\"\n\n[facts]\ndir = {:?}",
        facts_dir.path().to_str().unwrap()
    )
    .unwrap();
    let want = document("[]\n");

    reconcile_cmd()
        .args([
            "-c",
            config.path().to_str().unwrap(),
            "reconcile",
            "vxlan",
            "--config",
            want.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("no map vlan 20 vni 6000"));
}

#[test]
fn test_reconcile_warns_without_facts() {
    let config = empty_config();
    let want = document("- vlan: 10\n  vni: 5000\n");

    reconcile_cmd()
        .args([
            "-c",
            config.path().to_str().unwrap(),
            "reconcile",
            "vxlan",
            "--config",
            want.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("WARNING: No facts for vxlan"))
        .stdout(predicate::str::contains("map vlan 10 vni 5000"));
}

// ============================================================================
// Error Handling
// ============================================================================

#[test]
fn test_unknown_resource() {
    let config = empty_config();
    let want = document("[]\n");
    reconcile_cmd()
        .args([
            "-c",
            config.path().to_str().unwrap(),
            "reconcile",
            "ospf",
            "--config",
            want.path().to_str().unwrap(),
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown resource 'ospf'"));
}

#[test]
fn test_invariant_violation_exit_code() {
    let config = empty_config();
    let want = document("- vlan: 30\n  vni: 5000\n");
    let facts = document("- vlan: 10\n  vni: 5000\n");
    reconcile_cmd()
        .args([
            "-c",
            config.path().to_str().unwrap(),
            "reconcile",
            "vxlan",
            "--config",
            want.path().to_str().unwrap(),
            "--facts",
            facts.path().to_str().unwrap(),
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("vni 5000"));
}

#[test]
fn test_invalid_value_exit_code() {
    let config = empty_config();
    let want = document("- vlan: 0\n  vni: 5000\n");
    reconcile_cmd()
        .args([
            "-c",
            config.path().to_str().unwrap(),
            "reconcile",
            "vxlan",
            "--config",
            want.path().to_str().unwrap(),
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("vlan must be between 1 and 4094"));
}

#[test]
fn test_missing_want_file() {
    let config = empty_config();
    reconcile_cmd()
        .args([
            "-c",
            config.path().to_str().unwrap(),
            "reconcile",
            "vxlan",
            "--config",
            "/nonexistent/want.yml",
        ])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_missing_config_file() {
    reconcile_cmd()
        .args(["-c", "/nonexistent/awplus.toml", "list"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_state_argument() {
    reconcile_cmd()
        .args([
            "reconcile",
            "vxlan",
            "--state",
            "gathered",
            "--config",
            "want.yml",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gathered"));
}

//! ResourceModule execution against a device session: gathering facts,
//! applying commands, check mode and diff mode.

mod common;

use std::sync::Arc;

use awplus_resources::modules::{Module, ModuleContext, ModuleError, ModuleRegistry, ModuleStatus};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn vxlan_device() -> MockDevice {
    MockDevice::new("sw1").with_facts("vxlan", json!([{ "vlan": 10, "vni": 5000 }]))
}

#[test]
fn test_apply_pushes_commands_and_refreshes_facts() {
    let device = Arc::new(vxlan_device().with_after(
        "vxlan",
        json!([{ "vlan": 10, "vni": 5000 }, { "vlan": 20, "vni": 6000 }]),
    ));
    let context = ModuleContext::new().with_device(device.clone());

    let output = ModuleRegistry::with_builtins()
        .execute(
            "awplus_vxlan",
            &params("merged", json!([{ "vlan": 20, "vni": 6000 }])),
            &context,
        )
        .unwrap();

    assert!(output.changed);
    assert_eq!(output.status, ModuleStatus::Changed);
    assert_eq!(
        device.applied(),
        vec![vec!["nvo vxlan".to_string(), "map vlan 20 vni 6000".to_string()]]
    );
    assert_eq!(output.data["before"], json!([{ "vlan": 10, "vni": 5000 }]));
    assert_eq!(
        output.data["after"],
        json!([{ "vlan": 10, "vni": 5000 }, { "vlan": 20, "vni": 6000 }])
    );
}

#[test]
fn test_check_mode_never_applies() {
    let device = Arc::new(vxlan_device());
    let context = ModuleContext::new()
        .with_check_mode(true)
        .with_device(device.clone());

    let output = ModuleRegistry::with_builtins()
        .execute(
            "awplus_vxlan",
            &params("merged", json!([{ "vlan": 20, "vni": 6000 }])),
            &context,
        )
        .unwrap();

    assert!(output.changed);
    assert_eq!(output.commands(), vec!["nvo vxlan", "map vlan 20 vni 6000"]);
    assert!(device.applied().is_empty());
    assert!(output.data.get("after").is_none());
}

#[test]
fn test_no_change_skips_the_device() {
    let device = Arc::new(vxlan_device());
    let context = ModuleContext::new().with_device(device.clone());

    let output = ModuleRegistry::with_builtins()
        .execute(
            "awplus_vxlan",
            &params("merged", json!([{ "vlan": 10, "vni": 5000 }])),
            &context,
        )
        .unwrap();

    assert!(!output.changed);
    assert_eq!(output.status, ModuleStatus::Ok);
    assert!(device.applied().is_empty());
}

#[test]
fn test_apply_without_device_fails() {
    let context = ModuleContext::new().with_resource_facts("vxlan", json!([]));
    let err = ModuleRegistry::with_builtins()
        .execute(
            "awplus_vxlan",
            &params("merged", json!([{ "vlan": 20, "vni": 6000 }])),
            &context,
        )
        .unwrap_err();
    assert!(matches!(err, ModuleError::ExecutionFailed(_)));
}

#[test]
fn test_apply_failure_is_propagated() {
    let device = Arc::new(vxlan_device().failing());
    let context = ModuleContext::new().with_device(device);
    let err = ModuleRegistry::with_builtins()
        .execute(
            "awplus_vxlan",
            &params("overridden", json!([{ "vlan": 20, "vni": 6000 }])),
            &context,
        )
        .unwrap_err();
    assert!(matches!(err, ModuleError::ExecutionFailed(_)));
}

#[test]
fn test_invariant_violation_pushes_nothing() {
    let device = Arc::new(vxlan_device());
    let context = ModuleContext::new().with_device(device.clone());
    let err = ModuleRegistry::with_builtins()
        .execute(
            "awplus_vxlan",
            &params("merged", json!([{ "vlan": 30, "vni": 5000 }])),
            &context,
        )
        .unwrap_err();
    assert!(matches!(err, ModuleError::InvariantViolation(_)));
    assert!(device.applied().is_empty());
}

#[test]
fn test_diff_mode_reports_before_and_commands() {
    let context = ModuleContext::new()
        .with_check_mode(true)
        .with_diff_mode(true)
        .with_resource_facts("vxlan", json!([{ "vlan": 10, "vni": 5000 }]));

    let output = ModuleRegistry::with_builtins()
        .execute(
            "awplus_vxlan",
            &params("replaced", json!([{ "vlan": 10, "vni": 5001 }])),
            &context,
        )
        .unwrap();

    let diff = output.diff.expect("diff mode attaches a diff");
    assert!(diff.before.contains("vni: 5000"));
    assert!(diff.after.contains("vni: 5001"));
    assert_eq!(
        diff.details.as_deref(),
        Some("nvo vxlan\nno map vlan 10 vni 5000\nmap vlan 10 vni 5001")
    );
}

#[test]
fn test_module_diff_without_changes_is_none() {
    let registry = ModuleRegistry::with_builtins();
    let module = registry.get("awplus_premark_dscp").unwrap();
    let context = ModuleContext::new().with_resource_facts(
        "premark_dscp",
        json!([{ "dscp_in": 10, "dscp_new": 20 }]),
    );
    let diff = module
        .diff(
            &params("merged", json!([{ "dscp_in": 10, "dscp_new": 20 }])),
            &context,
        )
        .unwrap();
    assert!(diff.is_none());
}

#[test]
fn test_facts_from_device_take_precedence() {
    let device = Arc::new(vxlan_device());
    let context = ModuleContext::new()
        .with_check_mode(true)
        .with_resource_facts("vxlan", json!([{ "vlan": 99, "vni": 9900 }]))
        .with_device(device);

    let output = ModuleRegistry::with_builtins()
        .execute("awplus_vxlan", &params("deleted", json!([])), &context)
        .unwrap();
    assert_eq!(output.commands(), vec!["nvo vxlan", "no map vlan 10 vni 5000"]);
}

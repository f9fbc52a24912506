//! Network Resource Modules
//!
//! Declarative resource modules for Allied Telesis AlliedWare Plus devices.
//! Every module follows the same pattern:
//! - Read the device's current configuration for one resource ("have")
//! - Accept a desired configuration ("want") and a state
//! - Compute the minimal ordered list of CLI commands that moves have to want
//! - Push the commands through a [`DeviceSession`] unless running in check mode
//!
//! # States
//!
//! - **merged**: add or modify what want specifies, never remove anything
//! - **replaced**: reduce each record named in want to exactly want
//! - **overridden**: reduce the whole resource to exactly want
//! - **deleted**: remove the records named in want, or everything
//!
//! # Example Usage
//!
//! ```yaml
//! - name: Configure access ports
//!   awplus_l2_interfaces:
//!     config:
//!       - name: port1.0.1-1.0.4
//!         access:
//!           vlan: 5
//!     state: merged
//! ```
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +-------------------+
//! | params (want)    |---->|                   |     +-------------------+
//! +------------------+     |  ResourceModule   |---->|  DeviceSession    |
//! +------------------+     |   + Reconciler    |     |   edit_config     |
//! | facts (have)     |---->|                   |     +-------------------+
//! +------------------+     +-------------------+
//! ```
//!
//! [`DeviceSession`]: common::DeviceSession

pub mod awplus;
pub mod common;
pub mod diff;

// Re-export main types for convenience
pub use common::{
    check_address, check_prefix, check_range, ensure_unique, expand_interfaces, expand_want,
    string_or_number, walk_records, Afi, CommandSet, ContextLines, DeviceSession, InterfaceId,
    InterfaceRecord, Plan, Reconciler, ResourceConfig, ResourceModule, State, VlanSet,
};
pub use diff::{
    dict_diff, dict_merge, filter_dict_having_none_value, list_diff, merge_records,
    remove_empties, Absent, FieldChange, FieldDiff, KeyedDiff, ListDiff,
};

use crate::modules::ModuleRegistry;
use awplus::*;
use std::sync::Arc;

/// Register all network modules with the registry
pub fn register_network_modules(registry: &mut ModuleRegistry) {
    registry.register(Arc::new(ResourceModule::new(Interfaces)));
    registry.register(Arc::new(ResourceModule::new(L2Interfaces)));
    registry.register(Arc::new(ResourceModule::new(L3Interfaces)));
    registry.register(Arc::new(ResourceModule::new(LldpInterfaces)));
    registry.register(Arc::new(ResourceModule::new(StaticLagInterfaces)));
    registry.register(Arc::new(ResourceModule::new(Acl)));
    registry.register(Arc::new(ResourceModule::new(AclInterfaces)));
    registry.register(Arc::new(ResourceModule::new(Bgp)));
    registry.register(Arc::new(ResourceModule::new(ClassMaps)));
    registry.register(Arc::new(ResourceModule::new(PolicyMaps)));
    registry.register(Arc::new(ResourceModule::new(PremarkDscp)));
    registry.register(Arc::new(ResourceModule::new(Vrfs)));
    registry.register(Arc::new(ResourceModule::new(Vxlan)));
    registry.register(Arc::new(ResourceModule::new(StaticRoutes)));
    registry.register(Arc::new(ResourceModule::new(Mlag)));
    registry.register(Arc::new(ResourceModule::new(Openflow)));
}

/// Get a list of all available network module names
pub fn network_module_names() -> Vec<&'static str> {
    vec![
        Interfaces::MODULE,
        L2Interfaces::MODULE,
        L3Interfaces::MODULE,
        LldpInterfaces::MODULE,
        StaticLagInterfaces::MODULE,
        Acl::MODULE,
        AclInterfaces::MODULE,
        Bgp::MODULE,
        ClassMaps::MODULE,
        PolicyMaps::MODULE,
        PremarkDscp::MODULE,
        Vrfs::MODULE,
        Vxlan::MODULE,
        StaticRoutes::MODULE,
        Mlag::MODULE,
        Openflow::MODULE,
    ]
}

/// Map a short resource name (`interfaces`, `bgp`) to its module name
pub fn module_for_resource(resource: &str) -> Option<&'static str> {
    let wanted = resource.trim().trim_start_matches("awplus_");
    network_module_names()
        .into_iter()
        .find(|name| name.trim_start_matches("awplus_") == wanted)
}

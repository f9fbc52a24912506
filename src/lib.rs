//! # awplus-resources - Declarative resource modules for AlliedWare Plus
//!
//! awplus-resources turns a desired configuration for one resource of an
//! Allied Telesis AlliedWare Plus switch (interfaces, ACLs, BGP, QoS maps,
//! VRFs, VXLAN, ...) into the minimal ordered list of CLI commands that moves
//! the device's current configuration to it.
//!
//! ## Core Concepts
//!
//! - **Want**: the desired configuration for a resource
//! - **Have**: the device's current configuration (structured facts)
//! - **State**: how want is applied (merged, replaced, overridden, deleted)
//! - **Reconciler**: the pure function `(state, want, have) -> commands`
//! - **Modules**: reconcilers exposed through the [`Module`](modules::Module)
//!   trait and looked up in a [`ModuleRegistry`](modules::ModuleRegistry)
//!
//! ## Architecture Overview
//!
//! ```text
//! +---------------------------------------------------------------+
//! |                   CLI (awplus-reconcile)                      |
//! |                 (clap-based command parsing)                  |
//! +---------------------------------------------------------------+
//!                                |
//!                                v
//! +---------------------------------------------------------------+
//! |                       Module Registry                         |
//! |             (one ResourceModule per AW+ resource)             |
//! +---------------------------------------------------------------+
//!                                |
//!                                v
//! +---------------------------------------------------------------+
//! |   Reconcilers: interfaces, acl, bgp, policy_maps, vxlan, ...  |
//! +---------------------------------------------------------------+
//!                                |
//!                                v
//! +---------------------------------------------------------------+
//! |             DeviceSession (facts, edit_config)                |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Quick Example
//!
//! ```rust
//! use awplus_resources::prelude::*;
//! use awplus_resources::modules::network::awplus::vxlan::VxlanMapping;
//!
//! let have = vec![VxlanMapping::new(10, 5000)];
//! let want = vec![VxlanMapping::new(10, 5001)];
//! let commands = Vxlan.reconcile(State::Merged, &want, &have).unwrap();
//! assert_eq!(
//!     commands,
//!     vec!["nvo vxlan", "no map vlan 10 vni 5000", "map vlan 10 vni 5001"]
//! );
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.
    //!
    //! - **Modules**: Module system and registry
    //! - **Reconcilers**: one per AlliedWare Plus resource
    //! - **Errors**: Error handling types

    // Error types
    pub use crate::error::{Error, ErrorContext, Result};

    // Module system
    pub use crate::modules::{
        DeviceSession, Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams,
        ModuleRegistry, ModuleResult,
    };

    // Reconciliation
    pub use crate::modules::network::{CommandSet, Reconciler, ResourceModule, State};

    // Reconcilers
    pub use crate::modules::network::awplus::*;
}

// ============================================================================
// Core Types
// ============================================================================

/// Error types and result aliases.
///
/// [`Error`] covers the tooling around reconciliation (files,
/// configuration, parsing); module failures carry a
/// [`ModuleError`](modules::ModuleError).
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Module System
// ============================================================================

/// Module system for AlliedWare Plus resources.
///
/// # Example
///
/// ```rust
/// use awplus_resources::modules::{ModuleContext, ModuleParams, ModuleRegistry};
///
/// let registry = ModuleRegistry::with_builtins();
/// let context = ModuleContext::new().with_check_mode(true);
///
/// let mut params = ModuleParams::new();
/// params.insert("state".into(), serde_json::json!("merged"));
/// params.insert("config".into(), serde_json::json!([{ "vlan": 30, "vni": 7000 }]));
///
/// let result = registry.execute("awplus_vxlan", &params, &context).unwrap();
/// assert!(result.changed);
/// assert_eq!(result.commands(), vec!["nvo vxlan", "map vlan 30 vni 7000"]);
/// ```
pub mod modules;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the reconcile tooling.
///
/// Handles loading and merging configuration from multiple sources:
/// environment variables, config files, and command-line arguments.
pub mod config;

// ============================================================================
// Version Information
// ============================================================================

/// Returns the current version of awplus-resources.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

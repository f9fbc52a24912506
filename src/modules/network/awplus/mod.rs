//! AlliedWare Plus resource reconcilers
//!
//! One reconciler per resource. Each one turns `(state, want, have)` into the
//! ordered AW+ CLI commands that move the device from have to want.

pub mod acl;
pub mod acl_interfaces;
pub mod bgp;
pub mod class_maps;
pub mod interfaces;
pub mod l2_interfaces;
pub mod l3_interfaces;
pub mod lldp_interfaces;
pub mod mlag;
pub mod openflow;
pub mod policy_maps;
pub mod premark_dscp;
pub mod static_lag_interfaces;
pub mod static_routes;
pub mod vrfs;
pub mod vxlan;

pub use acl::Acl;
pub use acl_interfaces::AclInterfaces;
pub use bgp::Bgp;
pub use class_maps::ClassMaps;
pub use interfaces::Interfaces;
pub use l2_interfaces::L2Interfaces;
pub use l3_interfaces::L3Interfaces;
pub use lldp_interfaces::LldpInterfaces;
pub use mlag::Mlag;
pub use openflow::Openflow;
pub use policy_maps::PolicyMaps;
pub use premark_dscp::PremarkDscp;
pub use static_lag_interfaces::StaticLagInterfaces;
pub use static_routes::StaticRoutes;
pub use vrfs::Vrfs;
pub use vxlan::Vxlan;

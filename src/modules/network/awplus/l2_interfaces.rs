//! Layer 2 switchport configuration: access and trunk modes
//!
//! Access VLAN 1 is the device default. Trunk allowed VLANs are diffed as a
//! set and each VLAN gets its own `add`/`remove` command.

use crate::modules::network::common::{
    ensure_unique, expand_want, walk_records, CommandSet, ContextLines, InterfaceRecord,
    Reconciler, State, VlanSet,
};
use crate::modules::network::diff::{Absent, FieldChange};
use crate::modules::{ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};

const DEFAULT_ACCESS_VLAN: u16 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrunkConfig {
    #[serde(default, skip_serializing_if = "VlanSet::is_empty")]
    pub allowed_vlans: VlanSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_vlan: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct L2InterfaceConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trunk: Option<TrunkConfig>,
}

impl L2InterfaceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn validate(&self) -> ModuleResult<()> {
        if self.access.is_some() && self.trunk.is_some() {
            return Err(ModuleError::InvalidParameter(format!(
                "access and trunk are mutually exclusive on {}",
                self.name
            )));
        }
        if let Some(vlan) = self.access.as_ref().and_then(|a| a.vlan) {
            VlanSet([vlan].into_iter().collect()).validate(&format!("{} access vlan", self.name))?;
        }
        if let Some(trunk) = &self.trunk {
            trunk
                .allowed_vlans
                .validate(&format!("{} trunk allowed vlan", self.name))?;
            if let Some(native) = trunk.native_vlan {
                VlanSet([native].into_iter().collect())
                    .validate(&format!("{} trunk native vlan", self.name))?;
            }
        }
        Ok(())
    }
}

impl InterfaceRecord for L2InterfaceConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }
}

/// Reconciler for `awplus_l2_interfaces`
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Interfaces;

fn clear_access(lines: &mut ContextLines, have: Option<&AccessConfig>) {
    let vlan = have.and_then(|a| a.vlan.as_ref());
    if let FieldChange::Clear(_) = FieldChange::clear(vlan, Some(&DEFAULT_ACCESS_VLAN)) {
        lines.clear("switchport mode access");
        lines.clear("no switchport access vlan");
    }
}

/// Remove trunk settings; `only` restricts removal to the fields it names
fn clear_trunk(lines: &mut ContextLines, have: &TrunkConfig, only: Option<&TrunkConfig>) {
    let vlans: Vec<&u16> = match only {
        Some(only) if !only.allowed_vlans.is_empty() => have
            .allowed_vlans
            .iter()
            .filter(|v| only.allowed_vlans.0.contains(*v))
            .collect(),
        Some(_) => Vec::new(),
        None => have.allowed_vlans.iter().collect(),
    };
    for vlan in vlans {
        lines.clear(format!("switchport trunk allowed vlan remove {}", vlan));
    }
    if only.map_or(true, |o| o.native_vlan.is_some()) && have.native_vlan.is_some() {
        lines.clear("no switchport trunk native vlan");
    }
    if only.is_none() {
        lines.clear("switchport mode access");
    }
}

fn set_l2(
    commands: &mut CommandSet,
    have: Option<&L2InterfaceConfig>,
    want: &L2InterfaceConfig,
    absent: Absent,
) {
    let empty = L2InterfaceConfig::new(want.name.clone());
    let have = have.unwrap_or(&empty);
    let clear_omitted = absent == Absent::Clear;
    let mut lines = ContextLines::new();
    let mut trunk_mode = have.trunk.is_some();

    if clear_omitted && want.trunk.is_none() {
        if let Some(trunk) = &have.trunk {
            clear_trunk(&mut lines, trunk, None);
            trunk_mode = false;
        }
    }
    if clear_omitted && want.access.is_none() && !trunk_mode {
        clear_access(&mut lines, have.access.as_ref());
    }

    if let Some(access) = &want.access {
        let have_vlan = if trunk_mode {
            lines.set("switchport mode access");
            None
        } else {
            have.access.as_ref().and_then(|a| a.vlan.as_ref())
        };
        match FieldChange::between(
            have_vlan,
            access.vlan.as_ref(),
            Some(&DEFAULT_ACCESS_VLAN),
            absent,
        ) {
            FieldChange::Set(vlan) => lines.set(format!("switchport access vlan {}", vlan)),
            FieldChange::Clear(_) => lines.clear("no switchport access vlan"),
            FieldChange::Unchanged => {}
        }
    }

    if let Some(trunk) = &want.trunk {
        let empty_trunk = TrunkConfig::default();
        let have_trunk = if trunk_mode {
            have.trunk.as_ref().unwrap_or(&empty_trunk)
        } else {
            lines.set("switchport mode trunk");
            &empty_trunk
        };
        for vlan in trunk.allowed_vlans.iter() {
            if !have_trunk.allowed_vlans.0.contains(vlan) {
                lines.set(format!("switchport trunk allowed vlan add {}", vlan));
            }
        }
        if clear_omitted {
            for vlan in have_trunk.allowed_vlans.iter() {
                if !trunk.allowed_vlans.0.contains(vlan) {
                    lines.clear(format!("switchport trunk allowed vlan remove {}", vlan));
                }
            }
        }
        lines.field(
            FieldChange::between(
                have_trunk.native_vlan.as_ref(),
                trunk.native_vlan.as_ref(),
                None,
                absent,
            ),
            |v| format!("switchport trunk native vlan {}", v),
            |_| "no switchport trunk native vlan".to_string(),
        );
    }

    commands.extend_within(&format!("interface {}", want.name), lines.into_lines());
}

fn clear_l2(
    commands: &mut CommandSet,
    have: &L2InterfaceConfig,
    want: Option<&L2InterfaceConfig>,
) {
    let mut lines = ContextLines::new();
    let all = want.map_or(true, |w| w.access.is_none() && w.trunk.is_none());

    if let Some(trunk) = &have.trunk {
        if all {
            clear_trunk(&mut lines, trunk, None);
        } else if let Some(only) = want.and_then(|w| w.trunk.as_ref()) {
            clear_trunk(&mut lines, trunk, Some(only));
        }
    } else if all || want.is_some_and(|w| w.access.is_some()) {
        clear_access(&mut lines, have.access.as_ref());
    }

    commands.extend_within(&format!("interface {}", have.name), lines.into_lines());
}

impl Reconciler for L2Interfaces {
    type Config = Vec<L2InterfaceConfig>;

    const MODULE: &'static str = "awplus_l2_interfaces";
    const RESOURCE: &'static str = "l2_interfaces";
    const DESCRIPTION: &'static str =
        "Manage access and trunk switchport configuration on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        ensure_unique(have, "interface", |i| i.name.clone())?;
        let want = expand_want(want, have)?;
        for interface in &want {
            interface.validate()?;
        }

        let mut commands = CommandSet::new();
        walk_records(
            state,
            &want,
            have,
            |i| i.name.clone(),
            &mut commands,
            |commands, h, w, absent| {
                set_l2(commands, h, w, absent);
                Ok(())
            },
            |commands, h, w| {
                clear_l2(commands, h, w);
                Ok(())
            },
        )?;
        Ok(commands.into_commands())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn access(name: &str, vlan: u16) -> L2InterfaceConfig {
        L2InterfaceConfig {
            access: Some(AccessConfig { vlan: Some(vlan) }),
            ..L2InterfaceConfig::new(name)
        }
    }

    fn trunk(name: &str, vlans: &[u16], native: Option<u16>) -> L2InterfaceConfig {
        L2InterfaceConfig {
            trunk: Some(TrunkConfig {
                allowed_vlans: vlans.iter().copied().collect(),
                native_vlan: native,
            }),
            ..L2InterfaceConfig::new(name)
        }
    }

    #[test]
    fn test_deleted_access_port() {
        let want = vec![L2InterfaceConfig::new("port1.0.1")];
        let have = vec![access("port1.0.1", 5)];
        let commands = L2Interfaces
            .reconcile(State::Deleted, &want, &have)
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "interface port1.0.1",
                "switchport mode access",
                "no switchport access vlan",
            ]
        );
    }

    #[test]
    fn test_merged_adds_trunk_vlans_individually() {
        let want = vec![trunk("port1.0.2", &[2, 3, 4], None)];
        let have = vec![trunk("port1.0.2", &[2], Some(1))];
        let commands = L2Interfaces
            .reconcile(State::Merged, &want, &have)
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "interface port1.0.2",
                "switchport trunk allowed vlan add 3",
                "switchport trunk allowed vlan add 4",
            ]
        );
    }

    #[test]
    fn test_replaced_removes_unwanted_trunk_vlans() {
        let want = vec![trunk("port1.0.2", &[3], Some(3))];
        let have = vec![trunk("port1.0.2", &[2, 3], Some(1))];
        let commands = L2Interfaces
            .reconcile(State::Replaced, &want, &have)
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "interface port1.0.2",
                "switchport trunk allowed vlan remove 2",
                "switchport trunk native vlan 3",
            ]
        );
    }

    #[test]
    fn test_mode_change_precedes_mode_specific_commands() {
        let want = vec![trunk("port1.0.3", &[10], None)];
        let have = vec![L2InterfaceConfig::new("port1.0.3")];
        let commands = L2Interfaces
            .reconcile(State::Merged, &want, &have)
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "interface port1.0.3",
                "switchport mode trunk",
                "switchport trunk allowed vlan add 10",
            ]
        );
    }

    #[test]
    fn test_overridden_returns_trunk_to_access() {
        let want = vec![access("port1.0.1", 7)];
        let have = vec![access("port1.0.1", 7), trunk("port1.0.2", &[5], Some(5))];
        let commands = L2Interfaces
            .reconcile(State::Overridden, &want, &have)
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "interface port1.0.2",
                "switchport trunk allowed vlan remove 5",
                "no switchport trunk native vlan",
                "switchport mode access",
            ]
        );
    }

    #[test]
    fn test_access_vlan_one_is_default() {
        let want = vec![access("port1.0.1", 1)];
        let have = vec![L2InterfaceConfig::new("port1.0.1")];
        assert!(L2Interfaces
            .reconcile(State::Merged, &want, &have)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_access_and_trunk_are_exclusive() {
        let mut both = access("port1.0.1", 2);
        both.trunk = Some(TrunkConfig::default());
        let have = vec![L2InterfaceConfig::new("port1.0.1")];
        assert!(L2Interfaces
            .reconcile(State::Merged, &vec![both], &have)
            .is_err());
    }

    #[test]
    fn test_allowed_vlans_accept_ranges() {
        let config: L2InterfaceConfig = serde_json::from_value(serde_json::json!({
            "name": "port1.0.1",
            "trunk": {"allowed_vlans": ["2-4", 8]}
        }))
        .unwrap();
        let vlans: Vec<u16> = config.trunk.unwrap().allowed_vlans.iter().copied().collect();
        assert_eq!(vlans, vec![2, 3, 4, 8]);
    }
}

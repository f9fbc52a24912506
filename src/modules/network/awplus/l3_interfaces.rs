//! Layer 3 interface configuration: VRF binding and IPv4/IPv6 addresses
//!
//! Binding an interface to a different VRF removes every address configured
//! on it, so the addresses that must remain are emitted again after the
//! `ip vrf forwarding` change.

use crate::modules::network::common::{
    check_prefix, ensure_unique, expand_want, walk_records, Afi, CommandSet, ContextLines,
    InterfaceRecord, Reconciler, State,
};
use crate::modules::network::diff::{Absent, FieldChange};
use crate::modules::ModuleResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ipv4Address {
    /// `a.b.c.d/len` or `dhcp`
    pub address: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub secondary: bool,
}

impl Ipv4Address {
    fn line(&self) -> String {
        if self.secondary {
            format!("ip address {} secondary", self.address)
        } else {
            format!("ip address {}", self.address)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ipv6Address {
    pub address: String,
}

impl Ipv6Address {
    fn line(&self) -> String {
        format!("ipv6 address {}", self.address)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct L3InterfaceConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrf: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv4: Vec<Ipv4Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv6: Vec<Ipv6Address>,
}

impl L3InterfaceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn validate(&self) -> ModuleResult<()> {
        for v4 in &self.ipv4 {
            if v4.address != "dhcp" {
                check_prefix(&format!("{} ipv4 address", self.name), &v4.address, Afi::Ipv4)?;
            }
        }
        for v6 in &self.ipv6 {
            check_prefix(&format!("{} ipv6 address", self.name), &v6.address, Afi::Ipv6)?;
        }
        ensure_unique(&self.ipv4, "ipv4 address", |a| a.address.clone())?;
        ensure_unique(&self.ipv6, "ipv6 address", |a| a.address.clone())?;
        Ok(())
    }
}

impl InterfaceRecord for L3InterfaceConfig {
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

/// Reconciler for `awplus_l3_interfaces`
#[derive(Debug, Clone, Copy, Default)]
pub struct L3Interfaces;

/// Secondary addresses must go before the primary one
fn remove_ipv4(lines: &mut ContextLines, addresses: &[&Ipv4Address]) {
    let (secondary, primary): (Vec<&&Ipv4Address>, Vec<&&Ipv4Address>) =
        addresses.iter().partition(|a| a.secondary);
    for address in secondary.into_iter().chain(primary) {
        lines.clear(format!("no {}", address.line()));
    }
}

fn set_l3(
    commands: &mut CommandSet,
    have: Option<&L3InterfaceConfig>,
    want: &L3InterfaceConfig,
    absent: Absent,
) {
    let empty = L3InterfaceConfig::new(want.name.clone());
    let have = have.unwrap_or(&empty);
    let mut lines = ContextLines::new();

    let vrf_change = FieldChange::between(have.vrf.as_ref(), want.vrf.as_ref(), None, absent);
    let rebound = !vrf_change.is_unchanged();
    lines.field(
        vrf_change,
        |v| format!("ip vrf forwarding {}", v),
        |_| "no ip vrf forwarding".to_string(),
    );

    if rebound {
        // Every address was dropped with the old binding.
        let mut v4: Vec<&Ipv4Address> = want.ipv4.iter().collect();
        let mut v6: Vec<&Ipv6Address> = want.ipv6.iter().collect();
        if absent == Absent::Ignore {
            v4.extend(have.ipv4.iter().filter(|a| !want.ipv4.contains(a)));
            v6.extend(have.ipv6.iter().filter(|a| !want.ipv6.contains(a)));
        }
        for address in v4 {
            lines.set(address.line());
        }
        for address in v6 {
            lines.set(address.line());
        }
    } else {
        if absent == Absent::Clear {
            let stale: Vec<&Ipv4Address> = have
                .ipv4
                .iter()
                .filter(|a| !want.ipv4.contains(a))
                .collect();
            remove_ipv4(&mut lines, &stale);
            for address in have.ipv6.iter().filter(|a| !want.ipv6.contains(a)) {
                lines.clear(format!("no {}", address.line()));
            }
        }
        for address in want.ipv4.iter().filter(|a| !have.ipv4.contains(a)) {
            lines.set(address.line());
        }
        for address in want.ipv6.iter().filter(|a| !have.ipv6.contains(a)) {
            lines.set(address.line());
        }
    }

    commands.extend_within(&format!("interface {}", want.name), lines.into_lines());
}

fn clear_l3(
    commands: &mut CommandSet,
    have: &L3InterfaceConfig,
    want: Option<&L3InterfaceConfig>,
) {
    let all = want.map_or(true, |w| w.vrf.is_none() && w.ipv4.is_empty() && w.ipv6.is_empty());
    let mut lines = ContextLines::new();

    let v4: Vec<&Ipv4Address> = match want {
        Some(w) if !all => have.ipv4.iter().filter(|a| w.ipv4.contains(a)).collect(),
        _ => have.ipv4.iter().collect(),
    };
    remove_ipv4(&mut lines, &v4);
    let v6: Vec<&Ipv6Address> = match want {
        Some(w) if !all => have.ipv6.iter().filter(|a| w.ipv6.contains(a)).collect(),
        _ => have.ipv6.iter().collect(),
    };
    for address in v6 {
        lines.clear(format!("no {}", address.line()));
    }
    if all || want.is_some_and(|w| w.vrf.is_some()) {
        lines.field(
            FieldChange::clear(have.vrf.as_ref(), None),
            String::clone,
            |_| "no ip vrf forwarding".to_string(),
        );
    }

    commands.extend_within(&format!("interface {}", have.name), lines.into_lines());
}

impl Reconciler for L3Interfaces {
    type Config = Vec<L3InterfaceConfig>;

    const MODULE: &'static str = "awplus_l3_interfaces";
    const RESOURCE: &'static str = "l3_interfaces";
    const DESCRIPTION: &'static str =
        "Manage interface VRF binding and IPv4/IPv6 addresses on AlliedWare Plus";

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
                set_l3(commands, h, w, absent);
                Ok(())
            },
            |commands, h, w| {
                clear_l3(commands, h, w);
                Ok(())
            },
        )?;
        Ok(commands.into_commands())
    }
}

//! VLAN to VNI mappings under `nvo vxlan`
//!
//! A mapping is an atomic pair: changing the VNI of a VLAN removes the old
//! pair before adding the new one. After the change every VLAN and every VNI
//! may be used by at most one mapping. `deleted` removes a mapping only when
//! both its VLAN and its VNI match.

use crate::modules::network::common::{
    check_range, ensure_unique, CommandSet, ContextLines, Reconciler, State,
};
use crate::modules::network::diff::KeyedDiff;
use crate::modules::{ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use tracing::warn;

const CONTEXT: &str = "nvo vxlan";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VxlanMapping {
    pub vlan: u16,
    pub vni: u32,
}

impl VxlanMapping {
    pub fn new(vlan: u16, vni: u32) -> Self {
        Self { vlan, vni }
    }

    fn line(&self) -> String {
        format!("map vlan {} vni {}", self.vlan, self.vni)
    }

    fn validate(&self) -> ModuleResult<()> {
        check_range("vlan", self.vlan, 1, 4094)?;
        check_range("vni", self.vni, 1, 16_777_215)
    }
}

/// Use counts of VLANs and VNIs, seeded from the device and updated per change
#[derive(Debug, Default)]
struct UsageLedger {
    vlans: HashMap<u16, i64>,
    vnis: HashMap<u32, i64>,
}

impl UsageLedger {
    fn seeded(have: &[VxlanMapping]) -> Self {
        let mut ledger = Self::default();
        for mapping in have {
            ledger.add(mapping);
        }
        ledger
    }

    fn add(&mut self, mapping: &VxlanMapping) {
        *self.vlans.entry(mapping.vlan).or_default() += 1;
        *self.vnis.entry(mapping.vni).or_default() += 1;
    }

    fn remove(&mut self, mapping: &VxlanMapping) {
        *self.vlans.entry(mapping.vlan).or_default() -= 1;
        *self.vnis.entry(mapping.vni).or_default() -= 1;
    }

    fn check(&self) -> ModuleResult<()> {
        fn overused<K: Copy + Ord>(counts: &HashMap<K, i64>) -> Option<K> {
            counts
                .iter()
                .filter(|(_, count)| **count > 1)
                .map(|(k, _)| *k)
                .min()
        }
        if let Some(vlan) = overused(&self.vlans) {
            return Err(ModuleError::InvariantViolation(format!(
                "vlan {} would be mapped to more than one vni",
                vlan
            )));
        }
        if let Some(vni) = overused(&self.vnis) {
            return Err(ModuleError::InvariantViolation(format!(
                "vni {} would be mapped to more than one vlan",
                vni
            )));
        }
        Ok(())
    }
}

/// Removals and additions, tracked against the ledger
struct Changes {
    lines: ContextLines,
    ledger: UsageLedger,
}

impl Changes {
    fn new(have: &[VxlanMapping]) -> Self {
        Self {
            lines: ContextLines::new(),
            ledger: UsageLedger::seeded(have),
        }
    }

    fn unmap(&mut self, mapping: &VxlanMapping) {
        self.ledger.remove(mapping);
        self.lines.clear(format!("no {}", mapping.line()));
    }

    fn map(&mut self, mapping: &VxlanMapping) {
        self.ledger.add(mapping);
        self.lines.set(mapping.line());
    }

    fn finish(self) -> ModuleResult<Vec<String>> {
        self.ledger.check()?;
        let mut commands = CommandSet::new();
        commands.extend_within(CONTEXT, self.lines.into_lines());
        Ok(commands.into_commands())
    }
}

fn ensure_unique_by<K, F>(mappings: &[VxlanMapping], what: &str, key: F) -> ModuleResult<()>
where
    K: Eq + Hash + std::fmt::Display,
    F: Fn(&VxlanMapping) -> K,
{
    ensure_unique(mappings, what, key).map_err(|e| match e {
        ModuleError::InvalidParameter(msg) => {
            ModuleError::InvalidParameter(format!("duplicate mapping: {}", msg))
        }
        other => other,
    })
}

/// Reconciler for `awplus_vxlan`
#[derive(Debug, Clone, Copy, Default)]
pub struct Vxlan;

impl Reconciler for Vxlan {
    type Config = Vec<VxlanMapping>;

    const MODULE: &'static str = "awplus_vxlan";
    const RESOURCE: &'static str = "vxlan";
    const DESCRIPTION: &'static str = "Manage VLAN to VNI mappings on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        for mapping in want {
            mapping.validate()?;
        }
        ensure_unique_by(want, "vlan", |m| m.vlan)?;
        if state != State::Deleted {
            ensure_unique_by(want, "vni", |m| m.vni)?;
        }

        let mut changes = Changes::new(have);
        let diff = KeyedDiff::new(have, want, |m| m.vlan);
        match state {
            State::Merged | State::Replaced | State::Overridden => {
                if state == State::Overridden {
                    for mapping in &diff.have_only {
                        changes.unmap(mapping);
                    }
                }
                for (h, w) in &diff.pairs {
                    match h {
                        Some(h) if *h == *w => {}
                        Some(h) => {
                            changes.unmap(h);
                            changes.map(w);
                        }
                        None => changes.map(w),
                    }
                }
            }
            State::Deleted if want.is_empty() => {
                for mapping in have {
                    changes.unmap(mapping);
                }
            }
            State::Deleted => {
                // only a pair configured exactly as named is removed
                for (h, w) in &diff.pairs {
                    match h {
                        Some(h) if *h == *w => changes.unmap(h),
                        Some(h) => warn!(
                            vlan = w.vlan,
                            vni = w.vni,
                            configured_vni = h.vni,
                            "mapping not configured, skipping"
                        ),
                        None => {}
                    }
                }
            }
        }
        changes.finish()
    }
}

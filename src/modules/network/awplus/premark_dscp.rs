//! Premark-DSCP map: remapping of incoming DSCP values
//!
//! Every incoming DSCP value has an entry on the device. An entry that maps
//! to itself with CoS 0 and the green bandwidth class is the default.

use crate::modules::network::common::{
    check_range, ensure_unique, walk_records, CommandSet, Reconciler, State,
};
use crate::modules::network::diff::Absent;
use crate::modules::ModuleResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandwidthClass {
    #[default]
    Green,
    Yellow,
    Red,
}

impl fmt::Display for BandwidthClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandwidthClass::Green => write!(f, "green"),
            BandwidthClass::Yellow => write!(f, "yellow"),
            BandwidthClass::Red => write!(f, "red"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PremarkDscpConfig {
    pub dscp_in: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dscp_new: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos_new: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_new: Option<BandwidthClass>,
}

/// Fully resolved map entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mapping {
    dscp: u8,
    cos: u8,
    class: BandwidthClass,
}

impl Mapping {
    fn default_for(dscp_in: u8) -> Self {
        Self {
            dscp: dscp_in,
            cos: 0,
            class: BandwidthClass::Green,
        }
    }

    /// Overlay the fields given in `entry` onto `self`
    fn overlay(self, entry: &PremarkDscpConfig) -> Self {
        Self {
            dscp: entry.dscp_new.unwrap_or(self.dscp),
            cos: entry.cos_new.unwrap_or(self.cos),
            class: entry.class_new.unwrap_or(self.class),
        }
    }
}

impl PremarkDscpConfig {
    fn current(&self) -> Mapping {
        Mapping::default_for(self.dscp_in).overlay(self)
    }

    fn is_default(&self) -> bool {
        self.current() == Mapping::default_for(self.dscp_in)
    }

    fn has_target(&self) -> bool {
        self.dscp_new.is_some() || self.cos_new.is_some() || self.class_new.is_some()
    }

    fn validate(&self) -> ModuleResult<()> {
        check_range("dscp_in", self.dscp_in, 0, 63)?;
        if let Some(dscp) = self.dscp_new {
            check_range("dscp_new", dscp, 0, 63)?;
        }
        if let Some(cos) = self.cos_new {
            check_range("cos_new", cos, 0, 7)?;
        }
        Ok(())
    }
}

fn reset_line(dscp_in: u8) -> String {
    format!("no mls qos map premark-dscp {}", dscp_in)
}

/// Reconciler for `awplus_premark_dscp`
#[derive(Debug, Clone, Copy, Default)]
pub struct PremarkDscp;

fn set_mapping(
    commands: &mut CommandSet,
    have: Option<&PremarkDscpConfig>,
    want: &PremarkDscpConfig,
    absent: Absent,
) {
    let current = have
        .map(PremarkDscpConfig::current)
        .unwrap_or_else(|| Mapping::default_for(want.dscp_in));
    let base = match absent {
        Absent::Ignore => current,
        Absent::Clear => Mapping::default_for(want.dscp_in),
    };
    let target = base.overlay(want);
    if target == current {
        return;
    }
    if target == Mapping::default_for(want.dscp_in) {
        commands.global(reset_line(want.dscp_in));
        return;
    }

    let mut line = format!("mls qos map premark-dscp {} to", want.dscp_in);
    if target.dscp != current.dscp {
        line.push_str(&format!(" new-dscp {}", target.dscp));
    }
    if target.cos != current.cos {
        line.push_str(&format!(" new-cos {}", target.cos));
    }
    if target.class != current.class {
        line.push_str(&format!(" new-bandwidth-class {}", target.class));
    }
    commands.global(line);
}

impl Reconciler for PremarkDscp {
    type Config = Vec<PremarkDscpConfig>;

    const MODULE: &'static str = "awplus_premark_dscp";
    const RESOURCE: &'static str = "premark_dscp";
    const DESCRIPTION: &'static str = "Manage the premark-DSCP map on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        ensure_unique(want, "dscp_in", |e| e.dscp_in)?;
        for entry in want {
            entry.validate()?;
        }

        let mut commands = CommandSet::new();
        walk_records(
            state,
            want,
            have,
            |e| e.dscp_in,
            &mut commands,
            |commands, h, w, absent| {
                set_mapping(commands, h, w, absent);
                Ok(())
            },
            |commands, h, w| {
                if let Some(w) = w.filter(|w| w.has_target()) {
                    warn!(
                        dscp_in = w.dscp_in,
                        "deleted resets the whole entry, target fields ignored"
                    );
                }
                if !h.is_default() {
                    commands.global(reset_line(h.dscp_in));
                }
                Ok(())
            },
        )?;
        Ok(commands.into_commands())
    }
}

//! Per-interface LLDP: receive/transmit, notifications and TLV selection
//!
//! Every setting is a flag with a device default; clearing a flag restores
//! the default rather than always negating it.

use crate::modules::network::common::{
    ensure_unique, expand_want, walk_records, CommandSet, ContextLines, InterfaceRecord,
    Reconciler, State,
};
use crate::modules::network::diff::{Absent, FieldChange};
use crate::modules::ModuleResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlvSelect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_address: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_description: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_capabilities: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_description: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_name: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MedTlvSelect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_management: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_policy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_management: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LldpInterfaceConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tlv_select: Option<TlvSelect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub med_tlv_select: Option<MedTlvSelect>,
}

/// One LLDP flag: command, configured value, device default
type Flag = (&'static str, Option<bool>, bool);

impl LldpInterfaceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn flags(&self) -> [Flag; 13] {
        let tlv = self.tlv_select.clone().unwrap_or_default();
        let med = self.med_tlv_select.clone().unwrap_or_default();
        [
            ("lldp receive", self.receive, true),
            ("lldp transmit", self.transmit, true),
            ("lldp notifications", self.notifications, false),
            (
                "lldp tlv-select management-address",
                tlv.management_address,
                false,
            ),
            ("lldp tlv-select port-description", tlv.port_description, false),
            (
                "lldp tlv-select system-capabilities",
                tlv.system_capabilities,
                false,
            ),
            (
                "lldp tlv-select system-description",
                tlv.system_description,
                false,
            ),
            ("lldp tlv-select system-name", tlv.system_name, false),
            ("lldp med-tlv-select capabilities", med.capabilities, true),
            (
                "lldp med-tlv-select inventory-management",
                med.inventory_management,
                false,
            ),
            ("lldp med-tlv-select location", med.location, true),
            ("lldp med-tlv-select network-policy", med.network_policy, true),
            (
                "lldp med-tlv-select power-management-ext",
                med.power_management,
                true,
            ),
        ]
    }
}

impl InterfaceRecord for LldpInterfaceConfig {
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

/// Reconciler for `awplus_lldp_interfaces`
#[derive(Debug, Clone, Copy, Default)]
pub struct LldpInterfaces;

fn flag_line(command: &str, enabled: bool) -> String {
    if enabled {
        command.to_string()
    } else {
        format!("no {}", command)
    }
}

fn set_lldp(
    commands: &mut CommandSet,
    have: Option<&LldpInterfaceConfig>,
    want: &LldpInterfaceConfig,
    absent: Absent,
) {
    let empty = LldpInterfaceConfig::new(want.name.clone());
    let have = have.unwrap_or(&empty);
    let mut lines = ContextLines::new();

    for ((command, have_value, default), (_, want_value, _)) in
        have.flags().into_iter().zip(want.flags())
    {
        lines.field(
            FieldChange::between(
                have_value.as_ref(),
                want_value.as_ref(),
                Some(&default),
                absent,
            ),
            |enabled| flag_line(command, *enabled),
            |_| flag_line(command, default),
        );
    }

    commands.extend_within(&format!("interface {}", want.name), lines.into_lines());
}

fn clear_lldp(
    commands: &mut CommandSet,
    have: &LldpInterfaceConfig,
    want: Option<&LldpInterfaceConfig>,
) {
    let want = want.cloned().unwrap_or_else(|| LldpInterfaceConfig::new(have.name.clone()));
    let all = want == LldpInterfaceConfig::new(want.name.clone());
    let mut lines = ContextLines::new();

    for ((command, have_value, default), (_, want_value, _)) in
        have.flags().into_iter().zip(want.flags())
    {
        if all || want_value.is_some() {
            lines.field(
                FieldChange::clear(have_value.as_ref(), Some(&default)),
                |enabled| flag_line(command, *enabled),
                |_| flag_line(command, default),
            );
        }
    }

    commands.extend_within(&format!("interface {}", have.name), lines.into_lines());
}

impl Reconciler for LldpInterfaces {
    type Config = Vec<LldpInterfaceConfig>;

    const MODULE: &'static str = "awplus_lldp_interfaces";
    const RESOURCE: &'static str = "lldp_interfaces";
    const DESCRIPTION: &'static str =
        "Manage per-interface LLDP transmission and TLV selection on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        ensure_unique(have, "interface", |i| i.name.clone())?;
        let want = expand_want(want, have)?;

        let mut commands = CommandSet::new();
        walk_records(
            state,
            &want,
            have,
            |i| i.name.clone(),
            &mut commands,
            |commands, h, w, absent| {
                set_lldp(commands, h, w, absent);
                Ok(())
            },
            |commands, h, w| {
                clear_lldp(commands, h, w);
                Ok(())
            },
        )?;
        Ok(commands.into_commands())
    }
}

//! ACL attachment to interfaces (`access-group`)

use crate::modules::network::common::{
    ensure_unique, walk_records, Afi, CommandSet, ContextLines, InterfaceId, Reconciler, State,
};
use crate::modules::network::diff::{list_diff, Absent};
use crate::modules::{ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AclName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessGroup {
    pub afi: Afi,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acls: Vec<AclName>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AclInterfaceConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_groups: Vec<AccessGroup>,
}

impl AclInterfaceConfig {
    /// Attached ACLs as (family, name) pairs
    fn attachments(&self) -> Vec<(Afi, String)> {
        self.access_groups
            .iter()
            .flat_map(|g| g.acls.iter().map(move |a| (g.afi, a.name.clone())))
            .collect()
    }

    fn validate(&self) -> ModuleResult<()> {
        if InterfaceId::parse(&self.name).is_none() {
            return Err(ModuleError::InvalidParameter(format!(
                "invalid interface name '{}'",
                self.name
            )));
        }
        ensure_unique(&self.access_groups, &format!("{} access group", self.name), |g| {
            g.afi
        })
    }
}

fn attach_line((afi, name): &(Afi, String)) -> String {
    match afi {
        Afi::Ipv4 => format!("access-group {}", name),
        Afi::Ipv6 => format!("ipv6 access-group {}", name),
    }
}

/// Reconciler for `awplus_acl_interfaces`
#[derive(Debug, Clone, Copy, Default)]
pub struct AclInterfaces;

fn set_attachments(
    commands: &mut CommandSet,
    have: Option<&AclInterfaceConfig>,
    want: &AclInterfaceConfig,
    absent: Absent,
) {
    let have = have.map(AclInterfaceConfig::attachments).unwrap_or_default();
    let diff = list_diff(&have, &want.attachments());
    let mut lines = ContextLines::new();
    if absent == Absent::Clear {
        for attachment in &diff.removed {
            lines.clear(format!("no {}", attach_line(attachment)));
        }
    }
    for attachment in &diff.added {
        lines.set(attach_line(attachment));
    }
    commands.extend_within(&format!("interface {}", want.name), lines.into_lines());
}

fn clear_attachments(
    commands: &mut CommandSet,
    have: &AclInterfaceConfig,
    want: Option<&AclInterfaceConfig>,
) {
    let named = want.map(AclInterfaceConfig::attachments).unwrap_or_default();
    let lines = have
        .attachments()
        .iter()
        .filter(|a| named.is_empty() || named.contains(a))
        .map(|a| format!("no {}", attach_line(a)))
        .collect::<Vec<_>>();
    commands.extend_within(&format!("interface {}", have.name), lines);
}

impl Reconciler for AclInterfaces {
    type Config = Vec<AclInterfaceConfig>;

    const MODULE: &'static str = "awplus_acl_interfaces";
    const RESOURCE: &'static str = "acl_interfaces";
    const DESCRIPTION: &'static str = "Manage ACL attachment to interfaces on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        ensure_unique(want, "interface", |i| i.name.clone())?;
        ensure_unique(have, "interface", |i| i.name.clone())?;
        for interface in want {
            interface.validate()?;
        }

        let mut commands = CommandSet::new();
        walk_records(
            state,
            want,
            have,
            |i| i.name.clone(),
            &mut commands,
            |commands, h, w, absent| {
                set_attachments(commands, h, w, absent);
                Ok(())
            },
            |commands, h, w| {
                clear_attachments(commands, h, w);
                Ok(())
            },
        )?;
        Ok(commands.into_commands())
    }
}

//! QoS class-maps: traffic classification rules (`match ...`)
//!
//! The `default` class-map always exists on the device and is never removed.

use crate::modules::network::common::{
    check_range, ensure_unique, walk_records, CommandSet, ContextLines, Reconciler, State,
};
use crate::modules::network::diff::{Absent, FieldChange};
use crate::modules::{ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_CLASS_MAP: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacType {
    L2bcast,
    L2mcast,
    L2ucast,
}

impl fmt::Display for MacType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacType::L2bcast => write!(f, "l2bcast"),
            MacType::L2mcast => write!(f, "l2mcast"),
            MacType::L2ucast => write!(f, "l2ucast"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TcpFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psh: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rst: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syn: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urg: Option<bool>,
}

impl TcpFlags {
    /// Names of the flags that are set
    fn set(&self) -> Vec<&'static str> {
        [
            ("ack", self.ack),
            ("fin", self.fin),
            ("psh", self.psh),
            ("rst", self.rst),
            ("syn", self.syn),
            ("urg", self.urg),
        ]
        .into_iter()
        .filter(|(_, on)| *on == Some(true))
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassMapConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dscp: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_cos: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_vlan: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_precedence: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_type: Option<MacType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_flags: Option<TcpFlags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan: Option<u16>,
}

impl ClassMapConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn header(&self) -> String {
        format!("class-map {}", self.name)
    }

    fn is_key_only(&self) -> bool {
        *self == Self::new(self.name.clone())
    }

    /// eth-format and protocol are configured together
    fn eth_format(&self) -> Option<(String, String)> {
        match (&self.eth_format, &self.protocol) {
            (Some(format), Some(protocol)) => Some((format.clone(), protocol.clone())),
            _ => None,
        }
    }

    fn validate(&self) -> ModuleResult<()> {
        let what = |field: &str| format!("class-map {} {}", self.name, field);
        if let Some(cos) = self.cos {
            check_range(&what("cos"), cos, 0, 7)?;
        }
        if let Some(dscp) = self.dscp {
            check_range(&what("dscp"), dscp, 0, 63)?;
        }
        if let Some(inner_cos) = self.inner_cos {
            check_range(&what("inner_cos"), inner_cos, 0, 7)?;
        }
        if let Some(inner_vlan) = self.inner_vlan {
            check_range(&what("inner_vlan"), inner_vlan, 1, 4094)?;
        }
        if let Some(precedence) = self.ip_precedence {
            check_range(&what("ip_precedence"), precedence, 0, 7)?;
        }
        if let Some(vlan) = self.vlan {
            check_range(&what("vlan"), vlan, 1, 4094)?;
        }
        if self.eth_format.is_some() != self.protocol.is_some() {
            return Err(ModuleError::InvalidParameter(format!(
                "class-map {}: eth_format and protocol must be given together",
                self.name
            )));
        }
        Ok(())
    }
}

/// Reconciler for `awplus_class_maps`
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassMaps;

fn match_field<T: PartialEq + fmt::Display>(
    lines: &mut ContextLines,
    have: Option<&T>,
    want: Option<&T>,
    absent: Absent,
    keyword: &str,
) {
    lines.field(
        FieldChange::between(have, want, None, absent),
        |v| format!("match {} {}", keyword, v),
        |_| format!("no match {}", keyword),
    );
}

fn set_class_map(
    commands: &mut CommandSet,
    have: Option<&ClassMapConfig>,
    want: &ClassMapConfig,
    absent: Absent,
) {
    let empty = ClassMapConfig::new(want.name.clone());
    let header = want.header();
    if have.is_none() {
        commands.enter(header.clone());
    }
    let have = have.unwrap_or(&empty);
    let mut lines = ContextLines::new();

    match FieldChange::between(
        have.access_group.as_ref(),
        want.access_group.as_ref(),
        None,
        absent,
    ) {
        FieldChange::Set(acl) => {
            if let Some(old) = &have.access_group {
                lines.clear(format!("no match access-group {}", old));
            }
            lines.set(format!("match access-group {}", acl));
        }
        FieldChange::Clear(old) => lines.clear(format!("no match access-group {}", old)),
        FieldChange::Unchanged => {}
    }
    match_field(&mut lines, have.cos.as_ref(), want.cos.as_ref(), absent, "cos");
    match_field(&mut lines, have.dscp.as_ref(), want.dscp.as_ref(), absent, "dscp");
    lines.field(
        FieldChange::between(
            have.eth_format().as_ref(),
            want.eth_format().as_ref(),
            None,
            absent,
        ),
        |(format, protocol)| format!("match eth-format {} protocol {}", format, protocol),
        |_| "no match eth-format protocol".to_string(),
    );
    match_field(
        &mut lines,
        have.inner_cos.as_ref(),
        want.inner_cos.as_ref(),
        absent,
        "inner-cos",
    );
    match_field(
        &mut lines,
        have.inner_vlan.as_ref(),
        want.inner_vlan.as_ref(),
        absent,
        "inner-vlan",
    );
    match_field(
        &mut lines,
        have.ip_precedence.as_ref(),
        want.ip_precedence.as_ref(),
        absent,
        "ip-precedence",
    );
    match_field(
        &mut lines,
        have.mac_type.as_ref(),
        want.mac_type.as_ref(),
        absent,
        "mac-type",
    );

    let have_flags = have.tcp_flags.as_ref().map(TcpFlags::set).unwrap_or_default();
    match want.tcp_flags.as_ref().map(TcpFlags::set) {
        Some(want_flags) => {
            let added: Vec<&str> = want_flags
                .iter()
                .copied()
                .filter(|f| !have_flags.contains(f))
                .collect();
            if !added.is_empty() {
                lines.set(format!("match tcp-flags {}", added.join(" ")));
            }
            if absent == Absent::Clear {
                let removed: Vec<&str> = have_flags
                    .iter()
                    .copied()
                    .filter(|f| !want_flags.contains(f))
                    .collect();
                if !removed.is_empty() {
                    lines.clear(format!("no match tcp-flags {}", removed.join(" ")));
                }
            }
        }
        None if absent == Absent::Clear && !have_flags.is_empty() => {
            lines.clear(format!("no match tcp-flags {}", have_flags.join(" ")));
        }
        None => {}
    }

    match_field(&mut lines, have.vlan.as_ref(), want.vlan.as_ref(), absent, "vlan");

    commands.extend_within(&header, lines.into_lines());
}

fn clear_class_map(
    commands: &mut CommandSet,
    have: &ClassMapConfig,
    want: Option<&ClassMapConfig>,
) {
    match want {
        Some(want) if !want.is_key_only() => {
            // only the named matches
            let mut mask = ClassMapConfig::new(have.name.clone());
            if want.access_group.is_none() {
                mask.access_group = have.access_group.clone();
            }
            if want.cos.is_none() {
                mask.cos = have.cos;
            }
            if want.dscp.is_none() {
                mask.dscp = have.dscp;
            }
            if want.eth_format.is_none() && want.protocol.is_none() {
                mask.eth_format = have.eth_format.clone();
                mask.protocol = have.protocol.clone();
            }
            if want.inner_cos.is_none() {
                mask.inner_cos = have.inner_cos;
            }
            if want.inner_vlan.is_none() {
                mask.inner_vlan = have.inner_vlan;
            }
            if want.ip_precedence.is_none() {
                mask.ip_precedence = have.ip_precedence;
            }
            if want.mac_type.is_none() {
                mask.mac_type = have.mac_type;
            }
            if want.tcp_flags.is_none() {
                mask.tcp_flags = have.tcp_flags.clone();
            }
            if want.vlan.is_none() {
                mask.vlan = have.vlan;
            }
            set_class_map(commands, Some(have), &mask, Absent::Clear);
        }
        _ if have.name == DEFAULT_CLASS_MAP => {
            set_class_map(
                commands,
                Some(have),
                &ClassMapConfig::new(DEFAULT_CLASS_MAP),
                Absent::Clear,
            );
        }
        _ => commands.global(format!("no class-map {}", have.name)),
    }
}

impl Reconciler for ClassMaps {
    type Config = Vec<ClassMapConfig>;

    const MODULE: &'static str = "awplus_class_maps";
    const RESOURCE: &'static str = "class_maps";
    const DESCRIPTION: &'static str = "Manage QoS class-maps on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        ensure_unique(want, "class-map", |c| c.name.clone())?;
        ensure_unique(have, "class-map", |c| c.name.clone())?;
        if state != State::Deleted {
            for class_map in want {
                class_map.validate()?;
            }
        }

        let mut commands = CommandSet::new();
        walk_records(
            state,
            want,
            have,
            |c| c.name.clone(),
            &mut commands,
            |commands, h, w, absent| {
                set_class_map(commands, h, w, absent);
                Ok(())
            },
            |commands, h, w| {
                clear_class_map(commands, h, w);
                Ok(())
            },
        )?;
        Ok(commands.into_commands())
    }
}

//! Interface attributes: description, speed, duplex, mtu and admin state
//!
//! A want `name` may hold a comma separated list and ranges
//! (`port1.0.1-1.0.4,vlan2`); it is expanded against the interfaces present
//! on the device before reconciling.

use crate::modules::network::common::{
    check_range, ensure_unique, expand_want, string_or_number, walk_records, CommandSet,
    ContextLines, InterfaceRecord, Reconciler, State,
};
use crate::modules::network::diff::{Absent, FieldChange};
use crate::modules::ModuleResult;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Duplex {
    Full,
    Half,
    Auto,
}

impl fmt::Display for Duplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Duplex::Full => write!(f, "full"),
            Duplex::Half => write!(f, "half"),
            Duplex::Auto => write!(f, "auto"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterfaceConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplex: Option<Duplex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
}

impl InterfaceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn validate(&self) -> ModuleResult<()> {
        if let Some(mtu) = self.mtu {
            check_range(&format!("{} mtu", self.name), mtu, 68, 1582)?;
        }
        Ok(())
    }

    fn is_key_only(&self) -> bool {
        *self == Self::new(self.name.clone())
    }
}

impl InterfaceRecord for InterfaceConfig {
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

/// Reconciler for `awplus_interfaces`
#[derive(Debug, Clone, Copy, Default)]
pub struct Interfaces;

fn enabled_line(enabled: &bool) -> String {
    if *enabled {
        "no shutdown".to_string()
    } else {
        "shutdown".to_string()
    }
}

fn set_interface(
    commands: &mut CommandSet,
    have: Option<&InterfaceConfig>,
    want: &InterfaceConfig,
    absent: Absent,
) {
    let empty = InterfaceConfig::new(want.name.clone());
    let have = have.unwrap_or(&empty);
    let mut lines = ContextLines::new();

    lines.field(
        FieldChange::between(
            have.description.as_ref(),
            want.description.as_ref(),
            None,
            absent,
        ),
        |d| format!("description {}", d),
        |_| "no description".to_string(),
    );
    lines.field(
        FieldChange::between(have.speed.as_ref(), want.speed.as_ref(), None, absent),
        |s| format!("speed {}", s),
        |_| "no speed".to_string(),
    );
    lines.field(
        FieldChange::between(have.duplex.as_ref(), want.duplex.as_ref(), None, absent),
        |d| format!("duplex {}", d),
        |_| "no duplex".to_string(),
    );
    lines.field(
        FieldChange::between(have.mtu.as_ref(), want.mtu.as_ref(), None, absent),
        |m| format!("mtu {}", m),
        |_| "no mtu".to_string(),
    );
    lines.field(
        FieldChange::between(have.enabled.as_ref(), want.enabled.as_ref(), Some(&true), absent),
        enabled_line,
        |_| "no shutdown".to_string(),
    );

    commands.extend_within(&format!("interface {}", want.name), lines.into_lines());
}

fn clear_interface(commands: &mut CommandSet, have: &InterfaceConfig, want: Option<&InterfaceConfig>) {
    let all = want.map_or(true, InterfaceConfig::is_key_only);
    let named = |field: bool| all || field;
    let want = want.cloned().unwrap_or_default();
    let mut lines = ContextLines::new();

    if named(want.description.is_some()) {
        lines.field(
            FieldChange::clear(have.description.as_ref(), None),
            String::clone,
            |_| "no description".to_string(),
        );
    }
    if named(want.speed.is_some()) {
        lines.field(
            FieldChange::clear(have.speed.as_ref(), None),
            String::clone,
            |_| "no speed".to_string(),
        );
    }
    if named(want.duplex.is_some()) {
        lines.field(
            FieldChange::clear(have.duplex.as_ref(), None),
            Duplex::to_string,
            |_| "no duplex".to_string(),
        );
    }
    if named(want.mtu.is_some()) {
        lines.field(
            FieldChange::clear(have.mtu.as_ref(), None),
            u32::to_string,
            |_| "no mtu".to_string(),
        );
    }
    if named(want.enabled.is_some()) {
        lines.field(
            FieldChange::clear(have.enabled.as_ref(), Some(&true)),
            enabled_line,
            |_| "no shutdown".to_string(),
        );
    }

    commands.extend_within(&format!("interface {}", have.name), lines.into_lines());
}

impl Reconciler for Interfaces {
    type Config = Vec<InterfaceConfig>;

    const MODULE: &'static str = "awplus_interfaces";
    const RESOURCE: &'static str = "interfaces";
    const DESCRIPTION: &'static str =
        "Manage interface description, speed, duplex, mtu and admin state on AlliedWare Plus";

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
                set_interface(commands, h, w, absent);
                Ok(())
            },
            |commands, h, w| {
                clear_interface(commands, h, w);
                Ok(())
            },
        )?;
        Ok(commands.into_commands())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ModuleError;
    use pretty_assertions::assert_eq;

    fn port(name: &str) -> InterfaceConfig {
        InterfaceConfig {
            enabled: Some(true),
            ..InterfaceConfig::new(name)
        }
    }

    fn have() -> Vec<InterfaceConfig> {
        vec![
            InterfaceConfig {
                description: Some("uplink".into()),
                mtu: Some(1500),
                ..port("port1.0.1")
            },
            InterfaceConfig {
                speed: Some("1000".into()),
                duplex: Some(Duplex::Full),
                ..port("port1.0.2")
            },
            port("port1.0.3"),
            port("vlan1"),
        ]
    }

    #[test]
    fn test_merged_changes_only_wanted_fields() {
        let want = vec![InterfaceConfig {
            mtu: Some(1582),
            ..InterfaceConfig::new("port1.0.1")
        }];
        let commands = Interfaces
            .reconcile(State::Merged, &want, &have())
            .unwrap();
        assert_eq!(commands, vec!["interface port1.0.1", "mtu 1582"]);
    }

    #[test]
    fn test_merged_range_expands_against_have() {
        let want = vec![InterfaceConfig {
            enabled: Some(false),
            ..InterfaceConfig::new("port1.0.1-1.0.3")
        }];
        let commands = Interfaces
            .reconcile(State::Merged, &want, &have())
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "interface port1.0.1",
                "shutdown",
                "interface port1.0.2",
                "shutdown",
                "interface port1.0.3",
                "shutdown",
            ]
        );
    }

    #[test]
    fn test_replaced_clears_omitted_fields() {
        let want = vec![InterfaceConfig {
            description: Some("core".into()),
            ..InterfaceConfig::new("port1.0.2")
        }];
        let commands = Interfaces
            .reconcile(State::Replaced, &want, &have())
            .unwrap();
        assert_eq!(
            commands,
            vec!["interface port1.0.2", "no speed", "no duplex", "description core"]
        );
    }

    #[test]
    fn test_overridden_resets_unlisted_interfaces() {
        let want = vec![port("port1.0.2")];
        let commands = Interfaces
            .reconcile(State::Overridden, &want, &have())
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "interface port1.0.1",
                "no description",
                "no mtu",
                "interface port1.0.2",
                "no speed",
                "no duplex",
            ]
        );
    }

    #[test]
    fn test_deleted_named_fields_only() {
        let want = vec![InterfaceConfig {
            mtu: Some(9000),
            ..InterfaceConfig::new("port1.0.1")
        }];
        let commands = Interfaces
            .reconcile(State::Deleted, &want, &have())
            .unwrap();
        assert_eq!(commands, vec!["interface port1.0.1", "no mtu"]);
    }

    #[test]
    fn test_deleted_without_want_clears_everything() {
        let commands = Interfaces
            .reconcile(State::Deleted, &Vec::new(), &have())
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "interface port1.0.1",
                "no description",
                "no mtu",
                "interface port1.0.2",
                "no speed",
                "no duplex",
            ]
        );
    }

    #[test]
    fn test_unknown_interface_is_rejected() {
        let want = vec![InterfaceConfig::new("port9.0.1")];
        let err = Interfaces
            .reconcile(State::Merged, &want, &have())
            .unwrap_err();
        assert!(matches!(err, ModuleError::MissingResource(_)));
    }

    #[test]
    fn test_mtu_out_of_range() {
        let want = vec![InterfaceConfig {
            mtu: Some(20),
            ..InterfaceConfig::new("port1.0.1")
        }];
        assert!(Interfaces.reconcile(State::Merged, &want, &have()).is_err());
    }

    #[test]
    fn test_empty_want_rejected_for_merged() {
        let err = Interfaces
            .reconcile(State::Merged, &Vec::new(), &have())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid parameter: value of config parameter must not be empty for state merged"
        );
    }

    #[test]
    fn test_speed_accepts_numbers() {
        let config: InterfaceConfig =
            serde_json::from_value(serde_json::json!({"name": "port1.0.1", "speed": 1000}))
                .unwrap();
        assert_eq!(config.speed.as_deref(), Some("1000"));
    }
}

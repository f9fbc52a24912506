//! VRF instances: description, route distinguisher and route targets
//!
//! The route distinguisher cannot be changed in place. Changing or removing
//! it deletes the VRF and creates it again with every attribute re-applied.

use crate::modules::network::common::{
    check_range, ensure_unique, walk_records, CommandSet, ContextLines, Reconciler, State,
};
use crate::modules::network::diff::{Absent, FieldChange, KeyedDiff};
use crate::modules::{ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Import,
    Export,
    Both,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Import => write!(f, "import"),
            Direction::Export => write!(f, "export"),
            Direction::Both => write!(f, "both"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteTarget {
    pub target: String,
    pub direction: Direction,
}

impl RouteTarget {
    fn line(&self) -> String {
        format!("route-target {} {}", self.direction, self.target)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VrfConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rd: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route_targets: Vec<RouteTarget>,
}

/// `ASN:nn` or `IP:nn`
fn check_extended_community(what: &str, value: &str) -> ModuleResult<()> {
    match value.split_once(':') {
        Some((admin, assigned))
            if !admin.is_empty() && assigned.parse::<u32>().is_ok() =>
        {
            Ok(())
        }
        _ => Err(ModuleError::InvalidParameter(format!(
            "{} '{}' must be in the form ASN:nn or IP:nn",
            what, value
        ))),
    }
}

impl VrfConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn header(&self) -> String {
        match self.id {
            Some(id) => format!("ip vrf {} {}", self.name, id),
            None => format!("ip vrf {}", self.name),
        }
    }

    fn is_key_only(&self) -> bool {
        self.description.is_none() && self.rd.is_none() && self.route_targets.is_empty()
    }

    /// `self` without the attributes named in `named`
    fn without(&self, named: &VrfConfig) -> VrfConfig {
        VrfConfig {
            name: self.name.clone(),
            id: self.id,
            description: self
                .description
                .clone()
                .filter(|_| named.description.is_none()),
            rd: self.rd.clone().filter(|_| named.rd.is_none()),
            route_targets: self
                .route_targets
                .iter()
                .filter(|rt| !named.route_targets.iter().any(|n| n.target == rt.target))
                .cloned()
                .collect(),
        }
    }

    /// Overlay `want` onto `self` the way merged state does
    fn merged_with(&self, want: &VrfConfig) -> VrfConfig {
        let mut route_targets: Vec<RouteTarget> = self
            .route_targets
            .iter()
            .filter(|rt| !want.route_targets.iter().any(|w| w.target == rt.target))
            .cloned()
            .collect();
        route_targets.extend(want.route_targets.iter().cloned());
        VrfConfig {
            name: want.name.clone(),
            id: want.id.or(self.id),
            description: want.description.clone().or_else(|| self.description.clone()),
            rd: want.rd.clone().or_else(|| self.rd.clone()),
            route_targets,
        }
    }

    fn validate(&self) -> ModuleResult<()> {
        if let Some(id) = self.id {
            check_range(&format!("vrf {} id", self.name), id, 1, u32::MAX)?;
        }
        if let Some(rd) = &self.rd {
            check_extended_community(&format!("vrf {} rd", self.name), rd)?;
        }
        for rt in &self.route_targets {
            check_extended_community(&format!("vrf {} route target", self.name), &rt.target)?;
        }
        ensure_unique(
            &self.route_targets,
            &format!("vrf {} route target", self.name),
            |rt| rt.target.clone(),
        )
    }
}

/// Reconciler for `awplus_vrfs`
#[derive(Debug, Clone, Copy, Default)]
pub struct Vrfs;

fn create_vrf(commands: &mut CommandSet, vrf: &VrfConfig) {
    let header = vrf.header();
    commands.enter(header.clone());
    let mut lines = Vec::new();
    if let Some(description) = &vrf.description {
        lines.push(format!("description {}", description));
    }
    if let Some(rd) = &vrf.rd {
        lines.push(format!("rd {}", rd));
    }
    lines.extend(vrf.route_targets.iter().map(RouteTarget::line));
    commands.extend_within(&header, lines);
}

fn set_vrf(
    commands: &mut CommandSet,
    have: Option<&VrfConfig>,
    want: &VrfConfig,
    absent: Absent,
) {
    let Some(have) = have else {
        create_vrf(commands, want);
        return;
    };

    let target = match absent {
        Absent::Ignore => have.merged_with(want),
        Absent::Clear => VrfConfig {
            id: want.id.or(have.id),
            ..want.clone()
        },
    };
    if target.id != have.id || target.rd != have.rd {
        commands.global(format!("no ip vrf {}", have.name));
        create_vrf(commands, &target);
        return;
    }

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

    let targets = KeyedDiff::new(&have.route_targets, &want.route_targets, |rt| {
        rt.target.clone()
    });
    if absent == Absent::Clear {
        for rt in targets.have_only {
            lines.clear(format!("no {}", rt.line()));
        }
    }
    for (h, w) in targets.pairs {
        match h {
            Some(h) if h.direction == w.direction => {}
            Some(h) => {
                lines.clear(format!("no {}", h.line()));
                lines.set(w.line());
            }
            None => lines.set(w.line()),
        }
    }

    commands.extend_within(&have.header(), lines.into_lines());
}

fn clear_vrf(commands: &mut CommandSet, have: &VrfConfig, want: Option<&VrfConfig>) {
    match want {
        Some(want) if !want.is_key_only() => {
            set_vrf(commands, Some(have), &have.without(want), Absent::Clear);
        }
        _ => commands.global(format!("no ip vrf {}", have.name)),
    }
}

impl Reconciler for Vrfs {
    type Config = Vec<VrfConfig>;

    const MODULE: &'static str = "awplus_vrfs";
    const RESOURCE: &'static str = "vrfs";
    const DESCRIPTION: &'static str = "Manage VRF instances on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        ensure_unique(want, "vrf", |v| v.name.clone())?;
        ensure_unique(have, "vrf", |v| v.name.clone())?;
        if state != State::Deleted {
            for vrf in want {
                vrf.validate()?;
            }
        }

        let mut commands = CommandSet::new();
        walk_records(
            state,
            want,
            have,
            |v| v.name.clone(),
            &mut commands,
            |commands, h, w, absent| {
                set_vrf(commands, h, w, absent);
                Ok(())
            },
            |commands, h, w| {
                clear_vrf(commands, h, w);
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

    fn rt(target: &str, direction: Direction) -> RouteTarget {
        RouteTarget {
            target: target.to_string(),
            direction,
        }
    }

    fn have() -> Vec<VrfConfig> {
        vec![
            VrfConfig {
                id: Some(1),
                description: Some("customer a".into()),
                rd: Some("65000:1".into()),
                route_targets: vec![rt("65000:1", Direction::Both)],
                ..VrfConfig::new("red")
            },
            VrfConfig {
                id: Some(2),
                rd: Some("65000:2".into()),
                ..VrfConfig::new("blue")
            },
        ]
    }

    #[test]
    fn test_merged_creates_vrf() {
        let want = vec![VrfConfig {
            id: Some(3),
            rd: Some("65000:3".into()),
            route_targets: vec![rt("65000:3", Direction::Import)],
            ..VrfConfig::new("green")
        }];
        let commands = Vrfs.reconcile(State::Merged, &want, &have()).unwrap();
        assert_eq!(
            commands,
            vec![
                "ip vrf green 3",
                "rd 65000:3",
                "route-target import 65000:3",
            ]
        );
    }

    #[test]
    fn test_direction_change_removes_old_first() {
        let want = vec![VrfConfig {
            route_targets: vec![rt("65000:1", Direction::Export)],
            ..VrfConfig::new("red")
        }];
        let commands = Vrfs.reconcile(State::Merged, &want, &have()).unwrap();
        assert_eq!(
            commands,
            vec![
                "ip vrf red 1",
                "no route-target both 65000:1",
                "route-target export 65000:1",
            ]
        );
    }

    #[test]
    fn test_rd_change_recreates_vrf() {
        let want = vec![VrfConfig {
            rd: Some("65000:10".into()),
            ..VrfConfig::new("red")
        }];
        let commands = Vrfs.reconcile(State::Merged, &want, &have()).unwrap();
        assert_eq!(
            commands,
            vec![
                "no ip vrf red",
                "ip vrf red 1",
                "description customer a",
                "rd 65000:10",
                "route-target both 65000:1",
            ]
        );
    }

    #[test]
    fn test_replaced_clears_description_and_targets() {
        let want = vec![VrfConfig {
            rd: Some("65000:1".into()),
            ..VrfConfig::new("red")
        }];
        let commands = Vrfs.reconcile(State::Replaced, &want, &have()).unwrap();
        assert_eq!(
            commands,
            vec![
                "ip vrf red 1",
                "no description",
                "no route-target both 65000:1",
            ]
        );
    }

    #[test]
    fn test_overridden_removes_other_vrfs() {
        let want = vec![have()[0].clone()];
        let commands = Vrfs.reconcile(State::Overridden, &want, &have()).unwrap();
        assert_eq!(commands, vec!["no ip vrf blue"]);
    }

    #[test]
    fn test_deleted_route_target_only() {
        let want = vec![VrfConfig {
            route_targets: vec![rt("65000:1", Direction::Both)],
            ..VrfConfig::new("red")
        }];
        let commands = Vrfs.reconcile(State::Deleted, &want, &have()).unwrap();
        assert_eq!(commands, vec!["ip vrf red 1", "no route-target both 65000:1"]);
    }

    #[test]
    fn test_deleted_vrf() {
        let commands = Vrfs
            .reconcile(State::Deleted, &vec![VrfConfig::new("blue")], &have())
            .unwrap();
        assert_eq!(commands, vec!["no ip vrf blue"]);
    }

    #[test]
    fn test_invalid_rd_rejected() {
        let want = vec![VrfConfig {
            rd: Some("65000".into()),
            ..VrfConfig::new("red")
        }];
        assert!(Vrfs.reconcile(State::Merged, &want, &have()).is_err());
    }
}

//! Static link aggregation: port membership in static channel groups
//!
//! Membership is configured on the member ports. A port that moves to another
//! group, or whose group changes its member-filters flag, is first removed
//! with `no static-channel-group` and then added again.

use crate::modules::network::common::{check_range, ensure_unique, CommandSet, Reconciler, State};
use crate::modules::{ModuleError, ModuleResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticLagConfig {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_filters: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

impl StaticLagConfig {
    fn validate(&self) -> ModuleResult<()> {
        check_range("static channel group id", self.id, 1, u32::MAX)?;
        ensure_unique(&self.members, "member", |m| m.clone())
    }
}

/// Reconciler for `awplus_static_lag_interfaces`
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLagInterfaces;

fn add_line(id: u32, member_filters: bool) -> String {
    if member_filters {
        format!("static-channel-group {} member-filters", id)
    } else {
        format!("static-channel-group {}", id)
    }
}

fn remove_port(commands: &mut CommandSet, port: &str) {
    commands.within(&format!("interface {}", port), "no static-channel-group");
}

impl Reconciler for StaticLagInterfaces {
    type Config = Vec<StaticLagConfig>;

    const MODULE: &'static str = "awplus_static_lag_interfaces";
    const RESOURCE: &'static str = "static_lag_interfaces";
    const DESCRIPTION: &'static str =
        "Manage static channel group membership on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        for group in want {
            group.validate()?;
        }
        ensure_unique(want, "static channel group", |g| g.id)?;
        ensure_unique(have, "static channel group", |g| g.id)?;
        let mut seen = HashSet::new();
        for group in want {
            for port in &group.members {
                if !seen.insert(port.as_str()) {
                    return Err(ModuleError::InvalidParameter(format!(
                        "port {} is a member of more than one static channel group",
                        port
                    )));
                }
            }
        }

        // port -> group and group -> member-filters, as configured
        let have_port: HashMap<&str, u32> = have
            .iter()
            .flat_map(|g| g.members.iter().map(move |p| (p.as_str(), g.id)))
            .collect();
        let have_flag: HashMap<u32, bool> = have
            .iter()
            .map(|g| (g.id, g.member_filters.unwrap_or(false)))
            .collect();
        let have_group: HashMap<u32, &StaticLagConfig> = have.iter().map(|g| (g.id, g)).collect();

        let mut commands = CommandSet::new();

        if state == State::Deleted {
            if want.is_empty() {
                for port in have.iter().flat_map(|g| g.members.iter()) {
                    remove_port(&mut commands, port);
                }
                return Ok(commands.into_commands());
            }
            for group in want {
                let Some(existing) = have_group.get(&group.id) else {
                    continue;
                };
                let members = if group.members.is_empty() {
                    &existing.members
                } else {
                    &group.members
                };
                for port in members {
                    if have_port.get(port.as_str()) == Some(&group.id) {
                        remove_port(&mut commands, port);
                    }
                }
            }
            return Ok(commands.into_commands());
        }

        // port -> (group, member-filters) once the change is applied
        let mut target: IndexMap<&str, (u32, bool)> = IndexMap::new();
        for group in want {
            let flag = match (group.member_filters, state) {
                (Some(flag), _) => flag,
                (None, State::Merged) => have_flag.get(&group.id).copied().unwrap_or(false),
                (None, _) => false,
            };
            for port in &group.members {
                target.insert(port.as_str(), (group.id, flag));
            }
        }
        if state == State::Merged {
            for group in want {
                let Some(existing) = have_group.get(&group.id) else {
                    continue;
                };
                let flag = group
                    .member_filters
                    .unwrap_or_else(|| existing.member_filters.unwrap_or(false));
                for port in &existing.members {
                    target.entry(port.as_str()).or_insert((group.id, flag));
                }
            }
        }

        let want_ids: HashSet<u32> = want.iter().map(|g| g.id).collect();
        let leaving: Vec<&str> = have
            .iter()
            .filter(|g| match state {
                State::Replaced => want_ids.contains(&g.id),
                State::Overridden => true,
                State::Merged | State::Deleted => false,
            })
            .flat_map(|g| g.members.iter().map(String::as_str))
            .filter(|p| !target.contains_key(p))
            .collect();
        for port in leaving {
            remove_port(&mut commands, port);
        }

        for (port, (id, flag)) in &target {
            let context = format!("interface {}", port);
            match have_port.get(port) {
                Some(current) if *current == *id && have_flag.get(current) == Some(flag) => {}
                Some(_) => {
                    commands.within(&context, "no static-channel-group");
                    commands.within(&context, add_line(*id, *flag));
                }
                None => commands.within(&context, add_line(*id, *flag)),
            }
        }

        Ok(commands.into_commands())
    }
}

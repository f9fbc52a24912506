//! The MLAG domain: a single `mlag domain <id>` context

use crate::modules::network::common::{
    check_address, check_range, Afi, CommandSet, ContextLines, Reconciler, State,
};
use crate::modules::network::diff::{Absent, FieldChange};
use crate::modules::ModuleResult;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MlagConfig {
    pub domain_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepalive_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

impl MlagConfig {
    pub fn new(domain_id: u32) -> Self {
        Self {
            domain_id,
            ..Default::default()
        }
    }

    fn header(&self) -> String {
        format!("mlag domain {}", self.domain_id)
    }

    fn is_key_only(&self) -> bool {
        *self == Self::new(self.domain_id)
    }

    fn validate(&self) -> ModuleResult<()> {
        check_range("mlag domain id", self.domain_id, 1, u32::MAX)?;
        if let Some(address) = &self.peer_address {
            check_address("mlag peer-address", address, Afi::Ipv4)?;
        }
        if let Some(address) = &self.source_address {
            check_address("mlag source-address", address, Afi::Ipv4)?;
        }
        if let Some(interval) = self.keepalive_interval {
            check_range("mlag keepalive-interval", interval, 1, u32::MAX)?;
        }
        if let Some(timeout) = self.timeout {
            check_range("mlag timeout", timeout, 1, u32::MAX)?;
        }
        Ok(())
    }
}

fn field<T: PartialEq + fmt::Display>(
    lines: &mut ContextLines,
    have: Option<&T>,
    want: Option<&T>,
    absent: Absent,
    keyword: &str,
) {
    lines.field(
        FieldChange::between(have, want, None, absent),
        |v| format!("{} {}", keyword, v),
        |_| format!("no {}", keyword),
    );
}

fn domain_lines(have: &MlagConfig, want: &MlagConfig, absent: Absent) -> Vec<String> {
    let mut lines = ContextLines::new();
    field(
        &mut lines,
        have.peer_address.as_ref(),
        want.peer_address.as_ref(),
        absent,
        "peer-address",
    );
    field(
        &mut lines,
        have.peer_link.as_ref(),
        want.peer_link.as_ref(),
        absent,
        "peer-link",
    );
    field(
        &mut lines,
        have.source_address.as_ref(),
        want.source_address.as_ref(),
        absent,
        "source-address",
    );
    field(
        &mut lines,
        have.keepalive_interval.as_ref(),
        want.keepalive_interval.as_ref(),
        absent,
        "keepalive-interval",
    );
    field(
        &mut lines,
        have.timeout.as_ref(),
        want.timeout.as_ref(),
        absent,
        "timeout",
    );
    lines.into_lines()
}

fn create_domain(commands: &mut CommandSet, want: &MlagConfig) {
    let header = want.header();
    commands.enter(header.clone());
    let lines = domain_lines(&MlagConfig::new(want.domain_id), want, Absent::Ignore);
    commands.extend_within(&header, lines);
}

/// Reconciler for `awplus_mlag`
#[derive(Debug, Clone, Copy, Default)]
pub struct Mlag;

impl Reconciler for Mlag {
    type Config = Option<MlagConfig>;

    const MODULE: &'static str = "awplus_mlag";
    const RESOURCE: &'static str = "mlag";
    const DESCRIPTION: &'static str = "Manage the MLAG domain on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        if state != State::Deleted {
            if let Some(want) = want {
                want.validate()?;
            }
        }

        let mut commands = CommandSet::new();
        match (state, want, have) {
            (State::Deleted, _, None) => {}
            (State::Deleted, None, Some(have)) => {
                commands.global(format!("no {}", have.header()));
            }
            (State::Deleted, Some(want), Some(have)) => {
                // removing the domain removes everything under it
                let domain_deleted = want.is_key_only() && want.domain_id == have.domain_id;
                if domain_deleted {
                    commands.global(format!("no {}", have.header()));
                } else if want.domain_id == have.domain_id {
                    let named = [
                        (want.peer_address.is_some() && have.peer_address.is_some(), "peer-address"),
                        (want.peer_link.is_some() && have.peer_link.is_some(), "peer-link"),
                        (
                            want.source_address.is_some() && have.source_address.is_some(),
                            "source-address",
                        ),
                        (
                            want.keepalive_interval.is_some() && have.keepalive_interval.is_some(),
                            "keepalive-interval",
                        ),
                        (want.timeout.is_some() && have.timeout.is_some(), "timeout"),
                    ];
                    let lines = named
                        .iter()
                        .filter(|(configured, _)| *configured)
                        .map(|(_, keyword)| format!("no {}", keyword));
                    commands.extend_within(&have.header(), lines);
                }
            }
            (_, None, _) => {}
            (_, Some(want), None) => create_domain(&mut commands, want),
            (_, Some(want), Some(have)) if want.domain_id != have.domain_id => {
                commands.global(format!("no {}", have.header()));
                create_domain(&mut commands, want);
            }
            (_, Some(want), Some(have)) => {
                let absent = match state {
                    State::Merged => Absent::Ignore,
                    _ => Absent::Clear,
                };
                commands.extend_within(&have.header(), domain_lines(have, want, absent));
            }
        }
        Ok(commands.into_commands())
    }
}

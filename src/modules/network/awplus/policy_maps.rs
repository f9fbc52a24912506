//! QoS policy-maps and their classifiers
//!
//! A policy-map holds policy-level settings followed by one `class` block per
//! classifier. Policer rates and burst sizes are rounded up to the hardware
//! granularity on both sides before they are compared or rendered.
//!
//! The `default` classifier always exists. `replaced` and `overridden` never
//! remove it; they clear whatever settings want leaves out, as for any other
//! classifier.

use super::premark_dscp::BandwidthClass;
use crate::modules::network::common::{
    check_address, check_range, ensure_unique, walk_records, Afi, CommandSet, ContextLines,
    Reconciler, State,
};
use crate::modules::network::diff::{Absent, FieldChange, KeyedDiff};
use crate::modules::{ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Policer rates are programmed in steps of 64 kbps
const RATE_STEP: u64 = 64;
/// Burst sizes are programmed in steps of 4096 bytes
const BURST_STEP: u64 = 4096;
/// Storm downtime the device falls back to when unset
const DEFAULT_STORM_DOWNTIME: u32 = 10;
/// The class every policy-map carries implicitly
const DEFAULT_CLASS: &str = "default";

fn round_up(value: u64, step: u64) -> u64 {
    value.div_ceil(step).max(1) * step
}

// ============================================================================
// Policer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoliceAction {
    DropRed,
    RemarkTransmit,
}

impl fmt::Display for PoliceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoliceAction::DropRed => write!(f, "drop-red"),
            PoliceAction::RemarkTransmit => write!(f, "remark-transmit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policer {
    SingleRate {
        cir: u64,
        cbs: u64,
        ebs: u64,
        action: PoliceAction,
    },
    TwinRate {
        cir: u64,
        pir: u64,
        cbs: u64,
        pbs: u64,
        action: PoliceAction,
    },
}

impl Policer {
    /// The policer as the hardware stores it
    pub fn rounded(self) -> Self {
        match self {
            Policer::SingleRate {
                cir,
                cbs,
                ebs,
                action,
            } => Policer::SingleRate {
                cir: round_up(cir, RATE_STEP),
                cbs: round_up(cbs, BURST_STEP),
                ebs: round_up(ebs, BURST_STEP),
                action,
            },
            Policer::TwinRate {
                cir,
                pir,
                cbs,
                pbs,
                action,
            } => Policer::TwinRate {
                cir: round_up(cir, RATE_STEP),
                pir: round_up(pir, RATE_STEP),
                cbs: round_up(cbs, BURST_STEP),
                pbs: round_up(pbs, BURST_STEP),
                action,
            },
        }
    }

    fn line(&self) -> String {
        match self {
            Policer::SingleRate {
                cir,
                cbs,
                ebs,
                action,
            } => format!(
                "police single-rate {} {} {} action {}",
                cir, cbs, ebs, action
            ),
            Policer::TwinRate {
                cir,
                pir,
                cbs,
                pbs,
                action,
            } => format!(
                "police twin-rate {} {} {} {} action {}",
                cir, pir, cbs, pbs, action
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disabled {
    None,
}

/// A policer, or `none` to remove the policer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Police {
    Disabled(Disabled),
    Rate(Policer),
}

impl Police {
    fn policer(&self) -> Option<Policer> {
        match self {
            Police::Disabled(_) => None,
            Police::Rate(policer) => Some(policer.rounded()),
        }
    }
}

// ============================================================================
// Remarking
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemarkApply {
    Internal,
    External,
    Both,
    None,
}

impl fmt::Display for RemarkApply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemarkApply::Internal => write!(f, "internal"),
            RemarkApply::External => write!(f, "external"),
            RemarkApply::Both => write!(f, "both"),
            RemarkApply::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Remark {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_cos: Option<u8>,
    pub apply: RemarkApply,
}

impl Remark {
    /// `(cos, apply)` when the remark is active
    fn active(&self) -> Option<(u8, RemarkApply)> {
        match (self.apply, self.new_cos) {
            (RemarkApply::None, _) => None,
            (apply, cos) => Some((cos.unwrap_or(0), apply)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemarkMap {
    pub bandwidth_class: BandwidthClass,
    pub new_dscp: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_bandwidth_class: Option<BandwidthClass>,
}

impl RemarkMap {
    fn line(&self) -> String {
        let mut line = format!(
            "remark-map bandwidth-class {} to new-dscp {}",
            self.bandwidth_class, self.new_dscp
        );
        if let Some(class) = self.new_bandwidth_class {
            line.push_str(&format!(" new-bandwidth-class {}", class));
        }
        line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StormAction {
    Linkdown,
    Portdisable,
    Vlandisable,
}

impl fmt::Display for StormAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StormAction::Linkdown => write!(f, "linkdown"),
            StormAction::Portdisable => write!(f, "portdisable"),
            StormAction::Vlandisable => write!(f, "vlandisable"),
        }
    }
}

// ============================================================================
// Classifiers and Policies
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Classifier {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub police: Option<Police>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<Remark>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remark_map: Vec<RemarkMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storm_protection: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storm_action: Option<StormAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storm_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storm_window: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storm_downtime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pbr_next_hop: Option<String>,
}

impl Classifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn is_key_only(&self) -> bool {
        *self == Self::new(self.name.clone())
    }

    /// Storm downtime with 0 meaning the default
    fn storm_downtime(&self) -> Option<u32> {
        self.storm_downtime.map(|d| match d {
            0 => DEFAULT_STORM_DOWNTIME,
            d => d,
        })
    }

    /// `self` without the fields named in `named`
    fn without(&self, named: &Classifier) -> Classifier {
        let keep = |listed: bool| !listed;
        Classifier {
            name: self.name.clone(),
            police: self.police.filter(|_| keep(named.police.is_some())),
            remark: self.remark.clone().filter(|_| keep(named.remark.is_some())),
            remark_map: self
                .remark_map
                .iter()
                .filter(|m| {
                    !named
                        .remark_map
                        .iter()
                        .any(|n| n.bandwidth_class == m.bandwidth_class)
                })
                .cloned()
                .collect(),
            storm_protection: self
                .storm_protection
                .filter(|_| keep(named.storm_protection.is_some())),
            storm_action: self
                .storm_action
                .filter(|_| keep(named.storm_action.is_some())),
            storm_rate: self.storm_rate.filter(|_| keep(named.storm_rate.is_some())),
            storm_window: self
                .storm_window
                .filter(|_| keep(named.storm_window.is_some())),
            storm_downtime: self
                .storm_downtime
                .filter(|_| keep(named.storm_downtime.is_some())),
            pbr_next_hop: self
                .pbr_next_hop
                .clone()
                .filter(|_| keep(named.pbr_next_hop.is_some())),
        }
    }

    fn validate(&self, policy: &str) -> ModuleResult<()> {
        let what = |field: &str| format!("policy-map {} class {} {}", policy, self.name, field);
        ensure_unique(&self.remark_map, &what("remark_map bandwidth class"), |m| {
            m.bandwidth_class
        })?;
        for map in &self.remark_map {
            check_range(&what("remark_map new_dscp"), map.new_dscp, 0, 63)?;
        }
        if let Some(cos) = self.remark.as_ref().and_then(|r| r.new_cos) {
            check_range(&what("remark new_cos"), cos, 0, 7)?;
        }
        if let Some(rate) = self.storm_rate {
            check_range(&what("storm_rate"), rate, 1, 40_000_000)?;
        }
        if let Some(window) = self.storm_window {
            check_range(&what("storm_window"), window, 100, 60_000)?;
        }
        if let Some(downtime) = self.storm_downtime {
            check_range(&what("storm_downtime"), downtime, 0, 86_400)?;
        }
        if let Some(next_hop) = &self.pbr_next_hop {
            check_address(&what("pbr_next_hop"), next_hop, Afi::Ipv4)?;
        }
        if let Some(Police::Rate(Policer::TwinRate { cir, pir, .. })) = self.police {
            if pir < cir {
                return Err(ModuleError::InvalidParameter(format!(
                    "{} must not be lower than cir",
                    what("police pir")
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultAction {
    Permit,
    Deny,
    SendToCpu,
    CopyToCpu,
    SendToMirror,
    CopyToMirror,
}

impl fmt::Display for DefaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            DefaultAction::Permit => "permit",
            DefaultAction::Deny => "deny",
            DefaultAction::SendToCpu => "send-to-cpu",
            DefaultAction::CopyToCpu => "copy-to-cpu",
            DefaultAction::SendToMirror => "send-to-mirror",
            DefaultAction::CopyToMirror => "copy-to-mirror",
        };
        write!(f, "{}", action)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyMapConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_dscp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_action: Option<DefaultAction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classifiers: Vec<Classifier>,
}

impl PolicyMapConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn header(&self) -> String {
        format!("policy-map {}", self.name)
    }

    fn is_key_only(&self) -> bool {
        *self == Self::new(self.name.clone())
    }

    /// The policy left on the device after deleting what `named` lists
    fn without(&self, named: &PolicyMapConfig) -> PolicyMapConfig {
        let classifiers = self
            .classifiers
            .iter()
            .filter_map(|c| match named.classifiers.iter().find(|n| n.name == c.name) {
                Some(n) if n.is_key_only() => None,
                Some(n) => Some(c.without(n)),
                None => Some(c.clone()),
            })
            .collect();
        PolicyMapConfig {
            name: self.name.clone(),
            description: self
                .description
                .clone()
                .filter(|_| named.description.is_none()),
            trust_dscp: self.trust_dscp.filter(|_| named.trust_dscp.is_none()),
            default_action: self
                .default_action
                .filter(|_| named.default_action.is_none()),
            classifiers,
        }
    }

    fn validate(&self) -> ModuleResult<()> {
        ensure_unique(
            &self.classifiers,
            &format!("policy-map {} class", self.name),
            |c| c.name.clone(),
        )?;
        self.classifiers
            .iter()
            .try_for_each(|c| c.validate(&self.name))
    }
}

/// Reconciler for `awplus_policy_maps`
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyMaps;

fn classifier_lines(have: Option<&Classifier>, want: &Classifier, absent: Absent) -> Vec<String> {
    let empty = Classifier::new(want.name.clone());
    let have = have.unwrap_or(&empty);
    let mut lines = ContextLines::new();

    let have_policer = have.police.and_then(|p| p.policer());
    match want.police {
        Some(Police::Disabled(_)) if have_policer.is_some() => lines.clear("no police"),
        Some(Police::Rate(policer)) if have_policer != Some(policer.rounded()) => {
            lines.set(policer.rounded().line())
        }
        None if absent == Absent::Clear && have_policer.is_some() => lines.clear("no police"),
        _ => {}
    }

    let have_remark = have.remark.as_ref().and_then(Remark::active);
    match want.remark.as_ref().map(Remark::active) {
        Some(None) if have_remark.is_some() => lines.clear("no remark new-cos"),
        Some(Some(remark)) if have_remark != Some(remark) => {
            lines.set(format!("remark new-cos {} {}", remark.0, remark.1))
        }
        None if absent == Absent::Clear && have_remark.is_some() => {
            lines.clear("no remark new-cos")
        }
        _ => {}
    }

    let maps = KeyedDiff::new(&have.remark_map, &want.remark_map, |m| m.bandwidth_class);
    if absent == Absent::Clear {
        for map in maps.have_only {
            lines.clear(format!(
                "no remark-map bandwidth-class {}",
                map.bandwidth_class
            ));
        }
    }
    for (h, w) in maps.pairs {
        if h != Some(w) {
            lines.set(w.line());
        }
    }

    lines.field(
        FieldChange::between(
            have.storm_protection.as_ref(),
            want.storm_protection.as_ref(),
            Some(&false),
            absent,
        ),
        |on| {
            if *on {
                "storm-protection".to_string()
            } else {
                "no storm-protection".to_string()
            }
        },
        |_| "no storm-protection".to_string(),
    );
    lines.field(
        FieldChange::between(
            have.storm_action.as_ref(),
            want.storm_action.as_ref(),
            None,
            absent,
        ),
        |a| format!("storm-action {}", a),
        |_| "no storm-action".to_string(),
    );
    lines.field(
        FieldChange::between(
            have.storm_rate.as_ref(),
            want.storm_rate.as_ref(),
            None,
            absent,
        ),
        |r| format!("storm-rate {}", r),
        |_| "no storm-rate".to_string(),
    );
    lines.field(
        FieldChange::between(
            have.storm_window.as_ref(),
            want.storm_window.as_ref(),
            None,
            absent,
        ),
        |w| format!("storm-window {}", w),
        |_| "no storm-window".to_string(),
    );
    lines.field(
        FieldChange::between(
            have.storm_downtime().as_ref(),
            want.storm_downtime().as_ref(),
            Some(&DEFAULT_STORM_DOWNTIME),
            absent,
        ),
        |d| {
            if *d == DEFAULT_STORM_DOWNTIME {
                "no storm-downtime".to_string()
            } else {
                format!("storm-downtime {}", d)
            }
        },
        |_| "no storm-downtime".to_string(),
    );
    lines.field(
        FieldChange::between(
            have.pbr_next_hop.as_ref(),
            want.pbr_next_hop.as_ref(),
            None,
            absent,
        ),
        |nh| format!("policy-based-routing ipv4 next-hop {}", nh),
        |_| "no policy-based-routing ipv4 next-hop".to_string(),
    );

    lines.into_lines()
}

fn set_policy(
    commands: &mut CommandSet,
    have: Option<&PolicyMapConfig>,
    want: &PolicyMapConfig,
    absent: Absent,
) {
    let header = want.header();
    if have.is_none() {
        commands.enter(header.clone());
    }
    let empty = PolicyMapConfig::new(want.name.clone());
    let have = have.unwrap_or(&empty);

    let mut policy = ContextLines::new();
    policy.field(
        FieldChange::between(
            have.description.as_ref(),
            want.description.as_ref(),
            None,
            absent,
        ),
        |d| format!("description {}", d),
        |_| "no description".to_string(),
    );
    policy.field(
        FieldChange::between(
            have.trust_dscp.as_ref(),
            want.trust_dscp.as_ref(),
            Some(&false),
            absent,
        ),
        |on| {
            if *on {
                "trust dscp".to_string()
            } else {
                "no trust dscp".to_string()
            }
        },
        |_| "no trust dscp".to_string(),
    );
    policy.field(
        FieldChange::between(
            have.default_action.as_ref(),
            want.default_action.as_ref(),
            Some(&DefaultAction::Permit),
            absent,
        ),
        |a| format!("default-action {}", a),
        |_| "no default-action".to_string(),
    );
    let mut body = policy.into_lines();

    let classifiers = KeyedDiff::new(&have.classifiers, &want.classifiers, |c| c.name.clone());
    if absent == Absent::Clear {
        for classifier in classifiers.have_only {
            if classifier.name != DEFAULT_CLASS {
                body.push(format!("no class {}", classifier.name));
                continue;
            }
            // the default class stays, only its settings are cleared
            let lines = classifier_lines(
                Some(classifier),
                &Classifier::new(DEFAULT_CLASS),
                Absent::Clear,
            );
            if !lines.is_empty() {
                body.push(format!("class {}", DEFAULT_CLASS));
                body.extend(lines);
            }
        }
    }
    for (h, w) in classifiers.pairs {
        let lines = classifier_lines(h, w, absent);
        if h.is_none() || !lines.is_empty() {
            body.push(format!("class {}", w.name));
            body.extend(lines);
        }
    }

    commands.extend_within(&header, body);
}

fn clear_policy(
    commands: &mut CommandSet,
    have: &PolicyMapConfig,
    want: Option<&PolicyMapConfig>,
) {
    match want {
        Some(want) if !want.is_key_only() => {
            set_policy(commands, Some(have), &have.without(want), Absent::Clear);
        }
        _ => commands.global(format!("no {}", have.header())),
    }
}

impl Reconciler for PolicyMaps {
    type Config = Vec<PolicyMapConfig>;

    const MODULE: &'static str = "awplus_policy_maps";
    const RESOURCE: &'static str = "policy_maps";
    const DESCRIPTION: &'static str = "Manage QoS policy-maps on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        ensure_unique(want, "policy-map", |p| p.name.clone())?;
        ensure_unique(have, "policy-map", |p| p.name.clone())?;
        for policy in want {
            policy.validate()?;
        }

        let mut commands = CommandSet::new();
        walk_records(
            state,
            want,
            have,
            |p| p.name.clone(),
            &mut commands,
            |commands, h, w, absent| {
                set_policy(commands, h, w, absent);
                Ok(())
            },
            |commands, h, w| {
                clear_policy(commands, h, w);
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

    fn single_rate(cir: u64, cbs: u64, ebs: u64) -> Police {
        Police::Rate(Policer::SingleRate {
            cir,
            cbs,
            ebs,
            action: PoliceAction::DropRed,
        })
    }

    fn have() -> Vec<PolicyMapConfig> {
        vec![PolicyMapConfig {
            description: Some("edge".into()),
            trust_dscp: Some(true),
            classifiers: vec![
                Classifier::new("default"),
                Classifier {
                    police: Some(single_rate(128, 8192, 4096)),
                    remark: Some(Remark {
                        new_cos: Some(3),
                        apply: RemarkApply::Both,
                    }),
                    storm_downtime: Some(30),
                    ..Classifier::new("voice")
                },
                Classifier {
                    pbr_next_hop: Some("10.0.0.1".into()),
                    ..Classifier::new("web")
                },
            ],
            ..PolicyMapConfig::new("qos")
        }]
    }

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(0, RATE_STEP), 64);
        assert_eq!(round_up(10, RATE_STEP), 64);
        assert_eq!(round_up(64, RATE_STEP), 64);
        assert_eq!(round_up(65, RATE_STEP), 128);
        assert_eq!(round_up(293, BURST_STEP), 4096);
        assert_eq!(round_up(16_767_373, BURST_STEP), 16_769_024);
    }

    #[test]
    fn test_policer_rounded_before_emission() {
        let want = vec![PolicyMapConfig {
            classifiers: vec![Classifier {
                police: Some(single_rate(10, 16_767_373, 293)),
                ..Classifier::new("video")
            }],
            ..PolicyMapConfig::new("qos")
        }];
        let commands = PolicyMaps
            .reconcile(State::Merged, &want, &have())
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "policy-map qos",
                "class video",
                "police single-rate 64 16769024 4096 action drop-red",
            ]
        );
    }

    #[test]
    fn test_policer_rounding_hides_false_delta() {
        let want = vec![PolicyMapConfig {
            classifiers: vec![Classifier {
                police: Some(single_rate(100, 5000, 1)),
                ..Classifier::new("voice")
            }],
            ..PolicyMapConfig::new("qos")
        }];
        let commands = PolicyMaps
            .reconcile(State::Merged, &want, &have())
            .unwrap();
        assert!(commands.is_empty());
    }

    #[test]
    fn test_none_values_remove_settings() {
        let want = vec![PolicyMapConfig {
            classifiers: vec![Classifier {
                police: Some(Police::Disabled(Disabled::None)),
                remark: Some(Remark {
                    new_cos: None,
                    apply: RemarkApply::None,
                }),
                storm_downtime: Some(0),
                ..Classifier::new("voice")
            }],
            ..PolicyMapConfig::new("qos")
        }];
        let commands = PolicyMaps
            .reconcile(State::Merged, &want, &have())
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "policy-map qos",
                "class voice",
                "no police",
                "no remark new-cos",
                "no storm-downtime",
            ]
        );
    }

    #[test]
    fn test_policy_lines_precede_classifiers() {
        let want = vec![PolicyMapConfig {
            description: Some("core".into()),
            default_action: Some(DefaultAction::Deny),
            classifiers: vec![Classifier {
                remark_map: vec![RemarkMap {
                    bandwidth_class: BandwidthClass::Yellow,
                    new_dscp: 10,
                    new_bandwidth_class: Some(BandwidthClass::Red),
                }],
                ..Classifier::new("web")
            }],
            ..PolicyMapConfig::new("qos")
        }];
        let commands = PolicyMaps
            .reconcile(State::Merged, &want, &have())
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "policy-map qos",
                "description core",
                "default-action deny",
                "class web",
                "remark-map bandwidth-class yellow to new-dscp 10 new-bandwidth-class red",
            ]
        );
    }

    #[test]
    fn test_replaced_removes_unlisted_classifiers() {
        let want = vec![PolicyMapConfig {
            description: Some("edge".into()),
            trust_dscp: Some(true),
            classifiers: vec![Classifier {
                pbr_next_hop: Some("10.0.0.2".into()),
                ..Classifier::new("web")
            }],
            ..PolicyMapConfig::new("qos")
        }];
        let commands = PolicyMaps
            .reconcile(State::Replaced, &want, &have())
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "policy-map qos",
                "no class voice",
                "class web",
                "policy-based-routing ipv4 next-hop 10.0.0.2",
            ]
        );
    }

    #[test]
    fn test_replaced_clears_omitted_default_class_settings() {
        let have = vec![PolicyMapConfig {
            classifiers: vec![Classifier {
                police: Some(single_rate(128, 8192, 4096)),
                ..Classifier::new("default")
            }],
            ..PolicyMapConfig::new("qos")
        }];
        let want = vec![PolicyMapConfig {
            classifiers: vec![Classifier {
                pbr_next_hop: Some("10.0.0.2".into()),
                ..Classifier::new("web")
            }],
            ..PolicyMapConfig::new("qos")
        }];
        let commands = PolicyMaps.reconcile(State::Replaced, &want, &have).unwrap();
        assert_eq!(
            commands,
            vec![
                "policy-map qos",
                "class default",
                "no police",
                "class web",
                "policy-based-routing ipv4 next-hop 10.0.0.2",
            ]
        );
    }

    #[test]
    fn test_deleted_named_classifier() {
        let want = vec![PolicyMapConfig {
            classifiers: vec![Classifier::new("web")],
            ..PolicyMapConfig::new("qos")
        }];
        let commands = PolicyMaps
            .reconcile(State::Deleted, &want, &have())
            .unwrap();
        assert_eq!(commands, vec!["policy-map qos", "no class web"]);
    }

    #[test]
    fn test_deleted_classifier_field() {
        let want = vec![PolicyMapConfig {
            classifiers: vec![Classifier {
                storm_downtime: Some(30),
                ..Classifier::new("voice")
            }],
            ..PolicyMapConfig::new("qos")
        }];
        let commands = PolicyMaps
            .reconcile(State::Deleted, &want, &have())
            .unwrap();
        assert_eq!(
            commands,
            vec!["policy-map qos", "class voice", "no storm-downtime"]
        );
    }

    #[test]
    fn test_deleted_whole_policy() {
        let commands = PolicyMaps
            .reconcile(State::Deleted, &vec![PolicyMapConfig::new("qos")], &have())
            .unwrap();
        assert_eq!(commands, vec!["no policy-map qos"]);
    }

    #[test]
    fn test_police_none_deserializes() {
        let classifier: Classifier =
            serde_json::from_value(serde_json::json!({"name": "voice", "police": "none"}))
                .unwrap();
        assert_eq!(classifier.police, Some(Police::Disabled(Disabled::None)));

        let classifier: Classifier = serde_json::from_value(serde_json::json!({
            "name": "voice",
            "police": {"twin_rate": {"cir": 64, "pir": 128, "cbs": 4096, "pbs": 4096, "action": "remark-transmit"}}
        }))
        .unwrap();
        assert!(matches!(
            classifier.police,
            Some(Police::Rate(Policer::TwinRate { pir: 128, .. }))
        ));
    }
}

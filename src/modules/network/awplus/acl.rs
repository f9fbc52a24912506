//! Access control lists: numbered, named and hardware ACLs
//!
//! ACL shape depends on its name and type:
//! - numbered standard/extended (1-99, 100-199, 1300-1999, 2000-2699) are
//!   configured under `access-list <n>`
//! - numbered hardware (3000-3699) are a single global line holding exactly
//!   one rule
//! - named ACLs live under `ip access-list <type> <name>`,
//!   `ipv6 access-list <type> <name>` or `access-list hardware <name>`

use crate::modules::network::common::{ensure_unique, Afi, CommandSet, Reconciler, State};
use crate::modules::{ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclType {
    Standard,
    Extended,
    Hardware,
}

impl fmt::Display for AclType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclType::Standard => write!(f, "standard"),
            AclType::Extended => write!(f, "extended"),
            AclType::Hardware => write!(f, "hardware"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AceAction {
    Permit,
    Deny,
    CopyToCpu,
    CopyToMirror,
    SendToCpu,
    SendToMirror,
}

impl AceAction {
    fn hardware_only(self) -> bool {
        !matches!(self, AceAction::Permit | AceAction::Deny)
    }
}

impl fmt::Display for AceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            AceAction::Permit => "permit",
            AceAction::Deny => "deny",
            AceAction::CopyToCpu => "copy-to-cpu",
            AceAction::CopyToMirror => "copy-to-mirror",
            AceAction::SendToCpu => "send-to-cpu",
            AceAction::SendToMirror => "send-to-mirror",
        };
        write!(f, "{}", action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ace {
    #[serde(rename = "ace_ID", default, skip_serializing_if = "Option::is_none")]
    pub ace_id: Option<u32>,
    pub action: AceAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ports: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_ports: Option<String>,
}

impl Ace {
    /// The rule text without the sequence number
    pub fn rule(&self) -> String {
        let mut parts = vec![self.action.to_string()];
        parts.extend(
            [
                &self.protocol,
                &self.source_addr,
                &self.source_ports,
                &self.destination_addr,
                &self.destination_ports,
            ]
            .into_iter()
            .flatten()
            .cloned(),
        );
        parts.join(" ")
    }

    fn line(&self) -> String {
        match self.ace_id {
            Some(id) => format!("{} {}", id, self.rule()),
            None => self.rule(),
        }
    }

    fn removal(&self) -> String {
        match self.ace_id {
            Some(id) => format!("no {}", id),
            None => format!("no {}", self.rule()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessList {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl_type: Option<AclType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aces: Vec<Ace>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AclConfig {
    pub afi: Afi,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acls: Vec<AccessList>,
}

/// How an ACL is rendered on the device
#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Numbered(u32),
    NumberedHardware(u32),
    Named { header: String, acl_type: AclType },
}

impl Shape {
    fn resolve(afi: Afi, acl: &AccessList) -> ModuleResult<Self> {
        let numbered = afi == Afi::Ipv4 && acl.name.chars().all(|c| c.is_ascii_digit());
        if numbered {
            let number: u32 = acl.name.parse().map_err(|_| {
                ModuleError::InvalidParameter(format!("invalid ACL number {}", acl.name))
            })?;
            let acl_type = match number {
                1..=99 | 1300..=1999 => AclType::Standard,
                100..=199 | 2000..=2699 => AclType::Extended,
                3000..=3699 => AclType::Hardware,
                _ => {
                    return Err(ModuleError::InvalidParameter(format!(
                        "ACL number {} is outside every numbered ACL range",
                        number
                    )))
                }
            };
            if acl.acl_type.is_some_and(|t| t != acl_type) {
                return Err(ModuleError::InvalidParameter(format!(
                    "ACL {} is a {} ACL, not {}",
                    number,
                    acl_type,
                    acl.acl_type.map(|t| t.to_string()).unwrap_or_default()
                )));
            }
            return Ok(match acl_type {
                AclType::Hardware => Shape::NumberedHardware(number),
                _ => Shape::Numbered(number),
            });
        }

        let acl_type = acl.acl_type.ok_or_else(|| {
            ModuleError::InvalidParameter(format!("named ACL {} requires acl_type", acl.name))
        })?;
        let header = match (afi, acl_type) {
            (Afi::Ipv4, AclType::Hardware) => format!("access-list hardware {}", acl.name),
            (Afi::Ipv4, t) => format!("ip access-list {} {}", t, acl.name),
            (Afi::Ipv6, AclType::Hardware) => format!("ipv6 access-list {}", acl.name),
            (Afi::Ipv6, t) => format!("ipv6 access-list {} {}", t, acl.name),
        };
        Ok(Shape::Named { header, acl_type })
    }

    fn acl_type(&self) -> AclType {
        match self {
            Shape::Numbered(n) if (1..=99).contains(n) || (1300..=1999).contains(n) => {
                AclType::Standard
            }
            Shape::Numbered(_) => AclType::Extended,
            Shape::NumberedHardware(_) => AclType::Hardware,
            Shape::Named { acl_type, .. } => *acl_type,
        }
    }

    fn header(&self) -> Option<String> {
        match self {
            Shape::Numbered(n) => Some(format!("access-list {}", n)),
            Shape::NumberedHardware(_) => None,
            Shape::Named { header, .. } => Some(header.clone()),
        }
    }

    fn removal(&self) -> String {
        match self {
            Shape::Numbered(n) | Shape::NumberedHardware(n) => format!("no access-list {}", n),
            Shape::Named { header, .. } => format!("no {}", header),
        }
    }
}

/// An ACL with its family and resolved shape
#[derive(Debug)]
struct Entry<'a> {
    afi: Afi,
    acl: &'a AccessList,
    shape: Shape,
}

fn entries(config: &[AclConfig]) -> ModuleResult<Vec<Entry<'_>>> {
    ensure_unique(config, "address family", |c| c.afi)?;
    let mut entries = Vec::new();
    for family in config {
        ensure_unique(&family.acls, &format!("{} ACL", family.afi), |a| a.name.clone())?;
        for acl in &family.acls {
            entries.push(Entry {
                afi: family.afi,
                acl,
                shape: Shape::resolve(family.afi, acl)?,
            });
        }
    }
    Ok(entries)
}

/// Want entries for `deleted`: an ACL is named by family and name alone and
/// takes its shape from the device. ACLs not on the device are skipped.
fn deleted_entries<'a>(
    want: &'a [AclConfig],
    have: &[Entry<'_>],
) -> ModuleResult<Vec<Entry<'a>>> {
    ensure_unique(want, "address family", |c| c.afi)?;
    let mut entries = Vec::new();
    for family in want {
        ensure_unique(&family.acls, &format!("{} ACL", family.afi), |a| a.name.clone())?;
        for acl in &family.acls {
            let existing = have
                .iter()
                .find(|h| h.afi == family.afi && h.acl.name == acl.name);
            if let Some(existing) = existing {
                entries.push(Entry {
                    afi: family.afi,
                    acl,
                    shape: existing.shape.clone(),
                });
            }
        }
    }
    Ok(entries)
}

fn validate(entry: &Entry<'_>) -> ModuleResult<()> {
    let name = &entry.acl.name;
    let hardware = entry.shape.acl_type() == AclType::Hardware;
    for ace in &entry.acl.aces {
        if ace.source_addr.is_none() {
            return Err(ModuleError::InvalidParameter(format!(
                "ACE '{}' in ACL {} requires source_addr",
                ace.rule(),
                name
            )));
        }
        if ace.action.hardware_only() && !hardware {
            return Err(ModuleError::InvalidParameter(format!(
                "action {} is only valid in hardware ACLs, ACL {} is {}",
                ace.action,
                name,
                entry.shape.acl_type()
            )));
        }
    }
    ensure_unique(
        &entry
            .acl
            .aces
            .iter()
            .filter_map(|a| a.ace_id)
            .collect::<Vec<_>>(),
        &format!("ace_ID in ACL {}", name),
        |id| *id,
    )?;
    if matches!(entry.shape, Shape::NumberedHardware(_)) && entry.acl.aces.len() != 1 {
        return Err(ModuleError::InvalidParameter(format!(
            "numbered hardware ACL {} must hold exactly one ACE",
            name
        )));
    }
    Ok(())
}

/// Whether two ACE lists hold the same rules, matched by ace_ID when given
fn same_aces(have: &[Ace], want: &[Ace]) -> bool {
    have.len() == want.len() && want.iter().all(|w| find_ace(have, w).is_some())
}

fn find_ace<'a>(have: &'a [Ace], want: &Ace) -> Option<&'a Ace> {
    let rule = want.rule();
    match want.ace_id {
        Some(id) => have
            .iter()
            .find(|h| h.ace_id == Some(id) && h.rule() == rule),
        None => have.iter().find(|h| h.rule() == rule),
    }
}

fn create(commands: &mut CommandSet, entry: &Entry<'_>) {
    match (&entry.shape, entry.shape.header()) {
        (Shape::NumberedHardware(number), _) => {
            for ace in &entry.acl.aces {
                commands.global(format!("access-list {} {}", number, ace.rule()));
            }
        }
        (_, Some(header)) => {
            if entry.acl.aces.is_empty() {
                commands.enter(header);
            } else {
                commands.extend_within(&header, entry.acl.aces.iter().map(Ace::line));
            }
        }
        (_, None) => {}
    }
}

fn delete(commands: &mut CommandSet, entry: &Entry<'_>) {
    debug!(afi = %entry.afi, acl = %entry.acl.name, "removing ACL");
    commands.global(entry.shape.removal());
}

/// Recreate the ACL when its type changed
fn recreate_if_reshaped(commands: &mut CommandSet, have: &Entry<'_>, want: &Entry<'_>) -> bool {
    if have.shape == want.shape {
        return false;
    }
    delete(commands, have);
    create(commands, want);
    true
}

fn merge_acl(commands: &mut CommandSet, have: &Entry<'_>, want: &Entry<'_>) {
    if recreate_if_reshaped(commands, have, want) {
        return;
    }
    let Some(header) = want.shape.header() else {
        // numbered hardware: one global rule
        if !same_aces(&have.acl.aces, &want.acl.aces) {
            delete(commands, have);
            create(commands, want);
        }
        return;
    };

    for ace in &want.acl.aces {
        if find_ace(&have.acl.aces, ace).is_some() {
            continue;
        }
        let replaced = ace
            .ace_id
            .and_then(|id| have.acl.aces.iter().find(|h| h.ace_id == Some(id)));
        if let Some(old) = replaced {
            commands.within(&header, old.removal());
        }
        commands.within(&header, ace.line());
    }
}

fn replace_acl(commands: &mut CommandSet, have: &Entry<'_>, want: &Entry<'_>) {
    if recreate_if_reshaped(commands, have, want) {
        return;
    }
    if same_aces(&have.acl.aces, &want.acl.aces) {
        return;
    }
    let Some(header) = want.shape.header() else {
        delete(commands, have);
        create(commands, want);
        return;
    };
    commands.extend_within(&header, have.acl.aces.iter().map(Ace::removal));
    commands.extend_within(&header, want.acl.aces.iter().map(Ace::line));
}

fn delete_aces(commands: &mut CommandSet, have: &Entry<'_>, want: &Entry<'_>) {
    let header = match have.shape.header() {
        Some(header) if !want.acl.aces.is_empty() => header,
        _ => return delete(commands, have),
    };
    for ace in &want.acl.aces {
        let existing = match ace.ace_id {
            Some(id) => have.acl.aces.iter().find(|h| h.ace_id == Some(id)),
            None => find_ace(&have.acl.aces, ace),
        };
        if let Some(existing) = existing {
            commands.within(&header, existing.removal());
        }
    }
}

/// Reconciler for `awplus_acl`
#[derive(Debug, Clone, Copy, Default)]
pub struct Acl;

impl Reconciler for Acl {
    type Config = Vec<AclConfig>;

    const MODULE: &'static str = "awplus_acl";
    const RESOURCE: &'static str = "acl";
    const DESCRIPTION: &'static str =
        "Manage numbered, named and hardware access lists on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        let have_entries = entries(have)?;
        let want_entries = if state == State::Deleted {
            deleted_entries(want, &have_entries)?
        } else {
            let entries = entries(want)?;
            for entry in &entries {
                validate(entry)?;
            }
            entries
        };

        let have_by_key: HashMap<(Afi, String), &Entry<'_>> = have_entries
            .iter()
            .map(|e| ((e.afi, e.acl.name.clone()), e))
            .collect();
        let lookup = |entry: &Entry<'_>| {
            have_by_key
                .get(&(entry.afi, entry.acl.name.clone()))
                .copied()
        };

        let mut commands = CommandSet::new();
        match state {
            State::Merged | State::Replaced => {
                for want in &want_entries {
                    match lookup(want) {
                        None => create(&mut commands, want),
                        Some(have) if state == State::Merged => merge_acl(&mut commands, have, want),
                        Some(have) => replace_acl(&mut commands, have, want),
                    }
                }
            }
            State::Overridden => {
                for have in &have_entries {
                    let wanted = want_entries
                        .iter()
                        .any(|w| w.afi == have.afi && w.acl.name == have.acl.name);
                    if !wanted {
                        delete(&mut commands, have);
                    }
                }
                for want in &want_entries {
                    match lookup(want) {
                        None => create(&mut commands, want),
                        Some(have) => replace_acl(&mut commands, have, want),
                    }
                }
            }
            State::Deleted if want.iter().all(|family| family.acls.is_empty()) => {
                for have in &have_entries {
                    delete(&mut commands, have);
                }
            }
            State::Deleted => {
                for want in &want_entries {
                    if let Some(have) = lookup(want) {
                        delete_aces(&mut commands, have, want);
                    }
                }
            }
        }

        Ok(commands.into_commands())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ace(
        id: Option<u32>,
        action: AceAction,
        protocol: Option<&str>,
        src: &str,
        dst: Option<&str>,
    ) -> Ace {
        Ace {
            ace_id: id,
            action,
            protocol: protocol.map(String::from),
            source_addr: Some(src.to_string()),
            source_ports: None,
            destination_addr: dst.map(String::from),
            destination_ports: None,
        }
    }

    fn ipv4(acls: Vec<AccessList>) -> Vec<AclConfig> {
        vec![AclConfig {
            afi: Afi::Ipv4,
            acls,
        }]
    }

    fn acl(name: &str, acl_type: Option<AclType>, aces: Vec<Ace>) -> AccessList {
        AccessList {
            name: name.to_string(),
            acl_type,
            aces,
        }
    }

    #[test]
    fn test_merged_adds_ace_to_numbered_acl() {
        let have = ipv4(vec![acl(
            "104",
            None,
            vec![ace(Some(1), AceAction::Deny, Some("ip"), "any", Some("any"))],
        )]);
        let want = ipv4(vec![acl(
            "104",
            None,
            vec![ace(
                Some(4),
                AceAction::Permit,
                Some("ip"),
                "196.146.88.0 0.0.0.255",
                Some("any"),
            )],
        )]);
        let commands = Acl.reconcile(State::Merged, &want, &have).unwrap();
        assert_eq!(
            commands,
            vec!["access-list 104", "4 permit ip 196.146.88.0 0.0.0.255 any"]
        );
    }

    #[test]
    fn test_merged_changed_ace_is_readded() {
        let have = ipv4(vec![acl(
            "web",
            Some(AclType::Extended),
            vec![ace(Some(10), AceAction::Permit, Some("tcp"), "any", Some("any"))],
        )]);
        let want = ipv4(vec![acl(
            "web",
            Some(AclType::Extended),
            vec![ace(Some(10), AceAction::Deny, Some("tcp"), "any", Some("any"))],
        )]);
        let commands = Acl.reconcile(State::Merged, &want, &have).unwrap();
        assert_eq!(
            commands,
            vec!["ip access-list extended web", "no 10", "10 deny tcp any any"]
        );
    }

    #[test]
    fn test_merged_identical_rule_without_id_is_skipped() {
        let have = ipv4(vec![acl(
            "10",
            None,
            vec![ace(Some(5), AceAction::Permit, None, "10.0.0.0 0.0.0.255", None)],
        )]);
        let want = ipv4(vec![acl(
            "10",
            None,
            vec![ace(None, AceAction::Permit, None, "10.0.0.0 0.0.0.255", None)],
        )]);
        assert!(Acl.reconcile(State::Merged, &want, &have).unwrap().is_empty());
    }

    #[test]
    fn test_replaced_readds_every_ace() {
        let have = ipv4(vec![acl(
            "std",
            Some(AclType::Standard),
            vec![
                ace(Some(1), AceAction::Permit, None, "10.0.0.0/8", None),
                ace(Some(2), AceAction::Deny, None, "any", None),
            ],
        )]);
        let want = ipv4(vec![acl(
            "std",
            Some(AclType::Standard),
            vec![ace(Some(1), AceAction::Permit, None, "10.0.0.0/8", None)],
        )]);
        let commands = Acl.reconcile(State::Replaced, &want, &have).unwrap();
        assert_eq!(
            commands,
            vec![
                "ip access-list standard std",
                "no 1",
                "no 2",
                "1 permit 10.0.0.0/8",
            ]
        );
    }

    #[test]
    fn test_numbered_hardware_acl_is_a_global_line() {
        let have = ipv4(vec![acl(
            "3001",
            None,
            vec![ace(None, AceAction::Permit, Some("ip"), "any", Some("any"))],
        )]);
        let want = ipv4(vec![acl(
            "3001",
            None,
            vec![ace(None, AceAction::CopyToCpu, Some("ip"), "any", Some("any"))],
        )]);
        let commands = Acl.reconcile(State::Merged, &want, &have).unwrap();
        assert_eq!(
            commands,
            vec!["no access-list 3001", "access-list 3001 copy-to-cpu ip any any"]
        );
    }

    #[test]
    fn test_numbered_hardware_acl_holds_one_ace() {
        let want = ipv4(vec![acl(
            "3001",
            None,
            vec![
                ace(None, AceAction::Permit, Some("ip"), "any", Some("any")),
                ace(None, AceAction::Deny, Some("ip"), "any", Some("any")),
            ],
        )]);
        assert!(Acl.reconcile(State::Merged, &want, &Vec::new()).is_err());
    }

    #[test]
    fn test_hardware_actions_rejected_in_software_acl() {
        let want = ipv4(vec![acl(
            "120",
            None,
            vec![ace(None, AceAction::SendToCpu, Some("ip"), "any", Some("any"))],
        )]);
        assert!(Acl.reconcile(State::Merged, &want, &Vec::new()).is_err());
    }

    #[test]
    fn test_named_acl_requires_type() {
        let want = ipv4(vec![acl("web", None, vec![])]);
        assert!(Acl.reconcile(State::Merged, &want, &Vec::new()).is_err());
    }

    #[test]
    fn test_overridden_deletes_unlisted_acls() {
        let have = vec![
            AclConfig {
                afi: Afi::Ipv4,
                acls: vec![acl(
                    "hw",
                    Some(AclType::Hardware),
                    vec![ace(Some(1), AceAction::Deny, Some("ip"), "any", Some("any"))],
                )],
            },
            AclConfig {
                afi: Afi::Ipv6,
                acls: vec![acl(
                    "v6",
                    Some(AclType::Standard),
                    vec![ace(Some(1), AceAction::Permit, None, "any", None)],
                )],
            },
        ];
        let want = vec![AclConfig {
            afi: Afi::Ipv6,
            acls: vec![acl(
                "v6",
                Some(AclType::Standard),
                vec![ace(Some(1), AceAction::Permit, None, "any", None)],
            )],
        }];
        let commands = Acl.reconcile(State::Overridden, &want, &have).unwrap();
        assert_eq!(commands, vec!["no access-list hardware hw"]);
    }

    #[test]
    fn test_deleted_aces_then_whole_acl() {
        let have = ipv4(vec![
            acl(
                "web",
                Some(AclType::Extended),
                vec![
                    ace(Some(10), AceAction::Permit, Some("tcp"), "any", Some("any")),
                    ace(Some(20), AceAction::Deny, Some("ip"), "any", Some("any")),
                ],
            ),
            acl(
                "104",
                None,
                vec![ace(Some(1), AceAction::Deny, Some("ip"), "any", Some("any"))],
            ),
        ]);
        let want = ipv4(vec![
            acl(
                "web",
                Some(AclType::Extended),
                vec![ace(Some(20), AceAction::Deny, Some("ip"), "any", Some("any"))],
            ),
            acl("104", None, vec![]),
        ]);
        let commands = Acl.reconcile(State::Deleted, &want, &have).unwrap();
        assert_eq!(
            commands,
            vec!["ip access-list extended web", "no 20", "no access-list 104"]
        );
    }

    #[test]
    fn test_deleted_named_acl_by_name_only() {
        let have = ipv4(vec![
            acl(
                "web",
                Some(AclType::Extended),
                vec![ace(Some(10), AceAction::Permit, Some("tcp"), "any", Some("any"))],
            ),
            acl(
                "mgmt",
                Some(AclType::Standard),
                vec![ace(Some(10), AceAction::Permit, None, "any", None)],
            ),
        ]);
        let want = ipv4(vec![acl("web", None, vec![])]);
        let commands = Acl.reconcile(State::Deleted, &want, &have).unwrap();
        assert_eq!(commands, vec!["no ip access-list extended web"]);
    }

    #[test]
    fn test_deleted_unknown_acl_is_noop() {
        let have = ipv4(vec![acl(
            "web",
            Some(AclType::Extended),
            vec![ace(Some(10), AceAction::Permit, Some("tcp"), "any", Some("any"))],
        )]);
        let want = ipv4(vec![acl("other", None, vec![])]);
        let commands = Acl.reconcile(State::Deleted, &want, &have).unwrap();
        assert!(commands.is_empty());
    }

    #[test]
    fn test_ace_id_field_name() {
        let ace: Ace = serde_json::from_value(serde_json::json!({
            "ace_ID": 4,
            "action": "send-to-mirror",
            "protocol": "ip",
            "source_addr": "any",
            "destination_addr": "any"
        }))
        .unwrap();
        assert_eq!(ace.line(), "4 send-to-mirror ip any any");
    }
}

//! BGP: router process, neighbors, networks, address families and L2VPN EVPN
//!
//! The BGP process is a singleton keyed by its AS number. Changing the AS
//! removes the process and builds it again. `replaced` and `overridden`
//! rebuild the process from scratch whenever want differs from have.

use crate::modules::network::common::{
    check_address, check_prefix, check_range, ensure_unique, Afi, CommandSet, ContextLines,
    Reconciler, State,
};
use crate::modules::network::diff::{merge_records, Absent, FieldChange};
use crate::modules::{ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Safi {
    Unicast,
    Multicast,
}

impl fmt::Display for Safi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Safi::Unicast => write!(f, "unicast"),
            Safi::Multicast => write!(f, "multicast"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timers {
    pub keepalive: u32,
    pub holdtime: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Neighbor {
    pub neighbor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_as: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebgp_multihop: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutdown: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Network {
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_map: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AfNeighbor {
    pub neighbor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_as: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activate: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Redistribute {
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_map: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressFamily {
    pub afi: Afi,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safi: Option<Safi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrf: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub neighbors: Vec<AfNeighbor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<Network>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redistribute: Vec<Redistribute>,
}

impl AddressFamily {
    fn key(&self) -> (Afi, Safi, Option<String>) {
        (self.afi, self.safi.unwrap_or(Safi::Unicast), self.vrf.clone())
    }

    fn header(&self) -> String {
        match &self.vrf {
            Some(vrf) => format!("address-family {} vrf {}", self.afi, vrf),
            None => format!(
                "address-family {} {}",
                self.afi,
                self.safi.unwrap_or(Safi::Unicast)
            ),
        }
    }

    fn is_empty(&self) -> bool {
        self.neighbors.is_empty() && self.networks.is_empty() && self.redistribute.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvpnNeighbor {
    pub neighbor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activate: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvpnVrf {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise_ipv4_unicast: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct L2vpnEvpn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise_all_vni: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub neighbors: Vec<EvpnNeighbor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vrfs: Vec<EvpnVrf>,
}

impl L2vpnEvpn {
    fn is_empty(&self) -> bool {
        self.advertise_all_vni.is_none() && self.neighbors.is_empty() && self.vrfs.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BgpConfig {
    pub bgp_as: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_neighbor_changes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timers: Option<Timers>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub neighbors: Vec<Neighbor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<Network>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address_families: Vec<AddressFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l2vpn_evpn: Option<L2vpnEvpn>,
}

impl BgpConfig {
    pub fn new(bgp_as: u32) -> Self {
        Self {
            bgp_as,
            ..Default::default()
        }
    }

    fn header(&self) -> String {
        format!("router bgp {}", self.bgp_as)
    }

    fn only_as(&self) -> bool {
        *self == Self::new(self.bgp_as)
    }

    fn validate(&self) -> ModuleResult<()> {
        check_range("bgp_as", self.bgp_as, 1, u32::MAX)?;
        if let Some(router_id) = &self.router_id {
            check_address("router_id", router_id, Afi::Ipv4)?;
        }
        if let Some(timers) = &self.timers {
            check_range("timers keepalive", timers.keepalive, 0, 65535)?;
            if timers.holdtime != 0 {
                check_range("timers holdtime", timers.holdtime, 3, 65535)?;
            }
        }
        ensure_unique(&self.neighbors, "neighbor", |n| n.neighbor.clone())?;
        for neighbor in &self.neighbors {
            check_neighbor(&neighbor.neighbor)?;
        }
        ensure_unique(&self.networks, "network", |n| n.prefix.clone())?;
        for network in &self.networks {
            check_prefix("network", &network.prefix, Afi::Ipv4)?;
        }
        ensure_unique(&self.address_families, "address family", |af| af.header())?;
        for af in &self.address_families {
            ensure_unique(&af.neighbors, &format!("{} neighbor", af.header()), |n| {
                n.neighbor.clone()
            })?;
            for neighbor in &af.neighbors {
                check_neighbor(&neighbor.neighbor)?;
            }
            ensure_unique(&af.networks, &format!("{} network", af.header()), |n| {
                n.prefix.clone()
            })?;
            for network in &af.networks {
                check_prefix("network", &network.prefix, af.afi)?;
            }
            ensure_unique(
                &af.redistribute,
                &format!("{} redistribute", af.header()),
                |r| r.protocol.clone(),
            )?;
        }
        if let Some(evpn) = &self.l2vpn_evpn {
            ensure_unique(&evpn.neighbors, "l2vpn evpn neighbor", |n| n.neighbor.clone())?;
            ensure_unique(&evpn.vrfs, "l2vpn evpn vrf", |v| v.name.clone())?;
        }
        Ok(())
    }

    /// Lists sorted by key and defaults made explicit, for comparison
    fn canonical(&self) -> Self {
        let mut config = self.clone();
        config.neighbors.sort_by(|a, b| a.neighbor.cmp(&b.neighbor));
        for neighbor in &mut config.neighbors {
            if neighbor.shutdown == Some(false) {
                neighbor.shutdown = None;
            }
        }
        config.networks.sort_by(|a, b| a.prefix.cmp(&b.prefix));
        for af in &mut config.address_families {
            af.safi = Some(af.safi.unwrap_or(Safi::Unicast));
            af.neighbors.sort_by(|a, b| a.neighbor.cmp(&b.neighbor));
            af.networks.sort_by(|a, b| a.prefix.cmp(&b.prefix));
            af.redistribute.sort_by(|a, b| a.protocol.cmp(&b.protocol));
        }
        config.address_families.sort_by_key(AddressFamily::key);
        if let Some(evpn) = &mut config.l2vpn_evpn {
            evpn.neighbors.sort_by(|a, b| a.neighbor.cmp(&b.neighbor));
            evpn.vrfs.sort_by(|a, b| a.name.cmp(&b.name));
        }
        config
    }
}

fn check_neighbor(address: &str) -> ModuleResult<()> {
    address.parse::<IpAddr>().map(|_| ()).map_err(|_| {
        ModuleError::InvalidParameter(format!("neighbor '{}' is not a valid address", address))
    })
}

fn network_line(network: &Network) -> String {
    match &network.route_map {
        Some(route_map) => format!("network {} route-map {}", network.prefix, route_map),
        None => format!("network {}", network.prefix),
    }
}

fn redistribute_line(redistribute: &Redistribute) -> String {
    match &redistribute.route_map {
        Some(route_map) => format!(
            "redistribute {} route-map {}",
            redistribute.protocol, route_map
        ),
        None => format!("redistribute {}", redistribute.protocol),
    }
}

fn flag_line(enabled: bool, line: String) -> String {
    if enabled {
        line
    } else {
        format!("no {}", line)
    }
}

/// Lines for a neighbor, only what differs from `have`
fn neighbor_lines(have: Option<&Neighbor>, want: &Neighbor) -> Vec<String> {
    let empty = Neighbor {
        neighbor: want.neighbor.clone(),
        ..Default::default()
    };
    let have = have.unwrap_or(&empty);
    let n = &want.neighbor;
    let mut lines = ContextLines::new();
    let keep = Absent::Ignore;

    lines.field(
        FieldChange::between(have.remote_as.as_ref(), want.remote_as.as_ref(), None, keep),
        |a| format!("neighbor {} remote-as {}", n, a),
        |_| format!("no neighbor {}", n),
    );
    lines.field(
        FieldChange::between(
            have.description.as_ref(),
            want.description.as_ref(),
            None,
            keep,
        ),
        |d| format!("neighbor {} description {}", n, d),
        |_| format!("no neighbor {} description", n),
    );
    lines.field(
        FieldChange::between(
            have.update_source.as_ref(),
            want.update_source.as_ref(),
            None,
            keep,
        ),
        |s| format!("neighbor {} update-source {}", n, s),
        |_| format!("no neighbor {} update-source", n),
    );
    lines.field(
        FieldChange::between(
            have.ebgp_multihop.as_ref(),
            want.ebgp_multihop.as_ref(),
            None,
            keep,
        ),
        |h| format!("neighbor {} ebgp-multihop {}", n, h),
        |_| format!("no neighbor {} ebgp-multihop", n),
    );
    lines.field(
        FieldChange::between(have.password.as_ref(), want.password.as_ref(), None, keep),
        |p| format!("neighbor {} password {}", n, p),
        |_| format!("no neighbor {} password", n),
    );
    lines.field(
        FieldChange::between(
            have.shutdown.as_ref(),
            want.shutdown.as_ref(),
            Some(&false),
            keep,
        ),
        |s| flag_line(*s, format!("neighbor {} shutdown", n)),
        |_| format!("no neighbor {} shutdown", n),
    );
    lines.into_lines()
}

fn merge_neighbors(
    lines: &mut Vec<String>,
    have: &[Neighbor],
    want: &[Neighbor],
) -> ModuleResult<()> {
    for neighbor in want {
        let existing = have.iter().find(|h| h.neighbor == neighbor.neighbor);
        match existing {
            Some(h)
                if neighbor
                    .remote_as
                    .is_some_and(|a| h.remote_as.is_some_and(|b| a != b)) =>
            {
                // remote-as cannot change in place
                let merged = merge_records(h, neighbor)?;
                lines.push(format!("no neighbor {}", neighbor.neighbor));
                lines.extend(neighbor_lines(None, &merged));
            }
            Some(h) => lines.extend(neighbor_lines(Some(h), neighbor)),
            None => {
                if neighbor.remote_as.is_none() {
                    return Err(ModuleError::InvalidParameter(format!(
                        "neighbor {} requires remote_as",
                        neighbor.neighbor
                    )));
                }
                lines.extend(neighbor_lines(None, neighbor));
            }
        }
    }
    Ok(())
}

fn merge_networks(lines: &mut Vec<String>, have: &[Network], want: &[Network]) {
    for network in want {
        match have.iter().find(|h| h.prefix == network.prefix) {
            Some(h) if network.route_map.is_none() || h.route_map == network.route_map => {}
            Some(_) => {
                lines.push(format!("no network {}", network.prefix));
                lines.push(network_line(network));
            }
            None => lines.push(network_line(network)),
        }
    }
}

/// Lines inside an address family block, only what differs from `have`
fn af_lines(have: Option<&AddressFamily>, want: &AddressFamily) -> Vec<String> {
    let mut lines = Vec::new();
    let (have_neighbors, have_networks, have_redistribute) = match have {
        Some(h) => (&h.neighbors[..], &h.networks[..], &h.redistribute[..]),
        None => (&[][..], &[][..], &[][..]),
    };

    for neighbor in &want.neighbors {
        let existing = have_neighbors.iter().find(|h| h.neighbor == neighbor.neighbor);
        let n = &neighbor.neighbor;
        if let FieldChange::Set(a) = FieldChange::between(
            existing.and_then(|h| h.remote_as.as_ref()),
            neighbor.remote_as.as_ref(),
            None,
            Absent::Ignore,
        ) {
            lines.push(format!("neighbor {} remote-as {}", n, a));
        }
        if let FieldChange::Set(a) = FieldChange::between(
            existing.and_then(|h| h.activate.as_ref()),
            neighbor.activate.as_ref(),
            None,
            Absent::Ignore,
        ) {
            lines.push(flag_line(*a, format!("neighbor {} activate", n)));
        }
    }
    merge_networks(&mut lines, have_networks, &want.networks);
    for redistribute in &want.redistribute {
        let existing = have_redistribute
            .iter()
            .find(|h| h.protocol == redistribute.protocol);
        match existing {
            Some(h) if redistribute.route_map.is_none() || h.route_map == redistribute.route_map => {}
            Some(_) => {
                lines.push(format!("no redistribute {}", redistribute.protocol));
                lines.push(redistribute_line(redistribute));
            }
            None => lines.push(redistribute_line(redistribute)),
        }
    }
    lines
}

fn push_block(lines: &mut Vec<String>, header: String, body: Vec<String>) {
    lines.push(header);
    lines.extend(body);
    lines.push("exit-address-family".to_string());
}

fn evpn_vrf_header(bgp_as: u32, vrf: &str) -> String {
    format!("router bgp {} vrf {}", bgp_as, vrf)
}

/// Merge want into have; `have` is None when the process is being created
fn merge_bgp(
    commands: &mut CommandSet,
    have: Option<&BgpConfig>,
    want: &BgpConfig,
) -> ModuleResult<()> {
    let empty = BgpConfig::new(want.bgp_as);
    let creating = have.is_none();
    let have = have.unwrap_or(&empty);
    let header = want.header();
    let mut vrf_contexts = CommandSet::new();
    let mut lines = ContextLines::new();

    lines.field(
        FieldChange::between(
            have.router_id.as_ref(),
            want.router_id.as_ref(),
            None,
            Absent::Ignore,
        ),
        |id| format!("bgp router-id {}", id),
        |_| "no bgp router-id".to_string(),
    );
    lines.field(
        FieldChange::between(
            have.log_neighbor_changes.as_ref(),
            want.log_neighbor_changes.as_ref(),
            None,
            Absent::Ignore,
        ),
        |on| flag_line(*on, "bgp log-neighbor-changes".to_string()),
        |_| "no bgp log-neighbor-changes".to_string(),
    );
    lines.field(
        FieldChange::between(have.timers.as_ref(), want.timers.as_ref(), None, Absent::Ignore),
        |t| format!("timers bgp {} {}", t.keepalive, t.holdtime),
        |_| "no timers bgp".to_string(),
    );

    let mut body = lines.into_lines();
    merge_neighbors(&mut body, &have.neighbors, &want.neighbors)?;
    merge_networks(&mut body, &have.networks, &want.networks);

    for af in &want.address_families {
        let existing = have
            .address_families
            .iter()
            .find(|h| h.key() == af.key());
        let af_body = af_lines(existing, af);
        if existing.is_none() || !af_body.is_empty() {
            push_block(&mut body, af.header(), af_body);
        }
    }

    if let Some(evpn) = &want.l2vpn_evpn {
        let empty_evpn = L2vpnEvpn::default();
        let existing = have.l2vpn_evpn.as_ref();
        let have_evpn = existing.unwrap_or(&empty_evpn);
        let mut evpn_body = Vec::new();
        if let FieldChange::Set(on) = FieldChange::between(
            have_evpn.advertise_all_vni.as_ref(),
            evpn.advertise_all_vni.as_ref(),
            Some(&false),
            Absent::Ignore,
        ) {
            evpn_body.push(flag_line(*on, "advertise-all-vni".to_string()));
        }
        for neighbor in &evpn.neighbors {
            let current = have_evpn
                .neighbors
                .iter()
                .find(|h| h.neighbor == neighbor.neighbor)
                .and_then(|h| h.activate.as_ref());
            if let FieldChange::Set(on) =
                FieldChange::between(current, neighbor.activate.as_ref(), None, Absent::Ignore)
            {
                evpn_body.push(flag_line(
                    *on,
                    format!("neighbor {} activate", neighbor.neighbor),
                ));
            }
        }
        if existing.is_none() || !evpn_body.is_empty() {
            push_block(&mut body, "address-family l2vpn evpn".to_string(), evpn_body);
        }
        for vrf in &evpn.vrfs {
            let current = have_evpn
                .vrfs
                .iter()
                .find(|h| h.name == vrf.name)
                .and_then(|h| h.advertise_ipv4_unicast.as_ref());
            let vrf_header = evpn_vrf_header(want.bgp_as, &vrf.name);
            match FieldChange::between(
                current,
                vrf.advertise_ipv4_unicast.as_ref(),
                Some(&false),
                Absent::Ignore,
            ) {
                FieldChange::Set(on) => vrf_contexts.extend_within(
                    &vrf_header,
                    [
                        "address-family l2vpn evpn".to_string(),
                        flag_line(*on, "advertise ipv4 unicast".to_string()),
                        "exit-address-family".to_string(),
                    ],
                ),
                _ if !have_evpn.vrfs.iter().any(|h| h.name == vrf.name) => {
                    vrf_contexts.enter(vrf_header)
                }
                _ => {}
            }
        }
    }

    if creating {
        commands.enter(header.clone());
    }
    commands.extend_within(&header, body);
    // per-VRF contexts follow the process context
    for line in vrf_contexts.into_commands() {
        commands.global(line);
    }
    Ok(())
}

/// Remove the sub-trees named in want
fn delete_parts(commands: &mut CommandSet, have: &BgpConfig, want: &BgpConfig) {
    let header = have.header();
    let mut lines = Vec::new();
    if want.router_id.is_some() && have.router_id.is_some() {
        lines.push("no bgp router-id".to_string());
    }
    if want.log_neighbor_changes.is_some() && have.log_neighbor_changes.is_some() {
        lines.push("no bgp log-neighbor-changes".to_string());
    }
    if want.timers.is_some() && have.timers.is_some() {
        lines.push("no timers bgp".to_string());
    }
    for neighbor in &want.neighbors {
        if have.neighbors.iter().any(|h| h.neighbor == neighbor.neighbor) {
            lines.push(format!("no neighbor {}", neighbor.neighbor));
        }
    }
    for network in &want.networks {
        if have.networks.iter().any(|h| h.prefix == network.prefix) {
            lines.push(format!("no network {}", network.prefix));
        }
    }
    for af in &want.address_families {
        let Some(existing) = have.address_families.iter().find(|h| h.key() == af.key()) else {
            continue;
        };
        if existing.vrf.is_some() && af.is_empty() {
            lines.push(format!("no {}", existing.header()));
            continue;
        }
        let target = if af.is_empty() { existing } else { af };
        let mut body = Vec::new();
        for neighbor in &target.neighbors {
            if existing.neighbors.iter().any(|h| h.neighbor == neighbor.neighbor) {
                body.push(format!("no neighbor {} activate", neighbor.neighbor));
            }
        }
        for network in &target.networks {
            if existing.networks.iter().any(|h| h.prefix == network.prefix) {
                body.push(format!("no network {}", network.prefix));
            }
        }
        for redistribute in &target.redistribute {
            if existing
                .redistribute
                .iter()
                .any(|h| h.protocol == redistribute.protocol)
            {
                body.push(format!("no redistribute {}", redistribute.protocol));
            }
        }
        if !body.is_empty() {
            push_block(&mut lines, existing.header(), body);
        }
    }
    let mut vrf_removals = Vec::new();
    if let (Some(evpn), Some(existing)) = (&want.l2vpn_evpn, &have.l2vpn_evpn) {
        if evpn.is_empty() {
            lines.push("no address-family l2vpn evpn".to_string());
        } else {
            let mut body = Vec::new();
            if evpn.advertise_all_vni.is_some() && existing.advertise_all_vni == Some(true) {
                body.push("no advertise-all-vni".to_string());
            }
            for neighbor in &evpn.neighbors {
                if existing.neighbors.iter().any(|h| h.neighbor == neighbor.neighbor) {
                    body.push(format!("no neighbor {} activate", neighbor.neighbor));
                }
            }
            if !body.is_empty() {
                push_block(&mut lines, "address-family l2vpn evpn".to_string(), body);
            }
        }
        // an empty l2vpn_evpn removes every EVPN VRF context with it
        let named = |name: &str| evpn.is_empty() || evpn.vrfs.iter().any(|v| v.name == name);
        for vrf in existing.vrfs.iter().filter(|v| named(&v.name)) {
            vrf_removals.push(format!("no {}", evpn_vrf_header(have.bgp_as, &vrf.name)));
        }
    }
    commands.extend_within(&header, lines);
    for removal in vrf_removals {
        commands.global(removal);
    }
}

/// Reconciler for `awplus_bgp`
#[derive(Debug, Clone, Copy, Default)]
pub struct Bgp;

impl Reconciler for Bgp {
    type Config = Option<BgpConfig>;

    const MODULE: &'static str = "awplus_bgp";
    const RESOURCE: &'static str = "bgp";
    const DESCRIPTION: &'static str =
        "Manage the BGP process, neighbors, networks and address families on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        if let Some(want) = want {
            want.validate()?;
        }
        let mut commands = CommandSet::new();

        match (state, want, have) {
            (State::Deleted, None, Some(have)) => {
                commands.global(format!("no {}", have.header()));
            }
            (State::Deleted, Some(want), Some(have)) if want.bgp_as == have.bgp_as => {
                if want.only_as() {
                    commands.global(format!("no {}", have.header()));
                } else {
                    delete_parts(&mut commands, have, want);
                }
            }
            (State::Deleted, _, _) => {}
            (_, None, _) => {}
            (_, Some(want), Some(have)) if want.bgp_as != have.bgp_as => {
                commands.global(format!("no {}", have.header()));
                merge_bgp(&mut commands, None, want)?;
            }
            (State::Merged, Some(want), have) => merge_bgp(&mut commands, have.as_ref(), want)?,
            (State::Replaced | State::Overridden, Some(want), Some(have)) => {
                if want.canonical() != have.canonical() {
                    commands.global(format!("no {}", have.header()));
                    merge_bgp(&mut commands, None, want)?;
                }
            }
            (State::Replaced | State::Overridden, Some(want), None) => {
                merge_bgp(&mut commands, None, want)?
            }
        }

        Ok(commands.into_commands())
    }
}

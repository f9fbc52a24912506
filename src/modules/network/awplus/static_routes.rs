//! Static routes, per VRF and address family
//!
//! Routes are flattened to one entry per next-hop and matched on
//! `(vrf, afi, destination, next-hop)`. An admin distance change removes the
//! route and adds it again.

use crate::modules::network::common::{
    check_address, check_prefix, check_range, ensure_unique, Afi, CommandSet, Reconciler, State,
};
use crate::modules::{ModuleError, ModuleResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Distance of a static route configured without one
const DEFAULT_DISTANCE: u8 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NextHop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_router_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_distance: Option<u8>,
}

impl NextHop {
    /// The next-hop as written on the command line
    fn target(&self) -> String {
        match (&self.forward_router_address, &self.interface) {
            (Some(address), Some(interface)) => format!("{} {}", address, interface),
            (Some(address), None) => address.clone(),
            (None, Some(interface)) => interface.clone(),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    pub dest: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_hops: Vec<NextHop>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressFamilyRoutes {
    pub afi: Afi,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticRouteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrf: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address_families: Vec<AddressFamilyRoutes>,
}

impl StaticRouteConfig {
    fn vrf_name(&self) -> String {
        self.vrf.clone().unwrap_or_else(|| "default".to_string())
    }

    fn validate(&self) -> ModuleResult<()> {
        let vrf = self.vrf_name();
        ensure_unique(
            &self.address_families,
            &format!("vrf {} address family", vrf),
            |af| af.afi,
        )?;
        for af in &self.address_families {
            ensure_unique(&af.routes, &format!("vrf {} {} route", vrf, af.afi), |r| {
                r.dest.clone()
            })?;
            for route in &af.routes {
                check_prefix("route destination", &route.dest, af.afi)?;
                ensure_unique(
                    &route.next_hops,
                    &format!("route {} next-hop", route.dest),
                    NextHop::target,
                )?;
                for next_hop in &route.next_hops {
                    if next_hop.forward_router_address.is_none() && next_hop.interface.is_none() {
                        return Err(ModuleError::InvalidParameter(format!(
                            "route {}: a next-hop needs forward_router_address or interface",
                            route.dest
                        )));
                    }
                    if let Some(address) = &next_hop.forward_router_address {
                        check_address("forward_router_address", address, af.afi)?;
                    }
                    if let Some(distance) = next_hop.admin_distance {
                        check_range("admin_distance", distance, 1, 255)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKey {
    vrf: Option<String>,
    afi: Afi,
    dest: String,
    next_hop: String,
}

impl RouteKey {
    fn line(&self, distance: Option<u8>) -> String {
        let mut line = format!("{} route ", self.afi.keyword());
        if let Some(vrf) = &self.vrf {
            line.push_str(&format!("vrf {} ", vrf));
        }
        line.push_str(&format!("{} {}", self.dest, self.next_hop));
        if let Some(distance) = distance {
            line.push_str(&format!(" {}", distance));
        }
        line
    }

    /// Whether this route falls under the part of the tree `config` names
    fn selected_by(&self, config: &[StaticRouteConfig]) -> bool {
        config.iter().filter(|v| v.vrf == self.vrf).any(|v| {
            v.address_families.is_empty()
                || v.address_families
                    .iter()
                    .filter(|af| af.afi == self.afi)
                    .any(|af| {
                        af.routes.is_empty()
                            || af.routes.iter().filter(|r| r.dest == self.dest).any(|r| {
                                r.next_hops.is_empty()
                                    || r.next_hops.iter().any(|nh| nh.target() == self.next_hop)
                            })
                    })
        })
    }
}

/// One entry per next-hop, in configuration order
fn flatten(config: &[StaticRouteConfig]) -> IndexMap<RouteKey, Option<u8>> {
    let mut entries = IndexMap::new();
    for vrf in config {
        for af in &vrf.address_families {
            for route in &af.routes {
                for next_hop in &route.next_hops {
                    let key = RouteKey {
                        vrf: vrf.vrf.clone(),
                        afi: af.afi,
                        dest: route.dest.clone(),
                        next_hop: next_hop.target(),
                    };
                    entries.insert(key, next_hop.admin_distance);
                }
            }
        }
    }
    entries
}

/// Reconciler for `awplus_static_routes`
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRoutes;

impl Reconciler for StaticRoutes {
    type Config = Vec<StaticRouteConfig>;

    const MODULE: &'static str = "awplus_static_routes";
    const RESOURCE: &'static str = "static_routes";
    const DESCRIPTION: &'static str = "Manage static routes on AlliedWare Plus";

    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        ensure_unique(want, "vrf", StaticRouteConfig::vrf_name)?;
        if state != State::Deleted {
            for vrf in want {
                vrf.validate()?;
            }
        }

        let have_routes = flatten(have);
        let want_routes = flatten(want);
        let mut removals = Vec::new();
        let mut additions = Vec::new();

        match state {
            State::Deleted => {
                for (key, distance) in &have_routes {
                    if want.is_empty() || key.selected_by(want) {
                        removals.push(format!("no {}", key.line(*distance)));
                    }
                }
            }
            State::Merged | State::Replaced | State::Overridden => {
                for (key, distance) in &have_routes {
                    if want_routes.contains_key(key) {
                        continue;
                    }
                    let in_scope = match state {
                        State::Overridden => true,
                        State::Replaced => want_routes
                            .keys()
                            .any(|w| w.vrf == key.vrf && w.afi == key.afi && w.dest == key.dest),
                        _ => false,
                    };
                    if in_scope {
                        removals.push(format!("no {}", key.line(*distance)));
                    }
                }
                for (key, distance) in &want_routes {
                    match have_routes.get(key) {
                        Some(current) => {
                            let target = match (distance, state) {
                                (Some(d), _) => Some(*d),
                                (None, State::Merged) => *current,
                                (None, _) => None,
                            };
                            let normalize = |d: Option<u8>| d.unwrap_or(DEFAULT_DISTANCE);
                            if normalize(target) != normalize(*current) {
                                removals.push(format!("no {}", key.line(*current)));
                                additions.push(key.line(target));
                            }
                        }
                        None => additions.push(key.line(*distance)),
                    }
                }
            }
        }

        let mut commands = CommandSet::new();
        for line in removals.into_iter().chain(additions) {
            commands.global(line);
        }
        Ok(commands.into_commands())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hop(address: &str, distance: Option<u8>) -> NextHop {
        NextHop {
            forward_router_address: Some(address.to_string()),
            interface: None,
            admin_distance: distance,
        }
    }

    fn routes(vrf: Option<&str>, afi: Afi, dest: &str, hops: Vec<NextHop>) -> StaticRouteConfig {
        StaticRouteConfig {
            vrf: vrf.map(str::to_string),
            address_families: vec![AddressFamilyRoutes {
                afi,
                routes: vec![Route {
                    dest: dest.to_string(),
                    next_hops: hops,
                }],
            }],
        }
    }

    fn have() -> Vec<StaticRouteConfig> {
        vec![
            routes(
                None,
                Afi::Ipv4,
                "10.0.0.0/8",
                vec![hop("192.168.1.1", None), hop("192.168.1.2", Some(5))],
            ),
            routes(Some("red"), Afi::Ipv4, "172.16.0.0/16", vec![hop("10.1.1.1", None)]),
        ]
    }

    #[test]
    fn test_merged_adds_route() {
        let want = vec![routes(
            None,
            Afi::Ipv6,
            "2001:db8::/32",
            vec![hop("2001:db8::1", Some(10))],
        )];
        let commands = StaticRoutes
            .reconcile(State::Merged, &want, &have())
            .unwrap();
        assert_eq!(commands, vec!["ipv6 route 2001:db8::/32 2001:db8::1 10"]);
    }

    #[test]
    fn test_distance_change_removes_then_adds() {
        let want = vec![routes(
            None,
            Afi::Ipv4,
            "10.0.0.0/8",
            vec![hop("192.168.1.2", Some(20))],
        )];
        let commands = StaticRoutes
            .reconcile(State::Merged, &want, &have())
            .unwrap();
        assert_eq!(
            commands,
            vec![
                "no ip route 10.0.0.0/8 192.168.1.2 5",
                "ip route 10.0.0.0/8 192.168.1.2 20",
            ]
        );
    }

    #[test]
    fn test_replaced_limits_removal_to_listed_destinations() {
        let want = vec![routes(
            None,
            Afi::Ipv4,
            "10.0.0.0/8",
            vec![hop("192.168.1.1", None)],
        )];
        let commands = StaticRoutes
            .reconcile(State::Replaced, &want, &have())
            .unwrap();
        assert_eq!(commands, vec!["no ip route 10.0.0.0/8 192.168.1.2 5"]);
    }

    #[test]
    fn test_overridden_removes_vrf_routes() {
        let want = vec![routes(
            None,
            Afi::Ipv4,
            "10.0.0.0/8",
            vec![hop("192.168.1.1", None), hop("192.168.1.2", Some(5))],
        )];
        let commands = StaticRoutes
            .reconcile(State::Overridden, &want, &have())
            .unwrap();
        assert_eq!(commands, vec!["no ip route vrf red 172.16.0.0/16 10.1.1.1"]);
    }

    #[test]
    fn test_deleted_by_vrf() {
        let want = vec![StaticRouteConfig {
            vrf: Some("red".into()),
            address_families: Vec::new(),
        }];
        let commands = StaticRoutes
            .reconcile(State::Deleted, &want, &have())
            .unwrap();
        assert_eq!(commands, vec!["no ip route vrf red 172.16.0.0/16 10.1.1.1"]);
    }

    #[test]
    fn test_deleted_single_next_hop() {
        let want = vec![routes(
            None,
            Afi::Ipv4,
            "10.0.0.0/8",
            vec![hop("192.168.1.1", None)],
        )];
        let commands = StaticRoutes
            .reconcile(State::Deleted, &want, &have())
            .unwrap();
        assert_eq!(commands, vec!["no ip route 10.0.0.0/8 192.168.1.1"]);
    }

    #[test]
    fn test_next_hop_family_mismatch() {
        let want = vec![routes(
            None,
            Afi::Ipv6,
            "2001:db8::/32",
            vec![hop("10.0.0.1", None)],
        )];
        assert!(StaticRoutes.reconcile(State::Merged, &want, &have()).is_err());
    }

    #[test]
    fn test_next_hop_requires_target() {
        let want = vec![routes(None, Afi::Ipv4, "10.1.0.0/16", vec![NextHop::default()])];
        assert!(StaticRoutes.reconcile(State::Merged, &want, &have()).is_err());
    }
}

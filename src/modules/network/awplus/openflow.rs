//! Openflow: global switch settings, controllers and openflow ports

use crate::modules::network::common::{
    check_address, check_range, ensure_unique, Afi, CommandSet, ContextLines, InterfaceId,
    Reconciler, State,
};
use crate::modules::network::diff::{list_diff, Absent, FieldChange, KeyedDiff};
use crate::modules::{ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailMode {
    SecureNonRuleExpired,
    SecureRuleExpired,
    Standalone,
}

impl fmt::Display for FailMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailMode::SecureNonRuleExpired => write!(f, "secure non-rule-expired"),
            FailMode::SecureRuleExpired => write!(f, "secure rule-expired"),
            FailMode::Standalone => write!(f, "standalone"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerProtocol {
    Tcp,
    Ssl,
}

impl fmt::Display for ControllerProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerProtocol::Tcp => write!(f, "tcp"),
            ControllerProtocol::Ssl => write!(f, "ssl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Controller {
    pub name: String,
    pub protocol: ControllerProtocol,
    pub address: String,
    pub l4_port: u16,
}

impl Controller {
    fn line(&self) -> String {
        format!(
            "openflow controller {} {} {} {}",
            self.name, self.protocol, self.address, self.l4_port
        )
    }

    fn removal(name: &str) -> String {
        format!("no openflow controller {}", name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenflowConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_vlan: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_mode: Option<FailMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactivity_timer: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controllers: Vec<Controller>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
}

impl OpenflowConfig {
    fn validate(&self) -> ModuleResult<()> {
        if let Some(vlan) = self.native_vlan {
            check_range("openflow native vlan", vlan, 1, 4094)?;
        }
        ensure_unique(&self.controllers, "openflow controller", |c| c.name.clone())?;
        for controller in &self.controllers {
            check_address(
                &format!("openflow controller {} address", controller.name),
                &controller.address,
                Afi::Ipv4,
            )?;
            check_range(
                &format!("openflow controller {} l4_port", controller.name),
                controller.l4_port,
                1,
                u16::MAX,
            )?;
        }
        ensure_unique(&self.ports, "openflow port", |p| p.clone())?;
        if let Some(port) = self.ports.iter().find(|p| InterfaceId::parse(p).is_none()) {
            return Err(ModuleError::InvalidParameter(format!(
                "invalid openflow port name '{}'",
                port
            )));
        }
        Ok(())
    }
}

/// Reconciler for `awplus_openflow`
#[derive(Debug, Clone, Copy, Default)]
pub struct Openflow;

fn global_lines(have: &OpenflowConfig, want: &OpenflowConfig, absent: Absent) -> ContextLines {
    let mut lines = ContextLines::new();
    lines.field(
        FieldChange::between(
            have.native_vlan.as_ref(),
            want.native_vlan.as_ref(),
            None,
            absent,
        ),
        |v| format!("openflow native vlan {}", v),
        |_| "no openflow native vlan".to_string(),
    );
    lines.field(
        FieldChange::between(
            have.fail_mode.as_ref(),
            want.fail_mode.as_ref(),
            None,
            absent,
        ),
        |m| format!("openflow failmode {}", m),
        |_| "no openflow failmode".to_string(),
    );
    lines.field(
        FieldChange::between(
            have.inactivity_timer.as_ref(),
            want.inactivity_timer.as_ref(),
            None,
            absent,
        ),
        |t| format!("openflow inactivity {}", t),
        |_| "no openflow inactivity".to_string(),
    );

    let controllers = KeyedDiff::new(&have.controllers, &want.controllers, |c| c.name.clone());
    if absent == Absent::Clear {
        for controller in controllers.have_only {
            lines.clear(Controller::removal(&controller.name));
        }
    }
    for (h, w) in controllers.pairs {
        match h {
            Some(h) if h == w => {}
            Some(h) => {
                lines.clear(Controller::removal(&h.name));
                lines.set(w.line());
            }
            None => lines.set(w.line()),
        }
    }
    lines
}

fn set_openflow(
    commands: &mut CommandSet,
    have: &OpenflowConfig,
    want: &OpenflowConfig,
    absent: Absent,
) {
    for line in global_lines(have, want, absent).into_lines() {
        commands.global(line);
    }
    let ports = list_diff(&have.ports, &want.ports);
    if absent == Absent::Clear {
        for port in &ports.removed {
            commands.within(&format!("interface {}", port), "no openflow");
        }
    }
    for port in &ports.added {
        commands.within(&format!("interface {}", port), "openflow");
    }
}

fn clear_openflow(commands: &mut CommandSet, have: &OpenflowConfig, want: &OpenflowConfig) {
    let mut lines = ContextLines::new();
    if want.native_vlan.is_some() && have.native_vlan.is_some() {
        lines.clear("no openflow native vlan");
    }
    if want.fail_mode.is_some() && have.fail_mode.is_some() {
        lines.clear("no openflow failmode");
    }
    if want.inactivity_timer.is_some() && have.inactivity_timer.is_some() {
        lines.clear("no openflow inactivity");
    }
    for controller in &have.controllers {
        if want.controllers.iter().any(|c| c.name == controller.name) {
            lines.clear(Controller::removal(&controller.name));
        }
    }
    for line in lines.into_lines() {
        commands.global(line);
    }
    for port in have.ports.iter().filter(|p| want.ports.contains(p)) {
        commands.within(&format!("interface {}", port), "no openflow");
    }
}

impl Reconciler for Openflow {
    type Config = Option<OpenflowConfig>;

    const MODULE: &'static str = "awplus_openflow";
    const RESOURCE: &'static str = "openflow";
    const DESCRIPTION: &'static str = "Manage openflow settings on AlliedWare Plus";

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

        let empty = OpenflowConfig::default();
        let have = have.as_ref().unwrap_or(&empty);
        let mut commands = CommandSet::new();
        match (state, want) {
            (State::Deleted, None) => set_openflow(&mut commands, have, &empty, Absent::Clear),
            (State::Deleted, Some(want)) => clear_openflow(&mut commands, have, want),
            (_, None) => {}
            (State::Merged, Some(want)) => set_openflow(&mut commands, have, want, Absent::Ignore),
            (State::Replaced | State::Overridden, Some(want)) => {
                set_openflow(&mut commands, have, want, Absent::Clear)
            }
        }
        Ok(commands.into_commands())
    }
}

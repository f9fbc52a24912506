//! Common network resource utilities and types
//!
//! This module provides shared functionality for the AlliedWare Plus resource
//! modules including:
//! - The reconciliation [`State`] (merged, replaced, overridden, deleted)
//! - Context-grouped command building ([`CommandSet`])
//! - The device boundary ([`DeviceSession`])
//! - The [`Reconciler`] trait and the generic [`ResourceModule`] wrapper
//! - Interface name, range and numeric validation helpers

use super::diff::{is_empty_value, remove_empties, Absent, FieldChange, FieldDiff, KeyedDiff};
use crate::modules::{
    Diff, Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult, ParamExt,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::Hash;
use std::net::IpAddr;
use tracing::{debug, info};

// ============================================================================
// Reconciliation State
// ============================================================================

/// Declarative state requested for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Add or modify what want specifies, never remove anything
    #[default]
    Merged,
    /// Reduce every key named in want to exactly want
    Replaced,
    /// Reduce the whole resource to exactly want
    Overridden,
    /// Remove the keys named in want, or everything when want is empty
    Deleted,
}

impl State {
    /// Whether an empty want is a user error for this state
    pub fn requires_config(self) -> bool {
        !matches!(self, State::Deleted)
    }

    /// How fields omitted from want are treated for keys present on both sides
    pub fn absent(self) -> Absent {
        match self {
            State::Merged => Absent::Ignore,
            State::Replaced | State::Overridden | State::Deleted => Absent::Clear,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Merged => write!(f, "merged"),
            State::Replaced => write!(f, "replaced"),
            State::Overridden => write!(f, "overridden"),
            State::Deleted => write!(f, "deleted"),
        }
    }
}

impl std::str::FromStr for State {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merged" => Ok(State::Merged),
            "replaced" => Ok(State::Replaced),
            "overridden" => Ok(State::Overridden),
            "deleted" => Ok(State::Deleted),
            _ => Err(ModuleError::InvalidParameter(format!(
                "Unknown state: {}. Valid options: merged, replaced, overridden, deleted",
                s
            ))),
        }
    }
}

// ============================================================================
// Command Building
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Block {
    header: Option<String>,
    lines: Vec<String>,
    standalone: bool,
}

/// Ordered command list grouped by configuration context.
///
/// Lines pushed for a context header always join the first block opened for
/// that header, so a header is rendered at most once per batch and blocks keep
/// the order in which their headers were first seen. Headers without lines are
/// dropped unless opened with [`CommandSet::enter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandSet {
    blocks: Vec<Block>,
}

impl CommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a top-level command
    pub fn global(&mut self, line: impl Into<String>) {
        let line = line.into();
        match self.blocks.last_mut() {
            Some(block) if block.header.is_none() => block.lines.push(line),
            _ => self.blocks.push(Block {
                header: None,
                lines: vec![line],
                standalone: false,
            }),
        }
    }

    /// Open a context that is rendered even when no line is pushed into it
    pub fn enter(&mut self, header: impl Into<String>) {
        let index = self.block_index(header.into());
        self.blocks[index].standalone = true;
    }

    /// Push a command scoped to a context
    pub fn within(&mut self, header: &str, line: impl Into<String>) {
        let index = self.block_index(header.to_string());
        self.blocks[index].lines.push(line.into());
    }

    /// Push several commands scoped to a context
    pub fn extend_within<I, S>(&mut self, header: &str, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = self.block_index(header.to_string());
        self.blocks[index]
            .lines
            .extend(lines.into_iter().map(Into::into));
    }

    fn block_index(&mut self, header: String) -> usize {
        if let Some(index) = self
            .blocks
            .iter()
            .position(|b| b.header.as_deref() == Some(header.as_str()))
        {
            return index;
        }
        self.blocks.push(Block {
            header: Some(header),
            lines: Vec::new(),
            standalone: false,
        });
        self.blocks.len() - 1
    }

    /// Whether rendering would produce no command at all
    pub fn is_empty(&self) -> bool {
        self.blocks
            .iter()
            .all(|b| b.lines.is_empty() && !(b.standalone && b.header.is_some()))
    }

    pub fn into_commands(self) -> Vec<String> {
        let mut commands = Vec::new();
        for block in self.blocks {
            match block.header {
                Some(header) if block.standalone || !block.lines.is_empty() => {
                    commands.push(header);
                    commands.extend(block.lines);
                }
                Some(_) => {}
                None => commands.extend(block.lines),
            }
        }
        commands
    }
}

/// Lines for one context: clears are rendered before sets
#[derive(Debug, Clone, Default)]
pub struct ContextLines {
    clears: Vec<String>,
    sets: Vec<String>,
}

impl ContextLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, line: impl Into<String>) {
        self.sets.push(line.into());
    }

    pub fn clear(&mut self, line: impl Into<String>) {
        self.clears.push(line.into());
    }

    /// Render a field change with the given set and clear forms
    pub fn field<T: PartialEq>(
        &mut self,
        change: FieldChange<'_, T>,
        set: impl FnOnce(&T) -> String,
        clear: impl FnOnce(&T) -> String,
    ) {
        match change {
            FieldChange::Set(value) => self.sets.push(set(value)),
            FieldChange::Clear(value) => self.clears.push(clear(value)),
            FieldChange::Unchanged => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clears.is_empty() && self.sets.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        let mut lines = self.clears;
        lines.extend(self.sets);
        lines
    }
}

/// Walk keyed want/have records according to `state`.
///
/// `set` receives the have counterpart, the want record and how omitted
/// fields are treated. `clear` receives a have record and, under `deleted`
/// with a want, the want record naming it. Under `overridden` have-only
/// records are cleared before any want record is applied.
pub fn walk_records<T, K, F, S, C>(
    state: State,
    want: &[T],
    have: &[T],
    key: F,
    commands: &mut CommandSet,
    mut set: S,
    mut clear: C,
) -> ModuleResult<()>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
    S: FnMut(&mut CommandSet, Option<&T>, &T, Absent) -> ModuleResult<()>,
    C: FnMut(&mut CommandSet, &T, Option<&T>) -> ModuleResult<()>,
{
    let diff = KeyedDiff::new(have, want, key);
    match state {
        State::Merged | State::Replaced => {
            for (h, w) in diff.pairs {
                set(commands, h, w, state.absent())?;
            }
        }
        State::Overridden => {
            for h in diff.have_only {
                clear(commands, h, None)?;
            }
            for (h, w) in diff.pairs {
                set(commands, h, w, Absent::Clear)?;
            }
        }
        State::Deleted if want.is_empty() => {
            for h in have {
                clear(commands, h, None)?;
            }
        }
        State::Deleted => {
            for (h, w) in diff.pairs {
                if let Some(h) = h {
                    clear(commands, h, Some(w))?;
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// Device Boundary
// ============================================================================

/// The collaborator that reads structured facts from a device and applies
/// command lists inside a configuration session.
pub trait DeviceSession: Send + Sync {
    /// Identifier used in logs (hostname, address)
    fn identifier(&self) -> &str;

    /// Structured facts for one resource, in the resource's config shape
    fn facts(&self, resource: &str) -> ModuleResult<serde_json::Value>;

    /// Push commands to the device, in order, inside a config session
    fn edit_config(&self, commands: &[String]) -> ModuleResult<()>;
}

// ============================================================================
// Reconciler Contract
// ============================================================================

/// Shape of a resource's want/have configuration
pub trait ResourceConfig:
    Serialize + DeserializeOwned + Default + Clone + fmt::Debug + Send + Sync
{
    fn is_empty(&self) -> bool;
}

impl<T> ResourceConfig for Vec<T>
where
    T: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync,
{
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl<T> ResourceConfig for Option<T>
where
    T: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync,
{
    fn is_empty(&self) -> bool {
        self.is_none()
    }
}

/// Diff-to-commands logic of one resource
pub trait Reconciler: Send + Sync + 'static {
    /// Want/have configuration shape
    type Config: ResourceConfig;

    /// Module name, e.g. `awplus_interfaces`
    const MODULE: &'static str;

    /// Resource name used to look facts up, e.g. `interfaces`
    const RESOURCE: &'static str;

    const DESCRIPTION: &'static str;

    /// Produce the ordered command list for `state`
    fn generate(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>>;

    /// Validate the preconditions then produce the ordered command list.
    ///
    /// Either the complete command list is returned or an error; never a
    /// partial list.
    fn reconcile(
        &self,
        state: State,
        want: &Self::Config,
        have: &Self::Config,
    ) -> ModuleResult<Vec<String>> {
        if state.requires_config() && want.is_empty() {
            return Err(ModuleError::InvalidParameter(format!(
                "value of config parameter must not be empty for state {}",
                state
            )));
        }
        let commands = self.generate(state, want, have)?;
        debug!(
            resource = Self::RESOURCE,
            %state,
            commands = commands.len(),
            "reconciled resource"
        );
        Ok(commands)
    }
}

/// Everything computed for one module invocation before anything is applied
#[derive(Debug, Clone)]
pub struct Plan<C> {
    pub state: State,
    pub want: C,
    pub have: C,
    pub commands: Vec<String>,
}

/// Exposes a [`Reconciler`] through the [`Module`] trait
pub struct ResourceModule<R> {
    reconciler: R,
}

impl<R: Reconciler> ResourceModule<R> {
    pub fn new(reconciler: R) -> Self {
        Self { reconciler }
    }

    fn parse_state(params: &ModuleParams) -> ModuleResult<State> {
        params
            .get_string("state")?
            .map(|s| s.parse())
            .transpose()
            .map(Option::unwrap_or_default)
    }

    fn parse_config(value: Option<&serde_json::Value>) -> ModuleResult<R::Config> {
        let Some(value) = value else {
            return Ok(R::Config::default());
        };
        let cleaned = remove_empties(value);
        if is_empty_value(&cleaned) {
            return Ok(R::Config::default());
        }
        serde_json::from_value(cleaned).map_err(|e| {
            ModuleError::ParseError(format!("{}: invalid config: {}", R::MODULE, e))
        })
    }

    fn gather(context: &ModuleContext) -> ModuleResult<R::Config> {
        match &context.device {
            Some(device) => Self::parse_config(Some(&device.facts(R::RESOURCE)?)),
            None => Self::parse_config(context.facts.get(R::RESOURCE)),
        }
    }

    /// Parse params, gather have and compute the command list
    pub fn plan(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<Plan<R::Config>> {
        let state = Self::parse_state(params)?;
        let want = Self::parse_config(params.get("config"))?;
        let have = Self::gather(context)?;
        let commands = self.reconciler.reconcile(state, &want, &have)?;
        Ok(Plan {
            state,
            want,
            have,
            commands,
        })
    }
}

fn to_yaml<T: Serialize>(value: &T) -> String {
    serde_yaml::to_string(value).unwrap_or_default()
}

impl<R: Reconciler> Module for ResourceModule<R> {
    fn name(&self) -> &'static str {
        R::MODULE
    }

    fn description(&self) -> &'static str {
        R::DESCRIPTION
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        let state = Self::parse_state(params)?;
        let want = Self::parse_config(params.get("config"))?;
        if state.requires_config() && want.is_empty() {
            return Err(ModuleError::InvalidParameter(format!(
                "value of config parameter must not be empty for state {}",
                state
            )));
        }
        Ok(())
    }

    fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let plan = self.plan(params, context)?;
        let field_diff = FieldDiff::between(&plan.have, &plan.want)?;

        let mut output = if plan.commands.is_empty() {
            ModuleOutput::ok(format!("{} already in {} state", R::RESOURCE, plan.state))
        } else {
            ModuleOutput::changed(format!(
                "{} command(s) generated for {} ({})",
                plan.commands.len(),
                R::RESOURCE,
                plan.state
            ))
        };
        output = output
            .with_data("commands", serde_json::to_value(&plan.commands)?)
            .with_data("before", serde_json::to_value(&plan.have)?)
            .with_data("diff", serde_json::to_value(&field_diff)?);

        let mut after = None;
        if !plan.commands.is_empty() && !context.check_mode {
            let device = context.device.as_ref().ok_or_else(|| {
                ModuleError::ExecutionFailed(format!(
                    "{} requires a device session to apply commands outside check mode",
                    R::MODULE
                ))
            })?;
            info!(
                device = device.identifier(),
                resource = R::RESOURCE,
                commands = plan.commands.len(),
                "applying configuration"
            );
            device.edit_config(&plan.commands)?;
            let refreshed = Self::gather(context)?;
            output = output.with_data("after", serde_json::to_value(&refreshed)?);
            after = Some(refreshed);
        }

        if context.diff_mode && !plan.commands.is_empty() {
            let after_text = match &after {
                Some(after) => to_yaml(after),
                None => to_yaml(&plan.want),
            };
            output = output.with_diff(
                Diff::new(to_yaml(&plan.have), after_text).with_details(plan.commands.join("\n")),
            );
        }

        Ok(output)
    }

    fn diff(&self, params: &ModuleParams, context: &ModuleContext) -> ModuleResult<Option<Diff>> {
        let plan = self.plan(params, context)?;
        if plan.commands.is_empty() {
            return Ok(None);
        }
        Ok(Some(Diff {
            before: to_yaml(&plan.have),
            after: format!("{} configuration commands", plan.commands.len()),
            details: Some(plan.commands.join("\n")),
        }))
    }
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Fail when a numeric field is outside `min..=max`
pub fn check_range<T>(what: &str, value: T, min: T, max: T) -> ModuleResult<()>
where
    T: PartialOrd + fmt::Display + Copy,
{
    if value < min || value > max {
        return Err(ModuleError::InvalidParameter(format!(
            "{} must be between {} and {}, got {}",
            what, min, max, value
        )));
    }
    Ok(())
}

/// Fail when two records share the same primary key
pub fn ensure_unique<T, K, F>(items: &[T], what: &str, key: F) -> ModuleResult<()>
where
    K: Eq + Hash + fmt::Display,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    for item in items {
        let k = key(item);
        if seen.contains(&k) {
            return Err(ModuleError::InvalidParameter(format!(
                "{} {} is specified more than once",
                what, k
            )));
        }
        seen.insert(k);
    }
    Ok(())
}

/// Accept a string or a number for a string field (`speed: 1000`)
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

// ============================================================================
// Addresses
// ============================================================================

/// Address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Afi {
    Ipv4,
    Ipv6,
}

impl fmt::Display for Afi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Afi::Ipv4 => write!(f, "ipv4"),
            Afi::Ipv6 => write!(f, "ipv6"),
        }
    }
}

impl Afi {
    /// Keyword used in CLI commands (`ip route`, `ipv6 route`)
    pub fn keyword(self) -> &'static str {
        match self {
            Afi::Ipv4 => "ip",
            Afi::Ipv6 => "ipv6",
        }
    }

    fn accepts(self, addr: &IpAddr) -> bool {
        matches!(
            (self, addr),
            (Afi::Ipv4, IpAddr::V4(_)) | (Afi::Ipv6, IpAddr::V6(_))
        )
    }

    fn max_prefix(self) -> u8 {
        match self {
            Afi::Ipv4 => 32,
            Afi::Ipv6 => 128,
        }
    }
}

/// Fail unless `value` is a host address of the family
pub fn check_address(what: &str, value: &str, afi: Afi) -> ModuleResult<()> {
    match value.parse::<IpAddr>() {
        Ok(addr) if afi.accepts(&addr) => Ok(()),
        _ => Err(ModuleError::InvalidParameter(format!(
            "{} '{}' is not a valid {} address",
            what, value, afi
        ))),
    }
}

/// Fail unless `value` is `address/length` of the family
pub fn check_prefix(what: &str, value: &str, afi: Afi) -> ModuleResult<()> {
    let invalid = || {
        ModuleError::InvalidParameter(format!(
            "{} '{}' is not a valid {} prefix",
            what, value, afi
        ))
    };
    let (addr, len) = value.split_once('/').ok_or_else(invalid)?;
    let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
    let len: u8 = len.parse().map_err(|_| invalid())?;
    if !afi.accepts(&addr) || len > afi.max_prefix() {
        return Err(invalid());
    }
    Ok(())
}

// ============================================================================
// VLAN Lists
// ============================================================================

/// A set of VLAN ids accepted as `7`, `"2-5,7"` or a list of either
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VlanSet(pub BTreeSet<u16>);

impl VlanSet {
    pub fn iter(&self) -> impl Iterator<Item = &u16> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self, what: &str) -> ModuleResult<()> {
        for vlan in &self.0 {
            check_range(what, *vlan, 1, 4094)?;
        }
        Ok(())
    }
}

impl FromIterator<u16> for VlanSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        VlanSet(iter.into_iter().collect())
    }
}

fn parse_vlan_text(text: &str) -> Result<Vec<u16>, String> {
    let mut vlans = Vec::new();
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: u16 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid VLAN range '{}'", part))?;
                let end: u16 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid VLAN range '{}'", part))?;
                if start > end {
                    return Err(format!("invalid VLAN range '{}'", part));
                }
                vlans.extend(start..=end);
            }
            None => vlans.push(
                part.parse()
                    .map_err(|_| format!("invalid VLAN id '{}'", part))?,
            ),
        }
    }
    Ok(vlans)
}

impl<'de> Deserialize<'de> for VlanSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Item {
            Id(u16),
            Text(String),
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(Item),
            Many(Vec<Item>),
        }

        let items = match Raw::deserialize(deserializer)? {
            Raw::One(item) => vec![item],
            Raw::Many(items) => items,
        };
        let mut set = BTreeSet::new();
        for item in items {
            match item {
                Item::Id(id) => {
                    set.insert(id);
                }
                Item::Text(text) => {
                    set.extend(parse_vlan_text(&text).map_err(serde::de::Error::custom)?);
                }
            }
        }
        Ok(VlanSet(set))
    }
}

// ============================================================================
// Interface Names
// ============================================================================

static INTERFACE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)([0-9]+(?:\.[0-9]+)*)?$").expect("valid regex"));

static INTERFACE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)([0-9]+(?:\.[0-9]+)*)-([A-Za-z]*)([0-9]+(?:\.[0-9]+)*)$")
        .expect("valid regex")
});

/// An interface name split into its type and numeric path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct InterfaceId {
    pub kind: String,
    pub path: Vec<u32>,
}

impl InterfaceId {
    pub fn parse(name: &str) -> Option<Self> {
        let caps = INTERFACE_NAME.captures(name.trim())?;
        let path = match caps.get(2) {
            Some(m) => parse_path(m.as_str())?,
            None => Vec::new(),
        };
        Some(Self {
            kind: caps[1].to_string(),
            path,
        })
    }
}

fn parse_path(text: &str) -> Option<Vec<u32>> {
    text.split('.').map(|p| p.parse().ok()).collect()
}

/// Expand a want interface name into concrete interface names.
///
/// Accepts a comma separated list of names and ranges (`port1.0.1-1.0.5`,
/// `port1.0.1-port1.0.5`, `vlan2-5`). Ranges select every available interface
/// of the same type between both ends. Every named interface and both ends of
/// every range must be present in `available`.
pub fn expand_interfaces(pattern: &str, available: &[&str]) -> ModuleResult<Vec<String>> {
    let mut names = Vec::new();

    for token in pattern.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let Some(caps) = INTERFACE_RANGE.captures(token) else {
            if InterfaceId::parse(token).is_none() {
                return Err(ModuleError::InvalidParameter(format!(
                    "invalid interface name '{}'",
                    token
                )));
            }
            if !available.contains(&token) {
                return Err(ModuleError::MissingResource(format!(
                    "interface {} does not exist",
                    token
                )));
            }
            names.push(token.to_string());
            continue;
        };

        let kind = &caps[1];
        let end_kind = &caps[3];
        if !end_kind.is_empty() && end_kind != kind {
            return Err(ModuleError::InvalidParameter(format!(
                "interface range {} mixes interface types {} and {}",
                token, kind, end_kind
            )));
        }
        let (Some(start), Some(end)) = (parse_path(&caps[2]), parse_path(&caps[4])) else {
            return Err(ModuleError::InvalidParameter(format!(
                "invalid interface range '{}'",
                token
            )));
        };
        if start.len() != end.len() {
            return Err(ModuleError::InvalidParameter(format!(
                "interface range {} mixes interface types",
                token
            )));
        }
        if start > end {
            return Err(ModuleError::InvalidParameter(format!(
                "interface range {} is reversed",
                token
            )));
        }
        for endpoint in [format!("{}{}", kind, &caps[2]), format!("{}{}", kind, &caps[4])] {
            if !available.contains(&endpoint.as_str()) {
                return Err(ModuleError::MissingResource(format!(
                    "interface {} does not exist",
                    endpoint
                )));
            }
        }

        let mut members: Vec<(InterfaceId, &str)> = available
            .iter()
            .filter_map(|name| InterfaceId::parse(name).map(|id| (id, *name)))
            .filter(|(id, _)| {
                id.kind == kind
                    && id.path.len() == start.len()
                    && id.path >= start
                    && id.path <= end
            })
            .collect();
        members.sort();
        names.extend(members.into_iter().map(|(_, name)| name.to_string()));
    }

    Ok(names)
}

/// A per-interface record whose `name` may be an interface list or range
pub trait InterfaceRecord: Clone {
    fn name(&self) -> &str;
    fn renamed(&self, name: &str) -> Self;
}

/// Expand ranges in want against the interfaces known in have, rejecting
/// unknown interfaces and interfaces named twice.
pub fn expand_want<T: InterfaceRecord>(want: &[T], have: &[T]) -> ModuleResult<Vec<T>> {
    let available: Vec<&str> = have.iter().map(InterfaceRecord::name).collect();
    let mut expanded = Vec::new();
    for record in want {
        for name in expand_interfaces(record.name(), &available)? {
            expanded.push(record.renamed(&name));
        }
    }
    ensure_unique(&expanded, "interface", |r| r.name().to_string())?;
    Ok(expanded)
}

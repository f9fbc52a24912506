//! Shared test utilities for the awplus-resources test suite.
//!
//! This module provides:
//! - A mock [`DeviceSession`] that serves facts and records applied commands
//! - Helpers for building module params and running a module by name
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use awplus_resources::modules::{
    DeviceSession, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleRegistry,
    ModuleResult,
};
use serde_json::Value;

// ============================================================================
// Mock Device Implementation
// ============================================================================

/// A device whose facts are fixed per resource until commands are applied
pub struct MockDevice {
    name: String,
    facts: Mutex<HashMap<String, Value>>,
    after: Mutex<HashMap<String, Value>>,
    applied: Mutex<Vec<Vec<String>>>,
    fail_apply: bool,
}

impl MockDevice {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            facts: Mutex::new(HashMap::new()),
            after: Mutex::new(HashMap::new()),
            applied: Mutex::new(Vec::new()),
            fail_apply: false,
        }
    }

    /// Facts served for a resource
    pub fn with_facts(self, resource: &str, facts: Value) -> Self {
        self.facts
            .lock()
            .unwrap()
            .insert(resource.to_string(), facts);
        self
    }

    /// Facts served for a resource once commands have been applied
    pub fn with_after(self, resource: &str, facts: Value) -> Self {
        self.after
            .lock()
            .unwrap()
            .insert(resource.to_string(), facts);
        self
    }

    /// Make every edit_config call fail
    pub fn failing(mut self) -> Self {
        self.fail_apply = true;
        self
    }

    /// Every command batch pushed so far
    pub fn applied(&self) -> Vec<Vec<String>> {
        self.applied.lock().unwrap().clone()
    }
}

impl DeviceSession for MockDevice {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn facts(&self, resource: &str) -> ModuleResult<Value> {
        Ok(self
            .facts
            .lock()
            .unwrap()
            .get(resource)
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn edit_config(&self, commands: &[String]) -> ModuleResult<()> {
        if self.fail_apply {
            return Err(ModuleError::ExecutionFailed(format!(
                "{}: configuration session rejected",
                self.name
            )));
        }
        self.applied.lock().unwrap().push(commands.to_vec());
        let after = self.after.lock().unwrap().clone();
        self.facts.lock().unwrap().extend(after);
        Ok(())
    }
}

// ============================================================================
// Module Helpers
// ============================================================================

/// Params for one module invocation
pub fn params(state: &str, config: Value) -> ModuleParams {
    let mut params = ModuleParams::new();
    params.insert("state".to_string(), Value::String(state.to_string()));
    params.insert("config".to_string(), config);
    params
}

/// Run a module in check mode against the given facts
pub fn plan(module: &str, state: &str, want: Value, have: Value) -> ModuleResult<ModuleOutput> {
    let resource = module.trim_start_matches("awplus_");
    let context = ModuleContext::new()
        .with_check_mode(true)
        .with_resource_facts(resource, have);
    ModuleRegistry::with_builtins().execute(module, &params(state, want), &context)
}

/// The command list a module generates in check mode
pub fn commands(module: &str, state: &str, want: Value, have: Value) -> Vec<String> {
    plan(module, state, want, have)
        .unwrap_or_else(|e| panic!("{} {} failed: {}", module, state, e))
        .commands()
}

/// Assert that every context header appears at most once
pub fn assert_unique_headers(commands: &[String], prefixes: &[&str]) {
    let mut seen = std::collections::HashSet::new();
    for command in commands {
        if prefixes.iter().any(|p| command.starts_with(p)) {
            assert!(
                seen.insert(command.clone()),
                "context header '{}' emitted twice in {:?}",
                command,
                commands
            );
        }
    }
}

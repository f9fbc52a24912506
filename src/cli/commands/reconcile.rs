//! Reconcile command: compute the commands for one resource
//!
//! Runs the resource module in check mode, so nothing is ever pushed to a
//! device; the generated command list is the result.

use super::CommandContext;
use crate::cli::diff::ColorizedDiff;
use crate::cli::output::ReconcileReport;
use anyhow::Result;
use awplus_resources::error::Error;
use awplus_resources::modules::network::{module_for_resource, State};
use awplus_resources::modules::{ModuleContext, ModuleParams, ModuleRegistry};
use clap::Parser;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Arguments for the reconcile command
#[derive(Parser, Debug, Clone)]
pub struct ReconcileArgs {
    /// Resource to reconcile (e.g. interfaces, vxlan, awplus_bgp)
    pub resource: String,

    /// Desired state (merged, replaced, overridden, deleted)
    #[arg(short, long)]
    pub state: Option<State>,

    /// Desired configuration of the resource (YAML or JSON)
    #[arg(long)]
    pub config: PathBuf,

    /// Current configuration of the resource (YAML or JSON)
    #[arg(long)]
    pub facts: Option<PathBuf>,
}

/// Read a YAML or JSON document into a JSON value
pub fn load_document(path: &Path) -> awplus_resources::Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let document: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| Error::input_parse(path, e.to_string()))?;
    serde_json::to_value(document).map_err(|e| Error::input_parse(path, e.to_string()))
}

impl ReconcileArgs {
    /// Execute the reconcile command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let module = module_for_resource(&self.resource)
            .ok_or_else(|| Error::UnknownResource(self.resource.clone()))?;
        let resource = module.trim_start_matches("awplus_");
        let state = self.state.unwrap_or(ctx.config.defaults.state);

        let want = load_document(&self.config)?;
        let facts_path = self
            .facts
            .clone()
            .or_else(|| ctx.config.facts.path_for(resource));
        let have = match &facts_path {
            Some(path) => {
                ctx.output
                    .info(&format!("Reading facts from {}", path.display()));
                load_document(path)?
            }
            None => {
                ctx.output.warning(&format!(
                    "No facts for {}, treating the device as unconfigured",
                    resource
                ));
                Value::Null
            }
        };

        let mut params = ModuleParams::new();
        params.insert("config".to_string(), want);
        params.insert("state".to_string(), Value::String(state.to_string()));

        let context = ModuleContext::new()
            .with_check_mode(true)
            .with_diff_mode(ctx.diff_mode)
            .with_resource_facts(resource, have);

        debug!(module, %state, "reconciling");
        let registry = ModuleRegistry::with_builtins();
        let result = registry
            .execute(module, &params, &context)
            .map_err(|e| Error::module(module, e))?;

        let rendered_diff = result.diff.as_ref().map(|diff| {
            ColorizedDiff::new(ctx.output.use_color()).diff(
                &diff.before,
                &diff.after,
                "before",
                "after",
            )
        });

        let report = ReconcileReport {
            module: module.to_string(),
            state: state.to_string(),
            changed: result.changed,
            msg: result.msg.clone(),
            commands: result.commands(),
            diff: if ctx.diff_mode {
                result.data.get("diff").cloned()
            } else {
                None
            },
        };
        ctx.output.report(&report, rendered_diff.as_deref())?;

        Ok(0)
    }
}

//! List command: show the available resource modules

use super::CommandContext;
use crate::cli::output::ModuleEntry;
use anyhow::Result;
use awplus_resources::modules::ModuleRegistry;
use clap::Parser;

/// Arguments for the list command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Only list modules whose name contains this text
    pub filter: Option<String>,
}

impl ListArgs {
    /// Execute the list command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let registry = ModuleRegistry::with_builtins();
        let entries: Vec<ModuleEntry> = registry
            .names()
            .into_iter()
            .filter(|name| {
                self.filter
                    .as_deref()
                    .map_or(true, |filter| name.contains(filter))
            })
            .filter_map(|name| registry.get(name))
            .map(|module| ModuleEntry {
                name: module.name().to_string(),
                resource: module.name().trim_start_matches("awplus_").to_string(),
                description: module.description().to_string(),
            })
            .collect();

        ctx.output.modules(&entries)?;
        Ok(0)
    }
}

//! Output formatting for awplus-reconcile
//!
//! Provides colored human output plus the JSON and YAML renderings of a
//! reconcile report.

use super::OutputFormat;
use colored::Colorize;
use serde::Serialize;

/// What a reconcile run produced
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub module: String,
    pub state: String,
    pub changed: bool,
    pub msg: String,
    pub commands: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<serde_json::Value>,
}

/// One entry of the module listing
#[derive(Debug, Clone, Serialize)]
pub struct ModuleEntry {
    pub name: String,
    pub resource: String,
    pub description: String,
}

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Selected output format
    format: OutputFormat,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, format: OutputFormat, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();
        if !use_color {
            colored::control::set_override(false);
        }

        Self {
            use_color,
            format,
            verbosity,
        }
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    fn is_structured(&self) -> bool {
        self.format != OutputFormat::Human
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.is_structured() {
            return;
        }

        if self.use_color {
            println!("{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Render one command line; removals stand out in red
    pub fn command_line(&self, command: &str) -> String {
        if self.use_color && command.starts_with("no ") {
            command.red().to_string()
        } else {
            command.to_string()
        }
    }

    /// Print a reconcile report in the selected format
    pub fn report(&self, report: &ReconcileReport, diff: Option<&str>) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(report)?),
            OutputFormat::Human => {
                if let Some(diff) = diff.filter(|d| !d.is_empty()) {
                    print!("{}", diff);
                }
                if report.commands.is_empty() {
                    let line = format!("ok: {}", report.msg);
                    if self.use_color {
                        println!("{}", line.green());
                    } else {
                        println!("{}", line);
                    }
                    return Ok(());
                }
                self.section(&format!("{} ({})", report.module, report.state));
                for command in &report.commands {
                    println!("{}", self.command_line(command));
                }
                let line = format!("changed: {}", report.msg);
                if self.use_color {
                    println!("{}", line.yellow());
                } else {
                    println!("{}", line);
                }
            }
        }
        Ok(())
    }

    /// Print the module listing in the selected format
    pub fn modules(&self, entries: &[ModuleEntry]) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(entries)?),
            OutputFormat::Human => {
                let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
                for entry in entries {
                    let name = format!("{:<width$}", entry.name, width = width);
                    if self.use_color {
                        println!("{}  {}", name.bold(), entry.description);
                    } else {
                        println!("{}  {}", name, entry.description);
                    }
                }
            }
        }
        Ok(())
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.is_structured() {
            let err = serde_json::json!({
                "type": "error",
                "message": message
            });
            eprintln!("{}", err);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.is_structured() {
            let warn = serde_json::json!({
                "type": "warning",
                "message": message
            });
            eprintln!("{}", warn);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an informational message (verbose only)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || self.is_structured() {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "INFO:".blue(), message);
        } else {
            eprintln!("INFO: {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_plain() {
        let output = OutputFormatter::new(false, OutputFormat::Human, 0);
        assert_eq!(output.command_line("interface port1.0.1"), "interface port1.0.1");
        assert_eq!(output.command_line("no shutdown"), "no shutdown");
    }

    #[test]
    fn test_report_serializes_without_diff() {
        let report = ReconcileReport {
            module: "awplus_vxlan".into(),
            state: "merged".into(),
            changed: true,
            msg: "2 command(s) generated for vxlan (merged)".into(),
            commands: vec!["nvo vxlan".into(), "map vlan 30 vni 7000".into()],
            diff: None,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["commands"][1], "map vlan 30 vni 7000");
        assert!(value.get("diff").is_none());
    }
}

//! Colorized before/after diff of a resource's configuration
//!
//! Uses the similar crate to render a unified diff of the YAML documents a
//! module reports in diff mode.

use colored::Colorize;
use similar::{ChangeTag, DiffOp, TextDiff};

/// Extract hunk range information from diff operations
/// Returns (old_start, old_len, new_start, new_len) in 1-based line numbers for display
fn hunk_ranges(ops: &[DiffOp]) -> (usize, usize, usize, usize) {
    let (Some(first), Some(last)) = (ops.first(), ops.last()) else {
        return (1, 0, 1, 0);
    };
    let old_start = first.old_range().start;
    let new_start = first.new_range().start;
    let old_len = last.old_range().end.saturating_sub(old_start);
    let new_len = last.new_range().end.saturating_sub(new_start);
    (old_start + 1, old_len, new_start + 1, new_len)
}

/// Colorized unified diff generator
#[derive(Debug, Clone)]
pub struct ColorizedDiff {
    context_lines: usize,
    use_color: bool,
}

impl Default for ColorizedDiff {
    fn default() -> Self {
        Self {
            context_lines: 3,
            use_color: true,
        }
    }
}

impl ColorizedDiff {
    pub fn new(use_color: bool) -> Self {
        Self {
            use_color,
            ..Default::default()
        }
    }

    fn paint(&self, text: String, tag: Option<ChangeTag>) -> String {
        if !self.use_color {
            return text;
        }
        match tag {
            Some(ChangeTag::Delete) => text.red().to_string(),
            Some(ChangeTag::Insert) => text.green().to_string(),
            Some(ChangeTag::Equal) => text.dimmed().to_string(),
            None => text.cyan().to_string(),
        }
    }

    /// Unified diff between two documents, empty when they are equal
    pub fn diff(&self, old: &str, new: &str, old_name: &str, new_name: &str) -> String {
        let diff = TextDiff::from_lines(old, new);
        let mut output = String::new();

        let mut hunks = diff
            .unified_diff()
            .context_radius(self.context_lines)
            .iter_hunks()
            .peekable();
        if hunks.peek().is_none() {
            return output;
        }

        output.push_str(&self.paint(format!("--- {}", old_name), Some(ChangeTag::Delete)));
        output.push('\n');
        output.push_str(&self.paint(format!("+++ {}", new_name), Some(ChangeTag::Insert)));
        output.push('\n');

        for hunk in hunks {
            let (old_start, old_len, new_start, new_len) = hunk_ranges(hunk.ops());
            let header = format!(
                "@@ -{},{} +{},{} @@",
                old_start, old_len, new_start, new_len
            );
            output.push_str(&self.paint(header, None));
            output.push('\n');

            for change in hunk.iter_changes() {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                let line = change.value().trim_end_matches('\n');
                output.push_str(&self.paint(format!("{}{}", sign, line), Some(change.tag())));
                output.push('\n');
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_equal_documents_produce_nothing() {
        let diff = ColorizedDiff::new(false);
        assert_eq!(diff.diff("a: 1\n", "a: 1\n", "before", "after"), "");
    }

    #[test]
    fn test_unified_diff_plain() {
        let diff = ColorizedDiff::new(false);
        let output = diff.diff(
            "- vlan: 10\n  vni: 5000\n",
            "- vlan: 10\n  vni: 5001\n",
            "before",
            "after",
        );
        assert_eq!(
            output,
            "--- before\n+++ after\n@@ -1,2 +1,2 @@\n - vlan: 10\n-  vni: 5000\n+  vni: 5001\n"
        );
    }
}

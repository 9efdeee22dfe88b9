use pure_ide_session::TestSummary;
use pure_ide_tree::TreeData;
use std::fmt::Write;

/// Console output, newline-terminated unless empty.
pub(crate) fn console(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}

pub(crate) fn test_summary(summary: &TestSummary) -> String {
    let mut out = format!(
        "{} test(s): {} passed, {} failed, {} error(s)",
        summary.total, summary.passed, summary.failed, summary.errors
    );
    if summary.running > 0 {
        let _ = write!(out, ", {} not run", summary.running);
    }
    out.push('\n');
    out
}

/// Open nodes indented by depth; `+` marks nodes that can still be expanded.
pub(crate) fn tree<V>(data: &TreeData<V>) -> String {
    let mut out = String::new();
    for (depth, node) in data.walk() {
        let marker = match &node.child_ids {
            Some(children) if children.is_empty() => ' ',
            _ if node.is_open => '-',
            _ => '+',
        };
        let _ = writeln!(out, "{}{marker} {}", "  ".repeat(depth), node.label);
    }
    out
}

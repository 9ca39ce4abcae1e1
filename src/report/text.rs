use super::types::{RunReport, Suite};
use crate::runner::state::TestVerdict;
use colored::Colorize;
use std::fmt::Write;

const RULE_WIDTH: usize = 80;

/// Human-readable report
pub fn render(report: &RunReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let summary = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(
        out,
        "{}: {}/{} passed ({:.1}%)",
        report.suite.title().to_uppercase().bold(),
        summary.passed,
        summary.total,
        summary.success_rate
    );
    let _ = writeln!(out, "{}", rule);

    for verdict in &report.results {
        match report.suite {
            Suite::Workflows => write_workflow(&mut out, verdict),
            Suite::Nodes => write_node(&mut out, verdict),
        }
    }

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(
        out,
        "SUMMARY: {} passed, {} failed, {:.1}% success rate",
        summary.passed, summary.failed, summary.success_rate
    );
    let _ = writeln!(out, "{}", rule);
    out
}

fn status(success: bool) -> String {
    if success {
        "✅ PASSED".green().bold().to_string()
    } else {
        "❌ FAILED".red().bold().to_string()
    }
}

fn write_workflow(out: &mut String, verdict: &TestVerdict) {
    let _ = writeln!(
        out,
        "\n{}: {} (ID: {})",
        status(verdict.success),
        verdict.target_name,
        verdict.target_id
    );
    let _ = writeln!(
        out,
        "  Execution Time: {:.2}s",
        verdict.elapsed.as_secs_f64()
    );
    if let Some(id) = &verdict.execution_id {
        let _ = writeln!(out, "  Execution ID: {}", id);
    }
    if !verdict.success {
        if let Some(message) = &verdict.error_message {
            let _ = writeln!(out, "  Error: {}", message.red());
        }
    }
    if let Some(steps) = verdict.nodes_tested.as_ref().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "  Nodes Tested: {}", steps.join(", "));
    }
}

fn write_node(out: &mut String, verdict: &TestVerdict) {
    let _ = writeln!(out, "\n{}: {}", status(verdict.success), verdict.target_name);

    let description = verdict
        .output_data
        .as_ref()
        .and_then(|o| o.get("info"))
        .and_then(|i| i.get("description"))
        .and_then(|d| d.as_str());
    if let Some(description) = description {
        let _ = writeln!(out, "  Description: {}", description);
    }

    let Some(checks) = &verdict.checks else {
        if let Some(message) = &verdict.error_message {
            let _ = writeln!(out, "  Error: {}", message.red());
        }
        return;
    };

    for check in checks {
        let mark = if check.success { "✅" } else { "❌" };
        let _ = writeln!(out, "  {} {}: {}", mark, check.name, check.message);
        if !check.success {
            for (key, value) in &check.details {
                let _ = writeln!(out, "    - {}: {}", key, value);
            }
        }
    }
}

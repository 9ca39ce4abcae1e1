use super::types::RunReport;
use crate::runner::state::TestVerdict;

/// GitHub Actions workflow commands: a collapsed summary group and one
/// `::error` annotation per failed target
pub fn render(report: &RunReport) -> String {
    let summary = &report.summary;
    let mut lines = vec![
        format!("::group::{}", report.suite.title()),
        format!(
            "Total: {}, Passed: {}, Failed: {}, Success Rate: {:.1}%",
            summary.total, summary.passed, summary.failed, summary.success_rate
        ),
        "::endgroup::".to_string(),
    ];

    lines.extend(
        report
            .results
            .iter()
            .filter(|v| !v.success)
            .map(annotation),
    );

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn annotation(verdict: &TestVerdict) -> String {
    let message = verdict.error_message.as_deref().unwrap_or_default();
    // Node verdicts already name their failed checks in the message
    let steps = match (&verdict.checks, &verdict.nodes_tested) {
        (None, Some(steps)) if !steps.is_empty() => {
            format!(" (Nodes tested: {})", steps.join(", "))
        }
        _ => String::new(),
    };
    format!(
        "::error file={}::{}",
        verdict.target_id,
        escape(&format!("{}{}", message, steps))
    )
}

/// Workflow command data must not contain raw line breaks
fn escape(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

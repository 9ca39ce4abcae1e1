use super::types::RunReport;
use anyhow::Result;

/// Machine-readable report: summary, results, run id and timestamp
pub fn render(report: &RunReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::types::Suite;
    use crate::runner::state::TestVerdict;
    use serde_json::Value;
    use std::time::Duration;

    #[test]
    fn test_report_shape() {
        let verdict = TestVerdict::failure(
            "wf-7",
            "Nightly Sync",
            Duration::from_millis(250),
            "Workflow 'wf-7' not found".to_string(),
        );
        let json = render(&RunReport::new(Suite::Workflows, vec![verdict])).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["summary"]["total"], 1);
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["summary"]["success_rate"], 0.0);
        assert_eq!(value["suite"], "workflows");
        assert_eq!(value["results"][0]["target_id"], "wf-7");
        assert_eq!(value["results"][0]["execution_time"], 0.25);
        assert!(value["run_id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(value["results"][0].get("checks").is_none());
    }
}

use crate::driver::types::{ExecutionRecord, ExecutionStatus};
use serde_json::{Map, Value};

/// Message attached to a failed execution whose steps carry no error
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Structured verdict derived from a terminal execution record
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub success: bool,
    pub failing_step: Option<String>,
    pub message: String,
    /// Non-empty `main` output per step, in step order
    pub output_by_step: Map<String, Value>,
    /// Step names in the order first encountered
    pub steps_touched: Vec<String>,
}

/// Derive pass/fail from an execution record.
///
/// Only the first erroring step (in the record's own order) is reported on
/// failure; further failures in the same execution are not aggregated.
pub fn classify(record: &ExecutionRecord) -> Classification {
    let mut steps_touched: Vec<String> = Vec::new();
    for step in &record.node_executions {
        if !steps_touched.contains(&step.name) {
            steps_touched.push(step.name.clone());
        }
    }

    if record.status == ExecutionStatus::Success {
        let mut output_by_step = Map::new();
        for step in &record.node_executions {
            // Later attempts overwrite earlier ones
            for run in &step.runs {
                if let Some(main) = run.main_output() {
                    output_by_step.insert(step.name.clone(), main.clone());
                }
            }
        }
        return Classification {
            success: true,
            failing_step: None,
            message: "Execution completed successfully".to_string(),
            output_by_step,
            steps_touched,
        };
    }

    let first_error = record.node_executions.iter().find_map(|step| {
        step.runs
            .iter()
            .find_map(|run| run.error_message())
            .map(|message| (step.name.clone(), message))
    });

    let (failing_step, message) = match first_error {
        Some((step, error)) => {
            let message = format!("Error in step '{}': {}", step, error);
            (Some(step), message)
        }
        None => (None, UNKNOWN_ERROR.to_string()),
    };

    Classification {
        success: false,
        failing_step,
        message,
        output_by_step: Map::new(),
        steps_touched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::types::StepRun;
    use serde_json::json;

    fn ok_run() -> StepRun {
        StepRun::default()
    }

    fn output_run(payload: Value) -> StepRun {
        StepRun {
            error: None,
            data: Some(json!({ "main": payload })),
        }
    }

    fn error_run(message: &str) -> StepRun {
        StepRun {
            error: Some(json!({ "message": message })),
            data: None,
        }
    }

    #[test]
    fn test_success_collects_outputs_and_steps() {
        let record = ExecutionRecord::new(ExecutionStatus::Success)
            .with_step("A", vec![ok_run()])
            .with_step("B", vec![output_run(json!([[{ "json": { "n": 1 } }]]))]);

        let c = classify(&record);
        assert!(c.success);
        assert_eq!(c.failing_step, None);
        assert_eq!(c.steps_touched, vec!["A", "B"]);
        assert_eq!(c.output_by_step.len(), 1);
        assert_eq!(c.output_by_step["B"], json!([[{ "json": { "n": 1 } }]]));
    }

    #[test]
    fn test_first_erroring_step_wins() {
        let record = ExecutionRecord::new(ExecutionStatus::Error)
            .with_step("A", vec![error_run("rate limit")])
            .with_step("B", vec![])
            .with_step("C", vec![error_run("later failure")]);

        let c = classify(&record);
        assert!(!c.success);
        assert_eq!(c.failing_step.as_deref(), Some("A"));
        assert_eq!(c.message, "Error in step 'A': rate limit");
        assert!(c.output_by_step.is_empty());
    }

    #[test]
    fn test_error_in_later_attempt_is_found() {
        let record = ExecutionRecord::new(ExecutionStatus::Failed)
            .with_step("Fetch", vec![ok_run(), error_run("timeout after retry")]);

        let c = classify(&record);
        assert_eq!(c.failing_step.as_deref(), Some("Fetch"));
        assert_eq!(c.message, "Error in step 'Fetch': timeout after retry");
    }

    #[test]
    fn test_failure_without_step_error_is_unknown() {
        let record = ExecutionRecord::new(ExecutionStatus::Failed).with_step("A", vec![ok_run()]);

        let c = classify(&record);
        assert!(!c.success);
        assert_eq!(c.failing_step, None);
        assert_eq!(c.message, UNKNOWN_ERROR);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let record = ExecutionRecord::new(ExecutionStatus::Error)
            .with_step("A", vec![ok_run()])
            .with_step("B", vec![error_run("bad request")]);

        let first = classify(&record);
        let second = classify(&record);
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_step_names_touched_once() {
        let record = ExecutionRecord::new(ExecutionStatus::Success)
            .with_step("Loop", vec![ok_run()])
            .with_step("Loop", vec![ok_run()]);
        assert_eq!(classify(&record).steps_touched, vec!["Loop"]);
    }
}

use crate::runner::state::TestVerdict;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which pipeline produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    Workflows,
    Nodes,
}

impl Suite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Suite::Workflows => "workflows",
            Suite::Nodes => "nodes",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Suite::Workflows => "Workflow Test Results",
            Suite::Nodes => "Custom Node Test Results",
        }
    }
}

/// Pass/fail counts for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Percentage of passed targets, 0 for an empty run
    pub success_rate: f64,
}

impl RunSummary {
    pub fn from_verdicts(verdicts: &[TestVerdict]) -> Self {
        let total = verdicts.len();
        let passed = verdicts.iter().filter(|v| v.success).count();
        let success_rate = if total > 0 {
            passed as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total,
            passed,
            failed: total - passed,
            success_rate,
        }
    }
}

/// Everything a renderer needs for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub suite: Suite,
    pub generated_at: String,
    pub summary: RunSummary,
    pub results: Vec<TestVerdict>,
}

impl RunReport {
    pub fn new(suite: Suite, results: Vec<TestVerdict>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            suite,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            summary: RunSummary::from_verdicts(&results),
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }
}

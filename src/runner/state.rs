use super::classifier::Classification;
use crate::error::HarnessError;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Progress of one target through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStage {
    Discovered,
    DataPrepared,
    Triggered,
    Polled,
    Classified,
    Done,
}

impl fmt::Display for TestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestStage::Discovered => "discovered",
            TestStage::DataPrepared => "data prepared",
            TestStage::Triggered => "triggered",
            TestStage::Polled => "polled",
            TestStage::Classified => "classified",
            TestStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of one check run against a node module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: String,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl CheckOutcome {
    pub fn new(name: &str, success: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            success,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Final outcome of testing one target
///
/// Built once per target and never modified afterwards; this is what the
/// reporters consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestVerdict {
    pub target_id: String,
    pub target_name: String,
    pub success: bool,
    #[serde(rename = "execution_time", serialize_with = "as_secs")]
    #[serde(deserialize_with = "from_secs")]
    pub elapsed: Duration,
    pub execution_id: Option<String>,
    pub error_message: Option<String>,
    pub failing_step: Option<String>,
    pub output_data: Option<Map<String, Value>>,
    pub nodes_tested: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<CheckOutcome>>,
}

impl TestVerdict {
    /// A failed verdict that carries nothing but an error message
    pub fn failure(target_id: &str, target_name: &str, elapsed: Duration, message: String) -> Self {
        Self {
            target_id: target_id.to_string(),
            target_name: target_name.to_string(),
            success: false,
            elapsed,
            execution_id: None,
            error_message: Some(message),
            failing_step: None,
            output_data: None,
            nodes_tested: None,
            checks: None,
        }
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.checks.iter().flatten().filter(|c| !c.success)
    }
}

fn as_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

fn from_secs<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let secs = f64::deserialize(d)?;
    Ok(Duration::from_secs_f64(secs.max(0.0)))
}

/// Tracks one target while it moves through the stages
#[derive(Debug)]
pub struct TargetRun {
    pub target_id: String,
    pub target_name: String,
    pub stage: TestStage,
    pub execution_id: Option<String>,
    started_at: Instant,
}

impl TargetRun {
    pub fn start(target_id: &str) -> Self {
        Self {
            target_id: target_id.to_string(),
            // Until the descriptor is fetched the id is all we have
            target_name: target_id.to_string(),
            stage: TestStage::Discovered,
            execution_id: None,
            started_at: Instant::now(),
        }
    }

    pub fn advance(&mut self, stage: TestStage) {
        log::debug!("{}: {} -> {}", self.target_id, self.stage, stage);
        self.stage = stage;
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stop at the current stage with an error
    pub fn fail(self, error: &HarnessError) -> TestVerdict {
        log::error!(
            "Error testing {} (stage: {}): {}",
            self.target_id,
            self.stage,
            error
        );
        let mut verdict = TestVerdict::failure(
            &self.target_id,
            &self.target_name,
            self.elapsed(),
            error.to_string(),
        );
        verdict.execution_id = self.execution_id;
        verdict
    }

    /// Normal completion from a classified execution
    pub fn finish(mut self, classification: Classification) -> TestVerdict {
        self.advance(TestStage::Done);
        let elapsed = self.elapsed();
        let Classification {
            success,
            failing_step,
            message,
            output_by_step,
            steps_touched,
        } = classification;

        TestVerdict {
            target_id: self.target_id,
            target_name: self.target_name,
            success,
            elapsed,
            execution_id: self.execution_id,
            error_message: (!success).then_some(message),
            failing_step,
            output_data: success.then_some(output_by_step),
            nodes_tested: Some(steps_touched),
            checks: None,
        }
    }
}

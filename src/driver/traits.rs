use super::types::{ExecutionRecord, TriggerResponse, WorkflowDescriptor};
use crate::error::HarnessResult;
use async_trait::async_trait;
use serde_json::Value;

/// Automation platform interface
///
/// The four operations the workflow harness needs from the platform. A live
/// implementation talks to the REST API; the canned one answers executions
/// with mock downstream responses so workflows can be exercised in
/// isolation.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// Short name used in logs ("live", "canned")
    fn name(&self) -> &str;

    /// Fetch one workflow
    ///
    /// Fails with `NotFound` when the platform answers 404.
    async fn get_workflow(&self, workflow_id: &str) -> HarnessResult<WorkflowDescriptor>;

    /// List workflows, optionally restricted to a tag, in platform order
    async fn list_workflows(&self, tag: Option<&str>) -> HarnessResult<Vec<WorkflowDescriptor>>;

    /// Start an execution with the given input
    ///
    /// The response may lack an execution ID; the caller decides how to
    /// treat that.
    async fn execute_workflow(&self, workflow_id: &str, input: &Value)
        -> HarnessResult<TriggerResponse>;

    /// Current snapshot of an execution
    async fn get_execution(&self, execution_id: &str) -> HarnessResult<ExecutionRecord>;
}

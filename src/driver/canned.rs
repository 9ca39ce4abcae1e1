//! Canned platform client for the isolated test environment
//!
//! Discovery and workflow reads go to the wrapped client so the real
//! workflow graph is used, but executions never leave the process: each
//! trigger is answered with a synthetic execution in which every node
//! produces the mock downstream response for its node type.

use super::traits::WorkflowApi;
use super::types::{
    ExecutionRecord, ExecutionStatus, StepRun, TriggerResponse, WorkflowDescriptor,
};
use crate::error::{HarnessError, HarnessResult};
use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Mock responses for the external services workflows usually call
pub struct MockService;

impl MockService {
    /// Chat completion shaped payload; the prompt picks the flavour
    pub fn openai_response(prompt: &str) -> Value {
        let prompt = prompt.to_lowercase();
        let content = if prompt.contains("generate content") {
            "This is a mock response for content generation.".to_string()
        } else if prompt.contains("classify") {
            json!({
                "category": "Test Category",
                "confidence": 0.95,
                "reasoning": "This is a test classification."
            })
            .to_string()
        } else {
            "This is a generic mock response.".to_string()
        };
        json!({
            "choices": [
                { "message": { "content": content } }
            ]
        })
    }

    pub fn langchain_response() -> Value {
        json!({
            "result": {
                "output": "This is a mock LangChain response.",
                "metadata": {
                    "model": "mock-model",
                    "tokens": 15,
                    "process_time": 0.1
                }
            }
        })
    }

    pub fn webhook_response() -> Value {
        json!({
            "status": "success",
            "webhook_id": "mock-webhook-id",
            "data": {
                "timestamp": chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
                "event": "mock_event",
                "payload": { "key": "value" }
            }
        })
    }

    /// Payload for one node, chosen by a case-insensitive match on its type
    pub fn response_for(node_type: &str, input: &Value) -> Value {
        let node_type = node_type.to_lowercase();
        if node_type.contains("openai") {
            Self::openai_response(&input.to_string())
        } else if node_type.contains("langchain") {
            Self::langchain_response()
        } else if node_type.contains("webhook") {
            Self::webhook_response()
        } else {
            input.clone()
        }
    }
}

struct PendingExecution {
    workflow: WorkflowDescriptor,
    input: Value,
}

/// Client that forwards reads and answers executions itself
pub struct CannedApi {
    inner: Arc<dyn WorkflowApi>,
    executions: Mutex<HashMap<String, PendingExecution>>,
}

impl CannedApi {
    pub fn new(inner: Arc<dyn WorkflowApi>) -> Self {
        Self {
            inner,
            executions: Mutex::new(HashMap::new()),
        }
    }

    fn synthesize(execution_id: &str, pending: &PendingExecution) -> ExecutionRecord {
        let mut record = ExecutionRecord::new(ExecutionStatus::Success);
        record.id = Some(execution_id.to_string());
        for node in &pending.workflow.nodes {
            let payload = MockService::response_for(&node.node_type, &pending.input);
            let run = StepRun {
                error: None,
                data: Some(json!({ "main": [[{ "json": payload }]] })),
            };
            record = record.with_step(&node.name, vec![run]);
        }
        record
    }
}

#[async_trait]
impl WorkflowApi for CannedApi {
    fn name(&self) -> &str {
        "canned"
    }

    async fn get_workflow(&self, workflow_id: &str) -> HarnessResult<WorkflowDescriptor> {
        self.inner.get_workflow(workflow_id).await
    }

    async fn list_workflows(&self, tag: Option<&str>) -> HarnessResult<Vec<WorkflowDescriptor>> {
        self.inner.list_workflows(tag).await
    }

    async fn execute_workflow(
        &self,
        workflow_id: &str,
        input: &Value,
    ) -> HarnessResult<TriggerResponse> {
        let workflow = self.inner.get_workflow(workflow_id).await?;
        let execution_id = format!("canned-{}", Uuid::new_v4());
        debug!(
            "Answering execution of {} with {} canned node responses",
            workflow_id,
            workflow.nodes.len()
        );

        let mut executions = self.executions.lock().unwrap_or_else(|e| e.into_inner());
        executions.insert(
            execution_id.clone(),
            PendingExecution {
                workflow,
                input: input.clone(),
            },
        );

        Ok(TriggerResponse {
            execution_id: Some(execution_id),
        })
    }

    async fn get_execution(&self, execution_id: &str) -> HarnessResult<ExecutionRecord> {
        // Canned records are terminal, so each one is handed out once
        let pending = self
            .executions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(execution_id)
            .ok_or_else(|| HarnessError::execution_not_found(execution_id))?;
        Ok(Self::synthesize(execution_id, &pending))
    }
}

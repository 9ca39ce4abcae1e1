use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Workflow descriptor as returned by the platform
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDescriptor {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
}

impl WorkflowDescriptor {
    /// Display name, `Workflow <id>` when the platform did not send one
    pub fn display_name(&self, fallback_id: &str) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Workflow {}", fallback_id),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowNode {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub node_type: String,
}

/// Response of the list endpoint: either a bare array or `{ "data": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WorkflowList {
    Bare(Vec<WorkflowDescriptor>),
    Paged { data: Vec<WorkflowDescriptor> },
}

impl WorkflowList {
    pub(crate) fn into_vec(self) -> Vec<WorkflowDescriptor> {
        match self {
            WorkflowList::Bare(list) => list,
            WorkflowList::Paged { data } => data,
        }
    }
}

/// Response of the execute endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    #[serde(default, deserialize_with = "string_or_number")]
    pub execution_id: Option<String>,
}

impl TriggerResponse {
    /// The execution handle, treating an empty string as absent
    pub fn handle(&self) -> Option<&str> {
        self.execution_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Overall execution status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionStatus {
    Success,
    Error,
    Failed,
    /// Any non-terminal status such as "running", "waiting" or "new"
    InProgress(String),
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::InProgress(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Error => "error",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::InProgress(status) => status,
        }
    }
}

impl From<String> for ExecutionStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "success" => ExecutionStatus::Success,
            "error" => ExecutionStatus::Error,
            "failed" => ExecutionStatus::Failed,
            _ => ExecutionStatus::InProgress(status),
        }
    }
}

impl From<ExecutionStatus> for String {
    fn from(status: ExecutionStatus) -> Self {
        status.as_str().to_string()
    }
}

/// One attempt of one step inside an execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepRun {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl StepRun {
    /// The error text, if this attempt carries a non-empty error.
    ///
    /// An error object without a `message` still counts as an error and
    /// yields "Unknown error".
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) if obj.is_empty() => None,
            Value::Object(obj) => Some(
                obj.get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .unwrap_or("Unknown error")
                    .to_string(),
            ),
            Value::Array(items) if items.is_empty() => None,
            other => Some(other.to_string()),
        }
    }

    /// The `main` output payload, if non-empty
    pub fn main_output(&self) -> Option<&Value> {
        let main = self.data.as_ref()?.get("main")?;
        let empty = match main {
            Value::Null => true,
            Value::Array(items) => items.is_empty(),
            Value::Object(obj) => obj.is_empty(),
            _ => false,
        };
        (!empty).then_some(main)
    }
}

/// All attempts of one named step, in the order the platform reported them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepExecution {
    pub name: String,
    pub runs: Vec<StepRun>,
}

/// Snapshot of an execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub status: ExecutionStatus,
    #[serde(
        default,
        deserialize_with = "ordered_steps",
        serialize_with = "serialize_steps"
    )]
    pub node_executions: Vec<StepExecution>,
}

impl ExecutionRecord {
    pub fn new(status: ExecutionStatus) -> Self {
        Self {
            id: None,
            status,
            node_executions: Vec::new(),
        }
    }

    /// Builder helper used by the canned client and tests
    pub fn with_step(mut self, name: &str, runs: Vec<StepRun>) -> Self {
        self.node_executions.push(StepExecution {
            name: name.to_string(),
            runs,
        });
        self
    }
}

fn ordered_steps<'de, D>(deserializer: D) -> Result<Vec<StepExecution>, D::Error>
where
    D: Deserializer<'de>,
{
    // serde_json's preserve_order keeps the server's key order
    let raw = Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|(name, runs)| -> Result<StepExecution, D::Error> {
            let runs = match runs {
                Value::Null => Vec::new(),
                Value::Array(_) => serde_json::from_value(runs).map_err(D::Error::custom)?,
                single => vec![serde_json::from_value(single).map_err(D::Error::custom)?],
            };
            Ok(StepExecution { name, runs })
        })
        .collect()
}

fn serialize_steps<S>(steps: &[StepExecution], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(steps.len()))?;
    for step in steps {
        map.serialize_entry(&step.name, &step.runs)?;
    }
    map.end()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_keeps_step_order() {
        let record: ExecutionRecord = serde_json::from_value(json!({
            "id": 17,
            "status": "success",
            "nodeExecutions": {
                "Webhook": [{ "data": { "main": [[{ "json": {} }]] } }],
                "Classify": [{}],
                "Answer": [{ "data": { "main": [] } }]
            }
        }))
        .unwrap();

        assert_eq!(record.id.as_deref(), Some("17"));
        assert_eq!(record.status, ExecutionStatus::Success);
        let names: Vec<_> = record
            .node_executions
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Webhook", "Classify", "Answer"]);
    }

    #[test]
    fn test_status_parsing() {
        let running: ExecutionStatus = "running".to_string().into();
        assert!(!running.is_terminal());
        assert_eq!(running.as_str(), "running");
        for terminal in ["success", "error", "failed"] {
            let status: ExecutionStatus = terminal.to_string().into();
            assert!(status.is_terminal());
            assert_eq!(status.as_str(), terminal);
        }
    }

    #[test]
    fn test_step_error_message() {
        let run = StepRun {
            error: Some(json!({ "message": "rate limit" })),
            data: None,
        };
        assert_eq!(run.error_message().as_deref(), Some("rate limit"));

        let no_message = StepRun {
            error: Some(json!({ "code": 500 })),
            data: None,
        };
        assert_eq!(no_message.error_message().as_deref(), Some("Unknown error"));

        let empty = StepRun {
            error: Some(json!({})),
            data: None,
        };
        assert_eq!(empty.error_message(), None);
        assert_eq!(StepRun::default().error_message(), None);
    }

    #[test]
    fn test_main_output_requires_payload() {
        let with_output = StepRun {
            error: None,
            data: Some(json!({ "main": [[{ "json": { "ok": true } }]] })),
        };
        assert!(with_output.main_output().is_some());

        let empty = StepRun {
            error: None,
            data: Some(json!({ "main": [] })),
        };
        assert!(empty.main_output().is_none());
    }

    #[test]
    fn test_trigger_handle() {
        let resp: TriggerResponse = serde_json::from_value(json!({ "executionId": "" })).unwrap();
        assert_eq!(resp.handle(), None);
        let resp: TriggerResponse = serde_json::from_value(json!({ "executionId": 99 })).unwrap();
        assert_eq!(resp.handle(), Some("99"));
        let resp: TriggerResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(resp.handle(), None);
    }

    #[test]
    fn test_workflow_list_shapes() {
        let bare: WorkflowList =
            serde_json::from_value(json!([{ "id": "1", "name": "A" }])).unwrap();
        assert_eq!(bare.into_vec().len(), 1);
        let paged: WorkflowList =
            serde_json::from_value(json!({ "data": [{ "id": "1" }, { "id": "2" }] })).unwrap();
        assert_eq!(paged.into_vec().len(), 2);
    }
}

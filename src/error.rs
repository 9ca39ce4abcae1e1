use thiserror::Error;

/// Result alias used across the library
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Failures that can occur while testing a single target.
///
/// Every variant is caught at the target boundary and turned into a failed
/// verdict; only `Config` is allowed to abort a whole run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("No execution ID returned for workflow '{workflow_id}'")]
    MissingExecutionHandle { workflow_id: String },

    #[error("Execution {execution_id} did not complete within {timeout_secs:.1} seconds")]
    Timeout {
        execution_id: String,
        timeout_secs: f64,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to run '{program}': {source}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HarnessError {
    pub fn workflow_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Workflow",
            id: id.into(),
        }
    }

    pub fn execution_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Execution",
            id: id.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True when the error came from the poller giving up, not from the platform
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

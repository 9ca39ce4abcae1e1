use crate::error::{HarnessError, HarnessResult};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Where workflow executions are allowed to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TestEnvironment {
    /// Executions are answered with canned downstream responses
    Isolated,
    /// Executions run against the real platform and its services
    Integrated,
    Production,
}

impl TestEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestEnvironment::Isolated => "isolated",
            TestEnvironment::Integrated => "integrated",
            TestEnvironment::Production => "production",
        }
    }

    /// Whether boundary calls are answered by the canned client
    pub fn is_mocked(&self) -> bool {
        matches!(self, TestEnvironment::Isolated)
    }
}

/// Application configuration
///
/// Built once by the binary and handed to the testers; nothing in the
/// library reads the process environment directly.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL of the platform REST API (e.g. "http://localhost:5678/api/v1")
    pub base_url: String,

    /// Sent as `X-N8N-API-KEY` when present
    pub api_key: Option<String>,

    pub test_env: TestEnvironment,

    /// Wall-clock budget for one execution to reach a terminal status
    pub poll_timeout: Duration,

    /// Delay between two status checks
    pub poll_interval: Duration,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// Directory holding `<workflow_id>.json` input overrides
    pub test_data_dir: PathBuf,

    /// Directory holding one subdirectory per custom node module
    pub node_dir: PathBuf,

    /// Preferred node build tool, `tsc` is used when it is missing
    pub build_cli: String,

    /// Program used to run a module's unit tests
    pub test_runner: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: Self::base_url_from_parts("http", "localhost", 5678),
            api_key: None,
            test_env: TestEnvironment::Isolated,
            poll_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            test_data_dir: PathBuf::from("test_data"),
            node_dir: PathBuf::from("./custom-nodes"),
            build_cli: "n8n-node-dev".to_string(),
            test_runner: "pytest".to_string(),
        }
    }
}

impl HarnessConfig {
    pub fn base_url_from_parts(protocol: &str, host: &str, port: u16) -> String {
        format!("{}://{}:{}/api/v1", protocol, host, port)
    }

    /// Reject settings that would make polling meaningless
    pub fn validate(&self) -> HarnessResult<()> {
        if self.poll_timeout.is_zero() {
            return Err(HarnessError::config("poll timeout must be greater than zero"));
        }
        if self.poll_interval.is_zero() {
            return Err(HarnessError::config(
                "poll interval must be greater than zero",
            ));
        }
        if self.poll_interval >= self.poll_timeout {
            return Err(HarnessError::config(format!(
                "poll interval ({:?}) must be shorter than the timeout ({:?})",
                self.poll_interval, self.poll_timeout
            )));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(HarnessError::config(format!(
                "unsupported API URL: {}",
                self.base_url
            )));
        }
        Ok(())
    }
}

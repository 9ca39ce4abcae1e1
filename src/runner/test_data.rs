use crate::driver::types::WorkflowDescriptor;
use crate::error::HarnessResult;
use crate::utils::config::TestEnvironment;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Scheduled far enough in the future that nothing is actually posted
const FAR_FUTURE: &str = "2099-12-31T23:59:59Z";

/// Synthesizes the input for one workflow execution
pub struct TestDataProvider {
    data_dir: PathBuf,
    test_env: TestEnvironment,
}

impl TestDataProvider {
    pub fn new(data_dir: &Path, test_env: TestEnvironment) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            test_env,
        }
    }

    pub fn override_path(&self, workflow_id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", workflow_id))
    }

    /// `<data_dir>/<id>.json` when present, otherwise a template chosen
    /// from the workflow name
    pub fn prepare(&self, workflow_id: &str, workflow: &WorkflowDescriptor) -> HarnessResult<Value> {
        let path = self.override_path(workflow_id);
        if path.is_file() {
            log::debug!("Loading test data from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            return Ok(serde_json::from_str(&content)?);
        }
        Ok(self.template_for(workflow.name.as_deref().unwrap_or("")))
    }

    pub fn template_for(&self, workflow_name: &str) -> Value {
        let name = workflow_name.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if has(&["twitter", "social"]) {
            json!({
                "content": "This is a test post from automated workflow testing.",
                "scheduledTime": FAR_FUTURE
            })
        } else if has(&["email"]) {
            json!({
                "to": "test@example.com",
                "subject": "Test Email from Workflow Testing",
                "text": "This is a test email generated during automated workflow testing."
            })
        } else if has(&["document", "pdf"]) {
            json!({
                "document": "https://example.com/sample.pdf",
                "language": "en",
                "options": { "extractText": true }
            })
        } else if has(&["scrape", "web"]) {
            json!({
                "url": "https://example.com",
                "selectors": { "title": "h1", "content": ".main-content" }
            })
        } else {
            json!({
                "testInput": true,
                "timestamp": chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
                "testEnvironment": self.test_env.as_str()
            })
        }
    }
}

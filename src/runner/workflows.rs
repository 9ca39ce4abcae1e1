use super::classifier::{classify, Classification};
use super::poller::Poller;
use super::progress::Progress;
use super::state::{TargetRun, TestStage, TestVerdict};
use super::test_data::TestDataProvider;
use crate::driver::traits::WorkflowApi;
use crate::error::HarnessResult;
use crate::utils::config::HarnessConfig;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Which workflows a run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowSelection {
    Single(String),
    Tag(String),
    All,
}

/// Drives deployed workflows through trigger, poll and classification
pub struct WorkflowTester {
    api: Arc<dyn WorkflowApi>,
    test_data: TestDataProvider,
    poll_timeout: Duration,
    poll_interval: Duration,
    progress: Progress,
}

impl WorkflowTester {
    pub fn new(api: Arc<dyn WorkflowApi>, config: &HarnessConfig) -> Self {
        Self {
            api,
            test_data: TestDataProvider::new(&config.test_data_dir, config.test_env),
            poll_timeout: config.poll_timeout,
            poll_interval: config.poll_interval,
            progress: Progress::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Test one workflow. Always yields a verdict; failures at any stage
    /// are folded into it.
    pub async fn test_workflow(&self, workflow_id: &str) -> TestVerdict {
        let mut run = TargetRun::start(workflow_id);
        self.progress.begin(workflow_id);
        let verdict = match self.drive(&mut run).await {
            Ok(classification) => run.finish(classification),
            Err(e) => run.fail(&e),
        };
        self.progress.end(&verdict);
        verdict
    }

    async fn drive(&self, run: &mut TargetRun) -> HarnessResult<Classification> {
        let workflow = self.api.get_workflow(&run.target_id).await?;
        run.target_name = workflow.display_name(&run.target_id);

        let input = self.test_data.prepare(&run.target_id, &workflow)?;
        run.advance(TestStage::DataPrepared);

        let trigger = self.api.execute_workflow(&run.target_id, &input).await?;
        if let Some(handle) = trigger.handle() {
            run.execution_id = Some(handle.to_string());
            run.advance(TestStage::Triggered);
        }

        let poller = Poller::new(self.api.as_ref(), self.poll_timeout, self.poll_interval);
        let record = poller.await_trigger(&run.target_id, &trigger).await?;
        run.advance(TestStage::Polled);

        let classification = classify(&record);
        run.advance(TestStage::Classified);
        Ok(classification)
    }

    /// Resolve a selection to workflow IDs, in platform order
    pub async fn discover(&self, selection: &WorkflowSelection) -> HarnessResult<Vec<String>> {
        let tag = match selection {
            WorkflowSelection::Single(id) => return Ok(vec![id.clone()]),
            WorkflowSelection::Tag(tag) => Some(tag.as_str()),
            WorkflowSelection::All => None,
        };

        let workflows = self.api.list_workflows(tag).await?;
        let total = workflows.len();
        let ids: Vec<String> = workflows
            .into_iter()
            .filter_map(|w| w.id.filter(|id| !id.is_empty()))
            .collect();
        if ids.len() < total {
            warn!("Skipping {} workflow(s) without an ID", total - ids.len());
        }
        info!(
            "Discovered {} workflow(s) via {} client{}",
            ids.len(),
            self.api.name(),
            tag.map(|t| format!(" (tag: {})", t)).unwrap_or_default()
        );
        Ok(ids)
    }

    /// Test every selected workflow one at a time, in discovery order.
    ///
    /// Only discovery itself can fail the call; each workflow's own failure
    /// ends up in its verdict.
    pub async fn run(&self, selection: &WorkflowSelection) -> HarnessResult<Vec<TestVerdict>> {
        let ids = self.discover(selection).await?;
        self.progress.set_total(ids.len());

        let mut verdicts = Vec::with_capacity(ids.len());
        for id in &ids {
            verdicts.push(self.test_workflow(id).await);
        }
        self.progress.finish();
        Ok(verdicts)
    }
}

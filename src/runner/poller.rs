use crate::driver::traits::WorkflowApi;
use crate::driver::types::{ExecutionRecord, TriggerResponse};
use crate::error::{HarnessError, HarnessResult};
use log::debug;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Waits for executions to reach a terminal status
pub struct Poller<'a> {
    api: &'a dyn WorkflowApi,
    timeout: Duration,
    interval: Duration,
}

impl<'a> Poller<'a> {
    pub fn new(api: &'a dyn WorkflowApi, timeout: Duration, interval: Duration) -> Self {
        Self {
            api,
            timeout,
            interval,
        }
    }

    /// Poll the execution started by a trigger call.
    ///
    /// A response without an execution ID fails immediately with
    /// `MissingExecutionHandle`; nothing is fetched.
    pub async fn await_trigger(
        &self,
        workflow_id: &str,
        trigger: &TriggerResponse,
    ) -> HarnessResult<ExecutionRecord> {
        match trigger.handle() {
            Some(handle) => self.await_completion(handle).await,
            None => Err(HarnessError::MissingExecutionHandle {
                workflow_id: workflow_id.to_string(),
            }),
        }
    }

    /// Fetch the execution until its status is terminal.
    ///
    /// Returns the first terminal record. Gives up with `Timeout` once the
    /// budget is spent; the last sleep is cut short so the budget is never
    /// overrun by more than one fetch.
    pub async fn await_completion(&self, execution_id: &str) -> HarnessResult<ExecutionRecord> {
        if self.timeout.is_zero() || self.interval.is_zero() {
            return Err(HarnessError::config(
                "poll timeout and interval must be greater than zero",
            ));
        }

        let started = Instant::now();
        let mut polls = 0u32;
        while started.elapsed() < self.timeout {
            let record = self.api.get_execution(execution_id).await?;
            polls += 1;
            if record.status.is_terminal() {
                debug!(
                    "Execution {} finished with status '{}' after {} poll(s)",
                    execution_id,
                    record.status.as_str(),
                    polls
                );
                return Ok(record);
            }
            debug!(
                "Execution {} still '{}' (poll {})",
                execution_id,
                record.status.as_str(),
                polls
            );

            let remaining = self.timeout.saturating_sub(started.elapsed());
            sleep(self.interval.min(remaining)).await;
        }

        Err(HarnessError::Timeout {
            execution_id: execution_id.to_string(),
            timeout_secs: self.timeout.as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::types::{ExecutionStatus, WorkflowDescriptor};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports "running" until the n-th fetch, then "success"
    struct Countdown {
        terminal_on: Option<usize>,
        fetches: AtomicUsize,
    }

    impl Countdown {
        fn new(terminal_on: Option<usize>) -> Self {
            Self {
                terminal_on,
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WorkflowApi for Countdown {
        fn name(&self) -> &str {
            "countdown"
        }

        async fn get_workflow(&self, id: &str) -> HarnessResult<WorkflowDescriptor> {
            Err(HarnessError::workflow_not_found(id))
        }

        async fn list_workflows(&self, _tag: Option<&str>) -> HarnessResult<Vec<WorkflowDescriptor>> {
            Ok(Vec::new())
        }

        async fn execute_workflow(&self, _id: &str, _input: &Value) -> HarnessResult<TriggerResponse> {
            Ok(TriggerResponse::default())
        }

        async fn get_execution(&self, _id: &str) -> HarnessResult<ExecutionRecord> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            let status = match self.terminal_on {
                Some(k) if n >= k => ExecutionStatus::Success,
                _ => ExecutionStatus::InProgress("running".to_string()),
            };
            Ok(ExecutionRecord::new(status))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_on_kth_poll() {
        let api = Countdown::new(Some(3));
        let poller = Poller::new(&api, Duration::from_secs(60), Duration::from_secs(2));

        let started = Instant::now();
        let record = poller.await_completion("1").await.unwrap();
        assert_eq!(record.status, ExecutionStatus::Success);
        assert_eq!(api.fetches(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediately_terminal_does_not_sleep() {
        let api = Countdown::new(Some(1));
        let poller = Poller::new(&api, Duration::from_secs(60), Duration::from_secs(2));

        let started = Instant::now();
        poller.await_completion("1").await.unwrap();
        assert_eq!(api.fetches(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_within_one_interval() {
        let api = Countdown::new(None);
        let timeout = Duration::from_secs(10);
        let interval = Duration::from_secs(3);
        let poller = Poller::new(&api, timeout, interval);

        let started = Instant::now();
        let err = poller.await_completion("7").await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(err.is_timeout());
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + interval);
        // t = 0, 3, 6, 9
        assert_eq!(api.fetches(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_handle_short_circuits() {
        let api = Countdown::new(Some(1));
        let poller = Poller::new(&api, Duration::from_secs(60), Duration::from_secs(2));

        let trigger = TriggerResponse {
            execution_id: Some(String::new()),
        };
        let err = poller.await_trigger("wf-1", &trigger).await.unwrap_err();
        assert!(matches!(err, HarnessError::MissingExecutionHandle { .. }));
        assert_eq!(api.fetches(), 0);
    }

    #[tokio::test]
    async fn test_zero_interval_is_rejected() {
        let api = Countdown::new(Some(1));
        let poller = Poller::new(&api, Duration::from_secs(1), Duration::ZERO);
        assert!(matches!(
            poller.await_completion("1").await,
            Err(HarnessError::Config(_))
        ));
        assert_eq!(api.fetches(), 0);
    }
}

pub mod canned;
pub mod compiler;
pub mod live;
pub mod traits;
pub mod types;

use crate::error::HarnessResult;
use crate::utils::config::HarnessConfig;
use std::sync::Arc;

pub use canned::{CannedApi, MockService};
pub use live::LiveApi;
pub use traits::WorkflowApi;

/// Build the platform client for the configured test environment
pub fn connect(config: &HarnessConfig) -> HarnessResult<Arc<dyn WorkflowApi>> {
    let live: Arc<dyn WorkflowApi> = Arc::new(LiveApi::from_config(config)?);
    if config.test_env.is_mocked() {
        log::info!("Isolated environment: executions are answered with canned responses");
        Ok(Arc::new(CannedApi::new(live)))
    } else {
        Ok(live)
    }
}

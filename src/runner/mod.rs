//! Test pipelines for deployed workflows and custom node modules

pub mod classifier;
pub mod nodes;
pub mod poller;
pub mod progress;
pub mod state;
pub mod test_data;
pub mod workflows;

pub use classifier::{classify, Classification};
pub use nodes::{NodeSelection, NodeTester};
pub use poller::Poller;
pub use progress::Progress;
pub use state::{CheckOutcome, TargetRun, TestStage, TestVerdict};
pub use test_data::TestDataProvider;
pub use workflows::{WorkflowSelection, WorkflowTester};

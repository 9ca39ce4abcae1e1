pub mod driver;
pub mod error;
pub mod lint;
pub mod report;
pub mod runner;
pub mod utils;

// Re-export common items
pub use driver::{connect, WorkflowApi};
pub use error::{HarnessError, HarnessResult};
pub use runner::{NodeSelection, NodeTester, TestVerdict, WorkflowSelection, WorkflowTester};
pub use utils::config::{HarnessConfig, TestEnvironment};

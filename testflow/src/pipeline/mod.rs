//! Test execution.
//!
//! This module provides:
//! - Foreach expansion of stages
//! - The stage pipeline executor
//! - The fail-fast test runner
//! - The suite scheduler with its worker pool

mod config;
mod executor;
pub mod foreach;
mod runner;
mod scheduler;


pub use config::SuiteConfig;
pub use executor::StageExecutor;
pub use runner::{TestOutcome, TestRunner, TestStatus};
pub use scheduler::{SuiteReport, SuiteScheduler};

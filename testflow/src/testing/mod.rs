//! Testing utilities for testflow suites.
//!
//! This module provides:
//! - Mock actions (recording, failing, sleeping, panicking)
//! - Stage and test fixtures
//! - Assertions on test outcomes

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_outcome_failed, assert_outcome_passed};
pub use fixtures::{failing_test, passing_test, sleeping_test, void_stage};
pub use mocks::{FailingAction, PanickingAction, RecordingAction, SleepAction};

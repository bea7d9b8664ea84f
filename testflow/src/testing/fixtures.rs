//! Stage and test fixtures.

use std::time::Duration;

use super::SleepAction;
use crate::actions::VoidAction;
use crate::model::{Stage, Test};

/// A named stage with a [`VoidAction`].
#[must_use]
pub fn void_stage(name: &str) -> Stage {
    Stage::new().with_name(name).with_action(VoidAction)
}

/// A sequential test that passes.
#[must_use]
pub fn passing_test(name: &str) -> Test {
    Test::new(name).with_stage(
        void_stage("pass")
            .with_save("value", "1")
            .with_assertion("${value} == 1"),
    )
}

/// A sequential test whose only assertion is false.
#[must_use]
pub fn failing_test(name: &str) -> Test {
    Test::new(name).with_stage(void_stage("fail").with_assertion("1 == 2"))
}

/// A parallel test whose single stage sleeps for `duration`.
#[must_use]
pub fn sleeping_test(name: &str, duration: Duration) -> Test {
    Test::new(name).with_parallel(true).with_stage(
        Stage::new()
            .with_name("sleep")
            .with_action(SleepAction::new(duration)),
    )
}

//! Assertions on test outcomes.

use crate::errors::FailureKind;
use crate::pipeline::TestOutcome;

/// Asserts that the outcome passed.
pub fn assert_outcome_passed(outcome: &TestOutcome) {
    assert!(
        outcome.passed(),
        "Expected test '{}' to pass, got failure: {:?}",
        outcome.name,
        outcome.failure
    );
}

/// Asserts that the outcome failed with the given kind.
pub fn assert_outcome_failed(outcome: &TestOutcome, kind: FailureKind) {
    match outcome.failure {
        Some(ref failure) => assert_eq!(
            failure.kind, kind,
            "Expected test '{}' to fail with {}, got {}",
            outcome.name, kind, failure
        ),
        None => panic!("Expected test '{}' to fail with {}, but it passed", outcome.name, kind),
    }
}

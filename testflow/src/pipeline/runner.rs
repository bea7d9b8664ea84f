//! Test runner: one test, fresh context, fail-fast.

use super::StageExecutor;
use crate::context::TestContext;
use crate::errors::FailureDetail;
use crate::events::TestLogger;
use crate::model::Test;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// Final classification of a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Every stage completed.
    Passed,
    /// A stage failed.
    Failed,
}

/// Result of running one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Test display name.
    pub name: String,
    /// Pass/fail classification.
    pub status: TestStatus,
    /// Why the test failed, if it did.
    pub failure: Option<FailureDetail>,
    /// Identifier of this run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

impl TestOutcome {
    /// Creates a failed outcome for a test that could not be run at all.
    #[must_use]
    pub fn aborted(name: impl Into<String>, failure: FailureDetail) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Failed,
            failure: Some(failure),
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            duration_ms: 0.0,
        }
    }

    /// Returns true if the test passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }

    /// Returns `(passed, name)`.
    #[must_use]
    pub fn summary(&self) -> (bool, &str) {
        (self.passed(), &self.name)
    }
}

/// Runs single tests. Never fails: every error becomes a failed outcome.
#[derive(Clone)]
pub struct TestRunner {
    executor: StageExecutor,
    logger: Arc<dyn TestLogger>,
}

impl TestRunner {
    /// Creates a runner reporting to `logger`.
    #[must_use]
    pub fn new(logger: Arc<dyn TestLogger>) -> Self {
        Self {
            executor: StageExecutor::new(Arc::clone(&logger)),
            logger,
        }
    }

    /// Runs `test` against a fresh test context.
    ///
    /// Stages run in order; the first stage error or panic ends the test.
    pub async fn execute(&self, test: &Test) -> TestOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("test", test = %test.display_name(), run_id = %run_id);
        self.run(test, run_id).instrument(span).await
    }

    async fn run(&self, test: &Test, run_id: Uuid) -> TestOutcome {
        let name = test.display_name().to_string();
        let started_at = Utc::now();
        let start = Instant::now();

        self.logger.test_start(&name, test.description.as_deref());

        let mut context = TestContext::new();
        let mut failure = None;
        for stage in &test.stages {
            let result = AssertUnwindSafe(self.executor.execute(stage, &mut context))
                .catch_unwind()
                .await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failure = Some(FailureDetail::from(&err));
                    break;
                }
                Err(panic) => {
                    failure = Some(FailureDetail::panic(
                        Some(stage.label().to_string()),
                        panic_message(panic.as_ref()),
                    ));
                    break;
                }
            }
        }

        let status = match failure {
            Some(ref failure) => {
                self.logger.test_finish_error(&name, failure);
                TestStatus::Failed
            }
            None => {
                self.logger.test_finish(&name);
                TestStatus::Passed
            }
        };

        TestOutcome {
            name,
            status,
            failure,
            run_id,
            started_at,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

impl std::fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRunner")
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "stage panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::VoidAction;
    use crate::errors::FailureKind;
    use crate::events::{CollectingTestLogger, LogEvent};
    use crate::model::Stage;
    use crate::testing::{PanickingAction, RecordingAction};
    use serde_json::json;

    fn runner() -> (TestRunner, Arc<CollectingTestLogger>) {
        let logger = Arc::new(CollectingTestLogger::new());
        (TestRunner::new(logger.clone()), logger)
    }

    #[tokio::test]
    async fn test_passing_test() {
        let (runner, logger) = runner();
        let test = Test::new("ok")
            .with_description("two stages")
            .with_stage(Stage::new().with_action(VoidAction).with_save("n", "1"))
            .with_stage(Stage::new().with_action(VoidAction).with_assertion("${n} == 1"));

        let outcome = runner.execute(&test).await;

        assert_eq!(outcome.summary(), (true, "ok"));
        assert!(outcome.failure.is_none());
        assert_eq!(logger.names().first(), Some(&"test_start"));
        assert_eq!(logger.names().last(), Some(&"test_finish"));
    }

    #[tokio::test]
    async fn test_fail_fast() {
        let (runner, logger) = runner();
        let a = RecordingAction::new();
        let b = RecordingAction::new();
        let c = RecordingAction::new();
        let test = Test::new("fail fast")
            .with_stage(Stage::new().with_name("A").with_action(a.clone()))
            .with_stage(
                Stage::new()
                    .with_name("B")
                    .with_action(b.clone())
                    .with_assertion("1 == 2"),
            )
            .with_stage(Stage::new().with_name("C").with_action(c.clone()));

        let outcome = runner.execute(&test).await;

        assert!(!outcome.passed());
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
        assert_eq!(c.call_count(), 0);

        let failure = outcome.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::AssertionFailure);
        assert_eq!(failure.stage.as_deref(), Some("B"));
        assert_eq!(logger.events_named("test_finish_error").len(), 1);
    }

    #[tokio::test]
    async fn test_fresh_context_per_execution() {
        let (runner, _logger) = runner();
        let action = RecordingAction::new();
        let test = Test::new("fresh")
            .with_stage(Stage::new().with_action(action.clone()).with_save("runs", "1"));

        assert!(runner.execute(&test).await.passed());
        assert!(runner.execute(&test).await.passed());

        assert_eq!(action.test_contexts(), vec![json!({}), json!({})]);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let (runner, logger) = runner();
        let test = Test::new("panics")
            .with_stage(Stage::new().with_name("explode").with_action(PanickingAction::new("kaboom")));

        let outcome = runner.execute(&test).await;

        assert!(!outcome.passed());
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Panic);
        assert_eq!(failure.stage.as_deref(), Some("explode"));
        assert_eq!(failure.message, "kaboom");
        match logger.events().last() {
            Some(LogEvent::TestFinishError { name, .. }) => assert_eq!(name, "panics"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unnamed_test() {
        let (runner, _logger) = runner();
        let outcome = runner.execute(&Test::default()).await;
        assert_eq!(outcome.summary(), (true, "UNDEFINED"));
    }

    #[tokio::test]
    async fn test_outcome_serializes() {
        let (runner, _logger) = runner();
        let outcome = runner.execute(&Test::new("json")).await;
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(value["name"], json!("json"));
        assert_eq!(value["status"], json!("passed"));
    }
}

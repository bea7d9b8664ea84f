//! Suite scheduler: parallel group on a bounded pool, then the sequential
//! group in declaration order.

use super::{SuiteConfig, TestOutcome, TestRunner};
use crate::errors::{FailureDetail, TestSuiteFailureError};
use crate::events::{TestLogger, TracingTestLogger};
use crate::model::Test;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Aggregated result of a suite run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Number of tests run.
    pub executed: usize,
    /// Names of passing tests.
    pub success: Vec<String>,
    /// Names of failing tests.
    pub failures: Vec<String>,
    /// Every outcome: the parallel group first, then the sequential group,
    /// each in declaration order.
    pub outcomes: Vec<TestOutcome>,
}

impl SuiteReport {
    /// Returns true if every test passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.success.len() == self.executed
    }

    fn record(&mut self, outcome: TestOutcome) {
        self.executed += 1;
        if outcome.passed() {
            self.success.push(outcome.name.clone());
        } else {
            self.failures.push(outcome.name.clone());
        }
        self.outcomes.push(outcome);
    }
}

/// Schedules a suite of tests.
#[derive(Clone)]
pub struct SuiteScheduler {
    config: SuiteConfig,
    runner: Arc<TestRunner>,
    logger: Arc<dyn TestLogger>,
}

impl SuiteScheduler {
    /// Creates a scheduler logging through tracing at the configured level.
    #[must_use]
    pub fn new(config: SuiteConfig) -> Self {
        let logger: Arc<dyn TestLogger> = Arc::new(TracingTestLogger::new(config.level()));
        Self::with_logger(config, logger)
    }

    /// Creates a scheduler reporting to `logger`.
    #[must_use]
    pub fn with_logger(config: SuiteConfig, logger: Arc<dyn TestLogger>) -> Self {
        Self {
            runner: Arc::new(TestRunner::new(Arc::clone(&logger))),
            config,
            logger,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Runs the suite and fails if any test failed.
    pub async fn run(
        &self,
        tests: impl IntoIterator<Item = Test>,
    ) -> Result<SuiteReport, TestSuiteFailureError> {
        let report = self.execute(tests).await;
        if report.passed() {
            Ok(report)
        } else {
            Err(TestSuiteFailureError::new(report.failures))
        }
    }

    /// Runs the suite and returns the report without judging it.
    ///
    /// Parallel tests run first on a pool of `workers` tasks; the call waits
    /// for all of them before the sequential tests run one by one.
    pub async fn execute(&self, tests: impl IntoIterator<Item = Test>) -> SuiteReport {
        let (parallel, sequential): (Vec<Test>, Vec<Test>) =
            tests.into_iter().partition(|test| test.parallel);

        info!(
            parallel = parallel.len(),
            sequential = sequential.len(),
            workers = self.config.pool_size(),
            "Running suite"
        );

        let mut report = SuiteReport::default();
        for outcome in self.execute_parallel(parallel).await {
            report.record(outcome);
        }
        for test in &sequential {
            report.record(self.runner.execute(test).await);
        }

        self.logger
            .assert_execution_result(report.executed, &report.success, &report.failures);
        report
    }

    async fn execute_parallel(&self, tests: Vec<Test>) -> Vec<TestOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.pool_size()));

        let handles: Vec<_> = tests
            .into_iter()
            .map(|test| {
                let name = test.display_name().to_string();
                let runner = Arc::clone(&self.runner);
                let semaphore = Arc::clone(&semaphore);
                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    runner.execute(&test).await
                });
                (name, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(test = %name, error = %err, "Test task did not complete");
                    let failure = FailureDetail::panic(None, err.to_string());
                    self.logger.test_finish_error(&name, &failure);
                    TestOutcome::aborted(name, failure)
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}

impl std::fmt::Debug for SuiteScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteScheduler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollectingTestLogger, LogEvent};
    use crate::testing::{failing_test, passing_test};

    fn scheduler(workers: usize) -> (SuiteScheduler, Arc<CollectingTestLogger>) {
        let logger = Arc::new(CollectingTestLogger::new());
        let config = SuiteConfig::new().with_workers(workers);
        (SuiteScheduler::with_logger(config, logger.clone()), logger)
    }

    #[tokio::test]
    async fn test_empty_suite_passes() {
        let (scheduler, logger) = scheduler(2);
        let report = scheduler.run(Vec::new()).await.unwrap();

        assert_eq!(report.executed, 0);
        assert_eq!(
            logger.events_named("assert_execution_result"),
            vec![LogEvent::AssertExecutionResult {
                executed: 0,
                success: vec![],
                failures: vec![]
            }]
        );
    }

    #[tokio::test]
    async fn test_parallel_results_in_declaration_order() {
        let (scheduler, _logger) = scheduler(4);
        let tests = vec![
            passing_test("p1").with_parallel(true),
            passing_test("s1"),
            passing_test("p2").with_parallel(true),
            passing_test("s2"),
        ];

        let report = scheduler.run(tests).await.unwrap();

        assert_eq!(report.success, vec!["p1", "p2", "s1", "s2"]);
        assert!(report.passed());
    }

    #[tokio::test]
    async fn test_failure_raises_suite_error() {
        let (scheduler, _logger) = scheduler(1);
        let tests = vec![passing_test("ok"), failing_test("bad")];

        let err = scheduler.run(tests).await.unwrap_err();

        assert_eq!(err.failures, vec!["bad"]);
    }

    #[tokio::test]
    async fn test_execute_does_not_raise() {
        let (scheduler, _logger) = scheduler(1);
        let report = scheduler.execute(vec![failing_test("bad").with_parallel(true)]).await;

        assert!(!report.passed());
        assert_eq!(report.outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_worker_count_is_clamped() {
        let config: SuiteConfig =
            serde_json::from_str(r#"{"workers": 18446744073709551615}"#).unwrap();
        let logger = Arc::new(CollectingTestLogger::new());
        let scheduler = SuiteScheduler::with_logger(config, logger);

        let report = scheduler
            .run(vec![passing_test("wide").with_parallel(true)])
            .await
            .unwrap();

        assert_eq!(report.success, vec!["wide"]);
    }
}

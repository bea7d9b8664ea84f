//! Test logger trait and implementations.

use crate::context::{StageContext, TestContext, Variables};
use crate::errors::FailureDetail;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn, Level};

/// One-way sink for execution events.
///
/// The engine reports every lifecycle step through this trait and never
/// reads anything back from it.
pub trait TestLogger: Send + Sync {
    /// A test started.
    fn test_start(&self, name: &str, description: Option<&str>);

    /// A test finished with every stage passing.
    fn test_finish(&self, name: &str);

    /// A test ended because one of its stages failed.
    fn test_finish_error(&self, name: &str, failure: &FailureDetail);

    /// A stage invocation started (once per foreach iteration).
    fn stage_start(&self, stage: &str, test: &TestContext, context: &StageContext);

    /// The stage action completed.
    fn action_executed(&self, context: &StageContext);

    /// The action recorded an I/O error instead of raising it.
    fn action_error(&self, message: &str);

    /// The action hit a non-fatal condition.
    fn action_warn(&self, message: &str);

    /// A resolved log line of the stage.
    fn log_text(&self, text: &str);

    /// An assertion evaluated to true.
    fn assertion_success(&self, assertion: &str);

    /// An assertion evaluated to false.
    fn assertion_fail(&self, assertion: &str, variables: &Variables);

    /// An assertion could not be evaluated.
    fn assertion_error(&self, assertion: &str, error: &str);

    /// Assertion tally of one stage invocation.
    fn assert_stage_result(&self, executed: usize, success: usize, failed: usize);

    /// Suite tally.
    fn assert_execution_result(&self, executed: usize, success: &[String], failures: &[String]);
}

/// A logger that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTestLogger;

impl TestLogger for NoOpTestLogger {
    fn test_start(&self, _name: &str, _description: Option<&str>) {}
    fn test_finish(&self, _name: &str) {}
    fn test_finish_error(&self, _name: &str, _failure: &FailureDetail) {}
    fn stage_start(&self, _stage: &str, _test: &TestContext, _context: &StageContext) {}
    fn action_executed(&self, _context: &StageContext) {}
    fn action_error(&self, _message: &str) {}
    fn action_warn(&self, _message: &str) {}
    fn log_text(&self, _text: &str) {}
    fn assertion_success(&self, _assertion: &str) {}
    fn assertion_fail(&self, _assertion: &str, _variables: &Variables) {}
    fn assertion_error(&self, _assertion: &str, _error: &str) {}
    fn assert_stage_result(&self, _executed: usize, _success: usize, _failed: usize) {}
    fn assert_execution_result(&self, _executed: usize, _success: &[String], _failures: &[String]) {}
}

/// A logger that reports events through the tracing framework.
///
/// Failures are logged at `error`/`warn`. Chatty per-stage events (stage
/// start, action executed, log lines, passing assertions) use the
/// configured level.
#[derive(Debug, Clone)]
pub struct TracingTestLogger {
    level: Level,
}

impl Default for TracingTestLogger {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

macro_rules! chatty {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            Level::TRACE => trace!($($arg)+),
            Level::DEBUG => debug!($($arg)+),
            Level::WARN => warn!($($arg)+),
            Level::ERROR => error!($($arg)+),
            _ => info!($($arg)+),
        }
    };
}

impl TracingTestLogger {
    /// Creates a tracing logger with the given level for chatty events.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logger.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Returns the level used for chatty events.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

impl TestLogger for TracingTestLogger {
    fn test_start(&self, name: &str, description: Option<&str>) {
        info!(test = %name, description = description.unwrap_or_default(), "Test started");
    }

    fn test_finish(&self, name: &str) {
        info!(test = %name, "Test passed");
    }

    fn test_finish_error(&self, name: &str, failure: &FailureDetail) {
        error!(
            test = %name,
            kind = %failure.kind,
            stage = failure.stage.as_deref().unwrap_or_default(),
            error = %failure.message,
            "Test failed"
        );
    }

    fn stage_start(&self, stage: &str, test: &TestContext, context: &StageContext) {
        chatty!(
            self.level,
            stage = %stage,
            test_context = ?test.keys(),
            stage_context = %serde_json::Value::Object(context.to_dict()),
            "Stage started"
        );
    }

    fn action_executed(&self, context: &StageContext) {
        chatty!(
            self.level,
            stage_context = %serde_json::Value::Object(context.to_dict()),
            "Action executed"
        );
    }

    fn action_error(&self, message: &str) {
        error!(error = %message, "Action error");
    }

    fn action_warn(&self, message: &str) {
        warn!(warning = %message, "Action warning");
    }

    fn log_text(&self, text: &str) {
        chatty!(self.level, "{}", text);
    }

    fn assertion_success(&self, assertion: &str) {
        chatty!(self.level, assertion = %assertion, "Assertion passed");
    }

    fn assertion_fail(&self, assertion: &str, variables: &Variables) {
        warn!(
            assertion = %assertion,
            variables = %serde_json::Value::Object(variables.clone()),
            "Assertion failed"
        );
    }

    fn assertion_error(&self, assertion: &str, error: &str) {
        error!(assertion = %assertion, error = %error, "Assertion could not be evaluated");
    }

    fn assert_stage_result(&self, executed: usize, success: usize, failed: usize) {
        info!(executed, success, failed, "Stage assertions");
    }

    fn assert_execution_result(&self, executed: usize, success: &[String], failures: &[String]) {
        if failures.is_empty() {
            info!(executed, passed = success.len(), "Suite passed");
        } else {
            error!(
                executed,
                passed = success.len(),
                failed = failures.len(),
                failures = ?failures,
                "Suite failed"
            );
        }
    }
}

/// An event recorded by [`CollectingTestLogger`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    /// See [`TestLogger::test_start`].
    TestStart {
        /// Test name.
        name: String,
        /// Test description.
        description: Option<String>,
    },
    /// See [`TestLogger::test_finish`].
    TestFinish {
        /// Test name.
        name: String,
    },
    /// See [`TestLogger::test_finish_error`].
    TestFinishError {
        /// Test name.
        name: String,
        /// Why it failed.
        failure: FailureDetail,
    },
    /// See [`TestLogger::stage_start`].
    StageStart {
        /// Stage label.
        stage: String,
        /// Stage context at start.
        context: Variables,
    },
    /// See [`TestLogger::action_executed`].
    ActionExecuted {
        /// Stage context after the action.
        context: Variables,
    },
    /// See [`TestLogger::action_error`].
    ActionError {
        /// Error message.
        message: String,
    },
    /// See [`TestLogger::action_warn`].
    ActionWarn {
        /// Warning message.
        message: String,
    },
    /// See [`TestLogger::log_text`].
    LogText {
        /// Resolved text.
        text: String,
    },
    /// See [`TestLogger::assertion_success`].
    AssertionSuccess {
        /// Assertion text.
        assertion: String,
    },
    /// See [`TestLogger::assertion_fail`].
    AssertionFail {
        /// Assertion text.
        assertion: String,
        /// Variables consumed by the assertion.
        variables: Variables,
    },
    /// See [`TestLogger::assertion_error`].
    AssertionError {
        /// Assertion text.
        assertion: String,
        /// Evaluation error.
        error: String,
    },
    /// See [`TestLogger::assert_stage_result`].
    AssertStageResult {
        /// Assertions evaluated.
        executed: usize,
        /// Assertions that held.
        success: usize,
        /// Assertions that did not.
        failed: usize,
    },
    /// See [`TestLogger::assert_execution_result`].
    AssertExecutionResult {
        /// Tests run.
        executed: usize,
        /// Passing test names.
        success: Vec<String>,
        /// Failing test names.
        failures: Vec<String>,
    },
}

impl LogEvent {
    /// Returns the event name, e.g. `stage_start`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TestStart { .. } => "test_start",
            Self::TestFinish { .. } => "test_finish",
            Self::TestFinishError { .. } => "test_finish_error",
            Self::StageStart { .. } => "stage_start",
            Self::ActionExecuted { .. } => "action_executed",
            Self::ActionError { .. } => "action_error",
            Self::ActionWarn { .. } => "action_warn",
            Self::LogText { .. } => "log_text",
            Self::AssertionSuccess { .. } => "assertion_success",
            Self::AssertionFail { .. } => "assertion_fail",
            Self::AssertionError { .. } => "assertion_error",
            Self::AssertStageResult { .. } => "assert_stage_result",
            Self::AssertExecutionResult { .. } => "assert_execution_result",
        }
    }
}

/// A collecting logger for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingTestLogger {
    events: RwLock<Vec<LogEvent>>,
}

impl CollectingTestLogger {
    /// Creates a new collecting logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.read().clone()
    }

    /// Returns the names of all collected events, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events.read().iter().map(LogEvent::name).collect()
    }

    /// Returns the events with the given name.
    #[must_use]
    pub fn events_named(&self, name: &str) -> Vec<LogEvent> {
        self.events
            .read()
            .iter()
            .filter(|event| event.name() == name)
            .cloned()
            .collect()
    }

    /// Returns the resolved log lines, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.events
            .read()
            .iter()
            .filter_map(|event| match event {
                LogEvent::LogText { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    fn push(&self, event: LogEvent) {
        self.events.write().push(event);
    }
}

impl TestLogger for CollectingTestLogger {
    fn test_start(&self, name: &str, description: Option<&str>) {
        self.push(LogEvent::TestStart {
            name: name.to_string(),
            description: description.map(str::to_string),
        });
    }

    fn test_finish(&self, name: &str) {
        self.push(LogEvent::TestFinish {
            name: name.to_string(),
        });
    }

    fn test_finish_error(&self, name: &str, failure: &FailureDetail) {
        self.push(LogEvent::TestFinishError {
            name: name.to_string(),
            failure: failure.clone(),
        });
    }

    fn stage_start(&self, stage: &str, _test: &TestContext, context: &StageContext) {
        self.push(LogEvent::StageStart {
            stage: stage.to_string(),
            context: context.to_dict(),
        });
    }

    fn action_executed(&self, context: &StageContext) {
        self.push(LogEvent::ActionExecuted {
            context: context.to_dict(),
        });
    }

    fn action_error(&self, message: &str) {
        self.push(LogEvent::ActionError {
            message: message.to_string(),
        });
    }

    fn action_warn(&self, message: &str) {
        self.push(LogEvent::ActionWarn {
            message: message.to_string(),
        });
    }

    fn log_text(&self, text: &str) {
        self.push(LogEvent::LogText {
            text: text.to_string(),
        });
    }

    fn assertion_success(&self, assertion: &str) {
        self.push(LogEvent::AssertionSuccess {
            assertion: assertion.to_string(),
        });
    }

    fn assertion_fail(&self, assertion: &str, variables: &Variables) {
        self.push(LogEvent::AssertionFail {
            assertion: assertion.to_string(),
            variables: variables.clone(),
        });
    }

    fn assertion_error(&self, assertion: &str, error: &str) {
        self.push(LogEvent::AssertionError {
            assertion: assertion.to_string(),
            error: error.to_string(),
        });
    }

    fn assert_stage_result(&self, executed: usize, success: usize, failed: usize) {
        self.push(LogEvent::AssertStageResult {
            executed,
            success,
            failed,
        });
    }

    fn assert_execution_result(&self, executed: usize, success: &[String], failures: &[String]) {
        self.push(LogEvent::AssertExecutionResult {
            executed,
            success: success.to_vec(),
            failures: failures.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use serde_json::json;

    #[test]
    fn test_noop_logger() {
        let logger = NoOpTestLogger;
        logger.test_start("t", None);
        logger.log_text("hello");
        logger.assert_execution_result(1, &["t".to_string()], &[]);
    }

    #[test]
    fn test_tracing_logger_levels() {
        let logger = TracingTestLogger::debug();
        assert_eq!(logger.level(), Level::DEBUG);

        let mut context = StageContext::new();
        context.set("x", json!(1));
        logger.stage_start("stage", &TestContext::new(), &context);
        logger.log_text("text");
        logger.assertion_fail("${x} == 2", &context.to_dict());
        logger.assert_execution_result(2, &["a".to_string()], &["b".to_string()]);
    }

    #[test]
    fn test_collecting_logger() {
        let logger = CollectingTestLogger::new();
        assert!(logger.is_empty());

        logger.test_start("t", Some("desc"));
        logger.log_text("one");
        logger.log_text("two");
        logger.test_finish_error("t", &FailureDetail::panic(None, "boom"));

        assert_eq!(logger.len(), 4);
        assert_eq!(
            logger.names(),
            vec!["test_start", "log_text", "log_text", "test_finish_error"]
        );
        assert_eq!(logger.texts(), vec!["one", "two"]);

        match &logger.events_named("test_finish_error")[0] {
            LogEvent::TestFinishError { failure, .. } => assert_eq!(failure.kind, FailureKind::Panic),
            other => panic!("unexpected event {other:?}"),
        }

        logger.clear();
        assert!(logger.is_empty());
    }

    #[test]
    fn test_log_event_serialize() {
        let event = LogEvent::AssertStageResult {
            executed: 2,
            success: 1,
            failed: 1,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "assert_stage_result", "executed": 2, "success": 1, "failed": 1})
        );
    }
}

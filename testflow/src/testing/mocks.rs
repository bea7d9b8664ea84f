//! Mock actions for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use crate::actions::Action;
use crate::context::{StageContext, TestContext, Variables};
use crate::errors::ActionExecutionError;
use crate::events::TestLogger;

/// An action that records both contexts of every call.
///
/// Clones share the same record, so a clone handed to a stage can be
/// inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct RecordingAction {
    output: Variables,
    calls: Arc<Mutex<Vec<(Value, Value)>>>,
}

impl RecordingAction {
    /// Creates a recording action.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `key` into the stage context on every call.
    #[must_use]
    pub fn with_output(mut self, key: impl Into<String>, value: Value) -> Self {
        self.output.insert(key.into(), value);
        self
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the stage context seen by each call.
    #[must_use]
    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().iter().map(|(_, stage)| stage.clone()).collect()
    }

    /// Returns the test context seen by each call.
    #[must_use]
    pub fn test_contexts(&self) -> Vec<Value> {
        self.calls.lock().iter().map(|(test, _)| test.clone()).collect()
    }
}

#[async_trait]
impl Action for RecordingAction {
    fn action_type(&self) -> &str {
        "RECORDING"
    }

    fn enrich(&self, _template: &dyn Action) -> Arc<dyn Action> {
        Arc::new(self.clone())
    }

    async fn execute(
        &self,
        _logger: &dyn TestLogger,
        test: &mut TestContext,
        stage: &mut StageContext,
    ) -> Result<(), ActionExecutionError> {
        self.calls.lock().push((
            Value::Object(test.to_dict()),
            Value::Object(stage.to_dict()),
        ));
        for (key, value) in &self.output {
            stage.set(key.clone(), value.clone());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> Value {
        serde_json::json!({ "type": "RECORDING", "output": self.output })
    }
}

/// An action that always fails.
#[derive(Debug, Clone)]
pub struct FailingAction {
    reason: String,
}

impl FailingAction {
    /// Creates a failing action.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Action for FailingAction {
    fn action_type(&self) -> &str {
        "FAILING"
    }

    fn enrich(&self, _template: &dyn Action) -> Arc<dyn Action> {
        Arc::new(self.clone())
    }

    async fn execute(
        &self,
        _logger: &dyn TestLogger,
        _test: &mut TestContext,
        _stage: &mut StageContext,
    ) -> Result<(), ActionExecutionError> {
        Err(ActionExecutionError::new("FAILING", self.reason.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> Value {
        serde_json::json!({ "type": "FAILING", "reason": self.reason })
    }
}

/// An action that sleeps before succeeding.
#[derive(Debug, Clone)]
pub struct SleepAction {
    duration: Duration,
}

impl SleepAction {
    /// Creates a sleeping action.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

#[async_trait]
impl Action for SleepAction {
    fn action_type(&self) -> &str {
        "SLEEP"
    }

    fn enrich(&self, _template: &dyn Action) -> Arc<dyn Action> {
        Arc::new(self.clone())
    }

    async fn execute(
        &self,
        _logger: &dyn TestLogger,
        _test: &mut TestContext,
        _stage: &mut StageContext,
    ) -> Result<(), ActionExecutionError> {
        tokio::time::sleep(self.duration).await;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> Value {
        let duration_ms = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX);
        serde_json::json!({ "type": "SLEEP", "duration_ms": duration_ms })
    }
}

/// An action that panics.
#[derive(Debug, Clone)]
pub struct PanickingAction {
    message: String,
}

impl PanickingAction {
    /// Creates a panicking action.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Action for PanickingAction {
    fn action_type(&self) -> &str {
        "PANIC"
    }

    fn enrich(&self, _template: &dyn Action) -> Arc<dyn Action> {
        Arc::new(self.clone())
    }

    async fn execute(
        &self,
        _logger: &dyn TestLogger,
        _test: &mut TestContext,
        _stage: &mut StageContext,
    ) -> Result<(), ActionExecutionError> {
        panic!("{}", self.message)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> Value {
        serde_json::json!({ "type": "PANIC", "message": self.message })
    }
}

//! Error types for the testflow engine.
//!
//! The taxonomy separates definition-time problems ([`SchemaError`]) from
//! execution-time stage failures ([`StageFailure`]) and the single
//! suite-level signal ([`TestSuiteFailureError`]).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// The main error type for testflow operations.
#[derive(Debug, Error)]
pub enum TestflowError {
    /// A definition failed validation.
    #[error("{0}")]
    Schema(#[from] SchemaError),

    /// A stage failed while executing.
    #[error("{0}")]
    Stage(#[from] StageError),

    /// At least one test of the suite failed.
    #[error("{0}")]
    Suite(#[from] TestSuiteFailureError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error raised at validation time for missing or invalid required fields.
///
/// Never raised while a test executes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Invalid schema definition: missing fields {missing_fields:?}, wrong fields {wrong_fields:?}")]
pub struct SchemaError {
    /// Fields that are required but absent.
    pub missing_fields: BTreeSet<String>,
    /// Fields that are present but malformed.
    pub wrong_fields: BTreeSet<String>,
}

impl SchemaError {
    /// Creates a schema error for a single missing field.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        let mut err = Self::default();
        err.missing_fields.insert(field.into());
        err
    }

    /// Creates a schema error for a single malformed field.
    #[must_use]
    pub fn wrong(field: impl Into<String>) -> Self {
        let mut err = Self::default();
        err.wrong_fields.insert(field.into());
        err
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("SchemaError"));
        map.insert(
            "missing_fields".to_string(),
            serde_json::json!(self.missing_fields),
        );
        map.insert("wrong_fields".to_string(), serde_json::json!(self.wrong_fields));
        map
    }
}

/// An expression could not be evaluated (undefined variable, parse failure).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unresolvable expression '{expression}': {reason}")]
pub struct UnresolvableExpressionError {
    /// The expression as written in the definition.
    pub expression: String,
    /// Why evaluation failed.
    pub reason: String,
}

impl UnresolvableExpressionError {
    /// Creates a new unresolvable expression error.
    #[must_use]
    pub fn new(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// An assertion evaluated successfully but not to a boolean.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed assertion '{assertion}': evaluated to {value}, expected a boolean")]
pub struct MalformedAssertionError {
    /// The assertion text.
    pub assertion: String,
    /// The non-boolean value it produced, as JSON.
    pub value: String,
}

impl MalformedAssertionError {
    /// Creates a new malformed assertion error.
    #[must_use]
    pub fn new(assertion: impl Into<String>, value: &serde_json::Value) -> Self {
        Self {
            assertion: assertion.into(),
            value: value.to_string(),
        }
    }
}

/// One or more assertions evaluated to false.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} assertion(s) failed: {}", failures.len(), failures.join(", "))]
pub struct AssertionFailureError {
    /// The texts of the failing assertions, in definition order.
    pub failures: Vec<String>,
}

impl AssertionFailureError {
    /// Creates a new assertion failure error.
    #[must_use]
    pub fn new(failures: Vec<String>) -> Self {
        Self { failures }
    }
}

/// A concrete action's own execution failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Action '{action}' failed: {reason}")]
pub struct ActionExecutionError {
    /// The action type discriminator.
    pub action: String,
    /// The reason for failure.
    pub reason: String,
}

impl ActionExecutionError {
    /// Creates a new action execution error.
    #[must_use]
    pub fn new(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            reason: reason.into(),
        }
    }
}

/// Classification of a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// An expression could not be evaluated.
    Unresolvable,
    /// An assertion produced a non-boolean.
    Malformed,
    /// Assertions evaluated to false.
    AssertionFailure,
    /// The action failed.
    ActionExecution,
    /// The stage panicked.
    Panic,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unresolvable => write!(f, "unresolvable"),
            Self::Malformed => write!(f, "malformed"),
            Self::AssertionFailure => write!(f, "assertion_failure"),
            Self::ActionExecution => write!(f, "action_execution"),
            Self::Panic => write!(f, "panic"),
        }
    }
}

/// Any failure raised by one of the pipeline steps of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageFailure {
    /// See [`UnresolvableExpressionError`].
    #[error("{0}")]
    Unresolvable(#[from] UnresolvableExpressionError),

    /// See [`MalformedAssertionError`].
    #[error("{0}")]
    Malformed(#[from] MalformedAssertionError),

    /// See [`AssertionFailureError`].
    #[error("{0}")]
    AssertionFailure(#[from] AssertionFailureError),

    /// See [`ActionExecutionError`].
    #[error("{0}")]
    ActionExecution(#[from] ActionExecutionError),
}

impl StageFailure {
    /// Returns the failure classification.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unresolvable(_) => FailureKind::Unresolvable,
            Self::Malformed(_) => FailureKind::Malformed,
            Self::AssertionFailure(_) => FailureKind::AssertionFailure,
            Self::ActionExecution(_) => FailureKind::ActionExecution,
        }
    }
}

/// A stage failure tagged with the stage it originated from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Stage '{stage}' failed: {failure}")]
pub struct StageError {
    /// Label of the originating stage.
    pub stage: String,
    /// The underlying failure.
    #[source]
    pub failure: StageFailure,
}

impl StageError {
    /// Creates a new stage error.
    #[must_use]
    pub fn new(stage: impl Into<String>, failure: impl Into<StageFailure>) -> Self {
        Self {
            stage: stage.into(),
            failure: failure.into(),
        }
    }

    /// Returns the failure classification.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        self.failure.kind()
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind()));
        map.insert("stage".to_string(), serde_json::json!(self.stage));
        map.insert("message".to_string(), serde_json::json!(self.failure.to_string()));
        if let StageFailure::AssertionFailure(ref err) = self.failure {
            map.insert("failures".to_string(), serde_json::json!(err.failures));
        }
        map
    }
}

/// Structured description of why a test failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Failure classification.
    pub kind: FailureKind,
    /// Label of the stage that failed, when known.
    pub stage: Option<String>,
    /// Human readable message.
    pub message: String,
}

impl FailureDetail {
    /// Creates a failure detail for a panic raised while running `stage`.
    #[must_use]
    pub fn panic(stage: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Panic,
            stage,
            message: message.into(),
        }
    }
}

impl From<&StageError> for FailureDetail {
    fn from(err: &StageError) -> Self {
        Self {
            kind: err.kind(),
            stage: Some(err.stage.clone()),
            message: err.failure.to_string(),
        }
    }
}

impl std::fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.stage {
            Some(ref stage) => write!(f, "[{}] stage '{}': {}", self.kind, stage, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// Suite-level failure: at least one test did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Test suite failed: {} test(s) failed: {}", failures.len(), failures.join(", "))]
pub struct TestSuiteFailureError {
    /// Names of the failed tests.
    pub failures: Vec<String>,
}

impl TestSuiteFailureError {
    /// Creates a new suite failure error.
    #[must_use]
    pub fn new(failures: Vec<String>) -> Self {
        Self { failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_to_dict() {
        let err = SchemaError::missing("test.name");
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "SchemaError");
        assert_eq!(dict.get("missing_fields").unwrap(), &serde_json::json!(["test.name"]));
    }

    #[test]
    fn test_stage_error_kind_and_message() {
        let err = StageError::new(
            "check",
            AssertionFailureError::new(vec!["${a} == 1".to_string()]),
        );

        assert_eq!(err.kind(), FailureKind::AssertionFailure);
        assert!(err.to_string().contains("check"));
        assert!(err.to_string().contains("${a} == 1"));
        assert_eq!(
            err.to_dict().get("failures").unwrap(),
            &serde_json::json!(["${a} == 1"])
        );
    }

    #[test]
    fn test_failure_kind_serialize() {
        let json = serde_json::to_string(&FailureKind::AssertionFailure).unwrap();
        assert_eq!(json, r#""assertion_failure""#);
    }

    #[test]
    fn test_failure_detail_from_stage_error() {
        let err = StageError::new("read", ActionExecutionError::new("FILE", "denied"));
        let detail = FailureDetail::from(&err);

        assert_eq!(detail.kind, FailureKind::ActionExecution);
        assert_eq!(detail.stage.as_deref(), Some("read"));
        assert_eq!(
            detail.to_string(),
            "[action_execution] stage 'read': Action 'FILE' failed: denied"
        );
    }

    #[test]
    fn test_suite_failure_message() {
        let err = TestSuiteFailureError::new(vec!["a".to_string(), "b".to_string()]);
        assert!(err.to_string().contains("2 test(s) failed: a, b"));
    }

    #[test]
    fn test_umbrella_from_conversions() {
        let err: TestflowError = SchemaError::wrong("stage.type").into();
        assert!(matches!(err, TestflowError::Schema(_)));

        let err: TestflowError = TestSuiteFailureError::new(vec![]).into();
        assert!(matches!(err, TestflowError::Suite(_)));
    }
}

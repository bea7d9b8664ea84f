//! The assertion step.

use crate::context::{StageContext, TestContext};
use crate::errors::{
    AssertionFailureError, MalformedAssertionError, StageFailure, UnresolvableExpressionError,
};
use crate::events::TestLogger;
use crate::expression;
use serde_json::Value;

/// Ordered list of boolean expressions checked after the save and log steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageAssertions {
    assertions: Vec<String>,
}

impl StageAssertions {
    /// Creates an assertion step from expressions.
    #[must_use]
    pub fn new<S: Into<String>>(assertions: impl IntoIterator<Item = S>) -> Self {
        Self {
            assertions: assertions.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends an assertion.
    pub fn push(&mut self, assertion: impl Into<String>) {
        self.assertions.push(assertion.into());
    }

    /// Returns the assertions in order.
    #[must_use]
    pub fn assertions(&self) -> &[String] {
        &self.assertions
    }

    /// Returns true if there is nothing to check.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    /// Own assertions followed by the template's.
    pub fn enrich(&mut self, template: &Self) {
        self.assertions.extend_from_slice(&template.assertions);
    }

    /// Evaluates every assertion in order.
    ///
    /// An assertion that cannot be evaluated, or that yields a non-boolean,
    /// fails immediately. False results are collected and reported together
    /// once the whole list has been evaluated.
    pub fn execute(
        &self,
        logger: &dyn TestLogger,
        test: &TestContext,
        stage: &StageContext,
    ) -> Result<(), StageFailure> {
        if self.assertions.is_empty() {
            return Ok(());
        }

        let mut failures = Vec::new();
        for assertion in &self.assertions {
            let evaluation = expression::evaluate(assertion, test, stage).map_err(|err| {
                logger.assertion_error(assertion, &err.to_string());
                UnresolvableExpressionError::new(assertion, err.to_string())
            })?;

            match evaluation.value {
                Value::Bool(true) => logger.assertion_success(assertion),
                Value::Bool(false) => {
                    logger.assertion_fail(assertion, &evaluation.variables);
                    failures.push(assertion.clone());
                }
                ref other => return Err(MalformedAssertionError::new(assertion, other).into()),
            }
        }

        let executed = self.assertions.len();
        logger.assert_stage_result(executed, executed - failures.len(), failures.len());

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AssertionFailureError::new(failures).into())
        }
    }
}

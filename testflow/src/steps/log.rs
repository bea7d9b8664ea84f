//! The log step: emits resolved text lines.

use crate::context::{StageContext, TestContext};
use crate::events::TestLogger;
use crate::expression;

/// Ordered list of log line templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageLog {
    lines: Vec<String>,
}

impl StageLog {
    /// Creates a log step from lines.
    #[must_use]
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends a line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Returns the lines in order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns true if there is nothing to log.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Own lines followed by the template's.
    pub fn enrich(&mut self, template: &Self) {
        self.lines.extend_from_slice(&template.lines);
    }

    /// Resolves and emits every line. Never fails.
    pub fn execute(&self, logger: &dyn TestLogger, test: &TestContext, stage: &StageContext) {
        for line in &self.lines {
            logger.log_text(&expression::resolve(line, test, stage));
        }
    }
}

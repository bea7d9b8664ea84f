//! The save step: writes evaluated values into the test context.

use crate::context::{StageContext, TestContext};
use crate::expression;
use serde_json::Value;
use tracing::debug;

/// Ordered mapping from dotted variable path to expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSave {
    entries: Vec<(String, String)>,
}

impl StageSave {
    /// Creates an empty save step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a save step from `(path, expression)` pairs.
    ///
    /// A later pair replaces an earlier one with the same path.
    #[must_use]
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut save = Self::new();
        for (path, expression) in entries {
            save.insert(path, expression);
        }
        save
    }

    /// Sets the expression saved at `path`, keeping the original position
    /// when the path is already present.
    pub fn insert(&mut self, path: impl Into<String>, expression: impl Into<String>) {
        let path = path.into();
        let expression = expression.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == path) {
            Some(entry) => entry.1 = expression,
            None => self.entries.push((path, expression)),
        }
    }

    /// Returns the expression saved at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == path)
            .map(|(_, expression)| expression.as_str())
    }

    /// Returns the entries in order.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there is nothing to save.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map union with the template: own entries first and winning.
    pub fn enrich(&mut self, template: &Self) {
        for (path, expression) in &template.entries {
            if self.get(path).is_none() {
                self.entries.push((path.clone(), expression.clone()));
            }
        }
    }

    /// Evaluates every entry and writes it into the test context.
    ///
    /// Both the path and the expression may reference variables. An
    /// expression that cannot be evaluated is stored as its resolved text.
    pub fn execute(&self, test: &mut TestContext, stage: &StageContext) {
        for (variable, expr) in &self.entries {
            let path = expression::resolve(variable, test, stage);
            let value = match expression::evaluate(expr, test, stage) {
                Ok(evaluation) => evaluation.value,
                Err(err) => {
                    let text = expression::resolve(expr, test, stage);
                    debug!(
                        variable = %path,
                        error = %err,
                        unresolved = ?expression::references(&text),
                        "Saving resolved text"
                    );
                    Value::String(text)
                }
            };
            test.save(&path, value);
        }
    }
}

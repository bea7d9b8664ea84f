//! Test definition.

use super::{Stage, ValidationReport};
use crate::errors::SchemaError;

/// A named, ordered sequence of stages sharing one test context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Test {
    /// Identifier.
    pub id: Option<String>,
    /// Name; required.
    pub name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Whether the test runs in the parallel group.
    pub parallel: bool,
    /// Stages, executed in order.
    pub stages: Vec<Stage>,
}

impl Test {
    /// Creates a named test.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the parallel flag.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Appends a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Name, or `UNDEFINED` when unset.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("UNDEFINED")
    }

    /// Validates the test and every stage.
    ///
    /// Stage problems are reported prefixed with the test name.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let Some(ref name) = self.name else {
            return Err(SchemaError::missing("test.name"));
        };

        let mut report = ValidationReport::new();
        for stage in &self.stages {
            report.merge(stage.validate().prefixed(name));
        }
        report.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{FileAction, VoidAction};

    #[test]
    fn test_validate_requires_name() {
        let err = Test::default().validate().unwrap_err();
        assert!(err.missing_fields.contains("test.name"));
        assert_eq!(Test::default().display_name(), "UNDEFINED");
    }

    #[test]
    fn test_validate_accumulates_stage_reports() {
        let test = Test::new("login")
            .with_stage(Stage::new().with_name("ok").with_action(VoidAction))
            .with_stage(Stage::new().with_name("no action"))
            .with_stage(Stage::new().with_id("bad").with_action(FileAction::default()));

        let err = test.validate().unwrap_err();

        assert!(err.wrong_fields.contains("login.no action[name].action"));
        assert!(err.missing_fields.contains("login.action.method"));
        assert!(err.missing_fields.contains("login.action.file"));
    }

    #[test]
    fn test_valid_test() {
        let test = Test::new("ok")
            .with_description("does nothing")
            .with_parallel(true)
            .with_stage(Stage::new().with_action(VoidAction));

        assert!(test.validate().is_ok());
        assert!(test.parallel);
    }
}

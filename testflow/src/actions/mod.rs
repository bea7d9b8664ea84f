//! Stage actions: the unit of work a stage performs.
//!
//! Actions are polymorphic behind the [`Action`] trait and selected from raw
//! definitions by their `type` discriminator through a
//! [`StageBuilderRegistry`].

mod builder;
mod file;
mod void;

pub use builder::{
    definition_type, parse_stage, FileStageBuilder, StageBuilder, StageBuilderRegistry,
    VoidStageBuilder,
};
pub use file::{FileAction, FileMethod};
pub use void::VoidAction;

use crate::context::{StageContext, TestContext};
use crate::errors::ActionExecutionError;
use crate::events::TestLogger;
use crate::model::ValidationReport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// What an action does when its own I/O fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionErrorPolicy {
    /// Log `action_error`, store the message under the stage context key
    /// `error`, and let the stage continue.
    #[default]
    Record,
    /// Fail the stage with an [`ActionExecutionError`].
    Raise,
}

impl ActionErrorPolicy {
    /// Applies the policy to an I/O failure of `action`.
    pub fn handle(
        self,
        action: &str,
        message: String,
        logger: &dyn TestLogger,
        stage: &mut StageContext,
    ) -> Result<(), ActionExecutionError> {
        match self {
            Self::Record => {
                logger.action_error(&message);
                stage.set("error", serde_json::Value::String(message));
                Ok(())
            }
            Self::Raise => Err(ActionExecutionError::new(action, message)),
        }
    }
}

/// Trait for stage actions.
///
/// Implementations are immutable once built; enrichment returns a new
/// action instead of mutating in place.
#[async_trait]
pub trait Action: Send + Sync + Debug {
    /// Returns the `type` discriminator, e.g. `FILE`.
    fn action_type(&self) -> &str;

    /// Fields that must be set for the action to be valid.
    fn mandatory_fields(&self) -> &[&'static str] {
        &[]
    }

    /// Returns true if the named field is set.
    fn has_field(&self, _field: &str) -> bool {
        false
    }

    /// Validates mandatory fields, then variant-specific rules.
    fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        for field in self.mandatory_fields() {
            if !self.has_field(field) {
                report.missing(format!("action.{field}"));
            }
        }
        report.merge(self.validate_specific());
        report
    }

    /// Variant-specific validation rules.
    fn validate_specific(&self) -> ValidationReport {
        ValidationReport::new()
    }

    /// Returns this action with absent fields filled from `template`.
    ///
    /// A template of another variant leaves the action unchanged.
    fn enrich(&self, template: &dyn Action) -> Arc<dyn Action>;

    /// Executes the action.
    ///
    /// The action may read both scopes and write its results into the
    /// stage context.
    async fn execute(
        &self,
        logger: &dyn TestLogger,
        test: &mut TestContext,
        stage: &mut StageContext,
    ) -> Result<(), ActionExecutionError>;

    /// Returns self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// JSON form of the action.
    fn describe(&self) -> serde_json::Value;
}

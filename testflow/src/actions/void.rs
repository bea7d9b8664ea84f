//! The `VOID` action.

use super::Action;
use crate::context::{StageContext, TestContext};
use crate::errors::ActionExecutionError;
use crate::events::TestLogger;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

/// An action that does nothing.
///
/// Useful for stages that only save, log or assert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoidAction;

impl VoidAction {
    /// The `type` discriminator.
    pub const TYPE: &'static str = "VOID";
}

#[async_trait]
impl Action for VoidAction {
    fn action_type(&self) -> &str {
        Self::TYPE
    }

    fn enrich(&self, _template: &dyn Action) -> Arc<dyn Action> {
        Arc::new(*self)
    }

    async fn execute(
        &self,
        _logger: &dyn TestLogger,
        _test: &mut TestContext,
        _stage: &mut StageContext,
    ) -> Result<(), ActionExecutionError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::json!({ "type": Self::TYPE })
    }
}

//! Stage pipeline executor: action, save, log, assertions.

use super::foreach;
use crate::context::{StageContext, TestContext};
use crate::errors::{ActionExecutionError, StageError};
use crate::events::TestLogger;
use crate::model::Stage;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs stages against a test context.
#[derive(Clone)]
pub struct StageExecutor {
    logger: Arc<dyn TestLogger>,
}

impl StageExecutor {
    /// Creates an executor reporting to `logger`.
    #[must_use]
    pub fn new(logger: Arc<dyn TestLogger>) -> Self {
        Self { logger }
    }

    /// Executes a stage, once per foreach combination.
    ///
    /// The first failure aborts the stage and is returned tagged with the
    /// stage label.
    pub async fn execute(&self, stage: &Stage, test: &mut TestContext) -> Result<(), StageError> {
        foreach::expand(self, stage, &stage.foreach, test, StageContext::new()).await
    }

    /// Runs the fixed-order pipeline once with the given stage context.
    pub(crate) async fn execute_pipeline(
        &self,
        stage: &Stage,
        test: &mut TestContext,
        mut context: StageContext,
    ) -> Result<(), StageError> {
        let label = stage.label();
        let logger = self.logger.as_ref();
        let start = Instant::now();

        logger.stage_start(label, test, &context);

        let action = stage.action.as_ref().ok_or_else(|| {
            StageError::new(label, ActionExecutionError::new("NONE", "stage has no action"))
        })?;
        action
            .execute(logger, test, &mut context)
            .await
            .map_err(|err| StageError::new(label, err))?;
        logger.action_executed(&context);

        stage.save.execute(test, &context);
        stage.log.execute(logger, test, &context);
        stage
            .assertions
            .execute(logger, test, &context)
            .map_err(|failure| StageError::new(label, failure))?;

        debug!(
            stage = %label,
            action = %action.action_type(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stage completed"
        );
        Ok(())
    }
}

impl std::fmt::Debug for StageExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageExecutor").finish_non_exhaustive()
    }
}

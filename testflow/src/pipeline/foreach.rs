//! Foreach expansion: repeats a stage once per value of each binding.

use super::StageExecutor;
use crate::context::{StageContext, TestContext};
use crate::errors::{StageError, UnresolvableExpressionError};
use crate::expression;
use crate::model::{ForeachBinding, Stage};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

/// Resolves the values a binding iterates over.
///
/// An array is used as-is. A string is evaluated as an expression and must
/// produce an array or a string (iterated by character).
pub fn binding_values(
    binding: &ForeachBinding,
    test: &TestContext,
    stage: &StageContext,
) -> Result<Vec<Value>, UnresolvableExpressionError> {
    let source = match binding.source {
        Value::Array(ref items) => return Ok(items.clone()),
        Value::String(ref source) => source,
        ref other => {
            return Err(UnresolvableExpressionError::new(
                other.to_string(),
                format!("foreach '{}' needs a list or an expression", binding.name),
            ));
        }
    };

    let evaluation = expression::evaluate(source, test, stage)
        .map_err(|err| UnresolvableExpressionError::new(source, err.to_string()))?;

    match evaluation.value {
        Value::Array(items) => Ok(items),
        Value::String(text) => Ok(text.chars().map(|c| Value::String(c.to_string())).collect()),
        other => Err(UnresolvableExpressionError::new(
            source,
            format!("foreach '{}' produced {other}, not a list", binding.name),
        )),
    }
}

/// Runs `stage` once per combination of the remaining `bindings`.
///
/// Iterations are strictly sequential and share the one test context, so
/// each iteration sees what the previous one saved.
pub(crate) fn expand<'a>(
    executor: &'a StageExecutor,
    stage: &'a Stage,
    bindings: &'a [ForeachBinding],
    test: &'a mut TestContext,
    context: StageContext,
) -> BoxFuture<'a, Result<(), StageError>> {
    async move {
        let Some((binding, rest)) = bindings.split_first() else {
            return executor.execute_pipeline(stage, test, context).await;
        };

        let values = binding_values(binding, test, &context)
            .map_err(|err| StageError::new(stage.label(), err))?;

        for (index, value) in values.into_iter().enumerate() {
            let derived = context.derive([
                (binding.name.clone(), value),
                (binding.index_key(), Value::from(index)),
            ]);
            expand(executor, stage, rest, &mut *test, derived).await?;
        }
        Ok(())
    }
    .boxed()
}

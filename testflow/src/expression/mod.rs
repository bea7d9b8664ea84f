//! Variable resolution and expression evaluation.
//!
//! Variable references are written `${path}` where `path` is a dotted path
//! into the stage context, falling back to the test context. Two entry
//! points are provided:
//!
//! - [`resolve`] substitutes references inside free text and never fails;
//!   unresolved references are left verbatim so they stay visible.
//! - [`evaluate`] parses the text as a small expression (literals,
//!   arithmetic, comparisons, boolean logic, `len()`), binds every
//!   referenced variable, and computes the result.

mod eval;
mod lexer;
mod parser;

pub use parser::{parse, BinaryOp, CompareOp, Expr, LogicalOp, UnaryOp};

use crate::context::{StageContext, TestContext, Variables};
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{\s*([^{}]*?)\s*\}").expect("variable reference regex is valid")
});

/// Reasons an expression could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// The text is not a valid expression.
    #[error("parse error at offset {position}: {message}")]
    Parse {
        /// Byte offset of the offending token.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// A referenced variable exists in neither context.
    #[error("undefined variable '${{{0}}}'")]
    UndefinedVariable(String),

    /// Operand types do not support the operation.
    #[error("type error: {0}")]
    Type(String),
}

/// Result of a successful evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// The computed value.
    pub value: Value,
    /// Variables consumed by the expression, in order of appearance.
    pub variables: Variables,
}

/// Looks up a variable path, stage context first.
#[must_use]
pub fn lookup<'a>(path: &str, test: &'a TestContext, stage: &'a StageContext) -> Option<&'a Value> {
    stage.lookup(path).or_else(|| test.lookup(path))
}

/// Textual form of a value: strings verbatim, everything else as JSON.
#[must_use]
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replaces every `${path}` in `text` with its value's textual form.
///
/// References that cannot be resolved are kept as written.
#[must_use]
pub fn resolve(text: &str, test: &TestContext, stage: &StageContext) -> String {
    REFERENCE_RE
        .replace_all(text, |caps: &Captures<'_>| match lookup(&caps[1], test, stage) {
            Some(value) => to_text(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Lists the variable paths referenced in `text`, in order.
#[must_use]
pub fn references(text: &str) -> Vec<String> {
    REFERENCE_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Evaluates `expression` against the two contexts.
pub fn evaluate(
    expression: &str,
    test: &TestContext,
    stage: &StageContext,
) -> Result<Evaluation, ExpressionError> {
    let expr = parse(expression)?;

    let mut variables = Variables::new();
    for path in expr.variables() {
        let value = lookup(path, test, stage)
            .ok_or_else(|| ExpressionError::UndefinedVariable(path.to_string()))?;
        variables.insert(path.to_string(), value.clone());
    }

    let value = eval::evaluate(&expr, &variables)?;
    Ok(Evaluation { value, variables })
}

/// Python-like truthiness of a value.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    eval::truthy(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn contexts() -> (TestContext, StageContext) {
        let mut test = TestContext::new();
        test.set("name", json!("Ada"));
        test.set("user", json!({"age": 36, "tags": ["x", "y"]}));
        test.set("shadow", json!("test"));

        let mut stage = StageContext::new();
        stage.set("shadow", json!("stage"));
        stage.set("count", json!(3));
        (test, stage)
    }

    #[test]
    fn test_resolve_substitutes_text_forms() {
        let (test, stage) = contexts();

        assert_eq!(
            resolve("Hi ${name}, ${ user.age } / ${user.tags} / ${count}", &test, &stage),
            r#"Hi Ada, 36 / ["x","y"] / 3"#
        );
    }

    #[test]
    fn test_resolve_prefers_stage_context() {
        let (test, stage) = contexts();
        assert_eq!(resolve("${shadow}", &test, &stage), "stage");
    }

    #[test]
    fn test_resolve_keeps_unresolved_placeholder() {
        let (test, stage) = contexts();
        assert_eq!(resolve("value: ${missing.path}", &test, &stage), "value: ${missing.path}");
    }

    #[test]
    fn test_references() {
        assert_eq!(references("${a} and ${ b.c }"), vec!["a", "b.c"]);
    }

    #[test]
    fn test_references_left_after_resolve() {
        let mut test = TestContext::new();
        test.set("user", json!("ada"));
        let text = resolve("${user} owes ${amount}", &test, &StageContext::new());
        assert_eq!(references(&text), vec!["amount"]);
    }

    #[test]
    fn test_evaluate_returns_value_and_consumed_variables() {
        let (test, stage) = contexts();
        let evaluation = evaluate("${user.age} + ${count} == 39", &test, &stage).unwrap();

        assert_eq!(evaluation.value, json!(true));
        assert_eq!(evaluation.variables.get("user.age"), Some(&json!(36)));
        assert_eq!(evaluation.variables.get("count"), Some(&json!(3)));
        assert_eq!(evaluation.variables.len(), 2);
    }

    #[test]
    fn test_evaluate_keeps_value_types() {
        let (test, stage) = contexts();
        let evaluation = evaluate("${user}", &test, &stage).unwrap();

        assert_eq!(evaluation.value, json!({"age": 36, "tags": ["x", "y"]}));
    }

    #[test]
    fn test_evaluate_undefined_variable() {
        let (test, stage) = contexts();

        assert_eq!(
            evaluate("${ghost} == 1", &test, &stage),
            Err(ExpressionError::UndefinedVariable("ghost".to_string()))
        );
    }

    #[test]
    fn test_evaluate_binds_variables_even_on_short_circuit() {
        let (test, stage) = contexts();

        assert!(evaluate("true or ${ghost}", &test, &stage).is_err());
    }

    #[test]
    fn test_evaluate_parse_error() {
        let (test, stage) = contexts();
        assert!(matches!(
            evaluate("Hello ${name}", &test, &stage),
            Err(ExpressionError::Parse { .. })
        ));
    }

    #[test]
    fn test_error_display() {
        let err = ExpressionError::UndefinedVariable("a.b".to_string());
        assert_eq!(err.to_string(), "undefined variable '${a.b}'");
    }
}

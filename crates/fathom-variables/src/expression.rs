use std::sync::LazyLock;

use minijinja::Environment;
use serde_json::{Map, Value};

use crate::error::ExpressionError;
use crate::substitute::{Strictness, inline_literals};

static ENV: LazyLock<Environment<'static>> = LazyLock::new(Environment::new);

/// Evaluate a sandboxed expression against the scope.
///
/// The expression language is minijinja's: comparisons, `and`/`or`/`not`,
/// arithmetic, literals, attribute access and filters. Root identifiers are
/// the scope keys (`input.count > 5`). `{{path}}` references are inlined as
/// literals first, which is how ids containing `-` are reached.
pub fn evaluate_expression(
  expression: &str,
  scope: &Map<String, Value>,
  strictness: Strictness,
) -> Result<Value, ExpressionError> {
  let source = inline_literals(expression, scope, strictness)?;

  let compiled = ENV
    .compile_expression(&source)
    .map_err(|e| ExpressionError::Compile {
      expression: expression.to_string(),
      source: e,
    })?;

  let result = compiled
    .eval(minijinja::Value::from_serialize(scope))
    .map_err(|e| ExpressionError::Eval {
      expression: expression.to_string(),
      source: e,
    })?;

  Ok(serde_json::to_value(&result).unwrap_or(Value::Null))
}

/// Evaluate an expression and coerce the result to a boolean.
pub fn evaluate_condition(
  expression: &str,
  scope: &Map<String, Value>,
  strictness: Strictness,
) -> Result<bool, ExpressionError> {
  let value = evaluate_expression(expression, scope, strictness)?;
  Ok(is_truthy(&value))
}

/// Generic truthiness: null, false, zero, and empty strings or collections
/// are false.
pub fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
    Value::String(s) => !s.is_empty(),
    Value::Array(a) => !a.is_empty(),
    Value::Object(o) => !o.is_empty(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn scope() -> Map<String, Value> {
    json!({
      "input": { "count": 10, "name": "Ada", "tags": ["a", "b"], "empty": "" },
      "kb-1": { "documentCount": 0 }
    })
    .as_object()
    .cloned()
    .unwrap()
  }

  #[test]
  fn test_comparison() {
    let scope = scope();
    assert!(evaluate_condition("input.count > 5", &scope, Strictness::Lenient).unwrap());
    assert!(!evaluate_condition("input.count > 50", &scope, Strictness::Lenient).unwrap());
    assert!(
      evaluate_condition("input.count >= 10 and input.name == 'Ada'", &scope, Strictness::Lenient)
        .unwrap()
    );
  }

  #[test]
  fn test_inlined_references() {
    let scope = scope();
    assert!(
      evaluate_condition("{{input.name}} == 'Ada'", &scope, Strictness::Lenient).unwrap()
    );
    assert!(
      !evaluate_condition("{{kb-1.documentCount}} > 0", &scope, Strictness::Lenient).unwrap()
    );
  }

  #[test]
  fn test_non_boolean_results_are_coerced() {
    let scope = scope();
    assert!(evaluate_condition("input.name", &scope, Strictness::Lenient).unwrap());
    assert!(!evaluate_condition("input.empty", &scope, Strictness::Lenient).unwrap());
    assert!(evaluate_condition("input.tags", &scope, Strictness::Lenient).unwrap());
    assert!(!evaluate_condition("0", &scope, Strictness::Lenient).unwrap());
  }

  #[test]
  fn test_expression_values() {
    let scope = scope();
    assert_eq!(
      evaluate_expression("input.count * 2", &scope, Strictness::Lenient).unwrap(),
      json!(20)
    );
    assert_eq!(
      evaluate_expression("input.tags | length", &scope, Strictness::Lenient).unwrap(),
      json!(2)
    );
    assert_eq!(
      evaluate_expression("input.name | upper", &scope, Strictness::Lenient).unwrap(),
      json!("ADA")
    );
  }

  #[test]
  fn test_invalid_expression_is_an_error() {
    let scope = scope();
    let err = evaluate_expression("input.count >", &scope, Strictness::Lenient).unwrap_err();
    assert!(matches!(err, ExpressionError::Compile { .. }));
  }

  #[test]
  fn test_strict_unresolved_reference() {
    let scope = scope();
    let err = evaluate_condition("{{input.nope}} == 1", &scope, Strictness::Strict).unwrap_err();
    assert!(matches!(err, ExpressionError::Template(_)));
  }

  #[test]
  fn test_truthiness() {
    assert!(!is_truthy(&json!(null)));
    assert!(!is_truthy(&json!(0.0)));
    assert!(is_truthy(&json!(-1)));
    assert!(!is_truthy(&json!({})));
    assert!(is_truthy(&json!({ "k": 1 })));
  }
}

use std::collections::HashMap;
use std::sync::Arc;

use fathom_variables::{ExpressionError, Strictness, TemplateError};
use serde_json::{Map, Value};

use crate::output::NodeOutput;

/// Reserved scope key holding the run payload.
pub const INPUT_KEY: &str = "input";

/// Per-run store of node results.
///
/// The engine is the only writer. Executors receive a clone, which shares
/// the underlying state until the engine records the next result.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
  execution_id: String,
  state: Arc<ContextState>,
  /// Upstream node ids of the node this snapshot was handed to, in edge
  /// declaration order.
  upstream: Vec<String>,
}

#[derive(Debug, Clone)]
struct ContextState {
  input: Value,
  variables: Map<String, Value>,
  results: HashMap<String, NodeOutput>,
  /// Variables, then `input`, then every node's JSON projection.
  scope: Map<String, Value>,
  strictness: Strictness,
}

impl ExecutionContext {
  pub fn new(execution_id: impl Into<String>, input: Value) -> Self {
    let mut scope = Map::new();
    scope.insert(INPUT_KEY.to_string(), input.clone());

    Self {
      execution_id: execution_id.into(),
      state: Arc::new(ContextState {
        input,
        variables: Map::new(),
        results: HashMap::new(),
        scope,
        strictness: Strictness::default(),
      }),
      upstream: Vec::new(),
    }
  }

  /// Add user variables. `input` and node ids take precedence on collision.
  pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
    let state = Arc::make_mut(&mut self.state);
    for (key, value) in &variables {
      if !state.scope.contains_key(key) {
        state.scope.insert(key.clone(), value.clone());
      }
    }
    state.variables = variables;
    self
  }

  pub fn with_strictness(mut self, strictness: Strictness) -> Self {
    Arc::make_mut(&mut self.state).strictness = strictness;
    self
  }

  /// Snapshot handed to a single node, remembering its upstream ids.
  pub fn for_node(&self, upstream: Vec<String>) -> Self {
    Self {
      execution_id: self.execution_id.clone(),
      state: Arc::clone(&self.state),
      upstream,
    }
  }

  pub fn execution_id(&self) -> &str {
    &self.execution_id
  }

  pub fn input(&self) -> &Value {
    &self.state.input
  }

  pub fn variables(&self) -> &Map<String, Value> {
    &self.state.variables
  }

  pub fn strictness(&self) -> Strictness {
    self.state.strictness
  }

  pub fn upstream(&self) -> &[String] {
    &self.upstream
  }

  pub fn result(&self, node_id: &str) -> Option<&NodeOutput> {
    self.state.results.get(node_id)
  }

  pub fn results(&self) -> &HashMap<String, NodeOutput> {
    &self.state.results
  }

  pub fn contains(&self, node_id: &str) -> bool {
    self.state.results.contains_key(node_id)
  }

  /// The JSON object templates and expressions are resolved against.
  pub fn scope(&self) -> &Map<String, Value> {
    &self.state.scope
  }

  /// Record a node's result.
  pub fn insert_result(&mut self, node_id: impl Into<String>, output: NodeOutput) {
    let node_id = node_id.into();
    let state = Arc::make_mut(&mut self.state);
    state.scope.insert(node_id.clone(), output.to_value());
    state.results.insert(node_id, output);
  }

  /// `input` plus every node result, without user variables.
  pub fn to_json(&self) -> Value {
    let mut map = Map::new();
    map.insert(INPUT_KEY.to_string(), self.state.input.clone());

    let mut ids: Vec<&String> = self.state.results.keys().collect();
    ids.sort();
    for id in ids {
      if let Some(output) = self.state.results.get(id) {
        map.insert(id.clone(), output.to_value());
      }
    }

    Value::Object(map)
  }

  pub fn substitute(&self, template: &str) -> Result<String, TemplateError> {
    fathom_variables::substitute_with(template, self.scope(), self.strictness())
  }

  pub fn substitute_value(&self, value: &Value) -> Result<Value, TemplateError> {
    fathom_variables::substitute_value_with(value, self.scope(), self.strictness())
  }

  pub fn resolve_value(&self, template: &str) -> Result<Value, TemplateError> {
    fathom_variables::resolve_value_with(template, self.scope(), self.strictness())
  }

  pub fn evaluate_expression(&self, expression: &str) -> Result<Value, ExpressionError> {
    fathom_variables::evaluate_expression(expression, self.scope(), self.strictness())
  }

  pub fn evaluate_condition(&self, expression: &str) -> Result<bool, ExpressionError> {
    fathom_variables::evaluate_condition(expression, self.scope(), self.strictness())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_scope_contains_input_and_results() {
    let mut ctx = ExecutionContext::new("exec-1", json!({ "query": "q" }));
    ctx.insert_result("llm-1", NodeOutput::Function(json!({ "text": "hello" })));

    assert_eq!(ctx.substitute("{{input.query}} {{llm-1.text}}").unwrap(), "q hello");
    assert!(ctx.contains("llm-1"));
    assert_eq!(
      ctx.to_json(),
      json!({ "input": { "query": "q" }, "llm-1": { "text": "hello" } })
    );
  }

  #[test]
  fn test_snapshots_are_isolated_from_later_writes() {
    let mut ctx = ExecutionContext::new("exec-1", json!({}));
    let snapshot = ctx.for_node(vec!["a".to_string()]);

    ctx.insert_result("a", NodeOutput::Function(json!(1)));

    assert!(ctx.contains("a"));
    assert!(!snapshot.contains("a"));
    assert_eq!(snapshot.upstream(), &["a".to_string()]);
  }

  #[test]
  fn test_variables_do_not_shadow_input() {
    let mut vars = Map::new();
    vars.insert("input".to_string(), json!("shadow"));
    vars.insert("tenant".to_string(), json!("acme"));

    let ctx = ExecutionContext::new("exec-1", json!({ "a": 1 })).with_variables(vars);
    assert_eq!(ctx.substitute("{{input.a}} {{tenant}}").unwrap(), "1 acme");
  }

  #[test]
  fn test_strictness_is_honoured() {
    let ctx = ExecutionContext::new("exec-1", json!({})).with_strictness(Strictness::Strict);
    assert!(ctx.substitute("{{input.missing}}").is_err());

    let lenient = ExecutionContext::new("exec-1", json!({}));
    assert_eq!(lenient.substitute("{{input.missing}}").unwrap(), "{{input.missing}}");
  }
}

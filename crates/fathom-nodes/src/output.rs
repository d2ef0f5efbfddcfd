use async_trait::async_trait;
use fathom_config::{NodeConfig, OutputConfig};
use fathom_node_runtime::{ExecutionContext, NodeError, NodeExecutor, NodeOutput, OutputValue};
use fathom_workflow::Node;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{into_result, require_non_blank};

/// Publishes a value into the run's final result under `variableName`.
///
/// With a `value` template the referenced value is copied (structure intact
/// for a single `{{path}}`). Without one, the primary value of the first
/// upstream node is copied.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputExecutor;

fn config(node: &Node) -> Result<&OutputConfig, NodeError> {
  match &node.config {
    NodeConfig::Output(config) => Ok(config),
    _ => Err(NodeError::ConfigMismatch { expected: "output" }),
  }
}

#[async_trait]
impl NodeExecutor for OutputExecutor {
  async fn execute(
    &self,
    node: &Node,
    context: &ExecutionContext,
    cancel: &CancellationToken,
  ) -> Result<NodeOutput, NodeError> {
    if cancel.is_cancelled() {
      return Err(NodeError::Cancelled);
    }

    let config = config(node)?;
    let value = match &config.value {
      Some(template) if !template.trim().is_empty() => context.resolve_value(template)?,
      _ => context
        .upstream()
        .iter()
        .find_map(|id| context.result(id))
        .map(NodeOutput::primary)
        .unwrap_or(Value::Null),
    };

    Ok(NodeOutput::Output(OutputValue {
      variable_name: config.variable_name.clone(),
      value,
    }))
  }

  fn validate(&self, node: &Node) -> Result<(), Vec<String>> {
    let config = config(node).map_err(|e| vec![e.to_string()])?;
    let mut issues = Vec::new();
    require_non_blank(&mut issues, "variableName", &config.variable_name);
    into_result(issues)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::node;
  use fathom_node_runtime::{LlmOutput, TokenUsage};
  use serde_json::json;

  fn context() -> ExecutionContext {
    let mut ctx = ExecutionContext::new("exec", json!({ "query": "q" }));
    ctx.insert_result(
      "llm-1",
      NodeOutput::Llm(LlmOutput {
        text: "the answer".to_string(),
        usage: TokenUsage::default(),
        model: "m".to_string(),
      }),
    );
    ctx.insert_result("fn-1", NodeOutput::Function(json!({ "items": [1, 2] })));
    ctx
  }

  #[tokio::test]
  async fn test_copies_upstream_primary_value() {
    let out = node("out", "output", json!({ "variableName": "answer" }));
    let ctx = context().for_node(vec!["llm-1".to_string()]);

    let output = OutputExecutor
      .execute(&out, &ctx, &CancellationToken::new())
      .await
      .unwrap();
    assert_eq!(
      output.to_value(),
      json!({ "variableName": "answer", "value": "the answer" })
    );
  }

  #[tokio::test]
  async fn test_single_reference_keeps_structure() {
    let out = node(
      "out",
      "output",
      json!({ "variableName": "items", "value": "{{fn-1.items}}" }),
    );
    let ctx = context();

    let output = OutputExecutor
      .execute(&out, &ctx, &CancellationToken::new())
      .await
      .unwrap();
    assert_eq!(output.primary(), json!([1, 2]));
  }

  #[tokio::test]
  async fn test_mixed_template_is_a_string() {
    let out = node(
      "out",
      "output",
      json!({ "variableName": "summary", "value": "Q: {{input.query}} A: {{llm-1.text}}" }),
    );

    let output = OutputExecutor
      .execute(&out, &context(), &CancellationToken::new())
      .await
      .unwrap();
    assert_eq!(output.primary(), json!("Q: q A: the answer"));
  }

  #[tokio::test]
  async fn test_no_upstream_yields_null() {
    let out = node("out", "output", json!({ "variableName": "nothing" }));
    let output = OutputExecutor
      .execute(&out, &context(), &CancellationToken::new())
      .await
      .unwrap();
    assert_eq!(output.primary(), Value::Null);
  }

  #[test]
  fn test_validate_requires_variable_name() {
    let out = node("out", "output", json!({}));
    assert!(OutputExecutor.validate(&out).is_err());
  }
}

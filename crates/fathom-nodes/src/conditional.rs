use async_trait::async_trait;
use fathom_config::{ConditionalConfig, NodeConfig};
use fathom_node_runtime::{
  ConditionalOutput, ExecutionContext, NodeError, NodeExecutor, NodeOutput,
};
use fathom_workflow::Node;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{into_result, require_non_blank};

/// Evaluates `condition` and reports which branch handle stays live.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalExecutor;

fn config(node: &Node) -> Result<&ConditionalConfig, NodeError> {
  match &node.config {
    NodeConfig::Conditional(config) => Ok(config),
    _ => Err(NodeError::ConfigMismatch {
      expected: "conditional",
    }),
  }
}

#[async_trait]
impl NodeExecutor for ConditionalExecutor {
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
    let result = context.evaluate_condition(&config.condition)?;
    let rendered = fathom_variables::substitute(&config.condition, context.scope());

    debug!(node_id = %node.node_id, condition = %rendered, result, "condition_evaluated");
    Ok(NodeOutput::Conditional(ConditionalOutput::new(result, rendered)))
  }

  fn validate(&self, node: &Node) -> Result<(), Vec<String>> {
    let config = config(node).map_err(|e| vec![e.to_string()])?;
    let mut issues = Vec::new();
    require_non_blank(&mut issues, "condition", &config.condition);
    into_result(issues)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::node;
  use serde_json::json;

  #[tokio::test]
  async fn test_true_branch() {
    let check = node("check", "conditional", json!({ "condition": "input.count > 5" }));
    let ctx = ExecutionContext::new("exec", json!({ "count": 10 }));

    let output = ConditionalExecutor
      .execute(&check, &ctx, &CancellationToken::new())
      .await
      .unwrap();
    assert_eq!(
      output.to_value(),
      json!({ "result": true, "branch": "true", "condition": "input.count > 5" })
    );
  }

  #[tokio::test]
  async fn test_templated_operands() {
    let check = node(
      "check",
      "conditional",
      json!({ "condition": "{{input.count}} > 50" }),
    );
    let ctx = ExecutionContext::new("exec", json!({ "count": 10 }));

    let output = ConditionalExecutor
      .execute(&check, &ctx, &CancellationToken::new())
      .await
      .unwrap();
    let NodeOutput::Conditional(out) = output else {
      panic!("expected conditional output");
    };
    assert!(!out.result);
    assert_eq!(out.branch, "false");
    assert_eq!(out.condition, "10 > 50");
  }

  #[tokio::test]
  async fn test_invalid_condition_fails() {
    let check = node("check", "conditional", json!({ "condition": "input.count >" }));
    let ctx = ExecutionContext::new("exec", json!({ "count": 10 }));

    let err = ConditionalExecutor
      .execute(&check, &ctx, &CancellationToken::new())
      .await
      .unwrap_err();
    assert!(matches!(err, NodeError::Expression(_)));
  }

  #[test]
  fn test_validate_requires_condition() {
    let check = node("check", "conditional", json!({ "condition": "  " }));
    assert_eq!(
      ConditionalExecutor.validate(&check).unwrap_err(),
      vec!["'condition' is required".to_string()]
    );
  }
}

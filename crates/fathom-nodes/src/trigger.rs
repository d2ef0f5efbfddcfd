use async_trait::async_trait;
use fathom_config::NodeConfig;
use fathom_node_runtime::{ExecutionContext, NodeError, NodeExecutor, NodeOutput};
use fathom_workflow::Node;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Starts a run: publishes the run payload, layered over the trigger's
/// `defaultInput` when one is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerExecutor;

#[async_trait]
impl NodeExecutor for TriggerExecutor {
  async fn execute(
    &self,
    node: &Node,
    context: &ExecutionContext,
    _cancel: &CancellationToken,
  ) -> Result<NodeOutput, NodeError> {
    let defaults = match &node.config {
      NodeConfig::Trigger(config) => config.default_input.as_ref(),
      _ => None,
    };

    let payload = match (defaults, context.input()) {
      (Some(defaults), Value::Object(input)) => {
        let mut merged = defaults.clone();
        for (key, value) in input {
          merged.insert(key.clone(), value.clone());
        }
        Value::Object(merged)
      }
      (Some(defaults), Value::Null) => Value::Object(defaults.clone()),
      (_, input) => input.clone(),
    };

    Ok(NodeOutput::Trigger(payload))
  }

  fn validate(&self, node: &Node) -> Result<(), Vec<String>> {
    match node.config {
      NodeConfig::Trigger(_) => Ok(()),
      _ => Err(vec!["expected trigger configuration".to_string()]),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::node;
  use serde_json::json;

  #[tokio::test]
  async fn test_publishes_payload() {
    let trigger = node("start", "trigger", json!({}));
    let ctx = ExecutionContext::new("exec", json!({ "query": "What is X?" }));

    let output = TriggerExecutor
      .execute(&trigger, &ctx, &CancellationToken::new())
      .await
      .unwrap();
    assert_eq!(output, NodeOutput::Trigger(json!({ "query": "What is X?" })));
  }

  #[tokio::test]
  async fn test_payload_wins_over_defaults() {
    let trigger = node(
      "start",
      "trigger",
      json!({ "defaultInput": { "query": "default", "limit": 3 } }),
    );
    let ctx = ExecutionContext::new("exec", json!({ "query": "given" }));

    let output = TriggerExecutor
      .execute(&trigger, &ctx, &CancellationToken::new())
      .await
      .unwrap();
    assert_eq!(output.to_value(), json!({ "query": "given", "limit": 3 }));

    let empty = ExecutionContext::new("exec", Value::Null);
    let output = TriggerExecutor
      .execute(&trigger, &empty, &CancellationToken::new())
      .await
      .unwrap();
    assert_eq!(output.to_value(), json!({ "query": "default", "limit": 3 }));
  }
}

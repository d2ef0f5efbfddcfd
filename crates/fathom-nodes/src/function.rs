use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use fathom_config::{FunctionConfig, NodeConfig};
use fathom_node_runtime::{
  ExecutionContext, NodeError, NodeExecutor, NodeOutput, TransformInput, UserTransform,
};
use fathom_workflow::Node;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

/// Runs a user transform.
///
/// A node either names a transform registered with this executor, or gives
/// an `expression` evaluated by the sandboxed expression engine. Host code
/// is never evaluated from strings.
#[derive(Clone, Default)]
pub struct FunctionExecutor {
  transforms: HashMap<String, Arc<dyn UserTransform>>,
}

impl FunctionExecutor {
  pub fn new(transforms: HashMap<String, Arc<dyn UserTransform>>) -> Self {
    Self { transforms }
  }
}

impl fmt::Debug for FunctionExecutor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut names: Vec<&String> = self.transforms.keys().collect();
    names.sort();
    f.debug_struct("FunctionExecutor")
      .field("transforms", &names)
      .finish()
  }
}

fn config(node: &Node) -> Result<&FunctionConfig, NodeError> {
  match &node.config {
    NodeConfig::Function(config) => Ok(config),
    _ => Err(NodeError::ConfigMismatch {
      expected: "function",
    }),
  }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|s| !s.trim().is_empty())
}

#[async_trait]
impl NodeExecutor for FunctionExecutor {
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

    if let Some(name) = non_blank(&config.transform) {
      let transform = self
        .transforms
        .get(name)
        .ok_or_else(|| NodeError::UnknownTransform(name.to_string()))?;

      let params = match context.substitute_value(&Value::Object(config.params.clone()))? {
        Value::Object(map) => map,
        _ => Map::new(),
      };

      let value = transform
        .apply(TransformInput {
          node_id: &node.node_id,
          params: &params,
          scope: context.scope(),
        })
        .map_err(|source| NodeError::Transform {
          name: name.to_string(),
          source,
        })?;

      return Ok(NodeOutput::Function(value));
    }

    match non_blank(&config.expression) {
      Some(expression) => Ok(NodeOutput::Function(
        context.evaluate_expression(expression)?,
      )),
      None => Err(NodeError::InvalidConfig(
        "either 'transform' or 'expression' is required".to_string(),
      )),
    }
  }

  fn validate(&self, node: &Node) -> Result<(), Vec<String>> {
    let config = config(node).map_err(|e| vec![e.to_string()])?;

    match (non_blank(&config.transform), non_blank(&config.expression)) {
      (None, None) => Err(vec![
        "either 'transform' or 'expression' is required".to_string(),
      ]),
      (Some(_), Some(_)) => Err(vec![
        "'transform' and 'expression' are mutually exclusive".to_string(),
      ]),
      (Some(name), None) if !self.transforms.contains_key(name) => {
        Err(vec![format!("transform '{}' is not registered", name)])
      }
      _ => Ok(()),
    }
  }
}

use std::sync::Arc;

use async_trait::async_trait;
use fathom_config::{LlmConfig, NodeConfig};
use fathom_node_runtime::{
  ExecutionContext, GenerateRequest, LlmOutput, LlmProvider, NodeError, NodeExecutor, NodeOutput,
  cancellable,
};
use fathom_workflow::Node;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{into_result, require_non_blank};

/// Sends the substituted prompt to the configured LLM provider.
pub struct LlmExecutor {
  provider: Arc<dyn LlmProvider>,
}

impl LlmExecutor {
  pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
    Self { provider }
  }
}

fn config(node: &Node) -> Result<&LlmConfig, NodeError> {
  match &node.config {
    NodeConfig::Llm(config) => Ok(config),
    _ => Err(NodeError::ConfigMismatch { expected: "llm" }),
  }
}

#[async_trait]
impl NodeExecutor for LlmExecutor {
  async fn execute(
    &self,
    node: &Node,
    context: &ExecutionContext,
    cancel: &CancellationToken,
  ) -> Result<NodeOutput, NodeError> {
    let config = config(node)?;

    let request = GenerateRequest {
      model: config.model.clone().filter(|m| !m.trim().is_empty()),
      prompt: context.substitute(&config.prompt)?,
      system_prompt: config
        .system_prompt
        .as_deref()
        .map(|s| context.substitute(s))
        .transpose()?,
      temperature: config.temperature,
      max_tokens: config.max_tokens,
    };

    debug!(
      node_id = %node.node_id,
      model = ?request.model,
      prompt_len = request.prompt.len(),
      "llm_request"
    );

    let response = cancellable(cancel, self.provider.generate_text(request.clone())).await?;

    let model = if response.model.is_empty() {
      request.model.unwrap_or_default()
    } else {
      response.model
    };

    Ok(NodeOutput::Llm(LlmOutput {
      text: response.text,
      usage: response.usage,
      model,
    }))
  }

  fn validate(&self, node: &Node) -> Result<(), Vec<String>> {
    let config = config(node).map_err(|e| vec![e.to_string()])?;
    let mut issues = Vec::new();

    require_non_blank(&mut issues, "prompt", &config.prompt);
    if let Some(temperature) = config.temperature {
      if !(0.0..=2.0).contains(&temperature) {
        issues.push(format!(
          "'temperature' must be between 0 and 2, got {}",
          temperature
        ));
      }
    }
    if config.max_tokens == Some(0) {
      issues.push("'maxTokens' must be greater than 0".to_string());
    }

    into_result(issues)
  }
}

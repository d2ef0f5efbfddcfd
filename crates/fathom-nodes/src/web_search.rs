use std::sync::Arc;

use async_trait::async_trait;
use fathom_config::{NodeConfig, WebSearchConfig};
use fathom_node_runtime::{
  ExecutionContext, NodeError, NodeExecutor, NodeOutput, SearchProvider, SearchRequest,
  WebSearchOutput, WebSearchResult, cancellable,
};
use fathom_workflow::Node;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{into_result, require_non_blank};

const MAX_RESULTS: u32 = 50;

/// Queries a web search provider and flattens the hits into prompt context.
pub struct WebSearchExecutor {
  provider: Arc<dyn SearchProvider>,
}

impl WebSearchExecutor {
  pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
    Self { provider }
  }
}

fn config(node: &Node) -> Result<&WebSearchConfig, NodeError> {
  match &node.config {
    NodeConfig::WebSearch(config) => Ok(config),
    _ => Err(NodeError::ConfigMismatch {
      expected: "web-search",
    }),
  }
}

/// `[n] title\nsnippet\nSource: url` blocks separated by blank lines.
fn llm_context(results: &[WebSearchResult]) -> String {
  results
    .iter()
    .enumerate()
    .map(|(i, r)| format!("[{}] {}\n{}\nSource: {}", i + 1, r.title, r.snippet, r.url))
    .collect::<Vec<_>>()
    .join("\n\n")
}

#[async_trait]
impl NodeExecutor for WebSearchExecutor {
  async fn execute(
    &self,
    node: &Node,
    context: &ExecutionContext,
    cancel: &CancellationToken,
  ) -> Result<NodeOutput, NodeError> {
    let config = config(node)?;
    let query = context.substitute(&config.query)?;

    let request = SearchRequest {
      query: query.clone(),
      provider: config.provider.clone(),
      result_count: config.result_count.clamp(1, MAX_RESULTS),
      safe_search: config.safe_search,
    };

    debug!(node_id = %node.node_id, provider = %request.provider, "web_search_request");
    let results = cancellable(cancel, self.provider.search(request)).await?;

    Ok(NodeOutput::WebSearch(WebSearchOutput {
      llm_context: llm_context(&results),
      result_count: results.len(),
      query,
      results,
    }))
  }

  fn validate(&self, node: &Node) -> Result<(), Vec<String>> {
    let config = config(node).map_err(|e| vec![e.to_string()])?;
    let mut issues = Vec::new();

    require_non_blank(&mut issues, "query", &config.query);
    require_non_blank(&mut issues, "provider", &config.provider);
    if !(1..=MAX_RESULTS).contains(&config.result_count) {
      issues.push(format!(
        "'resultCount' must be between 1 and {}, got {}",
        MAX_RESULTS, config.result_count
      ));
    }

    into_result(issues)
  }
}

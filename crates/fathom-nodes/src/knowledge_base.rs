use std::sync::Arc;

use async_trait::async_trait;
use fathom_config::{KnowledgeBaseConfig, NodeConfig, ResultFormat, SearchMode};
use fathom_node_runtime::{
  CitationList, CompactContext, DocumentList, ExecutionContext, KnowledgeBaseOutput, NodeError,
  NodeExecutor, NodeOutput, RetrievalOptions, RetrievalProvider, RetrievalResponse,
  RetrievedDocument, TextContext, cancellable,
};
use fathom_workflow::Node;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{into_result, require_non_blank};

/// Retrieves context from a knowledge base (`rag` and `knowledge-base` nodes).
pub struct KnowledgeBaseExecutor {
  provider: Arc<dyn RetrievalProvider>,
}

impl KnowledgeBaseExecutor {
  pub fn new(provider: Arc<dyn RetrievalProvider>) -> Self {
    Self { provider }
  }
}

fn config(node: &Node) -> Result<&KnowledgeBaseConfig, NodeError> {
  match &node.config {
    NodeConfig::KnowledgeBase(config) => Ok(config),
    _ => Err(NodeError::ConfigMismatch {
      expected: "knowledge-base",
    }),
  }
}

fn options(
  config: &KnowledgeBaseConfig,
  workspace_id: String,
  filters: Option<Map<String, Value>>,
) -> RetrievalOptions {
  let hybrid = config.search_mode == SearchMode::Hybrid;
  RetrievalOptions {
    workspace_id,
    limit: config.limit,
    // The node stores a percentage; the retrieval service wants a probability.
    threshold: config.similarity_threshold / 100.0,
    use_hybrid_search: hybrid,
    keyword_weight: hybrid.then_some(config.keyword_weight),
    include_metadata: config.include_metadata,
    include_source_text: config.include_source_text,
    max_context_length: config.max_context_length,
    filters,
  }
}

fn format(
  response: RetrievalResponse,
  format: ResultFormat,
  query: String,
  include_metadata: bool,
) -> KnowledgeBaseOutput {
  let document_count = response.results.len();

  match format {
    ResultFormat::Text => KnowledgeBaseOutput::Text(TextContext {
      context: response.context,
      citations: response.citations,
      query,
      document_count,
    }),
    ResultFormat::Json => KnowledgeBaseOutput::Json(DocumentList {
      query,
      documents: response
        .results
        .into_iter()
        .map(|chunk| RetrievedDocument {
          content: chunk.content,
          score: chunk.score,
          source: chunk.source,
          metadata: if include_metadata {
            chunk.metadata
          } else {
            Map::new()
          },
        })
        .collect(),
      document_count,
      execution_time_ms: response.metadata.execution_time_ms,
    }),
    ResultFormat::Compact => {
      let mut sources: Vec<String> = Vec::new();
      for source in response.results.into_iter().filter_map(|chunk| chunk.source) {
        if !sources.contains(&source) {
          sources.push(source);
        }
      }
      KnowledgeBaseOutput::Compact(CompactContext {
        context: response.context,
        sources,
        document_count,
      })
    }
    ResultFormat::CitationsOnly => KnowledgeBaseOutput::CitationsOnly(CitationList {
      citations: response.citations,
      document_count,
    }),
    ResultFormat::Raw => KnowledgeBaseOutput::Raw(response),
  }
}

#[async_trait]
impl NodeExecutor for KnowledgeBaseExecutor {
  async fn execute(
    &self,
    node: &Node,
    context: &ExecutionContext,
    cancel: &CancellationToken,
  ) -> Result<NodeOutput, NodeError> {
    let config = config(node)?;

    let query = context.substitute(&config.query)?;
    let workspace_id = context.substitute(&config.workspace_id)?;
    let filters = match &config.filter_options {
      Some(filters) => match context.substitute_value(&Value::Object(filters.clone()))? {
        Value::Object(map) => Some(map),
        _ => None,
      },
      None => None,
    };

    let options = options(config, workspace_id, filters);
    debug!(
      node_id = %node.node_id,
      threshold = options.threshold,
      hybrid = options.use_hybrid_search,
      limit = options.limit,
      "knowledge_base_query"
    );

    let response = cancellable(cancel, self.provider.retrieve_knowledge(&query, options)).await?;

    Ok(NodeOutput::KnowledgeBase(format(
      response,
      config.format_results,
      query,
      config.include_metadata,
    )))
  }

  fn validate(&self, node: &Node) -> Result<(), Vec<String>> {
    let config = config(node).map_err(|e| vec![e.to_string()])?;
    let mut issues = Vec::new();

    require_non_blank(&mut issues, "query", &config.query);
    require_non_blank(&mut issues, "workspaceId", &config.workspace_id);
    if !(0.0..=100.0).contains(&config.similarity_threshold) {
      issues.push(format!(
        "'similarityThreshold' must be between 0 and 100, got {}",
        config.similarity_threshold
      ));
    }
    if !(0.0..=1.0).contains(&config.keyword_weight) {
      issues.push(format!(
        "'keywordWeight' must be between 0 and 1, got {}",
        config.keyword_weight
      ));
    }
    if config.limit == 0 {
      issues.push("'limit' must be greater than 0".to_string());
    }

    into_result(issues)
  }
}

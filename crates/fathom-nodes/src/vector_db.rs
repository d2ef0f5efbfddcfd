use std::sync::Arc;

use async_trait::async_trait;
use fathom_config::{NodeConfig, VectorDbConfig};
use fathom_node_runtime::{
  Embedder, ExecutionContext, NodeError, NodeExecutor, NodeOutput, VectorDbOutput, VectorQuery,
  VectorStore, cancellable,
};
use fathom_workflow::Node;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{into_result, require_non_blank};

/// Embeds the query and looks up its nearest rows in a vector table
/// (`lancedb` nodes).
pub struct VectorDbExecutor {
  embedder: Arc<dyn Embedder>,
  store: Arc<dyn VectorStore>,
}

impl VectorDbExecutor {
  pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
    Self { embedder, store }
  }
}

fn config(node: &Node) -> Result<&VectorDbConfig, NodeError> {
  match &node.config {
    NodeConfig::VectorDb(config) => Ok(config),
    _ => Err(NodeError::ConfigMismatch {
      expected: "lancedb",
    }),
  }
}

#[async_trait]
impl NodeExecutor for VectorDbExecutor {
  async fn execute(
    &self,
    node: &Node,
    context: &ExecutionContext,
    cancel: &CancellationToken,
  ) -> Result<NodeOutput, NodeError> {
    let config = config(node)?;

    let query = context.substitute(&config.query)?;
    let table = context.substitute(&config.table_name)?;
    let filter = config
      .filter
      .as_deref()
      .filter(|f| !f.trim().is_empty())
      .map(|f| context.substitute(f))
      .transpose()?;

    let vector = cancellable(cancel, self.embedder.embed(&query)).await?;
    debug!(node_id = %node.node_id, table = %table, dimensions = vector.len(), "vector_query");

    let rows = cancellable(
      cancel,
      self.store.query(VectorQuery {
        table: table.clone(),
        vector,
        limit: config.limit,
        filter,
        columns: config.columns.clone(),
      }),
    )
    .await?;

    Ok(NodeOutput::VectorDb(VectorDbOutput {
      count: rows.len(),
      query,
      table,
      rows,
    }))
  }

  fn validate(&self, node: &Node) -> Result<(), Vec<String>> {
    let config = config(node).map_err(|e| vec![e.to_string()])?;
    let mut issues = Vec::new();

    require_non_blank(&mut issues, "query", &config.query);
    require_non_blank(&mut issues, "tableName", &config.table_name);
    if config.limit == 0 {
      issues.push("'limit' must be greater than 0".to_string());
    }

    into_result(issues)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{MockEmbedder, MockVectorStore, node};
  use serde_json::json;

  #[tokio::test]
  async fn test_embeds_and_queries() {
    let store = Arc::new(MockVectorStore::returning(vec![
      json!({ "id": 1, "text": "a" }),
      json!({ "id": 2, "text": "b" }),
      json!({ "id": 3, "text": "c" }),
    ]));
    let executor = VectorDbExecutor::new(Arc::new(MockEmbedder), store.clone());
    let lookup = node(
      "vec",
      "lancedb",
      json!({
        "query": "{{input.q}}",
        "tableName": "docs",
        "limit": 2,
        "filter": "team = '{{input.team}}'",
        "columns": ["id", "text"]
      }),
    );
    let ctx = ExecutionContext::new("exec", json!({ "q": "hello", "team": "core" }));

    let output = executor
      .execute(&lookup, &ctx, &CancellationToken::new())
      .await
      .unwrap();
    assert_eq!(
      output.to_value(),
      json!({
        "query": "hello",
        "table": "docs",
        "rows": [{ "id": 1, "text": "a" }, { "id": 2, "text": "b" }],
        "count": 2
      })
    );

    let queries = store.queries.lock().unwrap();
    assert_eq!(queries[0].vector, vec![5.0, 0.0, 1.0]);
    assert_eq!(queries[0].filter.as_deref(), Some("team = 'core'"));
    assert_eq!(queries[0].columns, vec!["id", "text"]);
  }

  #[test]
  fn test_validate_requires_table() {
    let executor = VectorDbExecutor::new(
      Arc::new(MockEmbedder),
      Arc::new(MockVectorStore::returning(vec![])),
    );
    let issues = executor
      .validate(&node("vec", "lancedb", json!({ "query": "q" })))
      .unwrap_err();
    assert_eq!(issues, vec!["'tableName' is required".to_string()]);
  }
}

//! Mock collaborators shared by the executor tests.

use std::sync::Mutex;

use async_trait::async_trait;
use fathom_config::NodeDef;
use fathom_node_runtime::{
  Embedder, GenerateRequest, GenerateResponse, LlmProvider, ProviderError, RetrievalOptions,
  RetrievalProvider, RetrievalResponse, SearchProvider, SearchRequest, TokenUsage, VectorQuery,
  VectorStore, WebSearchResult,
};
use fathom_workflow::Node;
use serde_json::Value;

pub fn node(id: &str, node_type: &str, data: Value) -> Node {
  Node::from_def(NodeDef::new(id, node_type, data)).unwrap()
}

pub struct MockLlm {
  reply: String,
  pub requests: Mutex<Vec<GenerateRequest>>,
}

impl MockLlm {
  pub fn replying(reply: &str) -> Self {
    Self {
      reply: reply.to_string(),
      requests: Mutex::new(Vec::new()),
    }
  }
}

#[async_trait]
impl LlmProvider for MockLlm {
  async fn generate_text(
    &self,
    request: GenerateRequest,
  ) -> Result<GenerateResponse, ProviderError> {
    self.requests.lock().unwrap().push(request.clone());
    Ok(GenerateResponse {
      text: self.reply.clone(),
      usage: TokenUsage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
      },
      model: request.model.unwrap_or_else(|| "mock-model".to_string()),
    })
  }
}

#[derive(Default)]
pub struct MockRetrieval {
  pub response: RetrievalResponse,
  pub calls: Mutex<Vec<(String, RetrievalOptions)>>,
}

impl MockRetrieval {
  pub fn returning(response: RetrievalResponse) -> Self {
    Self {
      response,
      calls: Mutex::new(Vec::new()),
    }
  }
}

#[async_trait]
impl RetrievalProvider for MockRetrieval {
  async fn retrieve_knowledge(
    &self,
    query: &str,
    options: RetrievalOptions,
  ) -> Result<RetrievalResponse, ProviderError> {
    self
      .calls
      .lock()
      .unwrap()
      .push((query.to_string(), options));
    Ok(self.response.clone())
  }
}

pub struct MockSearch {
  pub results: Vec<WebSearchResult>,
  pub requests: Mutex<Vec<SearchRequest>>,
}

impl MockSearch {
  pub fn returning(results: Vec<WebSearchResult>) -> Self {
    Self {
      results,
      requests: Mutex::new(Vec::new()),
    }
  }
}

#[async_trait]
impl SearchProvider for MockSearch {
  async fn search(&self, request: SearchRequest) -> Result<Vec<WebSearchResult>, ProviderError> {
    self.requests.lock().unwrap().push(request);
    Ok(self.results.clone())
  }
}

/// Embeds text as `[len, 0, 1]`.
pub struct MockEmbedder;

#[async_trait]
impl Embedder for MockEmbedder {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
    Ok(vec![text.len() as f32, 0.0, 1.0])
  }
}

pub struct MockVectorStore {
  pub rows: Vec<Value>,
  pub queries: Mutex<Vec<VectorQuery>>,
}

impl MockVectorStore {
  pub fn returning(rows: Vec<Value>) -> Self {
    Self {
      rows,
      queries: Mutex::new(Vec::new()),
    }
  }
}

#[async_trait]
impl VectorStore for MockVectorStore {
  async fn query(&self, query: VectorQuery) -> Result<Vec<Value>, ProviderError> {
    let limit = query.limit as usize;
    self.queries.lock().unwrap().push(query);
    Ok(self.rows.iter().take(limit).cloned().collect())
  }
}

/// Never answers; used to exercise cancellation.
pub struct HangingLlm;

#[async_trait]
impl LlmProvider for HangingLlm {
  async fn generate_text(
    &self,
    _request: GenerateRequest,
  ) -> Result<GenerateResponse, ProviderError> {
    std::future::pending().await
  }
}

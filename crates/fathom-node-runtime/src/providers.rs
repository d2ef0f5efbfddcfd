//! Collaborator interfaces.
//!
//! Executors never talk to the network directly; they call these traits.
//! Implementations live in `fathom-host-http` or in tests as mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProviderError, TransformError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model: Option<String>,
  pub prompt: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub system_prompt: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub temperature: Option<f32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
  pub prompt_tokens: u32,
  pub completion_tokens: u32,
  pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
  pub text: String,
  #[serde(default)]
  pub usage: TokenUsage,
  /// The model that actually served the request.
  #[serde(default)]
  pub model: String,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
  async fn generate_text(&self, request: GenerateRequest)
  -> Result<GenerateResponse, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalOptions {
  pub workspace_id: String,
  pub limit: u32,
  /// Minimum similarity as a probability in `0.0..=1.0`.
  pub threshold: f64,
  pub use_hybrid_search: bool,
  /// Only set for hybrid search.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub keyword_weight: Option<f64>,
  pub include_metadata: bool,
  pub include_source_text: bool,
  pub max_context_length: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub filters: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedQuery {
  #[serde(default)]
  pub processed_query: String,
  #[serde(default)]
  pub expanded_queries: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalMetadata {
  #[serde(default)]
  pub execution_time_ms: u64,
}

/// One retrieved chunk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedChunk {
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub score: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source: Option<String>,
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResponse {
  #[serde(default)]
  pub context: String,
  #[serde(default)]
  pub citations: Vec<Value>,
  #[serde(default)]
  pub query: ProcessedQuery,
  #[serde(default)]
  pub results: Vec<RetrievedChunk>,
  #[serde(default)]
  pub metadata: RetrievalMetadata,
}

#[async_trait]
pub trait RetrievalProvider: Send + Sync {
  async fn retrieve_knowledge(
    &self,
    query: &str,
    options: RetrievalOptions,
  ) -> Result<RetrievalResponse, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
  pub query: String,
  pub provider: String,
  pub result_count: u32,
  pub safe_search: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchResult {
  pub title: String,
  pub url: String,
  #[serde(default)]
  pub snippet: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub score: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub published_date: Option<String>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
  async fn search(&self, request: SearchRequest) -> Result<Vec<WebSearchResult>, ProviderError>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorQuery {
  pub table: String,
  pub vector: Vec<f32>,
  pub limit: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub filter: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub columns: Vec<String>,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
  /// Nearest rows to the query vector, closest first.
  async fn query(&self, query: VectorQuery) -> Result<Vec<Value>, ProviderError>;
}

/// What a transform sees: its substituted parameters and the run's scope.
#[derive(Debug, Clone, Copy)]
pub struct TransformInput<'a> {
  pub node_id: &'a str,
  pub params: &'a Map<String, Value>,
  /// `input`, every completed node's result, and user variables.
  pub scope: &'a Map<String, Value>,
}

/// A precompiled function the `function` node can call by name.
pub trait UserTransform: Send + Sync {
  fn apply(&self, input: TransformInput<'_>) -> Result<Value, TransformError>;
}

impl<F> UserTransform for F
where
  F: Fn(TransformInput<'_>) -> Result<Value, TransformError> + Send + Sync,
{
  fn apply(&self, input: TransformInput<'_>) -> Result<Value, TransformError> {
    self(input)
  }
}

//! Typed node results.
//!
//! Every node type produces one variant of [`NodeOutput`]. The engine stores
//! the typed value and projects it to JSON for template resolution, so the
//! serialized field names below are what `{{node-id.field}}` paths address.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::providers::{RetrievalResponse, TokenUsage, WebSearchResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeOutput {
  /// The run payload merged over the trigger's default input.
  Trigger(Value),
  Llm(LlmOutput),
  KnowledgeBase(KnowledgeBaseOutput),
  WebSearch(WebSearchOutput),
  /// Whatever the transform or expression returned.
  Function(Value),
  Conditional(ConditionalOutput),
  Output(OutputValue),
  VectorDb(VectorDbOutput),
  /// Result of a custom executor.
  Custom(Value),
}

impl NodeOutput {
  /// The value an `output` node copies when it names no explicit source.
  pub fn primary(&self) -> Value {
    match self {
      NodeOutput::Trigger(v) | NodeOutput::Function(v) | NodeOutput::Custom(v) => v.clone(),
      NodeOutput::Llm(out) => Value::String(out.text.clone()),
      NodeOutput::KnowledgeBase(out) => out.primary(),
      NodeOutput::WebSearch(out) => Value::String(out.llm_context.clone()),
      NodeOutput::Conditional(out) => Value::Bool(out.result),
      NodeOutput::Output(out) => out.value.clone(),
      NodeOutput::VectorDb(out) => Value::Array(out.rows.clone()),
    }
  }

  /// JSON projection used for template resolution and final results.
  pub fn to_value(&self) -> Value {
    serde_json::to_value(self).unwrap_or(Value::Null)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmOutput {
  pub text: String,
  pub usage: TokenUsage,
  pub model: String,
}

/// Knowledge-base result, shaped by the node's `formatResults` setting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KnowledgeBaseOutput {
  Text(TextContext),
  Json(DocumentList),
  Compact(CompactContext),
  CitationsOnly(CitationList),
  /// The retrieval response, untouched.
  Raw(RetrievalResponse),
}

impl KnowledgeBaseOutput {
  pub fn document_count(&self) -> usize {
    match self {
      KnowledgeBaseOutput::Text(out) => out.document_count,
      KnowledgeBaseOutput::Json(out) => out.document_count,
      KnowledgeBaseOutput::Compact(out) => out.document_count,
      KnowledgeBaseOutput::CitationsOnly(out) => out.document_count,
      KnowledgeBaseOutput::Raw(out) => out.results.len(),
    }
  }

  fn primary(&self) -> Value {
    match self {
      KnowledgeBaseOutput::Text(out) => Value::String(out.context.clone()),
      KnowledgeBaseOutput::Compact(out) => Value::String(out.context.clone()),
      KnowledgeBaseOutput::Raw(out) => Value::String(out.context.clone()),
      KnowledgeBaseOutput::Json(out) => {
        serde_json::to_value(&out.documents).unwrap_or(Value::Null)
      }
      KnowledgeBaseOutput::CitationsOnly(out) => Value::Array(out.citations.clone()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContext {
  pub context: String,
  pub citations: Vec<Value>,
  pub query: String,
  pub document_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedDocument {
  pub content: String,
  pub score: f64,
  pub source: Option<String>,
  pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentList {
  pub query: String,
  pub documents: Vec<RetrievedDocument>,
  pub document_count: usize,
  pub execution_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactContext {
  pub context: String,
  pub sources: Vec<String>,
  pub document_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationList {
  pub citations: Vec<Value>,
  pub document_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchOutput {
  pub query: String,
  pub results: Vec<WebSearchResult>,
  /// Results flattened into a prompt-ready block.
  pub llm_context: String,
  pub result_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalOutput {
  pub result: bool,
  /// `"true"` or `"false"`: the edge handle that stays live.
  pub branch: String,
  /// The condition after substitution.
  pub condition: String,
}

impl ConditionalOutput {
  pub fn new(result: bool, condition: impl Into<String>) -> Self {
    Self {
      result,
      branch: result.to_string(),
      condition: condition.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputValue {
  pub variable_name: String,
  pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorDbOutput {
  pub query: String,
  pub table: String,
  pub rows: Vec<Value>,
  pub count: usize,
}

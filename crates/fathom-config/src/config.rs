//! Typed node configuration.
//!
//! Every built-in node type has a configuration struct mirroring the `data`
//! object the canvas writes. String fields may contain `{{path}}` references
//! that are substituted at run time.
//!
//! Required string fields default to empty rather than failing to parse, so
//! a missing field is reported by the executor's `validate` with a readable
//! message instead of a serde error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kind::NodeKind;

/// Strongly-typed configuration for a node, keyed by its type tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeConfig {
  Trigger(TriggerConfig),
  Llm(LlmConfig),
  KnowledgeBase(KnowledgeBaseConfig),
  WebSearch(WebSearchConfig),
  Function(FunctionConfig),
  Conditional(ConditionalConfig),
  VectorDb(VectorDbConfig),
  Output(OutputConfig),
  /// Configuration for a custom node type, left as raw JSON for its executor.
  Custom(Value),
}

impl NodeConfig {
  /// Parse a node's `data` object according to its type tag.
  ///
  /// Unknown tags yield [`NodeConfig::Custom`]; whether the tag is actually
  /// runnable is decided by the executor registry, not here.
  pub fn parse(node_type: &str, data: &Value) -> Result<Self, serde_json::Error> {
    let data = if data.is_null() {
      Value::Object(Map::new())
    } else {
      data.clone()
    };

    let Some(kind) = NodeKind::from_tag(node_type) else {
      return Ok(NodeConfig::Custom(data));
    };

    Ok(match kind {
      NodeKind::Trigger => NodeConfig::Trigger(serde_json::from_value(data)?),
      NodeKind::Llm => NodeConfig::Llm(serde_json::from_value(data)?),
      NodeKind::Rag | NodeKind::KnowledgeBase => {
        NodeConfig::KnowledgeBase(serde_json::from_value(data)?)
      }
      NodeKind::WebSearch => NodeConfig::WebSearch(serde_json::from_value(data)?),
      NodeKind::Function => NodeConfig::Function(serde_json::from_value(data)?),
      NodeKind::Conditional => NodeConfig::Conditional(serde_json::from_value(data)?),
      NodeKind::LanceDb => NodeConfig::VectorDb(serde_json::from_value(data)?),
      NodeKind::Output => NodeConfig::Output(serde_json::from_value(data)?),
    })
  }

  /// Serialize back into a `data` object.
  pub fn to_value(&self) -> Value {
    serde_json::to_value(self).unwrap_or(Value::Null)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
  #[default]
  Manual,
  Webhook,
  Schedule,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConfig {
  #[serde(default)]
  pub trigger_type: TriggerType,
  /// Values merged under the run payload; payload keys win.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_input: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
  #[serde(default)]
  pub prompt: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub system_prompt: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub temperature: Option<f32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_tokens: Option<u32>,
}

/// Retrieval strategy for knowledge-base nodes. Anything other than
/// `hybrid` falls back to pure vector search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
  Hybrid,
  #[default]
  #[serde(other)]
  Vector,
}

/// Output shape of a knowledge-base node. Unrecognised values map to `Raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultFormat {
  Text,
  Json,
  Compact,
  CitationsOnly,
  #[default]
  #[serde(other)]
  Raw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfig {
  #[serde(default)]
  pub query: String,
  #[serde(default)]
  pub workspace_id: String,
  #[serde(default = "default_limit")]
  pub limit: u32,
  /// Percentage in `0..=100`; converted to a probability before retrieval.
  #[serde(default = "default_similarity_threshold")]
  pub similarity_threshold: f64,
  #[serde(default)]
  pub search_mode: SearchMode,
  #[serde(default = "default_keyword_weight")]
  pub keyword_weight: f64,
  #[serde(default = "default_true")]
  pub include_metadata: bool,
  #[serde(default = "default_true")]
  pub include_source_text: bool,
  #[serde(default = "default_max_context_length")]
  pub max_context_length: u32,
  #[serde(default)]
  pub format_results: ResultFormat,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub filter_options: Option<Map<String, Value>>,
}

impl Default for KnowledgeBaseConfig {
  fn default() -> Self {
    Self {
      query: String::new(),
      workspace_id: String::new(),
      limit: default_limit(),
      similarity_threshold: default_similarity_threshold(),
      search_mode: SearchMode::default(),
      keyword_weight: default_keyword_weight(),
      include_metadata: true,
      include_source_text: true,
      max_context_length: default_max_context_length(),
      format_results: ResultFormat::default(),
      filter_options: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchConfig {
  #[serde(default)]
  pub query: String,
  #[serde(default = "default_search_provider")]
  pub provider: String,
  #[serde(default = "default_limit")]
  pub result_count: u32,
  #[serde(default = "default_true")]
  pub safe_search: bool,
}

impl Default for WebSearchConfig {
  fn default() -> Self {
    Self {
      query: String::new(),
      provider: default_search_provider(),
      result_count: default_limit(),
      safe_search: true,
    }
  }
}

/// A user transform: either a named transform registered with the function
/// executor, or a sandboxed expression evaluated against the context.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub transform: Option<String>,
  #[serde(default, alias = "code", skip_serializing_if = "Option::is_none")]
  pub expression: Option<String>,
  /// Parameters handed to a named transform after substitution.
  #[serde(default, skip_serializing_if = "Map::is_empty")]
  pub params: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalConfig {
  #[serde(default)]
  pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
  #[serde(default)]
  pub variable_name: String,
  /// Template selecting the value to publish. When absent the upstream
  /// node's primary value is used.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorDbConfig {
  #[serde(default)]
  pub query: String,
  #[serde(default)]
  pub table_name: String,
  #[serde(default = "default_limit")]
  pub limit: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub filter: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub columns: Vec<String>,
}

impl Default for VectorDbConfig {
  fn default() -> Self {
    Self {
      query: String::new(),
      table_name: String::new(),
      limit: default_limit(),
      filter: None,
      columns: Vec::new(),
    }
  }
}

fn default_true() -> bool {
  true
}

fn default_limit() -> u32 {
  5
}

fn default_similarity_threshold() -> f64 {
  70.0
}

fn default_keyword_weight() -> f64 {
  0.3
}

fn default_max_context_length() -> u32 {
  4000
}

fn default_search_provider() -> String {
  "tavily".to_string()
}

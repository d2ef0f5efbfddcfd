use async_trait::async_trait;
use fathom_node_runtime::{
  Embedder, GenerateRequest, GenerateResponse, LlmProvider, ProviderError, TokenUsage,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{BaseUrl, send_json};
use crate::error::HostConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// OpenAI-compatible client. Works with OpenAI, Ollama, vLLM, Groq and other
/// servers exposing `/chat/completions` and `/embeddings`.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
  http: Client,
  base_url: BaseUrl,
  api_key: Option<String>,
  model: String,
  embedding_model: String,
}

impl OpenAiClient {
  pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, HostConfigError> {
    Ok(Self {
      http: Client::new(),
      base_url: BaseUrl::parse(base_url)?,
      api_key,
      model: DEFAULT_MODEL.to_string(),
      embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
    })
  }

  /// Model used when a node does not name one.
  pub fn with_model(mut self, model: impl Into<String>) -> Self {
    self.model = model.into();
    self
  }

  pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
    self.embedding_model = model.into();
    self
  }

  fn post(&self, path: &str) -> reqwest::RequestBuilder {
    let request = self.http.post(self.base_url.endpoint(path));
    match &self.api_key {
      Some(key) => request.bearer_auth(key),
      None => request,
    }
  }
}

// Request types

#[derive(Debug, Serialize)]
struct ChatRequest {
  model: String,
  messages: Vec<ChatMessage>,
  #[serde(skip_serializing_if = "Option::is_none")]
  temperature: Option<f32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
  role: &'static str,
  content: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
  model: &'a str,
  input: &'a str,
}

// Response types

#[derive(Debug, Deserialize)]
struct ChatResponse {
  #[serde(default)]
  model: String,
  #[serde(default)]
  choices: Vec<ChatChoice>,
  #[serde(default)]
  usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
  message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
  #[serde(default)]
  content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
  #[serde(default)]
  prompt_tokens: u32,
  #[serde(default)]
  completion_tokens: u32,
  #[serde(default)]
  total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
  data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
  embedding: Vec<f32>,
}

fn chat_request(request: GenerateRequest, default_model: &str) -> ChatRequest {
  let mut messages = Vec::with_capacity(2);
  if let Some(system) = request.system_prompt.filter(|s| !s.trim().is_empty()) {
    messages.push(ChatMessage {
      role: "system",
      content: system,
    });
  }
  messages.push(ChatMessage {
    role: "user",
    content: request.prompt,
  });

  ChatRequest {
    model: request
      .model
      .filter(|m| !m.trim().is_empty())
      .unwrap_or_else(|| default_model.to_string()),
    messages,
    temperature: request.temperature,
    max_tokens: request.max_tokens,
  }
}

fn generate_response(
  response: ChatResponse,
  requested_model: String,
) -> Result<GenerateResponse, ProviderError> {
  let choice = response
    .choices
    .into_iter()
    .next()
    .ok_or_else(|| ProviderError::invalid_response("completion has no choices"))?;

  let usage = response
    .usage
    .map(|u| TokenUsage {
      prompt_tokens: u.prompt_tokens,
      completion_tokens: u.completion_tokens,
      total_tokens: u.total_tokens,
    })
    .unwrap_or_default();

  Ok(GenerateResponse {
    text: choice.message.content.unwrap_or_default(),
    usage,
    model: if response.model.is_empty() {
      requested_model
    } else {
      response.model
    },
  })
}

#[async_trait]
impl LlmProvider for OpenAiClient {
  async fn generate_text(
    &self,
    request: GenerateRequest,
  ) -> Result<GenerateResponse, ProviderError> {
    let body = chat_request(request, &self.model);
    let model = body.model.clone();
    debug!(model = %model, base_url = %self.base_url, "chat_completion_request");

    let response: ChatResponse = send_json(self.post("chat/completions").json(&body)).await?;
    generate_response(response, model)
  }
}

#[async_trait]
impl Embedder for OpenAiClient {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
    let body = EmbeddingRequest {
      model: &self.embedding_model,
      input: text,
    };
    let response: EmbeddingResponse = send_json(self.post("embeddings").json(&body)).await?;

    response
      .data
      .into_iter()
      .next()
      .map(|d| d.embedding)
      .ok_or_else(|| ProviderError::invalid_response("embedding response has no data"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn request() -> GenerateRequest {
    GenerateRequest {
      model: None,
      prompt: "Summarize X".to_string(),
      system_prompt: Some("Be brief.".to_string()),
      temperature: Some(0.2),
      max_tokens: None,
    }
  }

  #[test]
  fn test_chat_request_shape() {
    let body = chat_request(request(), DEFAULT_MODEL);
    assert_eq!(
      serde_json::to_value(&body).unwrap(),
      json!({
        "model": "gpt-4o-mini",
        "messages": [
          { "role": "system", "content": "Be brief." },
          { "role": "user", "content": "Summarize X" }
        ],
        "temperature": 0.2f32
      })
    );
  }

  #[test]
  fn test_blank_system_prompt_is_dropped() {
    let mut req = request();
    req.system_prompt = Some("  ".to_string());
    req.model = Some("llama3".to_string());
    let body = chat_request(req, DEFAULT_MODEL);
    assert_eq!(body.messages.len(), 1);
    assert_eq!(body.model, "llama3");
  }

  #[test]
  fn test_generate_response_reads_first_choice() {
    let response: ChatResponse = serde_json::from_value(json!({
      "model": "gpt-4o-mini-2024",
      "choices": [{ "message": { "role": "assistant", "content": "X is Y" } }],
      "usage": { "prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12 }
    }))
    .unwrap();

    let out = generate_response(response, "gpt-4o-mini".to_string()).unwrap();
    assert_eq!(out.text, "X is Y");
    assert_eq!(out.model, "gpt-4o-mini-2024");
    assert_eq!(out.usage.total_tokens, 12);
  }

  #[test]
  fn test_generate_response_without_choices() {
    let response: ChatResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
    assert!(matches!(
      generate_response(response, "m".to_string()),
      Err(ProviderError::InvalidResponse { .. })
    ));
  }

  #[test]
  fn test_new_rejects_invalid_base_url() {
    assert!(OpenAiClient::new("::nope::", None).is_err());
    assert!(OpenAiClient::new(DEFAULT_BASE_URL, Some("sk".to_string())).is_ok());
  }
}

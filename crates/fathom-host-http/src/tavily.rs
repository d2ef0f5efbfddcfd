use async_trait::async_trait;
use fathom_node_runtime::{ProviderError, SearchProvider, SearchRequest, WebSearchResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{BaseUrl, send_json};
use crate::error::HostConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";
const PROVIDER: &str = "tavily";

/// Web search backed by the Tavily search API.
#[derive(Debug, Clone)]
pub struct TavilySearchClient {
  http: Client,
  base_url: BaseUrl,
  api_key: String,
}

impl TavilySearchClient {
  pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, HostConfigError> {
    Ok(Self {
      http: Client::new(),
      base_url: BaseUrl::parse(base_url)?,
      api_key: api_key.into(),
    })
  }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
  api_key: &'a str,
  query: &'a str,
  max_results: u32,
  search_depth: &'static str,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
  #[serde(default)]
  results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
  #[serde(default)]
  title: String,
  #[serde(default)]
  url: String,
  #[serde(default)]
  content: String,
  #[serde(default)]
  score: Option<f64>,
  #[serde(default)]
  published_date: Option<String>,
}

impl From<TavilyResult> for WebSearchResult {
  fn from(result: TavilyResult) -> Self {
    WebSearchResult {
      title: result.title,
      url: result.url,
      snippet: result.content,
      score: result.score,
      published_date: result.published_date,
    }
  }
}

#[async_trait]
impl SearchProvider for TavilySearchClient {
  async fn search(&self, request: SearchRequest) -> Result<Vec<WebSearchResult>, ProviderError> {
    if !request.provider.eq_ignore_ascii_case(PROVIDER) {
      return Err(ProviderError::Unsupported(request.provider));
    }

    // Tavily filters unsafe content itself; there is no toggle to forward.
    debug!(
      query = %request.query,
      max_results = request.result_count,
      safe_search = request.safe_search,
      "tavily_search"
    );

    let body = TavilyRequest {
      api_key: &self.api_key,
      query: &request.query,
      max_results: request.result_count,
      search_depth: "basic",
    };
    let response: TavilyResponse =
      send_json(self.http.post(self.base_url.endpoint("search")).json(&body)).await?;

    Ok(
      response
        .results
        .into_iter()
        .take(request.result_count as usize)
        .map(WebSearchResult::from)
        .collect(),
    )
  }
}

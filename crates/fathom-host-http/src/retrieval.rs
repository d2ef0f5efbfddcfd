use async_trait::async_trait;
use fathom_node_runtime::{ProviderError, RetrievalOptions, RetrievalProvider, RetrievalResponse};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::client::{BaseUrl, send_json};
use crate::error::HostConfigError;

/// Knowledge-base retrieval over a JSON HTTP service.
///
/// Sends `POST {base}/retrieve` with the query and the node's options, and
/// expects a `RetrievalResponse` body.
#[derive(Debug, Clone)]
pub struct HttpRetrievalClient {
  http: Client,
  base_url: BaseUrl,
  api_key: Option<String>,
}

impl HttpRetrievalClient {
  pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, HostConfigError> {
    Ok(Self {
      http: Client::new(),
      base_url: BaseUrl::parse(base_url)?,
      api_key,
    })
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRequest<'a> {
  query: &'a str,
  #[serde(flatten)]
  options: RetrievalOptions,
}

#[async_trait]
impl RetrievalProvider for HttpRetrievalClient {
  async fn retrieve_knowledge(
    &self,
    query: &str,
    options: RetrievalOptions,
  ) -> Result<RetrievalResponse, ProviderError> {
    debug!(
      workspace_id = %options.workspace_id,
      limit = options.limit,
      "retrieve_knowledge"
    );

    let mut request = self
      .http
      .post(self.base_url.endpoint("retrieve"))
      .json(&RetrieveRequest { query, options });
    if let Some(key) = &self.api_key {
      request = request.bearer_auth(key);
    }

    send_json(request).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_request_body_flattens_options() {
    let body = RetrieveRequest {
      query: "What is X?",
      options: RetrievalOptions {
        workspace_id: "ws-1".to_string(),
        limit: 5,
        threshold: 0.5,
        use_hybrid_search: false,
        keyword_weight: None,
        include_metadata: true,
        include_source_text: true,
        max_context_length: 4000,
        filters: None,
      },
    };

    assert_eq!(
      serde_json::to_value(&body).unwrap(),
      json!({
        "query": "What is X?",
        "workspaceId": "ws-1",
        "limit": 5,
        "threshold": 0.5,
        "useHybridSearch": false,
        "includeMetadata": true,
        "includeSourceText": true,
        "maxContextLength": 4000
      })
    );
  }
}

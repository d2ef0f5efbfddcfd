use async_trait::async_trait;
use fathom_node_runtime::{ProviderError, VectorQuery, VectorStore};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{BaseUrl, send_json};
use crate::error::HostConfigError;

/// Vector table lookups over HTTP: `POST {base}/tables/{table}/query`.
#[derive(Debug, Clone)]
pub struct HttpVectorStore {
  http: Client,
  base_url: BaseUrl,
}

impl HttpVectorStore {
  pub fn new(base_url: &str) -> Result<Self, HostConfigError> {
    Ok(Self {
      http: Client::new(),
      base_url: BaseUrl::parse(base_url)?,
    })
  }
}

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
  vector: &'a [f32],
  limit: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  filter: Option<&'a str>,
  #[serde(skip_serializing_if = "no_columns")]
  columns: &'a [String],
}

fn no_columns(columns: &&[String]) -> bool {
  columns.is_empty()
}

/// Services answer either `{"rows": [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueryResponse {
  Rows { rows: Vec<Value> },
  Bare(Vec<Value>),
}

impl QueryResponse {
  fn into_rows(self) -> Vec<Value> {
    match self {
      QueryResponse::Rows { rows } | QueryResponse::Bare(rows) => rows,
    }
  }
}

#[async_trait]
impl VectorStore for HttpVectorStore {
  async fn query(&self, query: VectorQuery) -> Result<Vec<Value>, ProviderError> {
    let url = self
      .base_url
      .endpoint_segments(&["tables", &query.table, "query"]);
    let body = QueryBody {
      vector: &query.vector,
      limit: query.limit,
      filter: query.filter.as_deref(),
      columns: &query.columns,
    };

    let response: QueryResponse = send_json(self.http.post(url).json(&body)).await?;
    let mut rows = response.into_rows();
    rows.truncate(query.limit as usize);
    Ok(rows)
  }
}

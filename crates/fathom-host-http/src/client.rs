use std::fmt;

use fathom_node_runtime::ProviderError;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::HostConfigError;

/// Longest error body kept in a [`ProviderError::Status`].
const MAX_ERROR_BODY: usize = 2048;

/// A validated http(s) base URL that endpoint paths are appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(Url);

impl BaseUrl {
  pub fn parse(url: &str) -> Result<Self, HostConfigError> {
    let parsed = Url::parse(url).map_err(|source| HostConfigError::InvalidUrl {
      url: url.to_string(),
      source,
    })?;
    match parsed.scheme() {
      "http" | "https" => Ok(Self(parsed)),
      _ => Err(HostConfigError::UnsupportedScheme(url.to_string())),
    }
  }

  /// `base` + `/` + `path`, keeping any path prefix on the base (`/v1`).
  pub fn endpoint(&self, path: &str) -> String {
    format!(
      "{}/{}",
      self.0.as_str().trim_end_matches('/'),
      path.trim_start_matches('/')
    )
  }

  /// Append percent-encoded path segments.
  pub fn endpoint_segments(&self, segments: &[&str]) -> String {
    let mut url = self.0.clone();
    // http(s) URLs always have a hierarchical path.
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url.into()
  }
}

impl fmt::Display for BaseUrl {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.0.as_str())
  }
}

/// Send a request and decode a JSON success body.
pub(crate) async fn send_json<T: DeserializeOwned>(
  request: RequestBuilder,
) -> Result<T, ProviderError> {
  let response = request.send().await.map_err(ProviderError::transport)?;

  let status = response.status();
  if !status.is_success() {
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
      let mut end = MAX_ERROR_BODY;
      while !body.is_char_boundary(end) {
        end -= 1;
      }
      body.truncate(end);
    }
    return Err(ProviderError::Status {
      status: status.as_u16(),
      body,
    });
  }

  response
    .json::<T>()
    .await
    .map_err(|e| ProviderError::invalid_response(e.to_string()))
}

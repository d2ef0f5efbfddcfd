/// Errors raised while configuring an HTTP collaborator.
#[derive(Debug, thiserror::Error)]
pub enum HostConfigError {
  #[error("invalid base url '{url}': {source}")]
  InvalidUrl {
    url: String,
    #[source]
    source: url::ParseError,
  },

  #[error("base url '{0}' must use http or https")]
  UnsupportedScheme(String),
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("template not found: {0}")]
  NotFound(String),

  #[error("invalid template '{name}': {source}")]
  Parse {
    name: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to read templates from {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

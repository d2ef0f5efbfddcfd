use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("unresolved template reference '{{{{{reference}}}}}'")]
  Unresolved { reference: String },
}

#[derive(Debug, Error)]
pub enum ExpressionError {
  #[error("invalid expression '{expression}': {source}")]
  Compile {
    expression: String,
    #[source]
    source: minijinja::Error,
  },

  #[error("failed to evaluate '{expression}': {source}")]
  Eval {
    expression: String,
    #[source]
    source: minijinja::Error,
  },

  #[error(transparent)]
  Template(#[from] TemplateError),
}

/// A reference that could not be resolved and was left verbatim.
///
/// Never an error in lenient mode; it is only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateResolutionWarning {
  pub reference: String,
}

impl fmt::Display for TemplateResolutionWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "template reference '{}' did not resolve and was left unchanged",
      self.reference
    )
  }
}

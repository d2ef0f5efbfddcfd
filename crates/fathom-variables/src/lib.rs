//! Fathom Variables
//!
//! Resolves `{{identifier.path}}` references inside node configuration
//! against the execution context of a run.
//!
//! The scope is a JSON object keyed by root identifier: the reserved `input`
//! key holds the run payload, every completed node is keyed by its id, and
//! user variables sit alongside them. A path walks nested objects by key and
//! arrays by numeric index:
//!
//! ```text
//! {{input.query}}            -> payload field
//! {{kb-1.citations.0.title}} -> first citation of node `kb-1`
//! ```
//!
//! References that do not resolve are left in place byte-for-byte and a
//! [`TemplateResolutionWarning`] is logged. [`Strictness::Strict`] turns that
//! warning into a [`TemplateError`].
//!
//! Conditions and function expressions are evaluated by a sandboxed
//! minijinja expression engine (see [`evaluate_expression`]).

mod error;
mod expression;
mod substitute;

pub use error::{ExpressionError, TemplateError, TemplateResolutionWarning};
pub use expression::{evaluate_condition, evaluate_expression, is_truthy};
pub use substitute::{
  Strictness, has_references, lookup, resolve_value, resolve_value_with, stringify, substitute,
  substitute_value, substitute_value_with, substitute_with,
};

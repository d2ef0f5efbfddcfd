//! Workflow templates.
//!
//! A template is a complete workflow definition that users copy and adapt.
//! The built-in set is embedded at compile time; more can be loaded from a
//! directory of `*.json` files.

mod error;
mod store;

pub use error::TemplateError;
pub use store::{TemplateStore, TemplateSummary};

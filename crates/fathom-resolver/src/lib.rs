mod error;
mod resolver;

pub use error::{GraphValidationError, Violation};
pub use resolver::{Resolver, StandardResolver};

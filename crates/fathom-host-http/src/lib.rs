//! HTTP implementations of the node provider traits.
//!
//! Each client owns a `reqwest::Client` and a validated base URL. Transport
//! failures, non-success statuses and undecodable bodies all surface as
//! [`ProviderError`](fathom_node_runtime::ProviderError).

mod client;
mod error;
mod openai;
mod retrieval;
mod tavily;
mod vector;

pub use client::BaseUrl;
pub use error::HostConfigError;
pub use openai::{DEFAULT_BASE_URL as OPENAI_BASE_URL, OpenAiClient};
pub use retrieval::HttpRetrievalClient;
pub use tavily::{DEFAULT_BASE_URL as TAVILY_BASE_URL, TavilySearchClient};
pub use vector::HttpVectorStore;

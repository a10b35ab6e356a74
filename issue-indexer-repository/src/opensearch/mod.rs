//! OpenSearch implementation of the bulk write backend.

mod client;
mod index_config;
mod queries;

pub use client::OpenSearchBackend;
pub use index_config::IndexConfig;

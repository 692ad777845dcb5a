//! Discussion forum backend with federated full-text thread search.
//!
//! The search index (tantivy) ranks and filters thread and comment
//! documents; the primary store (sled or in-memory) owns the canonical
//! records. The search pipeline bridges the two through a deduplicated set
//! of thread identifiers — see [`search`] for the details.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod state;

//! Federated full-text thread search.
//!
//! Threads and comments are separate documents in the tantivy index, while
//! the canonical thread records live in the primary store. A search request
//! is answered in two stages connected only by a set of thread identifiers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │          ThreadSearchService                     │
//! ├─────────────────────────────────────────────────┤
//! │  params ─► filter + sort criteria               │
//! │  tantivy ─► candidate thread-id set             │
//! │    (empty? one corrected retry, never more)     │
//! │  primary store ─► canonical records             │
//! │  sort + slice ─► ThreadSearchOutcome            │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! The index query is recency-sorted and capped at
//! `max_deep_search_count` documents: very common terms can match more
//! documents than the cap, and threads past it are silently dropped. That is
//! an accepted latency/recall tradeoff, not a bug.

mod config;
mod document;
mod error;
mod index;
mod query;
mod service;
mod suggest;

pub use config::SearchConfig;
pub use document::{build_content_schema, ContentDocument, ContentKind};
pub use error::{SearchError, SearchResult};
pub use index::{IndexManager, IndexStats};
pub use query::{
    resolve_sort_criteria, InvalidSortKey, QueryBuilder, SortCriteria, SortOrder,
    ThreadSearchFilter, ThreadSearchParams,
};
pub use service::{ThreadSearchOutcome, ThreadSearchService};

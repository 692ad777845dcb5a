//! Search configuration

use crate::models::SortKey;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Path to the search index directory
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Index writer heap size in bytes (default: 50MB)
    #[serde(default = "default_writer_heap_size")]
    pub writer_heap_size: usize,

    /// Commit (and reload readers) on every write
    #[serde(default = "default_realtime_indexing")]
    pub realtime_indexing: bool,

    /// Maximum number of index documents considered per search query.
    ///
    /// Queries are recency-sorted and truncated at this count before the
    /// thread-id reduction, so matching threads past the cap are dropped.
    /// Raising it trades latency for recall.
    #[serde(default = "default_max_deep_search_count")]
    pub max_deep_search_count: usize,

    /// Page size used when a request does not specify one
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Sort key used when a request does not specify one
    #[serde(default)]
    pub default_sort_key: SortKey,

    /// Budget for the primary-store membership fetch (seconds)
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,

    /// Enable the spelling-correction fallback on empty results
    #[serde(default = "default_enable_suggestions")]
    pub enable_suggestions: bool,

    /// Maximum edit distance a corrected term may be from the query term
    #[serde(default = "default_suggestion_max_edit_distance")]
    pub suggestion_max_edit_distance: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            writer_heap_size: default_writer_heap_size(),
            realtime_indexing: default_realtime_indexing(),
            max_deep_search_count: default_max_deep_search_count(),
            default_page_size: default_page_size(),
            default_sort_key: SortKey::default(),
            store_timeout_secs: default_store_timeout_secs(),
            enable_suggestions: default_enable_suggestions(),
            suggestion_max_edit_distance: default_suggestion_max_edit_distance(),
        }
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./data/search_index")
}

fn default_writer_heap_size() -> usize {
    50_000_000 // 50MB
}

fn default_realtime_indexing() -> bool {
    true
}

fn default_max_deep_search_count() -> usize {
    1000
}

fn default_page_size() -> usize {
    20
}

fn default_store_timeout_secs() -> u64 {
    10
}

fn default_enable_suggestions() -> bool {
    true
}

fn default_suggestion_max_edit_distance() -> usize {
    2
}

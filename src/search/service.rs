//! The federated thread-search pipeline.
//!
//! The search index is used purely as a thread-id oracle; the primary store
//! is the sole source of presented fields and sort order. The two stages
//! are connected only by the deduplicated id set.

use crate::error::{AppError, Result};
use crate::models::{Comment, CommentThread};
use crate::search::config::SearchConfig;
use crate::search::document::{ContentDocument, ContentKind};
use crate::search::error::{SearchError, SearchResult};
use crate::search::index::{IndexManager, IndexStats};
use crate::search::query::{
    resolve_sort_criteria, QueryBuilder, SortCriteria, ThreadSearchFilter, ThreadSearchParams,
};
use crate::search::suggest;
use crate::state::ThreadStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tantivy::collector::TopDocs;
use tantivy::schema::Value;
use tantivy::{Order, TantivyDocument};
use uuid::Uuid;

/// The assembled result of one search request.
///
/// `total_results` counts the candidate thread-id set, not the fetched
/// records: an id surfaced by the index whose canonical record is missing
/// is dropped from `collection` but still counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSearchOutcome {
    /// The requested page of canonical thread records, sorted
    pub collection: Vec<CommentThread>,

    /// Corrected query text, present only when the spelling-correction
    /// retry produced results
    pub corrected_text: Option<String>,

    /// Size of the candidate thread-id set before pagination
    pub total_results: usize,

    /// Total page count at the requested page size
    pub num_pages: usize,

    /// The 1-indexed page that was requested
    pub page: usize,
}

impl ThreadSearchOutcome {
    /// The neutral outcome returned for missing query text or an
    /// unrecognized sort key
    fn empty(page: usize) -> Self {
        Self {
            collection: Vec::new(),
            corrected_text: None,
            total_results: 0,
            num_pages: 0,
            page,
        }
    }
}

/// Main thread-search service
pub struct ThreadSearchService {
    /// Index manager
    index_manager: Arc<IndexManager>,

    /// Primary store holding canonical thread records
    store: Arc<dyn ThreadStore>,

    /// Configuration
    config: SearchConfig,
}

impl ThreadSearchService {
    /// Create a new search service
    pub async fn new(config: SearchConfig, store: Arc<dyn ThreadStore>) -> SearchResult<Self> {
        let index_manager = Arc::new(IndexManager::new(config.clone()).await?);

        Ok(Self {
            index_manager,
            store,
            config,
        })
    }

    /// Run the full search pipeline for one request.
    ///
    /// Missing query text and unrecognized sort keys yield a structurally
    /// valid empty outcome rather than an error; store faults surface as
    /// service errors distinct from "no results".
    pub async fn search_threads(&self, params: &ThreadSearchParams) -> Result<ThreadSearchOutcome> {
        let page = params.page.unwrap_or(1).max(1);
        let per_page = params
            .per_page
            .unwrap_or(self.config.default_page_size)
            .max(1);

        let text = params
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let Some(text) = text else {
            return Ok(ThreadSearchOutcome::empty(page));
        };

        let criteria = match resolve_sort_criteria(
            params.sort_key.as_deref(),
            self.config.default_sort_key,
        ) {
            Ok(criteria) => criteria,
            Err(err) => {
                tracing::debug!(error = %err, "Sort key not recognized, returning empty outcome");
                return Ok(ThreadSearchOutcome::empty(page));
            }
        };

        let filter = ThreadSearchFilter::from_params(params);

        let mut thread_ids = self.matching_thread_ids(text, &filter).await?;
        let mut corrected_text = None;

        // Two-state fallback: Initial -> (on empty) -> Corrected -> done.
        // The retry keeps the filter unchanged and never cascades.
        if thread_ids.is_empty() && self.config.enable_suggestions {
            if let Some(correction) = self.suggest_correction(text)? {
                let retried = self.matching_thread_ids(&correction, &filter).await?;
                if retried.is_empty() {
                    tracing::debug!(
                        correction = %correction,
                        "Corrected query matched nothing, discarding suggestion"
                    );
                } else {
                    thread_ids = retried;
                    corrected_text = Some(correction);
                }
            }
        }

        let total_results = thread_ids.len();
        let collection = self.fetch_page(&thread_ids, criteria, page, per_page).await?;
        let num_pages = (total_results + per_page - 1) / per_page;

        Ok(ThreadSearchOutcome {
            collection,
            corrected_text,
            total_results,
            num_pages,
            page,
        })
    }

    /// Candidate finder: one recency-capped index query reduced to a
    /// deduplicated set of thread ids.
    ///
    /// Comment documents contribute their parent thread id, thread documents
    /// their own. The query is capped at `max_deep_search_count` documents
    /// ordered by update recency, so very common terms can silently lose
    /// matching threads past the cap. No retry happens here; that is the
    /// caller's decision.
    pub async fn matching_thread_ids(
        &self,
        query_text: &str,
        filter: &ThreadSearchFilter,
    ) -> SearchResult<HashSet<Uuid>> {
        let query_builder = QueryBuilder::new(
            self.index_manager.schema().clone(),
            self.index_manager.index().clone(),
        );
        let query = query_builder.build(query_text, filter)?;

        let searcher = self.index_manager.reader().searcher();
        let schema = self.index_manager.schema();
        let id_field = schema.get_field("id")?;
        let kind_field = schema.get_field("kind")?;
        let thread_id_field = schema.get_field("thread_id")?;

        let collector = TopDocs::with_limit(self.config.max_deep_search_count)
            .order_by_fast_field::<tantivy::DateTime>("updated_at", Order::Desc);

        let top_docs = searcher
            .search(&*query, &collector)
            .map_err(|e| SearchError::SearchFailed(format!("Search execution failed: {}", e)))?;

        let mut thread_ids = HashSet::new();

        for (_updated_at, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| SearchError::SearchFailed(format!("Failed to retrieve doc: {}", e)))?;

            let kind = doc
                .get_first(kind_field)
                .and_then(|v| v.as_str())
                .and_then(|raw| ContentKind::from_str(raw).ok());

            let raw_thread_id = match kind {
                Some(ContentKind::Thread) => doc.get_first(id_field).and_then(|v| v.as_str()),
                Some(ContentKind::Comment) => {
                    doc.get_first(thread_id_field).and_then(|v| v.as_str())
                }
                None => None,
            };

            if let Some(thread_id) = raw_thread_id.and_then(|raw| Uuid::parse_str(raw).ok()) {
                thread_ids.insert(thread_id);
            }
        }

        Ok(thread_ids)
    }

    /// Cross-store paginator: membership fetch against the primary store,
    /// then sort and 1-indexed slice.
    ///
    /// An empty id set never touches the store; a page past the end is an
    /// empty page, not an error. Ids with no canonical record are simply
    /// absent from the fetched set.
    async fn fetch_page(
        &self,
        thread_ids: &HashSet<Uuid>,
        criteria: SortCriteria,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<CommentThread>> {
        if thread_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = thread_ids.iter().copied().collect();
        let mut threads = tokio::time::timeout(
            Duration::from_secs(self.config.store_timeout_secs),
            self.store.find_threads_by_ids(&ids),
        )
        .await
        .map_err(|_| AppError::Timeout("primary store membership fetch".to_string()))??;

        criteria.apply(&mut threads);

        Ok(threads
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect())
    }

    /// Ask the index for its single best corrected phrase, scored across
    /// title and body combined
    fn suggest_correction(&self, query_text: &str) -> SearchResult<Option<String>> {
        let searcher = self.index_manager.reader().searcher();
        let schema = self.index_manager.schema();
        let fields = [schema.get_field("title")?, schema.get_field("body")?];

        suggest::suggest_phrase(
            &searcher,
            &fields,
            query_text,
            self.config.suggestion_max_edit_distance,
        )
    }

    /// Index a thread document
    pub async fn index_thread(&self, thread: &CommentThread) -> SearchResult<()> {
        self.index_manager
            .index_document(&ContentDocument::from(thread))
            .await
    }

    /// Index a comment document
    pub async fn index_comment(&self, comment: &Comment) -> SearchResult<()> {
        self.index_manager
            .index_document(&ContentDocument::from(comment))
            .await
    }

    /// Commit pending index changes
    pub async fn commit(&self) -> SearchResult<()> {
        self.index_manager.commit().await
    }

    /// Get index statistics
    pub async fn get_stats(&self) -> SearchResult<IndexStats> {
        self.index_manager.get_stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::InMemoryStore;
    use crate::state::ThreadStore as _;
    use tempfile::TempDir;

    async fn create_test_service() -> (ThreadSearchService, Arc<InMemoryStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let store = Arc::new(InMemoryStore::new());
        let service = ThreadSearchService::new(config, store.clone())
            .await
            .unwrap();
        (service, store, temp_dir)
    }

    #[tokio::test]
    async fn test_missing_text_yields_empty_outcome() {
        let (service, _store, _dir) = create_test_service().await;

        let outcome = service
            .search_threads(&ThreadSearchParams::default())
            .await
            .unwrap();

        assert!(outcome.collection.is_empty());
        assert_eq!(outcome.total_results, 0);
        assert_eq!(outcome.num_pages, 0);
        assert!(outcome.corrected_text.is_none());
    }

    #[tokio::test]
    async fn test_blank_text_yields_empty_outcome() {
        let (service, _store, _dir) = create_test_service().await;

        let params = ThreadSearchParams {
            text: Some("   ".to_string()),
            ..Default::default()
        };

        let outcome = service.search_threads(&params).await.unwrap();
        assert_eq!(outcome.total_results, 0);
    }

    #[tokio::test]
    async fn test_unrecognized_sort_key_yields_empty_outcome() {
        let (service, store, _dir) = create_test_service().await;

        let thread = CommentThread::new(
            "course-v1:Demo".to_string(),
            "general".to_string(),
            "Refund policy".to_string(),
            "How do refunds work?".to_string(),
            "user-1".to_string(),
        );
        store.save_thread(&thread).await.unwrap();
        service.index_thread(&thread).await.unwrap();

        let params = ThreadSearchParams {
            text: Some("refund".to_string()),
            sort_key: Some("hotness".to_string()),
            ..Default::default()
        };

        let outcome = service.search_threads(&params).await.unwrap();
        assert!(outcome.collection.is_empty());
        assert_eq!(outcome.total_results, 0);
    }

    #[tokio::test]
    async fn test_search_finds_indexed_thread() {
        let (service, store, _dir) = create_test_service().await;

        let thread = CommentThread::new(
            "course-v1:Demo".to_string(),
            "general".to_string(),
            "Refund policy".to_string(),
            "How do refunds work?".to_string(),
            "user-1".to_string(),
        );
        store.save_thread(&thread).await.unwrap();
        service.index_thread(&thread).await.unwrap();

        let params = ThreadSearchParams {
            text: Some("refund".to_string()),
            ..Default::default()
        };

        let outcome = service.search_threads(&params).await.unwrap();
        assert_eq!(outcome.total_results, 1);
        assert_eq!(outcome.num_pages, 1);
        assert_eq!(outcome.collection[0].id, thread.id);
        assert!(outcome.corrected_text.is_none());
    }
}
